//! Camera-side collaborators of the leader handshake.
//!
//! Decoding QR codes from video is done elsewhere; this module only defines
//! what the handshake consumes from it (batches of decoded text, a list of
//! capture devices) and the rate-limited loop that feeds decoded text into a
//! [`LeaderHandshake`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::handshake::{LeaderHandshake, ScanOutcome};

/// Default delay between scan attempts.
pub const DEFAULT_SCAN_DELAY: Duration = Duration::from_millis(500);

/// A source of decoded QR payloads.
#[async_trait::async_trait]
pub trait PayloadSource: Send {
    /// Decode the next frame.
    ///
    /// Returns the payloads found (possibly none), or `None` once the source
    /// has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the capture device fails.
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>>;
}

/// A video input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    /// Stable identifier passed to the capture backend.
    pub id: String,
    /// Human-readable label.
    pub label: String,
}

/// Lists the video input devices available to the station.
#[async_trait::async_trait]
pub trait DeviceEnumerator: Send + Sync {
    /// Enumerate video inputs.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses enumeration.
    async fn enumerate(&self) -> Result<Vec<CaptureDevice>>;
}

/// The devices a scout can pick from, plus the current pick.
#[derive(Debug, Clone, Default)]
pub struct DeviceList {
    devices: Vec<CaptureDevice>,
    selected: Option<String>,
}

impl DeviceList {
    /// Create a list with an initial set of devices and no selection.
    #[must_use]
    pub fn new(devices: Vec<CaptureDevice>) -> Self {
        Self {
            devices,
            selected: None,
        }
    }

    /// Known devices.
    #[must_use]
    pub fn devices(&self) -> &[CaptureDevice] {
        &self.devices
    }

    /// The selected device id.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Select a known device. Returns `false` for unknown ids.
    pub fn select(&mut self, id: &str) -> bool {
        if self.devices.iter().any(|d| d.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            warn!(id, "Unknown capture device");
            false
        }
    }

    /// Re-enumerate devices.
    ///
    /// An empty result or a failure leaves the list unchanged. Returns
    /// `true` if the list was replaced.
    pub async fn refresh(&mut self, enumerator: &dyn DeviceEnumerator) -> bool {
        match enumerator.enumerate().await {
            Ok(devices) if !devices.is_empty() => {
                debug!(count = devices.len(), "Capture devices refreshed");
                if let Some(id) = &self.selected {
                    if !devices.iter().any(|d| &d.id == id) {
                        self.selected = None;
                    }
                }
                self.devices = devices;
                true
            }
            Ok(_) => {
                debug!("No capture devices found, keeping previous list");
                false
            }
            Err(e) => {
                warn!(error = %e, "Capture device enumeration failed");
                false
            }
        }
    }
}

/// A cloneable handle for stopping a scan loop from elsewhere.
///
/// Stopping also interrupts a loop blocked waiting on its payload source.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the scan loop to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Resolve once [`ScanHandle::stop`] has been called.
    pub async fn stopped(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.should_stop() {
                return;
            }
            notified.await;
        }
    }

    /// Stop when `signal` resolves, e.g. on Ctrl-C.
    ///
    /// The returned task can be aborted once the scan is over.
    pub fn stop_on<F>(&self, signal: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.clone();
        tokio::spawn(async move {
            signal.await;
            debug!("Stop signal received");
            handle.stop();
        })
    }
}

/// Why a scan loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// A leader payload is awaiting confirmation.
    Captured,
    /// The handle was stopped or the handshake stopped scanning.
    Stopped,
    /// The payload source ran dry.
    Exhausted,
}

/// Feed decoded payloads into `handshake`, at most one batch per `delay`,
/// until a candidate is captured.
///
/// # Errors
///
/// Returns an error if the payload source fails.
pub async fn scan_for_leader<P>(
    handshake: &mut LeaderHandshake,
    source: &mut P,
    delay: Duration,
    handle: &ScanHandle,
) -> Result<ScanEnd>
where
    P: PayloadSource + ?Sized,
{
    if delay.is_zero() {
        return Err(Error::scanner("scan delay must be greater than 0"));
    }

    let mut ticker = interval(delay);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        if handle.should_stop() || !handshake.is_scanning() {
            return Ok(ScanEnd::Stopped);
        }

        let next = tokio::select! {
            next = source.next_batch() => next?,
            () = handle.stopped() => return Ok(ScanEnd::Stopped),
        };
        let Some(batch) = next else {
            debug!("Payload source ended");
            return Ok(ScanEnd::Exhausted);
        };

        match handshake.on_batch(batch.iter().map(String::as_str)) {
            ScanOutcome::Captured => return Ok(ScanEnd::Captured),
            ScanOutcome::NotScanning => return Ok(ScanEnd::Stopped),
            ScanOutcome::Ignored => {}
        }
    }
}

/// Reads one decoded payload per line, e.g. from `zbarcam --raw`.
#[derive(Debug)]
pub struct LineSource<R> {
    lines: Lines<BufReader<R>>,
}

impl<R: AsyncRead + Unpin> LineSource<R> {
    /// Wrap a reader.
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
        }
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> PayloadSource for LineSource<R> {
    async fn next_batch(&mut self) -> Result<Option<Vec<String>>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| {
            let trimmed = l.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }))
    }
}

//! Leader/follower match metadata handshake.
//!
//! A follower station either scouts manually or scans a leader station's QR
//! code carrying the match metadata. A scanned candidate is shown for
//! confirmation; accepting it replaces the form's Metadata section with
//! leader-supplied, locked values.
//!
//! ```text
//! AwaitingRoleChoice ──manual──▶ ManualScouting
//!        │
//!   start_scanning
//!        ▼
//!   AwaitingScan ──valid payload──▶ AwaitingConfirmation ──accept──▶ Applied
//!        ▲                                   │
//!        └──────────────reject───────────────┘
//! ```

pub mod metadata;
mod payload;

use tracing::{debug, info, trace, warn};

use crate::form::FormModel;

pub use metadata::{alliance_code, METADATA_SECTION};
pub use payload::{LeaderPayload, PayloadRejection, REQUIRED_KEYS};

/// Where a station is in the handshake.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum HandshakeState {
    /// Waiting for the scout to choose scanning or manual entry.
    #[default]
    AwaitingRoleChoice,
    /// The scout chose manual entry. Terminal.
    ManualScouting,
    /// Decoding payloads from the camera.
    AwaitingScan,
    /// A valid payload is waiting for the scout to confirm it.
    AwaitingConfirmation(LeaderPayload),
    /// A confirmed payload was merged into the form. Terminal.
    Applied,
}

/// What happened to a decoded payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// A leader payload was captured and awaits confirmation.
    Captured,
    /// Nothing in the scan was a leader payload; scanning continues.
    Ignored,
    /// The station is not scanning; the scan was discarded.
    NotScanning,
}

/// The handshake state machine for one station.
#[derive(Debug, Clone, Default)]
pub struct LeaderHandshake {
    state: HandshakeState,
}

impl LeaderHandshake {
    /// Start in [`HandshakeState::AwaitingRoleChoice`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// The payload awaiting confirmation, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&LeaderPayload> {
        match &self.state {
            HandshakeState::AwaitingConfirmation(payload) => Some(payload),
            _ => None,
        }
    }

    /// Whether decoded payloads are currently acted on.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.state == HandshakeState::AwaitingScan
    }

    /// Whether the scan dialog is still up, i.e. the handshake has not ended.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.is_finished()
    }

    /// Whether the handshake reached a terminal state.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self.state,
            HandshakeState::ManualScouting | HandshakeState::Applied
        )
    }

    /// Skip the leader scan and give the form a blank, editable Metadata
    /// section.
    ///
    /// Returns `false` and leaves everything unchanged once the handshake has
    /// finished, or when the form already uses a Metadata code elsewhere.
    pub fn choose_manual(&mut self, model: &mut FormModel) -> bool {
        if self.is_finished() {
            debug!(state = ?self.state, "Ignoring manual choice, handshake finished");
            return false;
        }
        if let Err(e) = model.replace_section(metadata::manual_section()) {
            warn!(error = %e, "Cannot install Metadata section");
            return false;
        }
        self.state = HandshakeState::ManualScouting;
        info!("Manual scouting selected");
        true
    }

    /// Begin reacting to decoded payloads.
    ///
    /// Returns `false` unless the station is awaiting its role choice.
    pub fn start_scanning(&mut self) -> bool {
        if self.state != HandshakeState::AwaitingRoleChoice {
            debug!(state = ?self.state, "Ignoring scan start");
            return false;
        }
        self.state = HandshakeState::AwaitingScan;
        debug!("Scanning for leader payload");
        true
    }

    /// Feed one decoded payload.
    pub fn on_decoded(&mut self, raw: &str) -> ScanOutcome {
        self.on_batch(std::iter::once(raw))
    }

    /// Feed every payload decoded from one frame; the first valid one wins.
    pub fn on_batch<'a, I>(&mut self, batch: I) -> ScanOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        if !self.is_scanning() {
            trace!(state = ?self.state, "Discarding scan, not scanning");
            return ScanOutcome::NotScanning;
        }

        for raw in batch {
            match LeaderPayload::from_scan(raw) {
                Ok(payload) => {
                    info!(
                        match_number = ?payload.match_number,
                        fms_robot = ?payload.fms_robot,
                        "Leader payload captured"
                    );
                    self.state = HandshakeState::AwaitingConfirmation(payload);
                    return ScanOutcome::Captured;
                }
                Err(reason) => trace!(%reason, "Ignoring scan"),
            }
        }
        ScanOutcome::Ignored
    }

    /// Confirm the pending payload and install its Metadata section.
    ///
    /// A press with no pending payload is stale and is ignored. If the form
    /// already uses a Metadata code in another section, nothing is applied
    /// and the payload stays pending.
    pub fn accept(&mut self, model: &mut FormModel) -> bool {
        let HandshakeState::AwaitingConfirmation(payload) = &self.state else {
            debug!(state = ?self.state, "Ignoring stale accept");
            return false;
        };
        if let Err(e) = model.replace_section(metadata::leader_section(payload)) {
            warn!(error = %e, "Cannot apply leader metadata");
            return false;
        }
        info!(robot = ?payload.robot_code(), "Leader metadata applied");
        self.state = HandshakeState::Applied;
        true
    }

    /// Discard the pending payload and resume scanning.
    ///
    /// A press with no pending payload is stale and is ignored.
    pub fn reject(&mut self) -> bool {
        if self.pending().is_none() {
            debug!(state = ?self.state, "Ignoring stale reject");
            return false;
        }
        debug!("Leader payload rejected, resuming scan");
        self.state = HandshakeState::AwaitingScan;
        true
    }
}

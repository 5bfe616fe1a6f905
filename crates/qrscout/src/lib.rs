//! `qrscout` - configurable scouting forms encoded as QR records
//!
//! This library provides the form model, the tab-separated record and JSON
//! document codecs, the local store for the user's form, and the leader/follower
//! handshake that lets a station take match metadata from a scanned QR code.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod form;
pub mod handshake;
pub mod logging;
pub mod scanner;
pub mod session;
pub mod storage;

pub use codec::MissingValue;
pub use config::Config;
pub use error::{Error, Result};
pub use form::{Field, FieldType, FieldValue, FormModel, Section};
pub use handshake::{HandshakeState, LeaderHandshake, LeaderPayload};
pub use logging::init_logging;
pub use session::{Commit, Session};
pub use storage::{KeyValueStore, MemoryStore, Storage};

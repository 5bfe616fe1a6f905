//! Command-line interface for qrscout.
//!
//! This module provides the CLI structure for the `qrscout` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BroadcastCommand, ConfigCommand, EncodeCommand, FieldAssignment, FormCommand, LeaderCommand,
    MissingValueArg, ScanCommand,
};

use crate::logging::Verbosity;

/// qrscout - Scouting forms over QR codes
///
/// Fills in a configurable scouting form and encodes it as a single
/// tab-separated record for a QR code. Follower stations can take match
/// metadata from a leader station's broadcast.
#[derive(Debug, Parser)]
#[command(name = "qrscout")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect and encode the scouting form
    #[command(subcommand)]
    Form(FormCommand),

    /// Manage settings and the stored form document
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Leader/follower match metadata handshake
    #[command(subcommand)]
    Leader(LeaderCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

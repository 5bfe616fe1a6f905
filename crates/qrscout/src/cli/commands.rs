//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Subcommand, ValueEnum};

use crate::codec::MissingValue;
use crate::form::FieldValue;
use crate::handshake::LeaderPayload;

/// Form commands.
#[derive(Debug, Subcommand)]
pub enum FormCommand {
    /// Show the form a new session starts with
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the spreadsheet header line
    Header,

    /// Fill in the form and print the record
    Encode(EncodeCommand),
}

/// Encode command arguments.
#[derive(Debug, Args)]
pub struct EncodeCommand {
    /// Set a field value (repeatable)
    #[arg(short = 's', long = "set", value_name = "SECTION.CODE=VALUE")]
    pub assignments: Vec<FieldAssignment>,

    /// Apply a confirmed leader payload from a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub leader: Option<PathBuf>,

    /// How unset values are written (overrides the configuration)
    #[arg(short, long, value_enum)]
    pub missing: Option<MissingValueArg>,
}

/// One `SECTION.CODE=VALUE` edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldAssignment {
    /// Section name.
    pub section: String,
    /// Field code.
    pub code: String,
    /// Raw value text, parsed later for the field's type.
    pub value: String,
}

impl FromStr for FieldAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (target, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SECTION.CODE=VALUE, got '{s}'"))?;
        // Section names may contain dots; codes may not.
        let (section, code) = target
            .rsplit_once('.')
            .ok_or_else(|| format!("expected SECTION.CODE before '=', got '{target}'"))?;
        if section.is_empty() || code.is_empty() {
            return Err(format!("section and code must not be empty in '{s}'"));
        }
        Ok(Self {
            section: section.to_string(),
            code: code.to_string(),
            value: value.to_string(),
        })
    }
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current application settings
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the settings file path
    Path,

    /// Validate application settings
    Validate {
        /// Path to settings file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Write the current form as a value-free document
    Export {
        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Load a form document and keep it for future sessions
    Import {
        /// Form document to import
        file: PathBuf,
    },

    /// Forget the imported form and go back to the bundled one
    Clear,
}

/// Leader handshake commands.
#[derive(Debug, Subcommand)]
pub enum LeaderCommand {
    /// Scan for a leader payload and apply it
    Scan(ScanCommand),

    /// Print the payload a leader station broadcasts
    Broadcast(BroadcastCommand),
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Decoded payloads, one per line ("-" for stdin)
    #[arg(short, long, value_name = "FILE", default_value = "-")]
    pub input: PathBuf,

    /// Accept the first valid payload without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Skip scanning and scout manually
    #[arg(short, long, conflicts_with_all = ["input", "yes"])]
    pub manual: bool,
}

impl ScanCommand {
    /// Whether payloads come from stdin.
    #[must_use]
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

/// Broadcast command arguments.
#[derive(Debug, Args)]
pub struct BroadcastCommand {
    /// Data type code
    #[arg(long, default_value = "S")]
    pub basic: String,

    /// Scouter identity
    #[arg(long)]
    pub scouter: String,

    /// Scouter display name
    #[arg(long)]
    pub name: Option<String>,

    /// Match number
    #[arg(long)]
    pub match_number: u32,

    /// First alliance team
    #[arg(long)]
    pub team1: u32,

    /// Second alliance team
    #[arg(long)]
    pub team2: u32,

    /// Third alliance team
    #[arg(long)]
    pub team3: u32,

    /// Driver station label, e.g. "Red 2"
    #[arg(long)]
    pub fms_robot: String,
}

impl From<&BroadcastCommand> for LeaderPayload {
    fn from(cmd: &BroadcastCommand) -> Self {
        Self {
            basic: Some(FieldValue::from(cmd.basic.as_str())),
            scouter: Some(FieldValue::from(cmd.scouter.as_str())),
            name: cmd.name.as_deref().map(FieldValue::from),
            match_number: Some(FieldValue::from(cmd.match_number)),
            team_number1: Some(FieldValue::from(cmd.team1)),
            team_number2: Some(FieldValue::from(cmd.team2)),
            team_number3: Some(FieldValue::from(cmd.team3)),
            fms_robot: Some(cmd.fms_robot.clone()),
        }
    }
}

/// Missing value policy argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MissingValueArg {
    /// Leave the column empty
    Empty,
    /// Write "undefined"
    Literal,
}

impl From<MissingValueArg> for MissingValue {
    fn from(arg: MissingValueArg) -> Self {
        match arg {
            MissingValueArg::Empty => Self::Empty,
            MissingValueArg::Literal => Self::Literal,
        }
    }
}

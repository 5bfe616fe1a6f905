//! `qrscout` - CLI for qrscout
//!
//! This binary fills in the scouting form, prints QR records and headers,
//! manages the stored form document and runs the leader handshake.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::Path;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use qrscout::cli::{
    BroadcastCommand, Cli, Command, ConfigCommand, EncodeCommand, FormCommand, LeaderCommand,
    ScanCommand,
};
use qrscout::codec::{MissingValue, EXPORT_FILE_NAME};
use qrscout::handshake::{LeaderPayload, METADATA_SECTION};
use qrscout::scanner::{scan_for_leader, LineSource, PayloadSource, ScanEnd, ScanHandle};
use qrscout::storage::USER_CONFIG_KEY;
use qrscout::{init_logging, Config, FieldValue, FormModel, Session, Storage};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load settings")?;

    match cli.command {
        Command::Form(form_cmd) => handle_form(&config, form_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        Command::Leader(leader_cmd) => handle_leader(&config, leader_cmd),
    }
}

fn open_session(config: &Config, missing: MissingValue) -> anyhow::Result<Session<Storage>> {
    let storage = Storage::open(config.database_path())
        .with_context(|| format!("failed to open {}", config.database_path().display()))?;
    Ok(Session::start(storage, missing))
}

fn handle_form(config: &Config, cmd: FormCommand) -> anyhow::Result<()> {
    match cmd {
        FormCommand::Show { json } => {
            let session = open_session(config, config.encoding.missing_value)?;
            if json {
                println!("{}", serde_json::to_string_pretty(session.model())?);
            } else {
                print_form(session.model());
                if let Some(at) = session.store().updated_at(USER_CONFIG_KEY)? {
                    println!();
                    println!("Imported form, stored {at} UTC");
                }
            }
        }
        FormCommand::Header => {
            let session = open_session(config, config.encoding.missing_value)?;
            println!("{}", session.header());
        }
        FormCommand::Encode(encode_cmd) => handle_encode(config, &encode_cmd)?,
    }
    Ok(())
}

fn handle_encode(config: &Config, cmd: &EncodeCommand) -> anyhow::Result<()> {
    let missing = cmd
        .missing
        .map_or(config.encoding.missing_value, MissingValue::from);
    let mut session = open_session(config, missing)?;

    if let Some(path) = &cmd.leader {
        let raw = read_text(path)?;
        let raw = raw.trim();
        if let Err(reason) = LeaderPayload::from_scan(raw) {
            bail!("{} is not a leader payload: {reason}", path.display());
        }
        session.start_scanning();
        session.on_scan([raw]);
        if !session.accept() {
            bail!("cannot apply {}: the form already uses a Metadata code", path.display());
        }
    }

    for assignment in &cmd.assignments {
        session
            .set_from_text(&assignment.section, &assignment.code, &assignment.value)
            .with_context(|| format!("cannot set {}.{}", assignment.section, assignment.code))?;
    }

    let Some(commit) = session.commit() else {
        let missing: Vec<String> = session
            .missing_required()
            .iter()
            .map(|f| format!("{} ({})", f.code, f.title))
            .collect();
        bail!("required fields are missing: {}", missing.join(", "));
    };

    println!("{}", commit.title);
    println!("{}", commit.payload);
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Scanner]");
                println!("  Scan delay:     {} ms", config.scanner.scan_delay_ms);
                println!();
                println!("[Encoding]");
                println!("  Missing values: {:?}", config.encoding.missing_value);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
        ConfigCommand::Export { output } => {
            let session = open_session(config, config.encoding.missing_value)?;
            let path = output.unwrap_or_else(|| EXPORT_FILE_NAME.into());
            std::fs::write(&path, session.export_config_json()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Exported form to {}", path.display());
        }
        ConfigCommand::Import { file } => {
            let raw = read_text(&file)?;
            let mut session = open_session(config, config.encoding.missing_value)?;
            session
                .import_config(&raw)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!(
                "Imported '{}' ({} fields)",
                session.model().title,
                session.model().field_count()
            );
        }
        ConfigCommand::Clear => {
            let mut session = open_session(config, config.encoding.missing_value)?;
            if session.clear_user_config()? {
                println!("Removed stored form; new sessions use the built-in form.");
            } else {
                println!("No stored form.");
            }
        }
    }
    Ok(())
}

fn handle_leader(config: &Config, cmd: LeaderCommand) -> anyhow::Result<()> {
    match cmd {
        LeaderCommand::Scan(scan_cmd) => handle_scan(config, &scan_cmd),
        LeaderCommand::Broadcast(broadcast_cmd) => handle_broadcast(&broadcast_cmd),
    }
}

fn handle_scan(config: &Config, cmd: &ScanCommand) -> anyhow::Result<()> {
    let mut session = open_session(config, config.encoding.missing_value)?;

    if cmd.manual {
        if !session.choose_manual() {
            bail!("cannot install Metadata: the form already uses a Metadata code");
        }
    } else {
        if cmd.reads_stdin() && !cmd.yes {
            bail!("--yes is required when payloads are read from stdin");
        }
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to start runtime")?;
        runtime.block_on(scan(&mut session, config, cmd))?;
    }

    print_metadata(session.model());
    Ok(())
}

async fn scan(
    session: &mut Session<Storage>,
    config: &Config,
    cmd: &ScanCommand,
) -> anyhow::Result<()> {
    let mut source: Box<dyn PayloadSource> = if cmd.reads_stdin() {
        Box::new(LineSource::new(tokio::io::stdin()))
    } else {
        let file = tokio::fs::File::open(&cmd.input)
            .await
            .with_context(|| format!("failed to open {}", cmd.input.display()))?;
        Box::new(LineSource::new(file))
    };
    let mut answers = BufReader::new(tokio::io::stdin()).lines();
    let handle = ScanHandle::new();
    let watcher = handle.stop_on(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    });

    let result =
        scan_until_confirmed(session, source.as_mut(), &mut answers, config, cmd, &handle).await;
    watcher.abort();
    result
}

async fn scan_until_confirmed<R>(
    session: &mut Session<Storage>,
    source: &mut dyn PayloadSource,
    answers: &mut Lines<R>,
    config: &Config,
    cmd: &ScanCommand,
    handle: &ScanHandle,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    session.start_scanning();
    loop {
        let end = scan_for_leader(session.handshake_mut(), source, config.scan_delay(), handle)
            .await?;

        match end {
            ScanEnd::Captured => {}
            ScanEnd::Exhausted => bail!("no leader payload found"),
            ScanEnd::Stopped => bail!("scan stopped before a leader payload was found"),
        }

        let Some(candidate) = session.handshake().pending() else {
            bail!("scan ended without a pending payload");
        };
        if cmd.yes {
            return apply(session);
        }

        eprintln!("Leader payload:");
        eprintln!("  Match:   {}", show(candidate.match_number.as_ref()));
        eprintln!("  Scouter: {}", show(candidate.scouter.as_ref()));
        eprintln!(
            "  Robot:   {} ({})",
            candidate.fms_robot.as_deref().unwrap_or("-"),
            candidate.robot_code().as_deref().unwrap_or("-")
        );
        eprintln!(
            "  Teams:   {} {} {}",
            show(candidate.team_number1.as_ref()),
            show(candidate.team_number2.as_ref()),
            show(candidate.team_number3.as_ref())
        );
        eprint!("Accept? [y/N] ");

        let answer = tokio::select! {
            answer = answers.next_line() => answer?.unwrap_or_default(),
            () = handle.stopped() => bail!("scan stopped before a leader payload was confirmed"),
        };
        if matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes") {
            return apply(session);
        }
        session.reject();
    }
}

fn apply(session: &mut Session<Storage>) -> anyhow::Result<()> {
    if !session.accept() {
        bail!("cannot apply leader metadata: the form already uses a Metadata code");
    }
    Ok(())
}

fn show(value: Option<&FieldValue>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn handle_broadcast(cmd: &BroadcastCommand) -> anyhow::Result<()> {
    let payload = LeaderPayload::from(cmd);
    println!("{}", payload.to_json()?);
    Ok(())
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_form(model: &FormModel) {
    println!("{} - {}", model.title, model.page_title);
    for section in &model.sections {
        println!();
        let preserved = if section.preserve_data_on_reset {
            " (kept on reset)"
        } else {
            ""
        };
        println!("[{}]{preserved}", section.name);
        for field in &section.fields {
            let required = if field.required { "*" } else { " " };
            let value = field
                .value
                .as_ref()
                .map_or_else(|| "-".to_string(), ToString::to_string);
            println!(
                "  {required} {:<16} {:<8} {:<24} {value}",
                field.code,
                field.kind.as_str(),
                field.title
            );
        }
    }
}

fn print_metadata(model: &FormModel) {
    let Some(section) = model.section(METADATA_SECTION) else {
        return;
    };
    for field in &section.fields {
        let value = field
            .value
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let locked = if field.is_locked() { " (locked)" } else { "" };
        println!("{:<12} {value}{locked}", field.code);
    }
}

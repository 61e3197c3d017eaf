//! # mapchat
//!
//! Replays a recorded stream of bus events through a fresh chat session
//! and prints the resulting message timeline and active widgets.
//!
//! The input is JSON Lines, one bus event per line:
//!
//! ```text
//! {"type":"map.tile_selected","source":"map","payload":{"tileId":"t1","tileData":{"title":"Home","coordId":"0,0"}}}
//! {"type":"chat.message","source":"chat","payload":{"content":"hello"}}
//! {"type":"chat.clear","source":"chat"}
//! ```
//!
//! `chat.message` and `chat.clear` are dispatched to the session directly;
//! everything else is emitted on the bus. Blank lines and lines starting with
//! `#` are skipped.

#![deny(unsafe_code)]

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mapchat_bus::{BusEvent, EventBus};
use mapchat_events::{MessagePayload, PendingEvent};
use mapchat_runtime::{ChatSession, ChatSnapshot};
use mapchat_settings::ChatSettings;
use tracing::{info, warn};

/// Chat panel event replay tool.
#[derive(Parser, Debug)]
#[command(name = "mapchat", about = "Map chat event engine", version)]
struct Cli {
    /// Log level when `RUST_LOG` is unset.
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSONL file of bus events and print the derived state.
    Replay(ReplayArgs),
}

#[derive(clap::Args, Debug)]
struct ReplayArgs {
    /// JSONL file of bus events (`-` for stdin).
    file: PathBuf,

    /// Settings file (defaults to `~/.mapchat/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Show diagnostic messages for events that produce none.
    #[arg(long)]
    debug: bool,

    /// Print the snapshot as JSON.
    #[arg(long)]
    json: bool,

    /// Seed the log with a welcome message that survives `chat.clear`.
    #[arg(long)]
    welcome: Option<String>,
}

/// Counters for one replay run.
#[derive(Debug, Default, PartialEq, Eq)]
struct ReplayStats {
    lines: usize,
    emitted: usize,
    dispatched: usize,
    skipped: usize,
}

fn load_settings(args: &ReplayArgs) -> Result<ChatSettings> {
    let mut settings = match &args.settings {
        Some(path) => mapchat_settings::load_settings_from_path(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => mapchat_settings::load_settings().context("Failed to load settings")?,
    };
    if args.debug {
        settings.messages.debug = true;
    }
    Ok(settings)
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(std::io::stdin())));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Feed one parsed line to the session.
fn apply_event(session: &ChatSession, event: BusEvent, stats: &mut ReplayStats) -> Result<()> {
    match event.event_type.as_str() {
        "chat.clear" => {
            let _ = session.dispatch(PendingEvent::clear_chat())?;
            stats.dispatched += 1;
        }
        "chat.message" => {
            let payload: MessagePayload = serde_json::from_value(event.payload)
                .context("Invalid chat.message payload")?;
            let mut pending = PendingEvent::user_message(payload.content);
            pending.timestamp = event.timestamp;
            let _ = session.dispatch(pending)?;
            stats.dispatched += 1;
        }
        _ => {
            let report = session.bus().emit(event);
            if !report.failures.is_empty() {
                warn!(failures = report.failures.len(), "listeners failed during replay");
            }
            stats.emitted += 1;
        }
    }
    Ok(())
}

/// Replay every line of `input` into `session`.
fn replay(session: &ChatSession, input: impl BufRead) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();
    for (idx, line) in input.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        stats.lines += 1;
        match serde_json::from_str::<BusEvent>(trimmed) {
            Ok(event) => apply_event(session, event, &mut stats)
                .with_context(|| format!("Line {}", idx + 1))?,
            Err(error) => {
                warn!(line = idx + 1, %error, "skipping unparseable line");
                stats.skipped += 1;
            }
        }
    }
    Ok(stats)
}

fn render_text(snapshot: &ChatSnapshot, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "Messages ({}):", snapshot.visible_messages.len())?;
    for message in &snapshot.visible_messages {
        writeln!(
            out,
            "  [{}] {}: {}",
            message.timestamp.to_rfc3339(),
            message.actor,
            message.content
        )?;
    }
    writeln!(out, "Widgets ({}):", snapshot.active_widgets.len())?;
    for widget in &snapshot.active_widgets {
        writeln!(
            out,
            "  {} ({}, {:?}) at {}",
            widget.id,
            widget.widget_type.as_str(),
            widget.priority,
            widget.timestamp.to_rfc3339()
        )?;
    }
    Ok(())
}

fn run_replay(args: &ReplayArgs) -> Result<()> {
    let settings = load_settings(args)?;
    let bus = EventBus::new();
    let session = match &args.welcome {
        Some(text) => ChatSession::with_welcome(bus, settings, text.clone()),
        None => ChatSession::new(bus, settings),
    };

    let stats = replay(&session, open_input(&args.file)?)?;
    info!(?stats, "replay finished");

    let snapshot = session.snapshot();
    let mut stdout = std::io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut stdout, &*snapshot)
            .context("Failed to write snapshot")?;
        writeln!(stdout)?;
    } else {
        render_text(&snapshot, &mut stdout)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        mapchat_core::logging::init_json_subscriber(&cli.log_level);
    } else {
        mapchat_core::logging::init_subscriber(&cli.log_level);
    }

    match &cli.command {
        Command::Replay(args) => run_replay(args),
    }
}

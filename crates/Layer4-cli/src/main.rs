//! Vibepoints CLI - Main entry point

mod audio;
mod cli;
mod tui;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Vibepoints - checkpoint timeline for vibe coding sessions
#[derive(Parser, Debug)]
#[command(name = "vpoints")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Project directory (defaults to the current directory)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Assistant executable used for message suggestions
    #[arg(long, default_value = "claude")]
    assistant_command: String,

    /// Read conversation logs from this directory instead of the
    /// project's default location
    #[arg(long)]
    conversation_dir: Option<PathBuf>,

    /// Poll instead of watching the filesystem
    #[arg(long)]
    no_watch: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the project's conversation inputs, oldest first
    History,
    /// Copy the project into a sibling `<name>-trial` directory
    Trial {
        /// Open the timeline in the trial copy afterwards
        #[arg(long)]
        open: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let log_level = if args.debug { "debug" } else { "info" };

    let workdir = match &args.path {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("Cannot read the current directory")?,
    };
    let workdir = fs::canonicalize(&workdir)
        .with_context(|| format!("{} does not exist", workdir.display()))?;

    // Handle subcommands first
    match args.command {
        Some(Command::History) => {
            init_stderr_logging(log_level);
            return cli::print_history(&workdir, args.conversation_dir).await;
        }
        Some(Command::Trial { open }) => {
            if open {
                init_file_logging(log_level);
            } else {
                init_stderr_logging(log_level);
            }
            let trial = cli::create_trial(&workdir).await?;
            if !open {
                return Ok(());
            }
            return tui::run(tui::AppConfig {
                workdir: trial,
                assistant_command: args.assistant_command,
                conversation_dir: None,
                watch: !args.no_watch,
            })
            .await;
        }
        None => {}
    }

    // The terminal belongs to the TUI; logs go to a file
    init_file_logging(log_level);
    tracing::info!("Starting in {}", workdir.display());

    tui::run(tui::AppConfig {
        workdir,
        assistant_command: args.assistant_command,
        conversation_dir: args.conversation_dir,
        watch: !args.no_watch,
    })
    .await
}

fn env_filter(level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
}

fn init_stderr_logging(level: &str) {
    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

/// Log to `<cache dir>/vibepoints/vibepoints.log`; without a usable cache
/// directory logging stays off
fn init_file_logging(level: &str) {
    let Some(path) = vibepoints_foundation::log_file_path() else {
        return;
    };
    let file = path
        .parent()
        .map(fs::create_dir_all)
        .transpose()
        .and_then(|_| File::options().create(true).append(true).open(&path));
    let Ok(file) = file else {
        return;
    };

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

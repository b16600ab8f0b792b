use crate::error::PlaysyncError;
use clap::{ArgAction, Parser, Subcommand};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Targets that are too chatty at the default level.
const QUIET_TARGETS: &[&str] = &["hyper_util=warn", "reqwest=warn"];

#[derive(Debug, Clone)]
pub enum Command {
    Sync {
        config_path: String,
        lock_path: Option<String>,
    },
    Daemon {
        config_path: String,
        lock_path: Option<String>,
        schedule: Option<String>,
        run_on_start: bool,
    },
    Check {
        config_path: String,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "playsync",
    version,
    about = "Mirror online playlists into tagged local media files using yt-dlp"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        long = "log-file",
        value_name = "FILE",
        help = "Appends log output to FILE instead of writing it to stdout",
        global = true
    )]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Sync every configured playlist once
    Sync {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "config.yaml"
        )]
        config: String,

        #[arg(
            long = "lock-file",
            value_name = "FILE",
            help = "Overrides the lock file that prevents overlapping runs"
        )]
        lock_file: Option<String>,
    },

    /// Stay in the foreground and sync on a cron schedule
    Daemon {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file, re-read before every run",
            default_value = "config.yaml"
        )]
        config: String,

        #[arg(
            long = "lock-file",
            value_name = "FILE",
            help = "Overrides the lock file that prevents overlapping runs"
        )]
        lock_file: Option<String>,

        #[arg(
            short = 's',
            long = "schedule",
            value_name = "CRON",
            help = "Overrides the cron schedule (5-field crontab or 6/7-field with seconds)"
        )]
        schedule: Option<String>,

        #[arg(long = "run-on-start", help = "Sync once immediately after starting")]
        run_on_start: bool,
    },

    /// Validate the configuration and locate the external tools
    Check {
        #[arg(
            short = 'c',
            long = "config",
            value_name = "FILE",
            help = "Sets a custom config file",
            default_value = "config.yaml"
        )]
        config: String,
    },
}

fn env_filter(log_level: Level) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();
    if log_level < Level::TRACE {
        for target in QUIET_TARGETS {
            if let Ok(directive) = target.parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

fn init_tracing(log_level: Level, log_file: Option<PathBuf>) -> Result<(), PlaysyncError> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_env_filter(env_filter(log_level));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| PlaysyncError::CliArgumentValidation {
                    details: format!("Couldn't open log file {}: {}", path.display(), e),
                })?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None => builder.init(),
    }
    Ok(())
}

pub fn parse_args() -> Result<Args, PlaysyncError> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    init_tracing(log_level, cli.log_file)?;

    let command = match cli.command {
        CliCommand::Sync { config, lock_file } => Command::Sync {
            config_path: config,
            lock_path: lock_file,
        },
        CliCommand::Daemon {
            config,
            lock_file,
            schedule,
            run_on_start,
        } => Command::Daemon {
            config_path: config,
            lock_path: lock_file,
            schedule,
            run_on_start,
        },
        CliCommand::Check { config } => Command::Check {
            config_path: config,
        },
    };

    Ok(Args { command, log_level })
}

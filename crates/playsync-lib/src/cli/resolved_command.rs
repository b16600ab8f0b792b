use crate::cli::args::Command;
use crate::cli::params::{CheckParams, DaemonParams, SyncParams};
use crate::config::load_config;
use crate::error::PlaysyncError;
use crate::schedule::SyncSchedule;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Sync(SyncParams),
    Daemon(DaemonParams),
    Check(CheckParams),
}

pub fn resolve_command(command: Command) -> Result<ResolvedCommand, PlaysyncError> {
    match command {
        Command::Sync {
            config_path,
            lock_path,
        } => {
            let app_config = load_config(&config_path)?;
            let lock_path = lock_path
                .map(PathBuf::from)
                .unwrap_or_else(|| app_config.resolved_lock_path());

            Ok(ResolvedCommand::Sync(SyncParams {
                app_config,
                lock_path,
            }))
        }
        Command::Daemon {
            config_path,
            lock_path,
            schedule,
            run_on_start,
        } => {
            let app_config = load_config(&config_path)?;

            let expression = schedule.or(app_config.schedule).ok_or_else(|| {
                PlaysyncError::CliArgumentValidation {
                    details: "No schedule provided. Configure schedule or pass --schedule."
                        .to_string(),
                }
            })?;
            let schedule = SyncSchedule::parse(&expression)?;

            Ok(ResolvedCommand::Daemon(DaemonParams {
                config_path,
                lock_path_override: lock_path.map(PathBuf::from),
                schedule,
                run_on_start,
            }))
        }
        Command::Check { config_path } => {
            let app_config = load_config(&config_path)?;
            let schedule = app_config
                .schedule
                .as_deref()
                .map(SyncSchedule::parse)
                .transpose()?;

            Ok(ResolvedCommand::Check(CheckParams {
                app_config,
                schedule,
            }))
        }
    }
}

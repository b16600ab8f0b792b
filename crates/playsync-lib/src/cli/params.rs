use crate::config::Config;
use crate::schedule::SyncSchedule;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct SyncParams {
    pub app_config: Config,
    pub lock_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct DaemonParams {
    /// Re-read before every run so edits apply without a restart.
    pub config_path: String,
    pub lock_path_override: Option<PathBuf>,
    pub schedule: SyncSchedule,
    pub run_on_start: bool,
}

#[derive(Debug, Clone)]
pub struct CheckParams {
    pub app_config: Config,
    pub schedule: Option<SyncSchedule>,
}

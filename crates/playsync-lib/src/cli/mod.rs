mod args;
mod check;
mod daemon;
mod params;
mod resolved_command;
mod sync;

pub use args::{Args, Command, parse_args};
pub use check::run_check;
pub use daemon::{run_daemon, run_daemon_until, scheduled_run};
pub use params::{CheckParams, DaemonParams, SyncParams};
pub use resolved_command::{ResolvedCommand, resolve_command};
pub use sync::{SyncSummary, run_sync, sync_all};

use crate::cli::DaemonParams;
use crate::cli::sync::{SyncSummary, sync_all};
use crate::config::load_config;
use crate::error::PlaysyncError;
use chrono::Local;
use std::future::Future;

async fn shutdown_signal() -> Result<(), PlaysyncError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result?,
            _ = terminate.recv() => {}
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

/// One scheduled run: re-reads the configuration, then syncs everything.
/// `Ok(None)` means another run held the lock.
pub async fn scheduled_run(params: &DaemonParams) -> Result<Option<SyncSummary>, PlaysyncError> {
    let app_config = load_config(&params.config_path)?;
    let lock_path = params
        .lock_path_override
        .clone()
        .unwrap_or_else(|| app_config.resolved_lock_path());

    sync_all(&app_config, &lock_path).await
}

async fn logged_run(params: &DaemonParams) {
    match scheduled_run(params).await {
        Ok(Some(summary)) if !summary.is_complete() => {
            tracing::warn!("Scheduled sync incomplete: {}", summary);
        }
        Ok(_) => {}
        Err(e @ (PlaysyncError::Config(_) | PlaysyncError::ConfigValidation { .. })) => {
            tracing::error!("Couldn't load configuration, skipping this run: {}", e);
        }
        Err(e) => tracing::error!("Scheduled sync failed: {}", e),
    }
}

/// Runs syncs on the schedule until SIGINT or SIGTERM.
pub async fn run_daemon(params: DaemonParams) -> Result<(), PlaysyncError> {
    run_daemon_until(params, shutdown_signal()).await
}

/// Runs syncs on the schedule until `shutdown` resolves. Runs never
/// overlap: the next fire time is computed once the previous run is over,
/// so slots missed by a long run are skipped.
pub async fn run_daemon_until<F>(params: DaemonParams, shutdown: F) -> Result<(), PlaysyncError>
where
    F: Future<Output = Result<(), PlaysyncError>>,
{
    tracing::info!(schedule = %params.schedule, config = %params.config_path, "Starting scheduler");

    tokio::pin!(shutdown);

    if params.run_on_start {
        tokio::select! {
            _ = logged_run(&params) => {}
            result = &mut shutdown => {
                tracing::info!("Stopping scheduler");
                return result;
            }
        }
    }

    loop {
        let now = Local::now();
        let Some(next) = params.schedule.next_after(&now) else {
            tracing::warn!(schedule = %params.schedule, "Schedule has no future runs, stopping");
            return Ok(());
        };
        let wait = (next - now).to_std().unwrap_or_default();
        tracing::info!(next = %next, "Next sync scheduled");

        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            result = &mut shutdown => {
                tracing::info!("Stopping scheduler");
                return result;
            }
        }

        tokio::select! {
            _ = logged_run(&params) => {}
            result = &mut shutdown => {
                tracing::info!("Interrupted during sync, stopping scheduler");
                return result;
            }
        }
    }
}

use crate::cli::SyncParams;
use crate::config::Config;
use crate::error::PlaysyncError;
use crate::lock::RunLock;
use crate::playlist::{PlaylistReport, SyncContext, sync_playlist};
use crate::tools::resolve_toolchain;
use std::fmt;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub playlists: usize,
    pub failed_playlists: usize,
    pub tracks: PlaylistReport,
}

impl SyncSummary {
    pub fn is_complete(&self) -> bool {
        self.failed_playlists == 0 && self.tracks.failed == 0
    }
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} playlists ({} failed); tracks: {}",
            self.playlists, self.failed_playlists, self.tracks
        )
    }
}

/// Syncs every playlist in `app_config` while holding the run lock.
/// Returns `Ok(None)` without doing anything if another run holds it.
pub async fn sync_all(
    app_config: &Config,
    lock_path: &Path,
) -> Result<Option<SyncSummary>, PlaysyncError> {
    let mut run_lock = RunLock::open(lock_path)?;
    let Some(_guard) = run_lock.try_hold()? else {
        tracing::info!(lock = %lock_path.display(), "Instance already running");
        return Ok(None);
    };

    tracing::info!("Starting");
    let tools = resolve_toolchain(&app_config.tools)?;
    let ctx = SyncContext::new(tools, app_config)?;

    let mut summary = SyncSummary::default();
    for playlist in &app_config.playlists {
        summary.playlists += 1;
        tracing::info!(
            url = %playlist.url,
            path = %playlist.path.display(),
            format = %playlist.format,
            "Syncing playlist"
        );

        match sync_playlist(playlist, &ctx).await {
            Ok(report) => {
                tracing::info!(url = %playlist.url, "Playlist synced: {}", report);
                summary.tracks += report;
            }
            Err(e) => {
                tracing::error!(url = %playlist.url, "Playlist sync failed: {}", e);
                summary.failed_playlists += 1;
            }
        }
    }

    tracing::info!("Finished: {}", summary);
    Ok(Some(summary))
}

pub async fn run_sync(params: SyncParams) -> Result<(), PlaysyncError> {
    let SyncParams {
        app_config,
        lock_path,
    } = params;

    match sync_all(&app_config, &lock_path).await? {
        Some(summary) if !summary.is_complete() => Err(PlaysyncError::SyncIncomplete {
            failed_playlists: summary.failed_playlists,
            failed_tracks: summary.tracks.failed,
        }),
        _ => Ok(()),
    }
}

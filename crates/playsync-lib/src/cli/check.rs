use crate::cli::CheckParams;
use crate::error::PlaysyncError;
use crate::tools::resolve_toolchain;
use chrono::Local;
use itertools::Itertools;

const UPCOMING_RUNS: usize = 3;

pub async fn run_check(params: CheckParams) -> Result<(), PlaysyncError> {
    let CheckParams {
        app_config,
        schedule,
    } = params;

    tracing::info!(
        playlists = app_config.playlists.len(),
        tmp_dir = %app_config.tmp_dir.display(),
        lock = %app_config.resolved_lock_path().display(),
        "Configuration is valid"
    );
    for playlist in &app_config.playlists {
        tracing::info!(
            url = %playlist.url,
            path = %playlist.path.display(),
            format = %playlist.format,
            "Playlist"
        );
    }

    let tools = resolve_toolchain(&app_config.tools)?;
    let version = tools.yt_dlp.version().await?;
    tracing::info!(path = %tools.yt_dlp.binary().display(), version = %version, "Found yt-dlp");
    match &tools.mp3gain {
        Some(mp3gain) => tracing::info!(path = %mp3gain.binary().display(), "Found mp3gain"),
        None => tracing::warn!("mp3gain disabled, audio will not be normalised"),
    }

    match schedule {
        Some(schedule) => {
            let upcoming = schedule
                .upcoming(&Local::now(), UPCOMING_RUNS)
                .iter()
                .map(|at| at.to_rfc3339())
                .join(", ");
            tracing::info!(schedule = %schedule, "Next runs: {}", upcoming);
        }
        None => tracing::info!("No schedule configured; run `playsync sync` from cron"),
    }

    Ok(())
}

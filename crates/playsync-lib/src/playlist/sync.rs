use super::local::scan_local_tracks;
use super::track::{AlbumArtist, Track};
use crate::config::{Config, MediaFormat, PlaylistDef};
use crate::error::PlaysyncError;
use crate::metadata::{fetch_thumbnail, square_cover, write_track};
use crate::tools::Toolchain;
use crate::utils::{move_file, sanitize_file_stem};
use eyre::WrapErr;
use itertools::Itertools;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a playlist sync needs beyond the playlist definition.
pub struct SyncContext {
    pub tools: Toolchain,
    pub http: reqwest::Client,
    pub tmp_dir: PathBuf,
    pub embed_thumbnails: bool,
}

impl SyncContext {
    pub fn new(tools: Toolchain, app_config: &Config) -> Result<Self, PlaysyncError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("playsync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            tools,
            http,
            tmp_dir: app_config.tmp_dir.clone(),
            embed_thumbnails: app_config.embed_thumbnails,
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaylistReport {
    pub downloaded: usize,
    pub retagged: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl fmt::Display for PlaylistReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} downloaded, {} retagged, {} unchanged, {} failed",
            self.downloaded, self.retagged, self.unchanged, self.failed
        )
    }
}

enum TrackOutcome {
    Downloaded,
    Retagged,
    Unchanged,
}

impl std::ops::AddAssign for PlaylistReport {
    fn add_assign(&mut self, other: Self) {
        self.downloaded += other.downloaded;
        self.retagged += other.retagged;
        self.unchanged += other.unchanged;
        self.failed += other.failed;
    }
}

impl PlaylistReport {
    fn record(&mut self, outcome: TrackOutcome) {
        match outcome {
            TrackOutcome::Downloaded => self.downloaded += 1,
            TrackOutcome::Retagged => self.retagged += 1,
            TrackOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, PlaysyncError>
where
    F: FnOnce() -> Result<T, PlaysyncError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .wrap_err("Blocking task failed")?
}

/// Folds the remote view into the local one and renumbers the result
/// 1..n, ordered by the previous numbering. Tracks that vanished from the
/// remote playlist are kept.
pub fn merge_tracks(local: Vec<Track>, remote: Vec<Track>) -> Vec<Track> {
    let mut by_id: HashMap<String, Track> = HashMap::new();
    for track in local {
        if let Some(previous) = by_id.insert(track.id.clone(), track) {
            tracing::warn!(id = %previous.id, "Multiple local files carry the same id");
        }
    }

    for track in remote {
        match by_id.entry(track.id.clone()) {
            Entry::Occupied(mut existing) => existing.get_mut().update_from(track),
            Entry::Vacant(slot) => {
                slot.insert(track);
            }
        }
    }

    let mut merged = by_id
        .into_values()
        .sorted_by(|a, b| a.index.cmp(&b.index).then_with(|| a.id.cmp(&b.id)))
        .collect_vec();
    for (track, position) in merged.iter_mut().zip(1u32..) {
        track.set_index(Some(position));
    }
    merged
}

/// Where a freshly downloaded track is stored. Audio files are named after
/// the title, falling back to `<title> - <id>` when taken; video files
/// always carry the id so they can be recognised without tags.
pub fn output_path(track: &Track, output_dir: &Path) -> PathBuf {
    let extension = track.format.extension();
    let stem = track
        .title
        .as_deref()
        .map(sanitize_file_stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| track.id.clone());

    match track.format {
        MediaFormat::Video => output_dir.join(format!("{stem} [{}].{extension}", track.id)),
        MediaFormat::Audio => {
            let candidate = output_dir.join(format!("{stem}.{extension}"));
            if candidate.exists() {
                output_dir.join(format!("{stem} - {}.{extension}", track.id))
            } else {
                candidate
            }
        }
    }
}

pub async fn sync_playlist(
    playlist: &PlaylistDef,
    ctx: &SyncContext,
) -> Result<PlaylistReport, PlaysyncError> {
    let url = playlist.url.trim();

    let dir = playlist.path.clone();
    let local = run_blocking(move || scan_local_tracks(&dir)).await?;

    let mut album_artist = AlbumArtist::default();
    for track in &local {
        album_artist.add(track.channel.as_deref());
    }

    let remote = ctx.tools.yt_dlp.fetch_playlist(url).await?;
    for entry in remote.entries() {
        album_artist.add(entry.artist());
    }
    let remote = remote.into_tracks(playlist.format, &album_artist);

    tracing::info!(
        url,
        local = local.len(),
        remote = remote.len(),
        "Fetched playlist state"
    );

    let mut report = PlaylistReport::default();
    for mut track in merge_tracks(local, remote) {
        match sync_track(&mut track, &playlist.path, ctx).await {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                tracing::warn!(track = %track, "Failed to sync track: {}", e);
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

async fn sync_track(
    track: &mut Track,
    output_dir: &Path,
    ctx: &SyncContext,
) -> Result<TrackOutcome, PlaysyncError> {
    let downloaded = if track.is_downloaded() {
        false
    } else {
        download_track(track, output_dir, ctx).await?;
        true
    };

    let retagged = save_metadata(track, ctx).await?;

    Ok(if downloaded {
        TrackOutcome::Downloaded
    } else if retagged {
        TrackOutcome::Retagged
    } else {
        TrackOutcome::Unchanged
    })
}

async fn download_track(
    track: &mut Track,
    output_dir: &Path,
    ctx: &SyncContext,
) -> Result<(), PlaysyncError> {
    tracing::info!(track = %track, format = %track.format, "Downloading");

    tokio::fs::create_dir_all(&ctx.tmp_dir).await?;
    let tmp_path = ctx
        .tools
        .yt_dlp
        .download(&track.id, track.format, &ctx.tmp_dir)
        .await?;

    if track.format == MediaFormat::Audio
        && let Some(mp3gain) = &ctx.tools.mp3gain
        && let Err(e) = mp3gain.normalize(&tmp_path).await
    {
        tracing::warn!(track = %track, "Gain normalisation failed: {}", e);
    }

    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| PlaysyncError::OutputPlacement {
            path: output_dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    // Tag while still in tmp_dir: a placed file without our id tag would
    // not be recognised by the next scan.
    track.mark_downloaded(tmp_path.clone());
    save_metadata(track, ctx).await?;

    let out_path = output_path(track, output_dir);
    let (from, to) = (tmp_path, out_path.clone());
    run_blocking(move || move_file(&from, &to)).await?;

    tracing::info!(track = %track, output = %out_path.display(), "Downloaded");
    track.filepath = Some(out_path);
    Ok(())
}

async fn cover_for(url: &str, ctx: &SyncContext) -> Option<Vec<u8>> {
    let bytes = match fetch_thumbnail(&ctx.http, url).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::warn!(url, "Thumbnail unavailable, saving tags without a cover");
            return None;
        }
        Err(e) => {
            tracing::warn!(url, "Couldn't fetch thumbnail: {}", e);
            return None;
        }
    };

    match run_blocking(move || square_cover(&bytes).map_err(PlaysyncError::from)).await {
        Ok(cover) => Some(cover),
        Err(e) => {
            tracing::warn!(url, "Couldn't convert thumbnail: {}", e);
            None
        }
    }
}

/// Returns whether the tag was rewritten.
async fn save_metadata(track: &mut Track, ctx: &SyncContext) -> Result<bool, PlaysyncError> {
    let changes = track.changes();
    if !changes.any() {
        return Ok(false);
    }
    // MP4 files carry no tags of ours; their identity lives in the file name.
    if track.format == MediaFormat::Video {
        track.mark_saved();
        return Ok(false);
    }
    let Some(path) = track.filepath.clone() else {
        return Ok(false);
    };

    let cover = match &track.thumbnail {
        Some(url) if ctx.embed_thumbnails && (changes.initial_save || changes.thumbnail) => {
            cover_for(url, ctx).await
        }
        _ => None,
    };

    let snapshot = track.clone();
    run_blocking(move || {
        write_track(&path, &snapshot, cover).map_err(|e| PlaysyncError::Metadata {
            path: path.clone(),
            reason: e.to_string(),
        })
    })
    .await?;

    tracing::debug!(track = %track, ?changes, "Updated tags");
    track.mark_saved();
    Ok(true)
}

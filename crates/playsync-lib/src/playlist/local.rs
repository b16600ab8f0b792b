use super::track::Track;
use crate::config::MediaFormat;
use crate::error::PlaysyncError;
use crate::metadata::read_track;
use crate::utils::id_from_bracketed_stem;
use std::path::Path;

/// Collects the tracks already present in `dir`. A missing directory is
/// simply an empty playlist.
pub fn scan_local_tracks(dir: &Path) -> Result<Vec<Track>, PlaysyncError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut tracks = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(format) = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaFormat::from_extension)
        else {
            continue;
        };

        let track = match format {
            MediaFormat::Audio => match read_track(&path) {
                Ok(track) => track,
                Err(e) => {
                    tracing::warn!(path = %path.display(), "Skipping file with unreadable tags: {}", e);
                    continue;
                }
            },
            MediaFormat::Video => video_track(&path),
        };

        match track {
            Some(track) => {
                tracing::trace!(path = %path.display(), id = %track.id, "Found local track");
                tracks.push(track);
            }
            None => {
                tracing::debug!(path = %path.display(), "Ignoring file not created by playsync");
            }
        }
    }
    Ok(tracks)
}

fn video_track(path: &Path) -> Option<Track> {
    let stem = path.file_stem()?.to_str()?;
    let (title, id) = id_from_bracketed_stem(stem)?;

    let mut track = Track::new(id, MediaFormat::Video);
    track.title = Some(title.to_string()).filter(|t| !t.is_empty());
    track.filepath = Some(path.to_path_buf());
    Some(track)
}

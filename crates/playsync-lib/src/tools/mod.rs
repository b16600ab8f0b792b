mod mp3gain;
mod process;
mod ytdlp;

pub use mp3gain::Mp3Gain;
pub use ytdlp::{YtDlp, watch_url};

use crate::config::ToolsConfig;
use crate::error::PlaysyncError;

/// External programs used during a sync, resolved to concrete paths.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub yt_dlp: YtDlp,
    pub mp3gain: Option<Mp3Gain>,
}

pub fn resolve_toolchain(tools: &ToolsConfig) -> Result<Toolchain, PlaysyncError> {
    let yt_dlp = which::which(&tools.yt_dlp).map_err(|e| PlaysyncError::ToolNotFound {
        tool: "yt-dlp".to_string(),
        reason: format!("{}: {}", tools.yt_dlp.display(), e),
    })?;
    tracing::debug!(path = %yt_dlp.display(), "Using yt-dlp");

    let mp3gain = match &tools.mp3gain {
        Some(binary) => match which::which(binary) {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Using mp3gain");
                Some(Mp3Gain::new(path))
            }
            Err(e) => {
                tracing::warn!(
                    "mp3gain not available ({}: {}), audio will not be normalised",
                    binary.display(),
                    e
                );
                None
            }
        },
        None => None,
    };

    let ffmpeg_location = match &tools.ffmpeg {
        Some(ffmpeg) if ffmpeg.is_dir() => Some(ffmpeg.clone()),
        Some(ffmpeg) => match which::which(ffmpeg) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    "Configured ffmpeg {} not found ({}), letting yt-dlp locate it",
                    ffmpeg.display(),
                    e
                );
                None
            }
        },
        None => None,
    };

    Ok(Toolchain {
        yt_dlp: YtDlp::new(yt_dlp, ffmpeg_location),
        mp3gain,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_resolve_toolchain_missing_yt_dlp() {
        let tools = ToolsConfig {
            yt_dlp: PathBuf::from("/nonexistent/playsync/yt-dlp"),
            mp3gain: None,
            ffmpeg: None,
        };

        let err = resolve_toolchain(&tools).unwrap_err();
        assert!(matches!(err, PlaysyncError::ToolNotFound { .. }));
    }
}

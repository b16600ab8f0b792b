use super::process::run_tool;
use crate::config::MediaFormat;
use crate::error::PlaysyncError;
use crate::playlist::{RemotePlaylist, parse_playlist};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

const TOOL: &str = "yt-dlp";
const WATCH_URL: &str = "https://www.youtube.com/watch";
const VIDEO_FORMAT_SELECTOR: &str = "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/bv*+ba/b";

pub fn watch_url(id: &str) -> Result<url::Url, PlaysyncError> {
    url::Url::parse_with_params(WATCH_URL, &[("v", id)]).map_err(|e| PlaysyncError::Download {
        id: id.to_string(),
        reason: format!("Couldn't build watch URL: {}", e),
    })
}

#[derive(Debug, Clone)]
pub struct YtDlp {
    binary: PathBuf,
    ffmpeg_location: Option<PathBuf>,
}

impl YtDlp {
    pub fn new(binary: PathBuf, ffmpeg_location: Option<PathBuf>) -> Self {
        Self {
            binary,
            ffmpeg_location,
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub async fn version(&self) -> Result<String, PlaysyncError> {
        let output = run_tool(TOOL, &self.binary, ["--version"]).await?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Lists the playlist without resolving individual entries.
    pub async fn fetch_playlist(&self, url: &str) -> Result<RemotePlaylist, PlaysyncError> {
        let output = run_tool(
            TOOL,
            &self.binary,
            ["--flat-playlist", "-q", "-J", "--no-warnings", url],
        )
        .await
        .map_err(|e| PlaysyncError::PlaylistFetch {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if output.stdout.iter().all(u8::is_ascii_whitespace) {
            return Err(PlaysyncError::PlaylistFetch {
                url: url.to_string(),
                reason: "yt-dlp produced no output".to_string(),
            });
        }

        parse_playlist(&output.stdout).map_err(|e| PlaysyncError::PlaylistFetch {
            url: url.to_string(),
            reason: format!("Couldn't parse playlist JSON: {}", e),
        })
    }

    pub(crate) fn download_args(
        &self,
        id: &str,
        format: MediaFormat,
        tmp_dir: &Path,
    ) -> Result<Vec<OsString>, PlaysyncError> {
        let template = tmp_dir.join(format!("{id}.%(ext)s"));

        let mut args = vec![
            OsString::from("-o"),
            template.into_os_string(),
            OsString::from("-q"),
            OsString::from("--no-warnings"),
            OsString::from("--no-playlist"),
        ];
        if let Some(ffmpeg_location) = &self.ffmpeg_location {
            args.push(OsString::from("--ffmpeg-location"));
            args.push(ffmpeg_location.clone().into_os_string());
        }
        let selector_args: &[&str] = match format {
            MediaFormat::Audio => &["-x", "--audio-format", "mp3"],
            MediaFormat::Video => &[
                "-f",
                VIDEO_FORMAT_SELECTOR,
                "--merge-output-format",
                "mp4",
                "--remux-video",
                "mp4",
            ],
        };
        args.extend(selector_args.iter().copied().map(OsString::from));
        args.push(OsString::from(watch_url(id)?.as_str()));
        Ok(args)
    }

    /// Downloads a single entry into `tmp_dir`, returning the path of the
    /// finished file (`<tmp_dir>/<id>.<ext>`).
    pub async fn download(
        &self,
        id: &str,
        format: MediaFormat,
        tmp_dir: &Path,
    ) -> Result<PathBuf, PlaysyncError> {
        let expected = tmp_dir.join(format!("{id}.{}", format.extension()));
        if expected.exists() {
            tracing::debug!(path = %expected.display(), "Removing stale temporary file");
            tokio::fs::remove_file(&expected).await?;
        }

        let args = self.download_args(id, format, tmp_dir)?;
        run_tool(TOOL, &self.binary, args)
            .await
            .map_err(|e| PlaysyncError::Download {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        if !expected.is_file() {
            return Err(PlaysyncError::Download {
                id: id.to_string(),
                reason: format!("yt-dlp finished but {} is missing", expected.display()),
            });
        }
        Ok(expected)
    }
}

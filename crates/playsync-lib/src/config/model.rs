use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    #[default]
    Audio,
    Video,
}

impl MediaFormat {
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Audio => "mp3",
            MediaFormat::Video => "mp4",
        }
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => Some(MediaFormat::Audio),
            "mp4" => Some(MediaFormat::Video),
            _ => None,
        }
    }
}

impl FromStr for MediaFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audio" => Ok(MediaFormat::Audio),
            "video" => Ok(MediaFormat::Video),
            _ => Err(format!("unknown format `{s}`, expected `audio` or `video`")),
        }
    }
}

impl<'de> Deserialize<'de> for MediaFormat {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaFormat::Audio => f.write_str("audio"),
            MediaFormat::Video => f.write_str("video"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PlaylistDef {
    pub url: String,
    pub path: PathBuf,
    #[serde(default)]
    pub format: MediaFormat,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfig {
    #[serde(default = "default_yt_dlp")]
    pub yt_dlp: PathBuf,
    /// Set to `null` to skip gain normalisation entirely.
    #[serde(default = "default_mp3gain")]
    pub mp3gain: Option<PathBuf>,
    /// Forwarded to `yt-dlp --ffmpeg-location`.
    #[serde(default)]
    pub ffmpeg: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            yt_dlp: default_yt_dlp(),
            mp3gain: default_mp3gain(),
            ffmpeg: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub playlists: Vec<Arc<PlaylistDef>>,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: PathBuf,
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub lock_path: Option<PathBuf>,
    #[serde(default = "default_embed_thumbnails")]
    pub embed_thumbnails: bool,
}

impl Config {
    pub fn resolved_lock_path(&self) -> PathBuf {
        self.lock_path
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("playsync.lock"))
    }
}

fn default_yt_dlp() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_mp3gain() -> Option<PathBuf> {
    Some(PathBuf::from("mp3gain"))
}

fn default_tmp_dir() -> PathBuf {
    std::env::temp_dir().join("playsync")
}

fn default_embed_thumbnails() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_format_ignores_case() {
        assert_eq!("AUDIO".parse::<MediaFormat>(), Ok(MediaFormat::Audio));
        assert_eq!("vIdeo".parse::<MediaFormat>(), Ok(MediaFormat::Video));
        assert_eq!(" Video ".parse::<MediaFormat>(), Ok(MediaFormat::Video));
        assert!("flac".parse::<MediaFormat>().is_err());
    }

    #[test]
    fn test_media_format_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MediaFormat::Video).unwrap(),
            "\"video\""
        );
        assert_eq!(
            serde_json::from_str::<MediaFormat>("\"VIDEO\"").unwrap(),
            MediaFormat::Video
        );
    }
}

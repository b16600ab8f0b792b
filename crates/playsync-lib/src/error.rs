use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaysyncError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {details}")]
    ConfigValidation { details: String },

    #[error("Invalid command line arguments: {details}")]
    CliArgumentValidation { details: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Required tool {tool} could not be located: {reason}")]
    ToolNotFound { tool: String, reason: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Failed to fetch playlist {url}: {reason}")]
    PlaylistFetch { url: String, reason: String },

    #[error("Failed to download {id}: {reason}")]
    Download { id: String, reason: String },

    #[error("Failed to place {path}: {reason}")]
    OutputPlacement { path: PathBuf, reason: String },

    #[error("Failed to update metadata of {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    #[error("Invalid schedule '{expression}': {reason}")]
    Schedule { expression: String, reason: String },

    #[error("Failed to lock {path}: {reason}")]
    Lock { path: PathBuf, reason: String },

    #[error("Sync incomplete: {failed_playlists} playlists and {failed_tracks} tracks failed")]
    SyncIncomplete {
        failed_playlists: usize,
        failed_tracks: usize,
    },

    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ID3 tag error: {0}")]
    Id3(#[from] id3::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Unexpected error: {0}")]
    Unexpected(#[from] eyre::Report),
}

use super::track::{AlbumArtist, Track};
use crate::config::MediaFormat;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteThumbnail {
    pub url: String,
    #[serde(default)]
    pub height: Option<u32>,
}

/// One entry of `yt-dlp --flat-playlist -J` output.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEntry {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<RemoteThumbnail>,
}

impl RemoteEntry {
    pub fn artist(&self) -> Option<&str> {
        self.channel.as_deref().or(self.uploader.as_deref())
    }

    /// The tallest thumbnail on offer.
    pub fn best_thumbnail(&self) -> Option<&str> {
        self.thumbnails
            .iter()
            .max_by_key(|thumbnail| thumbnail.height.unwrap_or(0))
            .map(|thumbnail| thumbnail.url.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemotePlaylist {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    entries: Vec<Option<RemoteEntry>>,
}

impl RemotePlaylist {
    /// Entries in playlist order; unavailable entries are skipped.
    pub fn entries(&self) -> impl Iterator<Item = &RemoteEntry> {
        self.entries.iter().flatten()
    }

    /// Builds tracks numbered from 1 in playlist order, tagged with the
    /// playlist title as album and the aggregated album artist.
    pub fn into_tracks(self, format: MediaFormat, album_artist: &AlbumArtist) -> Vec<Track> {
        let album = self.title;
        self.entries
            .into_iter()
            .flatten()
            .zip(1u32..)
            .map(|(entry, index)| {
                let mut track = Track::new(entry.id.clone(), format);
                track.thumbnail = entry.best_thumbnail().map(str::to_string);
                track.channel = entry.artist().map(str::to_string);
                track.title = entry.title;
                track.index = Some(index);
                track.album = album.clone();
                track.album_artist = album_artist.value().map(str::to_string);
                track
            })
            .collect()
    }
}

pub fn parse_playlist(json: &[u8]) -> Result<RemotePlaylist, serde_json::Error> {
    serde_json::from_slice(json)
}

use crate::config::MediaFormat;
use std::fmt;
use std::path::PathBuf;

pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// Which tag fields differ from what is stored on disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrackChanges {
    /// The file was just downloaded and carries no tags of ours yet.
    pub initial_save: bool,
    pub title: bool,
    pub channel: bool,
    pub thumbnail: bool,
    pub index: bool,
    pub album_artist: bool,
}

impl TrackChanges {
    pub fn any(&self) -> bool {
        self.initial_save
            || self.title
            || self.channel
            || self.thumbnail
            || self.index
            || self.album_artist
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: Option<String>,
    pub channel: Option<String>,
    pub thumbnail: Option<String>,
    /// 1-based position within the playlist.
    pub index: Option<u32>,
    pub album: Option<String>,
    pub album_artist: Option<String>,
    pub format: MediaFormat,
    pub filepath: Option<PathBuf>,
    changes: TrackChanges,
}

impl Track {
    pub fn new(id: impl Into<String>, format: MediaFormat) -> Self {
        Self {
            id: id.into(),
            title: None,
            channel: None,
            thumbnail: None,
            index: None,
            album: None,
            album_artist: None,
            format,
            filepath: None,
            changes: TrackChanges::default(),
        }
    }

    pub fn changes(&self) -> TrackChanges {
        self.changes
    }

    pub fn is_downloaded(&self) -> bool {
        self.filepath.is_some()
    }

    pub fn set_title(&mut self, title: Option<String>) {
        if title != self.title {
            self.title = title;
            self.changes.title = true;
        }
    }

    pub fn set_channel(&mut self, channel: Option<String>) {
        if channel != self.channel {
            self.channel = channel;
            self.changes.channel = true;
        }
    }

    pub fn set_thumbnail(&mut self, thumbnail: Option<String>) {
        if thumbnail != self.thumbnail {
            self.thumbnail = thumbnail;
            self.changes.thumbnail = true;
        }
    }

    pub fn set_index(&mut self, index: Option<u32>) {
        if index != self.index {
            self.index = index;
            self.changes.index = true;
        }
    }

    pub fn set_album_artist(&mut self, album_artist: Option<String>) {
        if album_artist != self.album_artist {
            self.album_artist = album_artist;
            self.changes.album_artist = true;
        }
    }

    /// Adopts the remote view of this track, recording every field that
    /// changes. The album is only ever written on the first save.
    pub fn update_from(&mut self, remote: Track) {
        self.set_title(remote.title);
        self.set_channel(remote.channel);
        self.set_thumbnail(remote.thumbnail);
        self.set_index(remote.index);
        self.set_album_artist(remote.album_artist);
        if self.album.is_none() {
            self.album = remote.album;
        }
    }

    pub(crate) fn mark_downloaded(&mut self, filepath: PathBuf) {
        self.filepath = Some(filepath);
        self.changes.initial_save = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.changes = TrackChanges::default();
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}",
            self.title.as_deref().unwrap_or("<untitled>"),
            self.id
        )?;
        if let Some(index) = self.index {
            write!(f, " - {}", index)?;
        }
        Ok(())
    }
}

/// Picks the album artist of a playlist: the single channel all tracks
/// share, or [`VARIOUS_ARTISTS`] as soon as two differ.
#[derive(Clone, Debug, Default)]
pub struct AlbumArtist(Option<String>);

impl AlbumArtist {
    pub fn add(&mut self, artist: Option<&str>) {
        let Some(artist) = artist else {
            return;
        };
        match &self.0 {
            None => self.0 = Some(artist.to_string()),
            Some(current) if current != artist => self.0 = Some(VARIOUS_ARTISTS.to_string()),
            Some(_) => {}
        }
    }

    pub fn value(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

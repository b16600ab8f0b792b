use crate::config::MediaFormat;
use crate::playlist::Track;
use id3::frame::{Comment, Picture, PictureType};
use id3::{Tag, TagLike, Version};
use std::path::Path;

const ID_COMMENT: &str = "youtube_id";
const THUMBNAIL_COMMENT: &str = "thumbnail_url";
const COMMENT_LANG: &str = "eng";

fn read_tag(path: &Path) -> id3::Result<Option<Tag>> {
    match Tag::read_from_path(path) {
        Ok(tag) => Ok(Some(tag)),
        Err(id3::Error {
            kind: id3::ErrorKind::NoTag,
            ..
        }) => Ok(None),
        Err(e) => Err(e),
    }
}

fn comment<'a>(tag: &'a Tag, description: &str) -> Option<&'a str> {
    tag.comments()
        .find(|c| c.description == description)
        .map(|c| c.text.as_str())
}

fn set_comment(tag: &mut Tag, description: &str, text: Option<&str>) {
    tag.remove_comment(Some(description), None);
    if let Some(text) = text {
        tag.add_frame(Comment {
            lang: COMMENT_LANG.to_string(),
            description: description.to_string(),
            text: text.to_string(),
        });
    }
}

/// Reconstructs a track from the tags of a previously synced MP3. Files
/// without our id comment are not ours and yield `None`.
pub fn read_track(path: &Path) -> id3::Result<Option<Track>> {
    let Some(tag) = read_tag(path)? else {
        return Ok(None);
    };
    let Some(id) = comment(&tag, ID_COMMENT) else {
        return Ok(None);
    };

    let mut track = Track::new(id, MediaFormat::Audio);
    track.title = tag.title().map(str::to_string);
    track.channel = tag.artist().map(str::to_string);
    track.album = tag.album().map(str::to_string);
    track.album_artist = tag.album_artist().map(str::to_string);
    track.index = tag.track();
    track.thumbnail = comment(&tag, THUMBNAIL_COMMENT).map(str::to_string);
    track.filepath = Some(path.to_path_buf());
    Ok(Some(track))
}

/// Writes every pending change of `track` into the ID3v2.3 tag at `path`.
/// `cover` replaces the front cover when present; a track without a
/// thumbnail loses its cover.
pub fn write_track(path: &Path, track: &Track, cover: Option<Vec<u8>>) -> id3::Result<()> {
    let changes = track.changes();
    let mut tag = read_tag(path)?.unwrap_or_else(Tag::new);

    if changes.initial_save {
        if let Some(album) = &track.album {
            tag.set_album(album.as_str());
        }
        set_comment(&mut tag, ID_COMMENT, Some(&track.id));
    }

    if changes.initial_save || changes.title {
        match &track.title {
            Some(title) => {
                tag.set_title(title.as_str());
            }
            None => {
                tag.remove_title();
            }
        }
    }

    if changes.initial_save || changes.channel {
        match &track.channel {
            Some(channel) => {
                tag.set_artist(channel.as_str());
            }
            None => {
                tag.remove_artist();
            }
        }
    }

    if changes.initial_save || changes.thumbnail {
        set_comment(&mut tag, THUMBNAIL_COMMENT, track.thumbnail.as_deref());
        if let Some(data) = cover {
            tag.remove_picture_by_type(PictureType::CoverFront);
            tag.add_frame(Picture {
                mime_type: "image/png".to_string(),
                picture_type: PictureType::CoverFront,
                description: String::new(),
                data,
            });
        } else if track.thumbnail.is_none() {
            tag.remove_picture_by_type(PictureType::CoverFront);
        }
    }

    if changes.initial_save || changes.index {
        match track.index {
            Some(index) => {
                tag.set_track(index);
            }
            None => {
                tag.remove_track();
            }
        }
    }

    if changes.initial_save || changes.album_artist {
        match &track.album_artist {
            Some(album_artist) => {
                tag.set_album_artist(album_artist.as_str());
            }
            None => {
                tag.remove_album_artist();
            }
        }
    }

    tag.write_to_path(path, Version::Id3v23)
}

mod local;
mod remote;
mod sync;
mod track;

pub use local::scan_local_tracks;
pub use remote::{RemoteEntry, RemotePlaylist, RemoteThumbnail, parse_playlist};
pub use sync::{PlaylistReport, SyncContext, merge_tracks, output_path, sync_playlist};
pub use track::{AlbumArtist, Track, TrackChanges, VARIOUS_ARTISTS};

mod tags;
mod thumbnail;

pub use tags::{read_track, write_track};
pub use thumbnail::{fetch_thumbnail, square_cover};

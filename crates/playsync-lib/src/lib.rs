pub mod cli;
pub mod config;
pub mod error;
pub mod lock;
pub mod metadata;
pub mod playlist;
pub mod schedule;
pub mod tools;
pub mod utils;

pub use config::Config;
pub use error::PlaysyncError;

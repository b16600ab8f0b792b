use super::process::run_tool;
use crate::error::PlaysyncError;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

const TOOL: &str = "mp3gain";

#[derive(Debug, Clone)]
pub struct Mp3Gain {
    binary: PathBuf,
}

impl Mp3Gain {
    pub fn new(binary: PathBuf) -> Self {
        Self { binary }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Applies track gain in place, ignoring clipping warnings.
    pub async fn normalize(&self, path: &Path) -> Result<(), PlaysyncError> {
        run_tool(
            TOOL,
            &self.binary,
            [OsStr::new("-r"), OsStr::new("-c"), OsStr::new("-q"), path.as_os_str()],
        )
        .await?;
        Ok(())
    }
}

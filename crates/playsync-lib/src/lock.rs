use crate::error::PlaysyncError;
use fd_lock::{RwLock, RwLockWriteGuard};
use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Advisory lock that keeps two sync runs from working on the same
/// playlists at once. The lock is tied to the open file, so a crashed run
/// never leaves a stale lock behind.
pub struct RunLock {
    path: PathBuf,
    lock: RwLock<File>,
}

impl RunLock {
    pub fn open(path: &Path) -> Result<Self, PlaysyncError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| PlaysyncError::Lock {
                path: path.to_path_buf(),
                reason: format!("couldn't create {}: {}", parent.display(), e),
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| PlaysyncError::Lock {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            lock: RwLock::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Takes the lock without waiting. `Ok(None)` means another run holds it.
    pub fn try_hold(&mut self) -> Result<Option<RwLockWriteGuard<'_, File>>, PlaysyncError> {
        match self.lock.try_write() {
            Ok(guard) => Ok(Some(guard)),
            Err(e) if e.kind() == ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(PlaysyncError::Lock {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
        }
    }
}

//! Advisory run lock on the working directory.
//!
//! Two runs sharing a working directory would overwrite each other's
//! intermediate files, so a run holds an exclusive lock on
//! `<work>/.charpak.lock` from validation until it finishes.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use crate::error::{PipelineError, PipelineResult};

/// Held for the lifetime of a run; released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Takes the lock without blocking.
    ///
    /// Fails with [`PipelineError::RunInProgress`] naming `work_dir` if another
    /// run holds it.
    pub fn acquire(path: &Path, work_dir: &Path) -> PipelineResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| PipelineError::io(path, e))?;

        if let Err(e) = file.try_lock_exclusive() {
            let contended = e.kind() == std::io::ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error();
            return Err(if contended {
                PipelineError::RunInProgress(work_dir.to_path_buf())
            } else {
                PipelineError::io(path, e)
            });
        }

        debug!("Acquired run lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        debug!("Released run lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_lock_is_refused_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".charpak.lock");

        let first = RunLock::acquire(&path, dir.path()).unwrap();
        let err = RunLock::acquire(&path, dir.path()).unwrap_err();
        assert!(matches!(err, PipelineError::RunInProgress(ref p) if p == dir.path()));

        drop(first);
        assert!(RunLock::acquire(&path, dir.path()).is_ok());
    }
}

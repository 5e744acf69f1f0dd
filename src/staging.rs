//! Revision-scoped staging paths and their lifecycle.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::model::RevisionHandle;

/// The downloaded archive and the directory it is extracted into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StagingPaths {
    pub archive_path: PathBuf,
    pub root_path: PathBuf,
}

impl StagingPaths {
    pub fn for_revision(work_dir: &Path, revision: &RevisionHandle) -> Self {
        let key = revision.staging_key();
        Self {
            archive_path: work_dir.join(format!("{}.tar.gz", key)),
            root_path: work_dir.join(key),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.root_path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.root_path.with_file_name(name)
    }

    /// Remove the extracted tree and the archive.
    ///
    /// A missing directory is fine. A missing archive is reported as `Error::Io`
    /// with `NotFound`, so a second call fails on that leg only.
    pub fn cleanup(&self) -> Result<()> {
        remove_dir_if_present(&self.root_path)?;
        fs::remove_file(&self.archive_path).map_err(|e| Error::io(&self.archive_path, e))?;
        debug!(root = %self.root_path.display(), "staging cleaned up");
        Ok(())
    }

    /// Remove the claim marker left behind by a run that exited without cleanup.
    pub fn clear_lock(&self) -> Result<()> {
        let lock = self.lock_path();
        match fs::remove_file(&lock) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(&lock, e)),
        }
    }

    /// Cleanup for failure paths: never fails, logs anything other than "already gone".
    pub fn cleanup_best_effort(&self) {
        if let Err(err) = remove_dir_if_present(&self.root_path) {
            warn!(error = %err, "failed to remove staging directory");
        }
        match fs::remove_file(&self.archive_path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                path = %self.archive_path.display(),
                error = %e,
                "failed to remove staged archive"
            ),
        }
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Exclusive claim on the staging paths of one revision.
///
/// Holding a `StagingArea` means no other run in the same work directory is
/// using these paths. Dropping it without calling [`StagingArea::cleanup`]
/// removes whatever was staged, best-effort.
#[derive(Debug)]
pub struct StagingArea {
    revision: RevisionHandle,
    paths: StagingPaths,
    lock: PathBuf,
    released: bool,
}

impl StagingArea {
    pub fn acquire(work_dir: &Path, revision: &RevisionHandle) -> Result<Self> {
        fs::create_dir_all(work_dir).map_err(|e| Error::io(work_dir, e))?;

        let paths = StagingPaths::for_revision(work_dir, revision);
        let lock = paths.lock_path();
        let mut f = match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(Error::StagingBusy {
                    revision: revision.to_string(),
                    lock,
                });
            }
            Err(e) => return Err(Error::io(&lock, e)),
        };
        // Drop releases the lock if anything below fails.
        let area = Self {
            revision: revision.clone(),
            paths,
            lock,
            released: false,
        };
        writeln!(f, "{}", std::process::id()).map_err(|e| Error::io(&area.lock, e))?;

        // Leftovers from a run that died before cleanup.
        remove_dir_if_present(&area.paths.root_path)?;

        debug!(revision = %revision, root = %area.paths.root_path.display(), "staging acquired");
        Ok(area)
    }

    pub fn revision(&self) -> &RevisionHandle {
        &self.revision
    }

    pub fn paths(&self) -> &StagingPaths {
        &self.paths
    }

    /// Remove the staged artifacts and release the claim.
    pub fn cleanup(mut self) -> Result<()> {
        self.released = true;
        let res = self.paths.cleanup();
        self.release_lock();
        res
    }

    /// Release the claim but leave the staged files on disk.
    pub fn persist(mut self) -> StagingPaths {
        self.released = true;
        self.release_lock();
        self.paths.clone()
    }

    fn release_lock(&self) {
        match fs::remove_file(&self.lock) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.lock.display(), error = %e, "failed to remove staging lock"),
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        debug!(revision = %self.revision, "releasing staging area on drop");
        self.paths.cleanup_best_effort();
        self.release_lock();
    }
}

#[cfg(test)]
#[path = "tests/staging_tests.rs"]
mod tests;

//! The fetch → extract → materialize pipeline with scoped staging cleanup.

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::extract::extract_archive;
use crate::materialize::{MaterializeOptions, build_tree_with};
use crate::model::{DirectoryNode, RevisionHandle, SourceConfig};
use crate::remote::{ArchiveClient, CancelFlag};
use crate::staging::{StagingArea, StagingPaths};

/// A loaded tree together with the staging area it was read from.
///
/// The tree holds copies of all contents; the staged files are only kept so
/// they can be removed by [`Materialized::cleanup`]. Dropping this value also
/// removes them, best-effort.
#[derive(Debug)]
pub struct Materialized {
    pub tree: DirectoryNode,
    staging: StagingArea,
}

impl Materialized {
    pub fn revision(&self) -> &RevisionHandle {
        self.staging.revision()
    }

    pub fn paths(&self) -> &StagingPaths {
        self.staging.paths()
    }

    pub fn cleanup(self) -> Result<()> {
        self.staging.cleanup()
    }

    /// Keep the staged files on disk and return their location.
    pub fn persist(self) -> (DirectoryNode, StagingPaths) {
        let Materialized { tree, staging } = self;
        (tree, staging.persist())
    }

    /// Clean up the staging area and hand back the tree.
    pub fn into_tree(self) -> Result<DirectoryNode> {
        let Materialized { tree, staging } = self;
        staging.cleanup()?;
        Ok(tree)
    }
}

pub struct TreeFetcher {
    cfg: SourceConfig,
    client: ArchiveClient,
    cancel: CancelFlag,
}

impl TreeFetcher {
    pub fn new(cfg: SourceConfig) -> Result<Self> {
        let client = ArchiveClient::new(&cfg)?;
        Ok(Self {
            cfg,
            client,
            cancel: CancelFlag::new(),
        })
    }

    pub fn config(&self) -> &SourceConfig {
        &self.cfg
    }

    pub fn client(&self) -> &ArchiveClient {
        &self.client
    }

    /// Flag that aborts in-flight and future runs of this fetcher when set.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub fn staging_paths(&self, revision: &RevisionHandle) -> StagingPaths {
        StagingPaths::for_revision(&self.cfg.work_dir, revision)
    }

    fn options(&self) -> MaterializeOptions {
        MaterializeOptions {
            max_depth: self.cfg.max_depth,
            parallel: self.cfg.parallel,
        }
    }

    /// Download, extract and load `revision`.
    ///
    /// On failure nothing usable is returned and whatever was staged is removed.
    pub fn materialize(&self, revision: &RevisionHandle) -> Result<Materialized> {
        let staging = StagingArea::acquire(&self.cfg.work_dir, revision)?;
        let res = run(&staging, &self.cancel, self.options(), |paths| {
            self.client
                .download_archive(revision, &paths.archive_path, &self.cancel)
                .map(|_| ())
        });
        finish(staging, res)
    }

    /// Same as [`TreeFetcher::materialize`] but starting from an archive already on disk.
    pub fn materialize_archive(
        &self,
        archive: &Path,
        revision: &RevisionHandle,
    ) -> Result<Materialized> {
        materialize_archive(&self.cfg.work_dir, archive, revision, self.options())
    }

    /// Materialize `revision`, hand the tree to `consume`, then clean up.
    ///
    /// Cleanup runs whatever `consume` returns. A cleanup failure after a
    /// successful load is logged and does not replace the consumer's result.
    pub fn with_tree<T>(
        &self,
        revision: &RevisionHandle,
        consume: impl FnOnce(&DirectoryNode) -> T,
    ) -> Result<T> {
        let loaded = self.materialize(revision)?;
        let out = consume(&loaded.tree);
        if let Err(err) = loaded.cleanup() {
            warn!(revision = %revision, error = %err, "staging cleanup failed");
        }
        Ok(out)
    }
}

/// Load a tree from an archive already on disk, staged under `work_dir`.
///
/// The archive is copied into the staging area; the original is left alone.
pub fn materialize_archive(
    work_dir: &Path,
    archive: &Path,
    revision: &RevisionHandle,
    opts: MaterializeOptions,
) -> Result<Materialized> {
    let staging = StagingArea::acquire(work_dir, revision)?;
    let res = run(&staging, &CancelFlag::new(), opts, |paths| {
        fs::copy(archive, &paths.archive_path)
            .map(|_| ())
            .map_err(|e| Error::io(archive, e))
    });
    finish(staging, res)
}

fn run(
    staging: &StagingArea,
    cancel: &CancelFlag,
    opts: MaterializeOptions,
    acquire_archive: impl FnOnce(&StagingPaths) -> Result<()>,
) -> Result<DirectoryNode> {
    let revision = staging.revision();
    let paths = staging.paths();

    cancel.check(revision)?;
    acquire_archive(paths)?;

    cancel.check(revision)?;
    extract_archive(&paths.archive_path, &paths.root_path)?;

    cancel.check(revision)?;
    build_tree_with(&paths.root_path, opts)
}

fn finish(staging: StagingArea, res: Result<DirectoryNode>) -> Result<Materialized> {
    match res {
        Ok(tree) => {
            let stats = tree.stats();
            info!(
                revision = %staging.revision(),
                files = stats.files,
                dirs = stats.dirs,
                bytes = stats.bytes,
                "revision materialized"
            );
            Ok(Materialized { tree, staging })
        }
        Err(err) => {
            warn!(revision = %staging.revision(), error = %err, "materialization failed, discarding staging area");
            drop(staging);
            Err(err)
        }
    }
}

#[cfg(test)]
#[path = "tests/processor_tests.rs"]
mod tests;

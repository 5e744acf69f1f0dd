//! Fetch a repository snapshot as a tar.gz archive, extract it into a
//! revision-scoped staging area, and load it as an in-memory tree of
//! directories and text files.

pub mod error;
pub mod extract;
pub mod materialize;
pub mod model;
pub mod pack;
pub mod processor;
pub mod remote;
pub mod staging;

pub use self::error::{Error, Result};
pub use self::model::{DirectoryNode, FileNode, RevisionHandle, SourceConfig, TreeStats};
pub use self::processor::{Materialized, TreeFetcher};
pub use self::remote::{ArchiveClient, CancelFlag};
pub use self::staging::{StagingArea, StagingPaths};

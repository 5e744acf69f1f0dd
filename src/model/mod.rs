mod config;
mod ids;
mod tree;

pub use self::config::SourceConfig;
pub use self::ids::RevisionHandle;
pub use self::tree::{DirectoryNode, FileNode, TreeStats, child_path};

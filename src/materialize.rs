//! Conversion of an extracted directory into a [`DirectoryNode`] tree.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{DirectoryNode, FileNode, child_path};

mod common;

use self::common::read_dir_sorted;

#[derive(Clone, Copy, Debug)]
pub struct MaterializeOptions {
    /// Deepest directory level accepted below the root (the root is depth 0).
    pub max_depth: usize,
    /// Walk sibling subdirectories on the rayon pool.
    pub parallel: bool,
}

impl Default for MaterializeOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            parallel: false,
        }
    }
}

/// Load the tree under `root` with default options.
pub fn build_tree(root: &Path) -> Result<DirectoryNode> {
    build_tree_with(root, MaterializeOptions::default())
}

/// Load every directory and text file under `root`.
///
/// The returned root has an empty name and path; all descendant paths are
/// slash-separated and relative to `root`. Children are ordered by file name
/// bytes at every level. File contents must be UTF-8, otherwise the whole call
/// fails with `Error::Decode`. Links and special files fail with
/// `Error::UnsafePath`.
pub fn build_tree_with(root: &Path, opts: MaterializeOptions) -> Result<DirectoryNode> {
    let tree = process_dir(root, String::new(), String::new(), 0, opts)?;
    debug!(root = %root.display(), files = tree.stats().files, "tree materialized");
    Ok(tree)
}

fn process_dir(
    dir: &Path,
    name: String,
    rel: String,
    depth: usize,
    opts: MaterializeOptions,
) -> Result<DirectoryNode> {
    if depth > opts.max_depth {
        return Err(Error::DepthLimit {
            path: rel,
            max_depth: opts.max_depth,
        });
    }

    let mut subdirs: Vec<(PathBuf, String, String)> = Vec::new();
    let mut files = Vec::new();

    for child in read_dir_sorted(dir)? {
        let path = child.path();
        let child_name = child.file_name().into_string().map_err(|raw| Error::Decode {
            path: child_path(&rel, &raw.to_string_lossy()),
        })?;
        let child_rel = child_path(&rel, &child_name);
        let file_type = child.file_type().map_err(|e| Error::io(&path, e))?;

        if file_type.is_dir() {
            subdirs.push((path, child_name, child_rel));
        } else if file_type.is_file() {
            files.push(process_file(&path, child_name, child_rel)?);
        } else if file_type.is_symlink() {
            return Err(Error::UnsafePath {
                path: child_rel,
                reason: "symbolic link in staging tree",
            });
        } else {
            return Err(Error::UnsafePath {
                path: child_rel,
                reason: "special file in staging tree",
            });
        }
    }

    let directories = if opts.parallel && subdirs.len() > 1 {
        subdirs
            .into_par_iter()
            .map(|(path, name, rel)| process_dir(&path, name, rel, depth + 1, opts))
            .collect::<Result<Vec<_>>>()?
    } else {
        subdirs
            .into_iter()
            .map(|(path, name, rel)| process_dir(&path, name, rel, depth + 1, opts))
            .collect::<Result<Vec<_>>>()?
    };

    Ok(DirectoryNode {
        name,
        path: rel,
        directories,
        files,
    })
}

fn process_file(path: &Path, name: String, rel: String) -> Result<FileNode> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let content = String::from_utf8(bytes).map_err(|_| Error::Decode { path: rel.clone() })?;
    Ok(FileNode {
        name,
        path: rel,
        content,
    })
}

#[cfg(test)]
#[path = "tests/materialize_tests.rs"]
mod tests;

//! Extraction of a wrapper-rooted tar.gz archive into a staging directory.
//!
//! Repository archives put everything under one synthetic top-level directory
//! (`<project>-<revision>/`). That directory is taken from the first entry and
//! replaced by the staging root, so the root directly holds the repository's
//! top-level children.

use std::ffi::OsString;
use std::fs;
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::TreeStats;

/// Extract `archive_path` into `root_path`, stripping the wrapper directory.
///
/// Only directories and regular files are written. Any entry whose path is absolute
/// or climbs with `..`, and any link or special file, fails the whole extraction
/// with `Error::UnsafePath` before anything is written for it.
pub fn extract_archive(archive_path: &Path, root_path: &Path) -> Result<TreeStats> {
    let file = fs::File::open(archive_path)
        .map_err(|e| Error::extraction_io(archive_path, "open archive", e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(file)));
    archive.set_preserve_permissions(false);
    archive.set_unpack_xattrs(false);
    archive.set_overwrite(true);

    fs::create_dir_all(root_path)
        .map_err(|e| Error::extraction_io(root_path, "create staging root", e))?;

    let entries = archive
        .entries()
        .map_err(|e| Error::extraction_io(archive_path, "read archive entries", e))?;

    let mut wrapper: Option<OsString> = None;
    let mut stats = TreeStats::default();

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::extraction_io(archive_path, "read archive entry", e))?;
        let kind = entry.header().entry_type();
        if is_metadata_entry(kind) {
            continue;
        }

        let raw = entry
            .path()
            .map_err(|e| Error::extraction_io(archive_path, "read entry path", e))?
            .into_owned();
        let parts = safe_components(&raw)?;
        if parts.is_empty() {
            continue;
        }

        if wrapper.is_none() && parts.len() == 1 && !kind.is_dir() {
            return Err(Error::extraction(
                archive_path,
                format!(
                    "first entry {} is not inside a top-level directory",
                    raw.display()
                ),
            ));
        }
        let wrapper: &OsString = wrapper.get_or_insert_with(|| parts[0].clone());
        if parts[0] != *wrapper {
            return Err(Error::extraction(
                archive_path,
                format!(
                    "entry {} is outside the archive root {}",
                    raw.display(),
                    Path::new(wrapper).display()
                ),
            ));
        }

        let dest = rewrite_destination(root_path, &parts[1..]);
        if !dest.starts_with(root_path) {
            return Err(Error::UnsafePath {
                path: raw.display().to_string(),
                reason: "resolves outside the staging root",
            });
        }

        if kind.is_dir() {
            fs::create_dir_all(&dest)
                .map_err(|e| Error::extraction_io(&dest, "create directory", e))?;
            if dest != root_path {
                stats.dirs += 1;
            }
        } else if kind.is_file() || kind == tar::EntryType::Continuous {
            if parts.len() == 1 {
                return Err(Error::extraction(
                    archive_path,
                    format!("archive root {} is not a directory", raw.display()),
                ));
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::extraction_io(parent, "create parent directory", e))?;
            }
            entry
                .unpack(&dest)
                .map_err(|e| Error::extraction_io(&dest, "write file", e))?;
            stats.files += 1;
            stats.bytes += entry.header().size().unwrap_or(0);
        } else if kind.is_symlink() || kind.is_hard_link() {
            return Err(Error::UnsafePath {
                path: raw.display().to_string(),
                reason: "links are not extracted",
            });
        } else {
            return Err(Error::UnsafePath {
                path: raw.display().to_string(),
                reason: "special files are not extracted",
            });
        }
    }

    debug!(
        root = %root_path.display(),
        files = stats.files,
        dirs = stats.dirs,
        "archive extracted"
    );
    Ok(stats)
}

/// Pax and GNU bookkeeping records carry no content of their own.
fn is_metadata_entry(kind: tar::EntryType) -> bool {
    matches!(
        kind,
        tar::EntryType::XGlobalHeader
            | tar::EntryType::XHeader
            | tar::EntryType::GNULongName
            | tar::EntryType::GNULongLink
    )
}

/// Normal components of an entry path. Rooted paths and `..` are rejected.
fn safe_components(path: &Path) -> Result<Vec<OsString>> {
    let mut out = Vec::new();
    for c in path.components() {
        match c {
            Component::Normal(part) => out.push(part.to_os_string()),
            Component::CurDir => {}
            Component::ParentDir => {
                return Err(Error::UnsafePath {
                    path: path.display().to_string(),
                    reason: "contains '..'",
                });
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::UnsafePath {
                    path: path.display().to_string(),
                    reason: "absolute paths are not allowed",
                });
            }
        }
    }
    Ok(out)
}

fn rewrite_destination(root_path: &Path, rest: &[OsString]) -> PathBuf {
    let mut dest = root_path.to_path_buf();
    for part in rest {
        dest.push(part);
    }
    dest
}

#[cfg(test)]
#[path = "tests/extract_tests.rs"]
mod tests;

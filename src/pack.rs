//! Building repository-style archives: a gzip-compressed tar with every entry
//! under one top-level wrapper directory.

use std::fs;
use std::io::Write;
use std::path::Path;

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};

/// Archive the contents of `src` under `wrapper/` into `writer`.
///
/// Symbolic links are stored as links, not followed. Headers are written in
/// deterministic mode so the same tree always yields the same bytes.
pub fn pack_dir<W: Write>(src: &Path, wrapper: &str, writer: W) -> Result<W> {
    let mut builder = tar::Builder::new(GzEncoder::new(writer, Compression::default()));
    builder.mode(tar::HeaderMode::Deterministic);
    builder.follow_symlinks(false);
    builder
        .append_dir_all(wrapper, src)
        .map_err(|e| Error::io(src, e))?;
    let encoder = builder.into_inner().map_err(|e| Error::io(src, e))?;
    encoder.finish().map_err(|e| Error::io(src, e))
}

pub fn pack_dir_to_vec(src: &Path, wrapper: &str) -> Result<Vec<u8>> {
    pack_dir(src, wrapper, Vec::new())
}

pub fn pack_dir_to_file(src: &Path, wrapper: &str, dest: &Path) -> Result<()> {
    let f = fs::File::create(dest).map_err(|e| Error::io(dest, e))?;
    let f = pack_dir(src, wrapper, f)?;
    f.sync_all().map_err(|e| Error::io(dest, e))
}

#[cfg(test)]
#[path = "tests/pack_tests.rs"]
mod tests;

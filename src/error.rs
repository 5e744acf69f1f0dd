use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Network failure or non-success response while downloading an archive.
    #[error("fetch archive for revision {revision}: {message}{}", status_suffix(.status))]
    Fetch {
        revision: String,
        status: Option<u16>,
        message: String,
    },

    /// An archive entry that would land outside the staging root, or an entry kind
    /// that could redirect writes (links, devices).
    #[error("unsafe archive path {path}: {reason}")]
    UnsafePath { path: String, reason: &'static str },

    #[error("extract {}: {message}", .path.display())]
    Extraction {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("io error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file is not valid utf-8 text: {path}")]
    Decode { path: String },

    #[error("directory nesting deeper than {max_depth} levels at {path}")]
    DepthLimit { path: String, max_depth: usize },

    #[error("invalid revision handle: {0}")]
    InvalidRevision(String),

    /// Another run currently owns the staging area for this revision.
    #[error("staging area for revision {revision} is in use ({})", .lock.display())]
    StagingBusy { revision: String, lock: PathBuf },

    #[error("operation cancelled for revision {revision}")]
    Cancelled { revision: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" (status {})", code),
        None => String::new(),
    }
}

impl Error {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Error::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn extraction(path: &Path, message: impl Into<String>) -> Self {
        Error::Extraction {
            path: path.to_path_buf(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn extraction_io(
        path: &Path,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::Extraction {
            path: path.to_path_buf(),
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn fetch(revision: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Fetch {
            revision: revision.to_string(),
            status,
            message: message.into(),
        }
    }

    /// HTTP status attached to a fetch failure, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Fetch { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Error::Fetch { status, .. } => *status == Some(404),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "tests/error_tests.rs"]
mod tests;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Longest readable prefix kept from a revision when naming staging paths.
const KEY_PREFIX_MAX: usize = 48;
/// Hex characters of the blake3 digest appended to every staging key.
const KEY_HASH_LEN: usize = 32;

/// Branch, tag or commit selecting which repository snapshot to fetch.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RevisionHandle(String);

impl RevisionHandle {
    pub fn new(revision: impl Into<String>) -> Result<Self> {
        let revision = revision.into();
        if revision.trim().is_empty() {
            return Err(Error::InvalidRevision("revision must not be empty".to_string()));
        }
        if revision.chars().any(char::is_control) {
            return Err(Error::InvalidRevision(format!(
                "revision contains control characters: {:?}",
                revision
            )));
        }
        Ok(Self(revision))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-name-safe key unique to this revision.
    ///
    /// The readable prefix keeps ASCII alphanumerics, `-`, `_` and `.` and maps
    /// everything else to `_`, so `feature/x` and `feature_x` share a prefix. The
    /// blake3 suffix is computed over the untouched revision and keeps them apart.
    pub fn staging_key(&self) -> String {
        let mut prefix: String = self
            .0
            .chars()
            .take(KEY_PREFIX_MAX)
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if prefix.starts_with('.') {
            prefix.replace_range(..1, "_");
        }

        let digest = blake3::hash(self.0.as_bytes()).to_hex();
        format!("{}-{}", prefix, &digest.as_str()[..KEY_HASH_LEN])
    }
}

impl fmt::Display for RevisionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RevisionHandle {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RevisionHandle> for String {
    fn from(value: RevisionHandle) -> Self {
        value.0
    }
}

impl std::str::FromStr for RevisionHandle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

#[cfg(test)]
#[path = "../tests/model/ids_tests.rs"]
mod tests;

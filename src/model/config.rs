use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Where archives come from and how the local staging area behaves.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the API host, e.g. `https://gitlab.example.com`.
    pub api_host: String,

    /// Numeric id or URL-path of the project. Numbers in config files are accepted.
    #[serde(deserialize_with = "string_or_number")]
    pub project_id: String,

    // Never written back out; supply via config or TREEFETCH_TOKEN.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Whole-request deadline for the archive download.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Attempts for transient fetch failures (connect errors, timeouts, 5xx).
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Materialize sibling subdirectories on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("./treefetch-staging")
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_retries() -> u32 {
    3
}

fn default_max_depth() -> usize {
    256
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

impl SourceConfig {
    pub fn new(api_host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            project_id: project_id.into(),
            token: None,
            work_dir: default_work_dir(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            max_depth: default_max_depth(),
            parallel: false,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        let cfg: SourceConfig = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Config(format!("parse {}: {}", path.display(), e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_host)
            .map_err(|e| Error::Config(format!("api_host {:?}: {}", self.api_host, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "api_host must be an http(s) URL, got {:?}",
                self.api_host
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(Error::Config("project_id must not be empty".to_string()));
        }
        if self.retries == 0 {
            return Err(Error::Config("retries must be at least 1".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".to_string()));
        }
        if self.max_depth == 0 {
            return Err(Error::Config("max_depth must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }
}

#[cfg(test)]
#[path = "../tests/model/config_tests.rs"]
mod tests;

//! Archive download from the repository API host.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::{RevisionHandle, SourceConfig};

mod fetch;
mod http_client;

/// Shared flag used to abort an in-flight run.
///
/// Cloning shares the flag. Checked between streamed chunks and between
/// pipeline steps.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self, revision: &RevisionHandle) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled {
                revision: revision.to_string(),
            });
        }
        Ok(())
    }
}

pub struct ArchiveClient {
    api_host: reqwest::Url,
    project_id: String,
    token: Option<String>,
    retries: u32,
    client: reqwest::blocking::Client,
}

impl ArchiveClient {
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        cfg.validate()?;
        let api_host = reqwest::Url::parse(&cfg.api_host)
            .map_err(|e| Error::Config(format!("api_host {:?}: {}", cfg.api_host, e)))?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("treefetch/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30).min(cfg.timeout()))
            .timeout(cfg.timeout())
            .build()
            .map_err(|e| Error::Config(format!("build http client: {}", e)))?;
        Ok(Self {
            api_host,
            project_id: cfg.project_id.clone(),
            token: cfg.token.clone(),
            retries: cfg.retries,
            client,
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }
}

#[cfg(test)]
#[path = "tests/remote_tests.rs"]
mod tests;

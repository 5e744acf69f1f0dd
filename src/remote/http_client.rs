use tracing::warn;

use super::*;

/// Outcome of one request attempt that did not succeed.
pub(super) enum AttemptError {
    /// Worth trying again: connect failures, timeouts, interrupted bodies, 5xx.
    Transient(Error),
    Fatal(Error),
}

impl AttemptError {
    fn into_inner(self) -> Error {
        match self {
            AttemptError::Transient(e) | AttemptError::Fatal(e) => e,
        }
    }
}

pub(super) fn with_retries<T>(
    attempts: u32,
    revision: &RevisionHandle,
    cancel: &CancelFlag,
    mut f: impl FnMut() -> std::result::Result<T, AttemptError>,
) -> Result<T> {
    let attempts = attempts.max(1);
    let mut i = 0;
    loop {
        cancel.check(revision)?;
        match f() {
            Ok(v) => return Ok(v),
            Err(AttemptError::Transient(err)) if i + 1 < attempts => {
                warn!(revision = %revision, attempt = i + 1, error = %err, "archive fetch failed, retrying");
                std::thread::sleep(Duration::from_millis(200 * (1 << i.min(6))));
                i += 1;
            }
            Err(err) => return Err(err.into_inner()),
        }
    }
}

pub(super) fn classify_send_error(revision: &RevisionHandle, err: reqwest::Error) -> AttemptError {
    let status = err.status().map(|s| s.as_u16());
    let transient = err.is_timeout() || err.is_connect() || err.is_request() || err.is_body();
    let err = Error::fetch(revision.as_str(), status, format!("send request: {}", err));
    if transient {
        AttemptError::Transient(err)
    } else {
        AttemptError::Fatal(err)
    }
}

impl ArchiveClient {
    pub(super) fn ensure_ok(
        &self,
        resp: reqwest::blocking::Response,
        revision: &RevisionHandle,
    ) -> std::result::Result<reqwest::blocking::Response, AttemptError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let code = Some(status.as_u16());
        let message = if status == reqwest::StatusCode::UNAUTHORIZED {
            "unauthorized (token missing, invalid or expired)".to_string()
        } else if status == reqwest::StatusCode::FORBIDDEN {
            "forbidden (token lacks read access to the repository)".to_string()
        } else if status == reqwest::StatusCode::NOT_FOUND {
            format!(
                "project {} or revision {} not found",
                self.project_id, revision
            )
        } else {
            format!("unexpected status {}", status)
        };

        let err = Error::fetch(revision.as_str(), code, message);
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(AttemptError::Transient(err))
        } else {
            Err(AttemptError::Fatal(err))
        }
    }

    pub(super) fn auth(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }

    /// `{api_host}/api/v4/projects/{project_id}/repository/archive.tar.gz?sha={revision}`
    pub fn archive_url(&self, revision: &RevisionHandle) -> Result<reqwest::Url> {
        let mut url = self.api_host.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("api_host {} cannot be a base URL", self.api_host)))?
            .pop_if_empty()
            .extend([
                "api",
                "v4",
                "projects",
                self.project_id.as_str(),
                "repository",
                "archive.tar.gz",
            ]);
        url.query_pairs_mut().append_pair("sha", revision.as_str());
        Ok(url)
    }
}

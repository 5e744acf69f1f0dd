//! Streaming archive download into the staging area.

use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::http_client::{AttemptError, classify_send_error, with_retries};
use super::*;

const CHUNK_SIZE: usize = 64 * 1024;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

impl ArchiveClient {
    /// Download the archive for `revision` to `dest`.
    ///
    /// The body is streamed into a uniquely named sibling of `dest` and renamed into
    /// place only once complete, so `dest` either holds a full archive or does not
    /// exist. Returns the number of bytes written.
    pub fn download_archive(
        &self,
        revision: &RevisionHandle,
        dest: &Path,
        cancel: &CancelFlag,
    ) -> Result<u64> {
        let url = self.archive_url(revision)?;
        info!(revision = %revision, project = %self.project_id, "fetching archive");

        let written = with_retries(self.retries, revision, cancel, || {
            let tmp = partial_path(dest).map_err(AttemptError::Fatal)?;
            let res = self.download_once(&url, revision, &tmp, cancel);
            match res {
                Ok(n) => match fs::rename(&tmp, dest) {
                    Ok(()) => Ok(n),
                    Err(e) => {
                        let _ = fs::remove_file(&tmp);
                        Err(AttemptError::Fatal(Error::io(dest, e)))
                    }
                },
                Err(err) => {
                    let _ = fs::remove_file(&tmp);
                    Err(err)
                }
            }
        })?;

        debug!(revision = %revision, bytes = written, path = %dest.display(), "archive downloaded");
        Ok(written)
    }

    fn download_once(
        &self,
        url: &reqwest::Url,
        revision: &RevisionHandle,
        tmp: &Path,
        cancel: &CancelFlag,
    ) -> std::result::Result<u64, AttemptError> {
        let mut req = self.client.get(url.clone());
        if let Some(auth) = self.auth() {
            req = req.header(reqwest::header::AUTHORIZATION, auth);
        }
        let resp = req.send().map_err(|e| classify_send_error(revision, e))?;
        let mut resp = self.ensure_ok(resp, revision)?;
        let status = Some(resp.status().as_u16());

        if let Some(parent) = tmp.parent() {
            fs::create_dir_all(parent).map_err(|e| AttemptError::Fatal(Error::io(parent, e)))?;
        }
        let f = fs::File::create(tmp).map_err(|e| AttemptError::Fatal(Error::io(tmp, e)))?;
        let mut w = BufWriter::new(f);

        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut head: Vec<u8> = Vec::with_capacity(GZIP_MAGIC.len());
        let mut written: u64 = 0;
        loop {
            if cancel.is_cancelled() {
                // Dropping the response closes the connection.
                return Err(AttemptError::Fatal(Error::Cancelled {
                    revision: revision.to_string(),
                }));
            }
            let n = match resp.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(AttemptError::Transient(Error::fetch(
                        revision.as_str(),
                        status,
                        format!("read response body: {}", e),
                    )));
                }
            };
            if head.len() < GZIP_MAGIC.len() {
                let take = (GZIP_MAGIC.len() - head.len()).min(n);
                head.extend_from_slice(&buf[..take]);
                if !GZIP_MAGIC.starts_with(&head) {
                    return Err(AttemptError::Fatal(Error::fetch(
                        revision.as_str(),
                        status,
                        "response body is not gzip data",
                    )));
                }
            }
            w.write_all(&buf[..n])
                .map_err(|e| AttemptError::Fatal(Error::io(tmp, e)))?;
            written += n as u64;
        }

        if written < GZIP_MAGIC.len() as u64 {
            return Err(AttemptError::Fatal(Error::fetch(
                revision.as_str(),
                status,
                "response body is empty or truncated",
            )));
        }

        let f = w
            .into_inner()
            .map_err(|e| AttemptError::Fatal(Error::io(tmp, e.into_error())))?;
        f.sync_all()
            .map_err(|e| AttemptError::Fatal(Error::io(tmp, e)))?;
        Ok(written)
    }
}

/// `<dest>.partial.<random>` next to `dest`.
fn partial_path(dest: &Path) -> Result<PathBuf> {
    let mut bytes = [0u8; 8];
    getrandom::getrandom(&mut bytes)
        .map_err(|e| Error::io(dest, std::io::Error::other(format!("getrandom: {:?}", e))))?;
    let mut suffix = String::with_capacity(16);
    for b in &bytes {
        suffix.push_str(&format!("{:02x}", b));
    }

    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".partial.{}", suffix));
    Ok(dest.with_file_name(name))
}

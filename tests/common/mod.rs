use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

pub const PROJECT: &str = "demo";

pub struct ServerGuard {
    pub base_url: String,
    pub data_dir: tempfile::TempDir,
    child: Child,
}

impl Drop for ServerGuard {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[derive(Default)]
pub struct ServerOptions {
    pub token: Option<String>,
    pub fail_first: u32,
}

pub fn spawn_server(opts: ServerOptions) -> Result<ServerGuard> {
    let data_dir = tempfile::tempdir().context("create server tempdir")?;
    let addr_file = data_dir.path().join("addr.txt");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_treefetch-archive-server"));
    cmd.arg("--addr")
        .arg("127.0.0.1:0")
        .arg("--addr-file")
        .arg(&addr_file)
        .arg("--data-dir")
        .arg(data_dir.path())
        .arg("--fail-first")
        .arg(opts.fail_first.to_string());
    if let Some(token) = &opts.token {
        cmd.arg("--token").arg(token);
    }
    let child = cmd
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("spawn treefetch-archive-server")?;

    let mut guard = ServerGuard {
        base_url: String::new(),
        data_dir,
        child,
    };
    guard.base_url = read_addr_file(&addr_file)?;
    wait_for_healthz(&guard.base_url)?;
    Ok(guard)
}

impl ServerGuard {
    /// Lay out a revision's files under `<data>/<project>/<sha>/`.
    pub fn seed(&self, sha: &str, files: &[(&str, &str)]) -> Result<()> {
        let root = self.data_dir.path().join(PROJECT).join(sha);
        std::fs::create_dir_all(&root).with_context(|| format!("create {}", root.display()))?;
        for (rel, content) in files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
            std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    }
}

fn read_addr_file(addr_file: &Path) -> Result<String> {
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("addr file not written at {}", addr_file.display());
        }

        if let Ok(s) = std::fs::read_to_string(addr_file) {
            let s = s.trim();
            if !s.is_empty() {
                return Ok(format!("http://{}", s));
            }
        }
        thread::sleep(Duration::from_millis(10));
    }
}

pub fn wait_for_healthz(base_url: &str) -> Result<()> {
    let client = reqwest::blocking::Client::new();
    let start = Instant::now();
    loop {
        if start.elapsed() > Duration::from_secs(5) {
            anyhow::bail!("server did not become healthy at {}/healthz", base_url);
        }
        match client.get(format!("{}/healthz", base_url)).send() {
            Ok(resp) if resp.status().is_success() => return Ok(()),
            _ => {
                thread::sleep(Duration::from_millis(50));
            }
        }
    }
}

#[allow(dead_code)]
pub fn source_config(server: &ServerGuard, work_dir: &Path) -> treefetch::SourceConfig {
    treefetch::SourceConfig::new(server.base_url.clone(), PROJECT).with_work_dir(work_dir)
}

#[allow(dead_code)]
pub fn rev(s: &str) -> treefetch::RevisionHandle {
    treefetch::RevisionHandle::new(s).expect("valid revision")
}

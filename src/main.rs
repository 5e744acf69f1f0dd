use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use treefetch::materialize::{MaterializeOptions, build_tree_with};
use treefetch::processor::materialize_archive;
use treefetch::{DirectoryNode, Materialized, RevisionHandle, SourceConfig, StagingPaths, TreeFetcher};

#[derive(Parser)]
#[command(name = "treefetch")]
#[command(about = "Fetch repository snapshots and load them as file trees", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a revision's archive, extract it and print the tree
    Fetch {
        #[command(flatten)]
        source: SourceArgs,
        /// Branch, tag or commit to fetch
        #[arg(long)]
        revision: String,
        /// Emit the full tree (with contents) as JSON
        #[arg(long)]
        json: bool,
        /// Leave the staged archive and directory on disk
        #[arg(long)]
        keep: bool,
    },

    /// Load a tree from a tar.gz archive already on disk
    Extract {
        /// Archive to read
        #[arg(long)]
        archive: PathBuf,
        /// Revision name used to scope the staging paths
        #[arg(long, default_value = "local")]
        revision: String,
        #[arg(long, default_value = "./treefetch-staging")]
        work_dir: PathBuf,
        #[arg(long, default_value_t = 256)]
        max_depth: usize,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        keep: bool,
    },

    /// Load a tree from a local directory
    Scan {
        path: PathBuf,
        #[arg(long, default_value_t = 256)]
        max_depth: usize,
        /// Walk subdirectories in parallel
        #[arg(long)]
        parallel: bool,
        #[arg(long)]
        json: bool,
    },

    /// Show the staging paths used for a revision
    Paths {
        #[arg(long, default_value = "./treefetch-staging")]
        work_dir: PathBuf,
        #[arg(long)]
        revision: String,
    },

    /// Remove staged files (and a stale claim) left behind for a revision
    Clean {
        #[arg(long, default_value = "./treefetch-staging")]
        work_dir: PathBuf,
        #[arg(long)]
        revision: String,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// JSON config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// API host base URL
    #[arg(long)]
    api_host: Option<String>,
    /// Project id or URL-encoded path
    #[arg(long)]
    project: Option<String>,
    /// Bearer token
    #[arg(long, env = "TREEFETCH_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[arg(long)]
    work_dir: Option<PathBuf>,
    /// Download deadline in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,
    #[arg(long)]
    parallel: bool,
}

impl SourceArgs {
    fn resolve(self) -> Result<SourceConfig> {
        let mut cfg = match &self.config {
            Some(path) => SourceConfig::load(path)
                .with_context(|| format!("load config {}", path.display()))?,
            None => {
                let api_host = self
                    .api_host
                    .clone()
                    .context("--api-host is required without --config")?;
                let project = self
                    .project
                    .clone()
                    .context("--project is required without --config")?;
                SourceConfig::new(api_host, project)
            }
        };

        if let Some(api_host) = self.api_host {
            cfg.api_host = api_host;
        }
        if let Some(project) = self.project {
            cfg.project_id = project;
        }
        if self.token.is_some() {
            cfg = cfg.with_token(self.token);
        }
        if let Some(work_dir) = self.work_dir {
            cfg.work_dir = work_dir;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            cfg.timeout_secs = timeout_secs;
        }
        if self.parallel {
            cfg.parallel = true;
        }
        cfg.validate().context("validate config")?;
        Ok(cfg)
    }
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            source,
            revision,
            json,
            keep,
        } => {
            let cfg = source.resolve()?;
            let revision = RevisionHandle::new(revision)?;
            let fetcher = TreeFetcher::new(cfg).context("create fetcher")?;
            let loaded = fetcher
                .materialize(&revision)
                .with_context(|| format!("materialize revision {}", revision))?;
            finish_loaded(loaded, json, keep)?;
        }
        Commands::Extract {
            archive,
            revision,
            work_dir,
            max_depth,
            json,
            keep,
        } => {
            let revision = RevisionHandle::new(revision)?;
            let opts = MaterializeOptions {
                max_depth,
                parallel: false,
            };
            let loaded = materialize_archive(&work_dir, &archive, &revision, opts)
                .with_context(|| format!("load archive {}", archive.display()))?;
            finish_loaded(loaded, json, keep)?;
        }
        Commands::Scan {
            path,
            max_depth,
            parallel,
            json,
        } => {
            let opts = MaterializeOptions {
                max_depth,
                parallel,
            };
            let tree = build_tree_with(&path, opts)
                .with_context(|| format!("scan {}", path.display()))?;
            print_tree(&tree, json)?;
        }
        Commands::Paths { work_dir, revision } => {
            let revision = RevisionHandle::new(revision)?;
            let paths = StagingPaths::for_revision(&work_dir, &revision);
            println!("archive: {}", paths.archive_path.display());
            println!("root: {}", paths.root_path.display());
        }
        Commands::Clean { work_dir, revision } => {
            let revision = RevisionHandle::new(revision)?;
            let paths = StagingPaths::for_revision(&work_dir, &revision);
            paths.cleanup_best_effort();
            paths.clear_lock().context("remove staging claim")?;
            println!("Cleaned {}", revision);
        }
    }

    Ok(())
}

fn finish_loaded(loaded: Materialized, json: bool, keep: bool) -> Result<()> {
    if keep {
        let (tree, paths) = loaded.persist();
        print_tree(&tree, json)?;
        eprintln!("kept {}", paths.root_path.display());
        return Ok(());
    }

    let res = print_tree(&loaded.tree, json);
    loaded.cleanup().context("clean up staging area")?;
    res
}

fn print_tree(tree: &DirectoryNode, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(tree).context("serialize tree json")?
        );
        return Ok(());
    }

    let mut lines = Vec::new();
    collect_lines(tree, &mut lines);
    for line in lines {
        println!("{}", line);
    }
    let stats = tree.stats();
    println!(
        "stats: files={} dirs={} bytes={}",
        stats.files, stats.dirs, stats.bytes
    );
    Ok(())
}

fn collect_lines(dir: &DirectoryNode, out: &mut Vec<String>) {
    for d in &dir.directories {
        out.push(format!("{}/", d.path));
        collect_lines(d, out);
    }
    for f in &dir.files {
        out.push(format!("{} ({} bytes)", f.path, f.content.len()));
    }
}

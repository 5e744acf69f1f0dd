use std::net::SocketAddr;

use super::*;

#[derive(Parser)]
#[command(name = "treefetch-archive-server")]
#[command(about = "Repository archive endpoint (development)", long_about = None)]
pub(super) struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub(super) addr: SocketAddr,

    /// Write bound address to this file (dev/test convenience)
    #[arg(long)]
    pub(super) addr_file: Option<PathBuf>,

    /// Directory holding `<project>/<revision>/` trees
    #[arg(long, default_value = "./treefetch-data")]
    pub(super) data_dir: PathBuf,

    /// Require this bearer token on archive requests
    #[arg(long)]
    pub(super) token: Option<String>,

    /// Answer the first N archive requests with 503
    #[arg(long, default_value_t = 0)]
    pub(super) fail_first: u32,
}

pub(super) async fn run() -> Result<()> {
    let args = Args::parse();
    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("create data dir {}", args.data_dir.display()))?;

    let state = Arc::new(AppState {
        data_dir: args.data_dir.clone(),
        token: args.token.clone(),
        fail_remaining: AtomicU32::new(args.fail_first),
    });

    let app = build_router(state);
    let listener = bind_listener(args.addr).await?;
    let local_addr = listener.local_addr().context("read listener local addr")?;
    info!(addr = %local_addr, data_dir = %args.data_dir.display(), "archive server listening");
    maybe_write_addr_file(args.addr_file.as_ref(), local_addr)?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    let archive = Router::new()
        .route(
            "/api/v4/projects/:project/repository/archive.tar.gz",
            get(get_archive),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/healthz", get(healthz))
        .merge(archive)
        .with_state(state)
}

async fn bind_listener(addr: SocketAddr) -> Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {}", addr))
}

fn maybe_write_addr_file(addr_file: Option<&PathBuf>, local_addr: SocketAddr) -> Result<()> {
    if let Some(addr_file) = addr_file {
        std::fs::write(addr_file, local_addr.to_string())
            .with_context(|| format!("write addr file {}", addr_file.display()))?;
    }
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

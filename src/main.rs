use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use coi_proxy_cli::config::Overrides;
use coi_proxy_cli::{router, AppConfig, AppState, ReqwestFetch};
use isolation_worker::{IsolationWorker, MemoryClients, ScopeHost};
use proxy_types::VersionTag;
use version_registry::MemoryNamespaceStore;

#[derive(Parser)]
#[command(
    name = "coi-proxy",
    about = "Serve an origin through a cross-origin isolation retrofit proxy",
    version
)]
struct Cli {
    /// Optional configuration file (TOML/JSON/YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the proxy in front of an upstream origin
    Serve(ServeArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Listen address (overrides config)
    #[arg(long)]
    listen: Option<SocketAddr>,

    /// Upstream origin to front (overrides config)
    #[arg(long)]
    upstream: Option<Url>,

    /// Worker version tag (overrides config)
    #[arg(long)]
    tag: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(args) => serve(cli.config, args).await,
    }
}

async fn serve(config_path: Option<PathBuf>, args: ServeArgs) -> Result<()> {
    let overrides = Overrides {
        listen: args.listen,
        upstream: args.upstream,
        version_tag: args.tag,
    };
    let cfg = AppConfig::load(config_path.as_deref(), overrides)
        .context("failed to load configuration")?;

    init_tracing(&cfg.log_filter);

    let net = Arc::new(ReqwestFetch::new(&cfg.upstream).context("failed to build network layer")?);
    let namespaces = Arc::new(MemoryNamespaceStore::new());
    let clients = Arc::new(MemoryClients::new());
    let host = Arc::new(ScopeHost::new(net.clone()));

    let worker = Arc::new(IsolationWorker::new(
        VersionTag::new(&cfg.version_tag),
        namespaces,
        clients,
        net,
    ));
    let claimed = host
        .register(worker)
        .await
        .context("worker failed to take control of the scope")?;
    info!(tag = %cfg.version_tag, claimed, "isolation worker registered");

    let state = AppState {
        host,
        upstream: cfg.upstream.clone(),
    };
    let listener = TcpListener::bind(cfg.listen)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen))?;
    info!(listen = %cfg.listen, upstream = %cfg.upstream, "proxy listening");

    axum::serve(listener, router(state).into_make_service())
        .await
        .context("proxy server exited unexpectedly")?;
    Ok(())
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

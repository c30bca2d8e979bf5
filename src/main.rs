// src/main.rs — leafmarket entry point

use clap::Parser;
use std::sync::Arc;

use leafmarket::api::{self, ApiState};
use leafmarket::connect::{ConnectProvider, ConnectService, StripeClient};
use leafmarket::infra::config::Config;
use leafmarket::infra::logger;
use leafmarket::model::ModelCache;
use leafmarket::storage::{FsObjectStore, MemoryObjectStore, ObjectStore};
use leafmarket::upload::UploadSessions;
use leafmarket::users::{HttpUserStore, MemoryUserStore, UserStore};

#[derive(Parser)]
#[command(name = "leafmarket", version, about = "Plant-marketplace backend")]
struct Cli {
    /// Path to a TOML config file (defaults to ./leafmarket.toml).
    #[arg(long)]
    config: Option<String>,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    // Respects RUST_LOG.
    logger::init_logging("info");

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };
    config.apply_env_overrides();

    let store: Arc<dyn ObjectStore> = match config.storage.backend.as_str() {
        "memory" => Arc::new(MemoryObjectStore::new()),
        "fs" => Arc::new(FsObjectStore::new(config.storage.root.clone())),
        other => anyhow::bail!("unknown storage backend '{other}' (expected 'fs' or 'memory')"),
    };

    let users: Arc<dyn UserStore> = match &config.users.base_url {
        Some(base_url) => Arc::new(HttpUserStore::new(
            base_url.clone(),
            config.users.api_token.clone(),
        )),
        None => {
            tracing::warn!("No user-record store configured; using in-memory store");
            Arc::new(MemoryUserStore::new())
        }
    };

    let secret_key = config
        .stripe
        .secret_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("stripe.secret_key (or STRIPE_SECRET_KEY) is required"))?;
    let provider: Arc<dyn ConnectProvider> =
        Arc::new(StripeClient::new(secret_key, config.stripe.api_base.clone()));

    let state = ApiState {
        sessions: Arc::new(UploadSessions::new(store.clone())),
        model: Arc::new(ModelCache::new(store, config.model.artifact_prefix.clone())),
        connect: Arc::new(ConnectService::new(provider, users)),
        token: config.server.auth_token.clone(),
    };

    let port = cli.port.unwrap_or(config.server.port);
    api::start_server(port, state).await
}

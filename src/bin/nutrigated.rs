//! nutrigated: HTTP daemon for the nutrigate AI gateway.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use nutrigate::limiter::MAX_WINDOW;
use nutrigate::server::config::{Config, Secrets};
use nutrigate::server::{AppState, router};
use nutrigate::{
    CacheStore, FixedWindowLimiter, Gateway, GatewayError, MemoryCacheStore, PostgrestCacheStore,
};

/// nutrigate daemon: AI request gateway for the nutrition app.
#[derive(Parser)]
#[command(name = "nutrigated")]
#[command(version = nutrigate::PKG_VERSION)]
#[command(about = "nutrigate AI gateway daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "NUTRIGATE_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let secrets = Secrets::from_env();
    let config = Config::load(args.config.as_deref())?.with_secrets(&secrets);

    let addr: SocketAddr = config
        .server
        .address
        .parse()
        .map_err(|e| GatewayError::Configuration(format!("Invalid address: {e}")))?;

    let limiter = Arc::new(FixedWindowLimiter::new());
    let state = match build_gateway(&config, &secrets, Arc::clone(&limiter)) {
        Ok(gateway) => AppState::ready(Arc::new(gateway)),
        // Serve anyway so clients get a clear error instead of a dead socket
        Err(e) => {
            warn!(error = %e, "gateway not configured; all requests will be refused");
            AppState::misconfigured(e.to_string())
        }
    }
    .max_body_bytes(config.server.max_body_bytes);

    spawn_purge(limiter, config.limits.window_secs);

    let app = router(state, config.server.allowed_origin.as_deref());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(version = nutrigate::PKG_VERSION, %addr, "nutrigated starting");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("nutrigated stopped");
    Ok(())
}

/// Build the gateway from configuration and environment secrets.
fn build_gateway(
    config: &Config,
    secrets: &Secrets,
    limiter: Arc<FixedWindowLimiter>,
) -> nutrigate::Result<Gateway> {
    let api_key = secrets
        .gemini_api_key
        .clone()
        .ok_or_else(|| GatewayError::Configuration("GEMINI_API_KEY is not set".to_string()))?;

    let cache: Arc<dyn CacheStore> = match secrets.supabase() {
        Some((url, key)) => {
            info!(table = %config.cache.table, "using PostgREST analysis cache");
            Arc::new(PostgrestCacheStore::new(url, key)?.table(config.cache.table.clone()))
        }
        None => {
            info!("no persistent store configured; using in-memory analysis cache");
            Arc::new(MemoryCacheStore::new(&config.cache.memory()))
        }
    };

    Gateway::builder()
        .gemini(api_key)
        .tiers(config.models.tiers())
        .rate_limits(config.limits.rate_limits()?)
        .rate_limiter(limiter)
        .cache_store(cache)
        .hash_prefix_bytes(config.cache.hash_prefix_bytes)
        .build()
}

/// Drop finished rate-limit windows once per window length.
fn spawn_purge(limiter: Arc<FixedWindowLimiter>, window_secs: u64) {
    let period = Duration::from_secs(window_secs).clamp(Duration::from_secs(1), MAX_WINDOW);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // First tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = limiter.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "purged expired rate-limit windows");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

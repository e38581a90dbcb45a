//! chatdesk-server: registration handler and completion proxy.

use std::net::SocketAddr;
use std::sync::Arc;

use chatdesk::api::client::ApiClient;
use chatdesk::server::config::ServerConfig;
use chatdesk::server::{self, ServerState};
use chatdesk::storage::UserStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = ServerConfig::from_env();
    log::info!("chatdesk-server {} starting", env!("CARGO_PKG_VERSION"));
    if cfg.api_key.is_none() {
        log::warn!("OPENAI_API_KEY is not set; proxied completions will be unauthenticated");
    }

    let store = UserStore::open(&cfg.database_path)?;
    log::info!(
        "user store ready at {} ({} users)",
        cfg.database_path.display(),
        store.count()?
    );

    let upstream = ApiClient::new(&cfg.upstream_url, "", cfg.api_key.clone())?;
    let state = Arc::new(ServerState { store, upstream });

    let addr: SocketAddr = cfg.bind_address.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("listening on {}", addr);

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("chatdesk-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("failed to install Ctrl-C handler: {}", e);
    }
}

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use miniworld::config::Config;
use miniworld::database::{MemoryUserStore, SqliteUserStore, UserStore};
use miniworld::services::demo_service;
use miniworld::state::AppState;
use miniworld::web;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let store: Arc<dyn UserStore> = if config.uses_memory_store() {
        warn!("DATABASE_URL=memory, nothing will survive a restart");
        Arc::new(MemoryUserStore::new())
    } else {
        info!(database_url = %config.database_url, "Connecting to database");
        match SqliteUserStore::connect(&config.database_url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Cannot open database: {}", e);
                return ExitCode::FAILURE;
            }
        }
    };

    if config.seed_demo_users {
        if let Err(e) = demo_service::seed_demo_users(store.as_ref()).await {
            error!("Seeding demo users failed: {}", e);
            return ExitCode::FAILURE;
        }
    }

    match store.counts().await {
        Ok((sessions, users)) => info!(sessions, users, "Store ready"),
        Err(e) => warn!("Could not count store contents: {}", e),
    }

    let host = config.host.clone();
    let port = config.port;
    let app = web::router(AppState::new(config, store));

    let listener = match bind(&host, port).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Cannot bind {}:{} or {}:{}: {}", host, port, host, port.saturating_add(1), e);
            return ExitCode::FAILURE;
        }
    };

    match listener.local_addr() {
        Ok(addr) => info!(version = env!("CARGO_PKG_VERSION"), "Listening on http://{}", addr),
        Err(e) => warn!("Listening on an unknown address: {}", e),
    }

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server stopped: {}", e);
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}

/// Bind `host:port`, falling back to the next port once.
async fn bind(host: &str, port: u16) -> std::io::Result<tokio::net::TcpListener> {
    let addr = parse_addr(host, port)?;
    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => Ok(listener),
        Err(e) => {
            let fallback = parse_addr(host, port.saturating_add(1))?;
            warn!("Could not bind {}: {}. Trying {}", addr, e, fallback);
            tokio::net::TcpListener::bind(fallback).await
        }
    }
}

fn parse_addr(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    format!("{}:{}", host, port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

//! MyGrade Server - Main entry point

use anyhow::Result;
use mygrade_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use mygrade_server::{
    api::{self, AppState},
    config::{Config, IdentityBackend, StoreBackend},
    identity::{FirebaseIdentity, IdentityProvider, LocalIdentity},
    session,
    store::{postgres, DocumentStore, MemoryStore, PostgresStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("mygrade-server")
        .filter_directives("mygrade_server=debug,tower_http=debug,axum=info,sqlx=info")
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;

    init_logging(&log_config)?;

    info!("Starting MyGrade Server");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let store = open_store(&config).await?;
    let identity = open_identity(&config)?;

    let state = AppState::new(
        store,
        identity,
        Duration::from_secs(config.session.inactivity_timeout_secs),
    );

    state.sessions.spawn_pruning(session::SESSION_PRUNE_PERIOD);
    let app = api::create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

async fn open_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory document store - data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        },
        StoreBackend::Postgres => {
            let pool = postgres::create_pool(&config.database).await?;
            postgres::run_migrations(&pool).await?;
            let store = PostgresStore::connect(pool).await?;
            info!("PostgreSQL document store ready");
            Ok(Arc::new(store))
        },
    }
}

fn open_identity(config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    match config.identity.backend {
        IdentityBackend::Local => {
            info!(
                accounts = config.identity.admin_accounts.len(),
                "Using local administrator accounts"
            );
            Ok(Arc::new(LocalIdentity::new(&config.identity.admin_accounts)))
        },
        IdentityBackend::Firebase => {
            let api_key = config
                .identity
                .firebase_api_key
                .clone()
                .ok_or_else(|| anyhow::anyhow!("FIREBASE_API_KEY is not set"))?;
            info!(url = %config.identity.firebase_auth_url, "Using Firebase Auth");
            Ok(Arc::new(FirebaseIdentity::new(
                config.identity.firebase_auth_url.clone(),
                api_key,
            )))
        },
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}

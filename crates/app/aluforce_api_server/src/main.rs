//! Aluforce auth service HTTP server binary.
//!
//! Reads configuration from the environment (and `.env`), refuses to start
//! without a usable `JWT_SECRET`, then serves the API until Ctrl-C.

use std::process::ExitCode;
use std::sync::Arc;

use aluforce_api::config::ApiConfig;
use aluforce_core::auth::store::{MySqlUserStore, UserStore};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// CLI arguments; each falls back to its environment variable.
#[derive(Parser, Debug)]
#[command(name = "aluforce_api_server", about = "Aluforce auth service", version)]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR")]
    bind_addr: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_CONN_LIMIT")]
    max_connections: Option<u32>,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,aluforce_api=debug,aluforce_core=debug")),
        )
        .init();

    let args = Args::parse();

    let mut config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid configuration, refusing to start");
            return ExitCode::FAILURE;
        }
    };
    if let Some(bind_addr) = args.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(max_connections) = args.max_connections.filter(|n| *n > 0) {
        config.db.max_connections = max_connections;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: ApiConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        host = %config.db.host,
        database = %config.db.database,
        max_connections = config.db.max_connections,
        acquire_timeout = ?config.db.acquire_timeout,
        "configuring connection pool"
    );
    let store = Arc::new(MySqlUserStore::new(config.db.connect_lazy()));

    // Requests answer 503 until the database comes back.
    if let Err(e) = store.ping().await {
        warn!(error = %e, "database not reachable at startup");
    }

    let bind_addr = config.bind_addr.clone();
    let state = aluforce_api::AppState::new(config, store);
    let app = aluforce_api::router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, version = aluforce_core::version(), "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

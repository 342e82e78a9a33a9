use axum::Router;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::time::Duration;

use vurekeys::config::Config;
use vurekeys::db::{create_pool, init_db, queries, AppState};
use vurekeys::handlers;

#[derive(Parser, Debug)]
#[command(name = "vurekeys")]
#[command(about = "HWID-bound license key service")]
struct Cli {
    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Spawns a background task that periodically purges expired keys.
///
/// Every public operation sweeps on entry already; this keeps the table from
/// accumulating expired rows during quiet periods.
fn spawn_sweep_task(state: AppState) {
    tokio::spawn(async move {
        let interval = Duration::from_secs(5 * 60); // 5 minutes

        loop {
            tokio::time::sleep(interval).await;

            match state.db.get() {
                Ok(conn) => match queries::sweep_expired(&conn, chrono::Utc::now()) {
                    Ok(count) => {
                        if count > 0 {
                            tracing::debug!("Swept {} expired keys", count);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to sweep expired keys: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to get db connection for sweep: {}", e);
                }
            }
        }
    });

    tracing::info!("Background sweep task started (runs every 5 minutes)");
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vurekeys=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    let state = AppState {
        db: db_pool,
        admin_token: config.admin_token.clone(),
        key_prefix: config.key_prefix.clone(),
        expiry_policy: config.expiry_policy,
    };

    // Start the background sweep for expired keys
    spawn_sweep_task(state.clone());

    // Build the application router
    let app = Router::new()
        .merge(handlers::public_router())
        .merge(handlers::admin_router(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cli.ephemeral && !config.dev_mode {
        tracing::warn!("--ephemeral flag ignored: not in dev mode (set VUREKEYS_ENV=dev)");
    }
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("VureKeys server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}

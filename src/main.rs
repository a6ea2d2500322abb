//! Quota gateway - application entry point.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Open the storage handle (PostgreSQL pool + migrations, or in-memory)
//! 3. Build the generation engine client
//! 4. Start the optional ledger retention task
//! 5. Serve HTTP until Ctrl-C, then close the pool

use std::sync::Arc;

use quota_gateway::{
    AppState, build_router,
    config::Config,
    db,
    routes::cors_layer,
    services::{
        generation::{GenerationSettings, HttpGenerationEngine},
        retention,
    },
    store::{InMemoryStore, KeyStore, PgStore, UsageLedger},
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let (keys, ledger, pg_store): (Arc<dyn KeyStore>, Arc<dyn UsageLedger>, Option<Arc<PgStore>>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = db::create_pool(database_url, config.db_max_connections).await?;
                tracing::info!("Database pool created");

                db::run_migrations(&pool).await?;
                tracing::info!("Database migrations complete");

                let store = Arc::new(PgStore::new(pool));
                (
                    store.clone() as Arc<dyn KeyStore>,
                    store.clone() as Arc<dyn UsageLedger>,
                    Some(store),
                )
            }
            None => {
                tracing::warn!("DATABASE_URL not set; keys and usage are kept in memory only");
                let store = Arc::new(InMemoryStore::new());
                (
                    store.clone() as Arc<dyn KeyStore>,
                    store as Arc<dyn UsageLedger>,
                    None,
                )
            }
        };

    let generation = GenerationSettings::from(&config);
    if generation.endpoint.is_none() {
        tracing::warn!("GENERATION_URL not set; queries will fail after admission");
    }
    let engine = Arc::new(HttpGenerationEngine::new(generation)?);

    if let Some(days) = config.usage_retention_days {
        retention::spawn(ledger.clone(), days);
        tracing::info!("Usage counters retained for {} days", days);
    }

    if config.admin_key.is_none() {
        tracing::info!("ADMIN_KEY not set; admin listing disabled");
    }

    let state = AppState {
        keys,
        ledger,
        engine,
        limits: config.plan_limits(),
        admin_key: config.admin_key.as_deref().map(Arc::from),
    };

    let app = build_router(state).layer(cors_layer(&config.cors_allowed_origins));

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(store) = pg_store {
        store.close().await;
        tracing::info!("Database pool closed");
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

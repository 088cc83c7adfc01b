use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod catalog;
mod config;
mod domain;
mod metrics;
mod session;
mod store;
mod utils;

use api::AppState;
use catalog::ShopifyCatalog;
use config::{AppConfig, StoreBackend};
use domain::contract::{ContractRepository, CreateContract};
use domain::signature::SignatureLedger;
use domain::Shop;
use session::{MemorySessionProvider, PgSessionProvider, SessionProvider};
use store::{ContractStore, MemoryContractStore, PgContractStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,shop_contracts=debug")),
        )
        .init();

    tracing::info!("🚀 Starting shop contracts service");

    let config = AppConfig::from_env()?;

    // === 1. Store and sessions ===
    let (store, sessions) = match &config.store {
        StoreBackend::Postgres { url, max_connections } => {
            tracing::info!(max_connections, "Connecting to PostgreSQL...");
            let pool = PgPoolOptions::new()
                .max_connections(*max_connections)
                .connect(url)
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("✅ Database migrations applied");

            let store: Arc<dyn ContractStore> = Arc::new(PgContractStore::new(pool.clone()));
            let sessions: Arc<dyn SessionProvider> = Arc::new(PgSessionProvider::new(pool));
            (store, sessions)
        }
        StoreBackend::Memory { demo_shop } => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            let sessions = MemorySessionProvider::new();
            let token = sessions
                .issue(Shop::new(demo_shop.as_str()), "demo-access-token", None)
                .await;
            tracing::info!(shop = %demo_shop, token = %token, "🔑 Issued demo session");

            let memory = Arc::new(MemoryContractStore::new());
            seed_demo_data(&memory, &Shop::new(demo_shop.as_str())).await?;

            let store: Arc<dyn ContractStore> = memory;
            let sessions: Arc<dyn SessionProvider> = Arc::new(sessions);
            (store, sessions)
        }
    };

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());

    // === 3. Catalog client (with retry and circuit breaker) ===
    let catalog = Arc::new(ShopifyCatalog::new(config.catalog.clone(), metrics.clone())?);

    let state = web::Data::new(AppState {
        contracts: ContractRepository::new(store.clone()),
        signatures: SignatureLedger::new(store.clone()),
        catalog,
        sessions,
        metrics: metrics.clone(),
    });

    // === 4. Serve API and metrics ===
    tracing::info!("🌐 Serving contracts API on http://{}", config.bind_addr);
    let api_server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind(config.bind_addr)?
    .run();

    tokio::try_join!(
        api_server,
        metrics::start_metrics_server(metrics, store, config.metrics_port),
    )?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}

/// Gives the memory backend one contract with a recorded signature.
async fn seed_demo_data(store: &Arc<MemoryContractStore>, shop: &Shop) -> anyhow::Result<()> {
    let contract = ContractRepository::new(store.clone())
        .for_shop(shop)
        .create(CreateContract {
            name: Some("Sample rental agreement".to_string()),
            content: Some("Equipment must be returned within 24 hours of pick-up.".to_string()),
            skus: None,
        })
        .await?;

    store
        .record_signature(contract.id, Some("Demo Customer"), Some("customer@example.com"), Some("#1001"))
        .await?;

    tracing::info!(shop = %shop, contract_id = contract.id, "🌱 Seeded demo contract");
    Ok(())
}

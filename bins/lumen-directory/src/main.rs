mod config;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use lumen_core::relation::RelationTables;
use lumen_core::traits::ReputationStore;
use lumen_store::RocksStore;
use lumen_trust::ReputationService;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ReputationService<dyn ReputationStore>>,
    pub request_timeout: Duration,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = config::Config::from_env()?;

    let store: Arc<dyn ReputationStore> = Arc::new(
        RocksStore::open(&config.db_path)
            .with_context(|| format!("opening database at {}", config.db_path.display()))?,
    );
    let service = ReputationService::new(store, RelationTables::default(), config.reputation.clone())?;

    info!(
        db = %config.db_path.display(),
        bind = %config.bind_addr,
        max_weight = config.reputation.max_weight,
        "Starting lumen-directory"
    );

    let state = AppState {
        service: Arc::new(service),
        request_timeout: config.request_timeout,
    };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Directory listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::AppConfig;
use crate::database::client::{Database, DbConfig};
use crate::jobs;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::mw_ctx::{create_ctx_state, CtxState};
use crate::utils::reference_verifier::ReferenceVerifier;
use crate::utils::simulated_gateway::SimulatedPaymentGateway;

pub async fn run_migrations(database: &Database) -> AppResult<()> {
    database.run_migrations().await?;
    info!("->> migrations applied");
    Ok(())
}

/// Connects the ledger store and builds the shared state with the bundled collaborators.
pub async fn create_state(config: &AppConfig) -> AppResult<Arc<CtxState>> {
    let db = Database::connect(DbConfig {
        url: &config.db_url,
        database: &config.db_database,
        namespace: &config.db_namespace,
        username: config.db_username.as_deref(),
        password: config.db_password.as_deref(),
    })
    .await
    .map_err(AppError::from)?;

    run_migrations(&db).await?;

    let gateway = Arc::new(SimulatedPaymentGateway::new(Duration::from_millis(
        config.gateway_latency_ms,
    )));
    create_ctx_state(db, config, gateway, Arc::new(ReferenceVerifier))
}

pub async fn start(config: AppConfig) -> AppResult<()> {
    let state = create_state(&config).await?;
    info!("->> bounty board ready, gateway={}", state.gateway.name());

    let release_job = jobs::bounty_release::run(
        state.clone(),
        Duration::from_secs(config.release_retry_interval_secs),
    );

    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("->> could not listen for shutdown signal: {err}");
    }
    info!("->> shutting down");
    release_job.abort();
    Ok(())
}

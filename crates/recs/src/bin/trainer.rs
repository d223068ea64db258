//! Offline training binary
//!
//! Intended to run on a schedule. Fits both models from the live database and
//! replaces the serving artifacts; a failed run leaves the previous artifacts
//! in place and exits nonzero.

use std::process::ExitCode;
use std::sync::Arc;
use storefront_core::{load_dotenv, ConfigLoader, DatabaseConfig, DatabasePool};
use storefront_recs::{EngineConfig, PostgresStore, Trainer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "training run failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let database_config = DatabaseConfig::from_env()?;
    let engine_config = EngineConfig::from_env()?;

    let db = DatabasePool::new(&database_config).await?;
    let store = Arc::new(PostgresStore::new(db.pool().clone()));

    let trainer = Trainer::new(store, engine_config);
    let report = trainer.run().await?;

    info!(
        n_interactions = report.n_interactions,
        n_users = report.n_users,
        n_items = report.n_items,
        n_products = report.n_products,
        factor_rank = report.factor_rank,
        "training run complete"
    );

    Ok(())
}

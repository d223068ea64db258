//! Offline batch training pipeline
//!
//! Pulls interactions and catalog records from the store adapter, fits both
//! models, and persists them as versioned artifacts. Training errors are
//! fatal to the run: a wrong artifact is worse than no artifact.

use crate::artifact::{self, COLLABORATIVE_ARTIFACT, CONTENT_ARTIFACT};
use crate::collaborative::CollaborativeModel;
use crate::content::ContentModel;
use crate::store::ProductStore;
use crate::EngineConfig;
use std::sync::Arc;
use storefront_core::{aggregate_interactions, Result};
use tracing::info;

/// Summary of a completed training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingReport {
    pub n_interactions: usize,
    pub n_users: usize,
    pub n_items: usize,
    pub n_products: usize,
    pub factor_rank: usize,
}

/// Offline trainer producing the two model artifacts
pub struct Trainer {
    store: Arc<dyn ProductStore>,
    config: EngineConfig,
}

impl Trainer {
    pub fn new(store: Arc<dyn ProductStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Run a full training pass and replace both artifacts.
    ///
    /// Aborts with `Data`/`Config` errors on empty input or an invalid
    /// factorization rank; existing artifacts are left untouched on failure.
    pub async fn run(&self) -> Result<TrainingReport> {
        let events = self.store.fetch_interactions().await?;
        info!(n_events = events.len(), "fetched interaction events");

        let interactions = aggregate_interactions(&events);
        let mut collaborative = CollaborativeModel::prepare(&interactions)?;

        collaborative.train_user_similarity();
        info!("trained user-user similarity");
        collaborative.train_item_similarity();
        info!("trained item-item similarity");
        collaborative.train_factorization(self.config.factor_rank)?;
        info!(rank = self.config.factor_rank, "trained factorization");

        let products = self.store.fetch_products().await?;
        info!(n_products = products.len(), "fetched product catalog");

        let mut content = ContentModel::prepare(&products)?;
        content.train();
        info!("trained content similarity");

        artifact::save_collaborative(
            &collaborative,
            &self.config.model_dir.join(COLLABORATIVE_ARTIFACT),
        )?;
        artifact::save_content(&content, &self.config.model_dir.join(CONTENT_ARTIFACT))?;

        Ok(TrainingReport {
            n_interactions: interactions.len(),
            n_users: collaborative.n_users(),
            n_items: collaborative.n_items(),
            n_products: content.n_items(),
            factor_rank: self.config.factor_rank,
        })
    }
}

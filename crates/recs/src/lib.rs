//! # Storefront Recs
//!
//! Hybrid recommendation engine for the storefront platform. Blends
//! behavioral collaborative filtering (neighborhood and truncated-SVD
//! variants) with content similarity over product feature vectors, fused by
//! weighted rank fusion into one ranked product list.
//!
//! Models are trained offline by [`trainer::Trainer`], persisted as versioned
//! artifacts, and loaded read-only at service startup; no query path mutates
//! model state.

pub mod artifact;
pub mod collaborative;
pub mod content;
pub mod factorization;
pub mod service;
pub mod store;
pub mod trainer;

pub use collaborative::{CollaborativeModel, PredictionStrategy};
pub use content::{ContentModel, FeatureSchema, MAX_TFIDF_TERMS};
pub use factorization::LatentFactors;
pub use service::{fuse_candidates, HomepageBundle, RecommendationService};
pub use store::{PostgresStore, ProductStore};
pub use trainer::{Trainer, TrainingReport};

use std::path::PathBuf;
use storefront_core::{env_parse, env_var, ConfigLoader, Result, StorefrontError};

/// Engine hyperparameters and artifact location
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Truncated-SVD rank (must stay below min(n_users, n_items))
    pub factor_rank: usize,
    /// Collaborative score weight in rank fusion
    pub cf_weight: f64,
    /// Content score weight in rank fusion
    pub cb_weight: f64,
    /// How many recent distinct items seed the content signal
    pub recent_items_window: usize,
    /// Similar-item fan-out per recent item
    pub similar_per_recent: usize,
    /// Directory holding the model artifacts
    pub model_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            factor_rank: 50,
            cf_weight: 0.7,
            cb_weight: 0.3,
            recent_items_window: 5,
            similar_per_recent: 5,
            model_dir: PathBuf::from("models"),
        }
    }
}

impl ConfigLoader for EngineConfig {
    fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            factor_rank: env_parse("STOREFRONT_FACTOR_RANK", defaults.factor_rank)?,
            cf_weight: env_parse("STOREFRONT_CF_WEIGHT", defaults.cf_weight)?,
            cb_weight: env_parse("STOREFRONT_CB_WEIGHT", defaults.cb_weight)?,
            recent_items_window: env_parse(
                "STOREFRONT_RECENT_ITEMS_WINDOW",
                defaults.recent_items_window,
            )?,
            similar_per_recent: env_parse(
                "STOREFRONT_SIMILAR_PER_RECENT",
                defaults.similar_per_recent,
            )?,
            model_dir: env_var("STOREFRONT_MODEL_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_dir),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.factor_rank == 0 {
            return Err(StorefrontError::config("factor_rank must be positive"));
        }
        if self.cf_weight < 0.0 || self.cb_weight < 0.0 {
            return Err(StorefrontError::config("fusion weights must be nonnegative"));
        }
        if self.cf_weight + self.cb_weight == 0.0 {
            return Err(StorefrontError::config(
                "at least one fusion weight must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;

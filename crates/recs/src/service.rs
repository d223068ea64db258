//! Hybrid recommendation service
//!
//! Orchestrates the collaborative and content-based models over the store
//! adapter, fusing both candidate sets into one ranked list. Degradation is
//! local: a missing model or a failed store query turns into an empty section,
//! never a failed request. Trending-only fallback for an empty result is the
//! caller's decision.

use crate::artifact::{self, COLLABORATIVE_ARTIFACT, CONTENT_ARTIFACT};
use crate::collaborative::CollaborativeModel;
use crate::content::ContentModel;
use crate::store::ProductStore;
use crate::EngineConfig;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_core::ProductDetails;
use tracing::{info, warn};

const HOMEPAGE_RECOMMENDED: usize = 12;
const HOMEPAGE_TRENDING: usize = 8;
const HOMEPAGE_SIMILAR_TO_VIEWED: usize = 8;
const DEFAULT_TRENDING_WINDOW_DAYS: i64 = 7;

/// Personalized landing-page bundle. Sections degrade independently; a failed
/// section is empty, never an aborted bundle.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct HomepageBundle {
    pub recommended_for_you: Vec<ProductDetails>,
    pub trending: Vec<ProductDetails>,
    pub similar_to_viewed: Vec<ProductDetails>,
}

/// Read-only serving facade over the trained models and the store adapter.
///
/// Constructed once at process start; all query methods take `&self` and the
/// loaded models are immutable for the service lifetime. Retraining replaces
/// artifacts out-of-band and is applied by a full reload.
pub struct RecommendationService {
    store: Arc<dyn ProductStore>,
    collaborative: Option<CollaborativeModel>,
    content: Option<ContentModel>,
    config: EngineConfig,
}

impl RecommendationService {
    /// Construct with explicit models (test seam)
    pub fn new(
        store: Arc<dyn ProductStore>,
        collaborative: Option<CollaborativeModel>,
        content: Option<ContentModel>,
        config: EngineConfig,
    ) -> Self {
        Self {
            store,
            collaborative,
            content,
            config,
        }
    }

    /// Load both model artifacts from the configured model directory.
    ///
    /// A missing or corrupt artifact leaves that model absent and the service
    /// degrades per method; it does not abort startup.
    pub fn load(store: Arc<dyn ProductStore>, config: EngineConfig) -> Self {
        let collaborative =
            match artifact::load_collaborative(&config.model_dir.join(COLLABORATIVE_ARTIFACT)) {
                Ok(model) => {
                    info!(
                        n_users = model.n_users(),
                        n_items = model.n_items(),
                        "loaded collaborative model"
                    );
                    Some(model)
                }
                Err(e) => {
                    warn!(error = %e, "collaborative model unavailable, serving without it");
                    None
                }
            };

        let content = match artifact::load_content(&config.model_dir.join(CONTENT_ARTIFACT)) {
            Ok(model) => {
                info!(n_items = model.n_items(), "loaded content model");
                Some(model)
            }
            Err(e) => {
                warn!(error = %e, "content model unavailable, serving without it");
                None
            }
        };

        Self::new(store, collaborative, content, config)
    }

    /// True when at least one model is loaded
    pub fn has_models(&self) -> bool {
        self.collaborative.is_some() || self.content.is_some()
    }

    /// Personalized recommendations blending collaborative and content signal.
    ///
    /// Returns an empty list for a user with no collaborative history and no
    /// recent interactions; the API layer falls back to trending.
    pub async fn recommend_for_user(&self, user_id: &str, limit: usize) -> Vec<ProductDetails> {
        let cf_candidates = self
            .collaborative
            .as_ref()
            .map(|model| model.recommend(user_id, limit * 2))
            .unwrap_or_default();

        let recent_items = self
            .store
            .fetch_recent_items(user_id, self.config.recent_items_window)
            .await
            .unwrap_or_else(|e| {
                warn!(user_id, error = %e, "recent-item lookup failed, skipping content signal");
                Vec::new()
            });

        let mut cb_candidates = Vec::new();
        if let Some(content) = self.content.as_ref() {
            for item_id in &recent_items {
                cb_candidates
                    .extend(content.similar_items(item_id, self.config.similar_per_recent));
            }
        }

        let recent_set: HashSet<&String> = recent_items.iter().collect();
        let fused = fuse_candidates(
            &cf_candidates,
            &cb_candidates,
            self.config.cf_weight,
            self.config.cb_weight,
        );

        // Only unobserved items are recommendation candidates.
        let ranked: Vec<String> = fused
            .into_iter()
            .filter(|(item_id, _)| {
                !recent_set.contains(item_id)
                    && self
                        .collaborative
                        .as_ref()
                        .map_or(true, |m| m.observed_score(user_id, item_id) == 0.0)
            })
            .take(limit)
            .map(|(item_id, _)| item_id)
            .collect();

        self.resolve_details(&ranked).await
    }

    /// Content-similar products for a product detail page
    pub async fn get_similar_products(&self, product_id: &str, limit: usize) -> Vec<ProductDetails> {
        let Some(content) = self.content.as_ref() else {
            return Vec::new();
        };

        let ranked: Vec<String> = content
            .similar_items(product_id, limit)
            .into_iter()
            .map(|(item_id, _)| item_id)
            .collect();

        self.resolve_details(&ranked).await
    }

    /// Products ranked by weighted interaction volume over the trailing
    /// window. Store-driven, independent of personalization.
    pub async fn get_trending_products(
        &self,
        limit: usize,
        window_days: i64,
    ) -> Vec<ProductDetails> {
        let ranked = match self.store.fetch_trending(limit, window_days).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "trending query failed");
                return Vec::new();
            }
        };
        self.resolve_details(&ranked).await
    }

    /// Personalized landing-page bundle
    pub async fn get_personalized_homepage(&self, user_id: &str) -> HomepageBundle {
        let recommended_for_you = self
            .recommend_for_user(user_id, HOMEPAGE_RECOMMENDED)
            .await;
        let trending = self
            .get_trending_products(HOMEPAGE_TRENDING, DEFAULT_TRENDING_WINDOW_DAYS)
            .await;

        let similar_to_viewed = match self.store.fetch_last_viewed(user_id).await {
            Ok(Some(item_id)) => {
                self.get_similar_products(&item_id, HOMEPAGE_SIMILAR_TO_VIEWED)
                    .await
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(user_id, error = %e, "last-viewed lookup failed");
                Vec::new()
            }
        };

        HomepageBundle {
            recommended_for_you,
            trending,
            similar_to_viewed,
        }
    }

    /// Resolve ids into detail records, preserving ranked order. Inactive
    /// products drop out silently; a store failure degrades to empty.
    async fn resolve_details(&self, ranked_ids: &[String]) -> Vec<ProductDetails> {
        if ranked_ids.is_empty() {
            return Vec::new();
        }

        let details = match self.store.fetch_product_details(ranked_ids).await {
            Ok(details) => details,
            Err(e) => {
                warn!(error = %e, "product detail resolution failed");
                return Vec::new();
            }
        };

        let mut by_id: HashMap<String, ProductDetails> = details
            .into_iter()
            .map(|d| (d.id.clone(), d))
            .collect();
        ranked_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect()
    }
}

/// Weighted rank fusion of the two candidate sets.
///
/// Combined score is `cf * cf_weight + cb * cb_weight`, with 0 contribution
/// from a source an item is missing in. Equal combined scores preserve first
/// insertion order (collaborative candidates are inserted first), so fusion is
/// deterministic given deterministic model outputs.
pub fn fuse_candidates(
    cf_candidates: &[(String, f64)],
    cb_candidates: &[(String, f64)],
    cf_weight: f64,
    cb_weight: f64,
) -> Vec<(String, f64)> {
    let mut combined: Vec<(String, f64)> = Vec::new();
    let mut position: HashMap<String, usize> = HashMap::new();

    for (item_id, score) in cf_candidates {
        match position.get(item_id) {
            Some(&pos) => combined[pos].1 += score * cf_weight,
            None => {
                position.insert(item_id.clone(), combined.len());
                combined.push((item_id.clone(), score * cf_weight));
            }
        }
    }
    for (item_id, score) in cb_candidates {
        match position.get(item_id) {
            Some(&pos) => combined[pos].1 += score * cb_weight,
            None => {
                position.insert(item_id.clone(), combined.len());
                combined.push((item_id.clone(), score * cb_weight));
            }
        }
    }

    // Stable sort keeps insertion order across equal scores.
    combined.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    combined
}

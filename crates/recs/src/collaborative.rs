//! Collaborative filtering over aggregated user-item interaction scores
//!
//! The model owns a dense user x item score matrix plus the bidirectional
//! mappings between opaque external ids and matrix indices. Three prediction
//! strategies are kept because they degrade differently: factorization
//! generalizes best on sparse data, while the neighborhood strategies are
//! cheaper to recompute for item-level similarity queries.

use crate::factorization::{truncated_svd, LatentFactors};
use ndarray::Array2;
use std::collections::HashMap;
use storefront_core::{pairwise_cosine_rows, Result, StorefrontError};
use tracing::debug;

/// Closed set of prediction strategies.
///
/// An invalid strategy is unrepresentable; there is no string-dispatch
/// fallback that silently predicts zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionStrategy {
    Factorization,
    UserBased,
    ItemBased,
}

/// User-based collaborative filtering model
#[derive(Debug, Clone)]
pub struct CollaborativeModel {
    pub(crate) user_ids: Vec<String>,
    pub(crate) item_ids: Vec<String>,
    pub(crate) user_index: HashMap<String, usize>,
    pub(crate) item_index: HashMap<String, usize>,
    /// Dense user x item aggregated score matrix. Zero means "no observed
    /// interaction", not negative preference.
    pub(crate) matrix: Array2<f64>,
    pub(crate) user_similarity: Option<Array2<f64>>,
    pub(crate) item_similarity: Option<Array2<f64>>,
    pub(crate) factors: Option<LatentFactors>,
}

impl CollaborativeModel {
    /// Build id mappings and the dense interaction matrix.
    ///
    /// Input triples must have unique (user, item) pairs; callers pre-aggregate
    /// duplicate events by summation. Fails with a `Data` error when the input
    /// is empty.
    pub fn prepare(interactions: &[(String, String, f64)]) -> Result<Self> {
        if interactions.is_empty() {
            return Err(StorefrontError::data(
                "cannot prepare collaborative model from an empty interaction set",
            ));
        }

        let mut user_ids: Vec<String> = Vec::new();
        let mut item_ids: Vec<String> = Vec::new();
        let mut user_index: HashMap<String, usize> = HashMap::new();
        let mut item_index: HashMap<String, usize> = HashMap::new();

        for (user_id, item_id, _) in interactions {
            if !user_index.contains_key(user_id) {
                user_index.insert(user_id.clone(), user_ids.len());
                user_ids.push(user_id.clone());
            }
            if !item_index.contains_key(item_id) {
                item_index.insert(item_id.clone(), item_ids.len());
                item_ids.push(item_id.clone());
            }
        }

        let mut matrix = Array2::<f64>::zeros((user_ids.len(), item_ids.len()));
        for (user_id, item_id, score) in interactions {
            let u = user_index[user_id];
            let i = item_index[item_id];
            matrix[[u, i]] = *score;
        }

        debug!(
            n_users = user_ids.len(),
            n_items = item_ids.len(),
            "prepared interaction matrix"
        );

        Ok(Self {
            user_ids,
            item_ids,
            user_index,
            item_index,
            matrix,
            user_similarity: None,
            item_similarity: None,
            factors: None,
        })
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Compute the symmetric user-user cosine similarity matrix
    pub fn train_user_similarity(&mut self) {
        self.user_similarity = Some(pairwise_cosine_rows(self.matrix.view()));
    }

    /// Compute the symmetric item-item cosine similarity matrix
    pub fn train_item_similarity(&mut self) {
        let transposed = self.matrix.t().to_owned();
        self.item_similarity = Some(pairwise_cosine_rows(transposed.view()));
    }

    /// Compute rank-`rank` latent factors via truncated SVD.
    ///
    /// Fails with a `Config` error unless `rank < min(n_users, n_items)`.
    pub fn train_factorization(&mut self, rank: usize) -> Result<()> {
        let factors = truncated_svd(&self.matrix, rank)?;
        debug!(rank, "trained latent factors");
        self.factors = Some(factors);
        Ok(())
    }

    /// Predict a preference score for a (user, item) pair.
    ///
    /// Unknown user or item ids yield 0.0, never an error. A strategy whose
    /// training step has not run also yields 0.0.
    pub fn predict(&self, user_id: &str, item_id: &str, strategy: PredictionStrategy) -> f64 {
        let (Some(&u), Some(&i)) = (self.user_index.get(user_id), self.item_index.get(item_id))
        else {
            return 0.0;
        };
        self.predict_indexed(u, i, strategy)
    }

    fn predict_indexed(&self, u: usize, i: usize, strategy: PredictionStrategy) -> f64 {
        match strategy {
            PredictionStrategy::Factorization => {
                self.factors.as_ref().map_or(0.0, |f| f.predict(u, i))
            }
            PredictionStrategy::UserBased => {
                let Some(similarity) = self.user_similarity.as_ref() else {
                    return 0.0;
                };
                let mut weighted = 0.0;
                let mut weight_total = 0.0;
                for other in 0..self.n_users() {
                    if other == u {
                        continue;
                    }
                    let sim = similarity[[u, other]];
                    weighted += sim * self.matrix[[other, i]];
                    weight_total += sim.abs();
                }
                if weight_total == 0.0 {
                    0.0
                } else {
                    weighted / weight_total
                }
            }
            PredictionStrategy::ItemBased => {
                let Some(similarity) = self.item_similarity.as_ref() else {
                    return 0.0;
                };
                let mut weighted = 0.0;
                let mut weight_total = 0.0;
                for other in 0..self.n_items() {
                    if other == i {
                        continue;
                    }
                    let sim = similarity[[i, other]];
                    weighted += sim * self.matrix[[u, other]];
                    weight_total += sim.abs();
                }
                if weight_total == 0.0 {
                    0.0
                } else {
                    weighted / weight_total
                }
            }
        }
    }

    /// Top-`n` recommendations for a user over items with no observed
    /// interaction, scored with the factorization strategy.
    ///
    /// Ties keep item-index order (stable sort). Unknown users get an empty
    /// list; cold-start fallback belongs to the service layer.
    pub fn recommend(&self, user_id: &str, n: usize) -> Vec<(String, f64)> {
        let Some(&u) = self.user_index.get(user_id) else {
            return Vec::new();
        };

        let mut predictions: Vec<(usize, f64)> = (0..self.n_items())
            .filter(|&i| self.matrix[[u, i]] == 0.0)
            .map(|i| (i, self.predict_indexed(u, i, PredictionStrategy::Factorization)))
            .collect();

        predictions.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        predictions.truncate(n);

        predictions
            .into_iter()
            .map(|(i, score)| (self.item_ids[i].clone(), score))
            .collect()
    }

    /// Top-`n` behaviorally similar items, excluding the queried item itself.
    ///
    /// Unknown item ids or an untrained item-similarity matrix yield an empty
    /// list.
    pub fn similar_items(&self, item_id: &str, n: usize) -> Vec<(String, f64)> {
        let Some(&i) = self.item_index.get(item_id) else {
            return Vec::new();
        };
        let Some(similarity) = self.item_similarity.as_ref() else {
            return Vec::new();
        };

        let mut scored: Vec<(usize, f64)> = (0..self.n_items())
            .filter(|&other| other != i)
            .map(|other| (other, similarity[[i, other]]))
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(n);

        scored
            .into_iter()
            .map(|(idx, score)| (self.item_ids[idx].clone(), score))
            .collect()
    }

    /// Observed aggregated score for a (user, item) pair, 0.0 when unknown
    pub fn observed_score(&self, user_id: &str, item_id: &str) -> f64 {
        match (self.user_index.get(user_id), self.item_index.get(item_id)) {
            (Some(&u), Some(&i)) => self.matrix[[u, i]],
            _ => 0.0,
        }
    }
}

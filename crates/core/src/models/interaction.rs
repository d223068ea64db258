//! User-item interaction models and score aggregation
//!
//! Interactions are the behavioral signal behind collaborative filtering. Each
//! event type carries two weights: the preference weight summed into the
//! user-item matrix, and the coarser weight used by the trending query.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Closed set of interaction event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    Purchase,
    AddToCart,
    Wishlist,
    View,
}

impl InteractionType {
    /// Preference weight summed per (user, item) pair when building the
    /// interaction matrix
    pub fn preference_weight(&self) -> f64 {
        match self {
            InteractionType::Purchase => 5.0,
            InteractionType::AddToCart => 3.0,
            InteractionType::Wishlist => 2.0,
            InteractionType::View => 1.0,
        }
    }

    /// Weight used when ranking trending products over a trailing window
    pub fn trending_weight(&self) -> i64 {
        match self {
            InteractionType::Purchase => 3,
            InteractionType::AddToCart => 2,
            InteractionType::Wishlist | InteractionType::View => 1,
        }
    }

    /// Parse the store's type strings. Unknown types yield `None` and are
    /// skipped by callers rather than treated as errors.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "purchase" => Some(InteractionType::Purchase),
            "add_to_cart" => Some(InteractionType::AddToCart),
            "wishlist" => Some(InteractionType::Wishlist),
            "view" => Some(InteractionType::View),
            _ => None,
        }
    }
}

/// A single interaction event as supplied by the store adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: String,
    pub item_id: String,
    pub interaction_type: InteractionType,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate raw events into unique (user, item, score) triples by summing
/// preference weights.
///
/// Output order is first-seen order of each (user, item) pair, which keeps the
/// index mappings built from it deterministic for a given event stream.
pub fn aggregate_interactions(records: &[InteractionRecord]) -> Vec<(String, String, f64)> {
    let mut order: Vec<(String, String, f64)> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for record in records {
        let key = (record.user_id.clone(), record.item_id.clone());
        let weight = record.interaction_type.preference_weight();
        match index.get(&key) {
            Some(&pos) => order[pos].2 += weight,
            None => {
                index.insert(key.clone(), order.len());
                order.push((key.0, key.1, weight));
            }
        }
    }

    order
}

//! In-memory `ProductStore` used by service and trainer tests

use crate::store::ProductStore;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use storefront_core::{
    InteractionRecord, InteractionType, ProductDetails, ProductRecord, Result, StorefrontError,
};

fn store_failure() -> StorefrontError {
    StorefrontError::Store(sqlx::Error::PoolTimedOut)
}

/// In-memory store with per-method failure injection
#[derive(Default)]
pub struct MemoryStore {
    pub interactions: Vec<InteractionRecord>,
    pub products: Vec<ProductRecord>,
    pub fail_recent: bool,
    pub fail_trending: bool,
    pub fail_details: bool,
    pub fail_last_viewed: bool,
}

impl MemoryStore {
    pub fn with_data(
        interactions: Vec<InteractionRecord>,
        products: Vec<ProductRecord>,
    ) -> Self {
        Self {
            interactions,
            products,
            ..Self::default()
        }
    }
}

/// Interaction event `minutes_ago` minutes in the past
pub fn event(
    user: &str,
    item: &str,
    kind: InteractionType,
    minutes_ago: i64,
) -> InteractionRecord {
    InteractionRecord {
        user_id: user.to_string(),
        item_id: item.to_string(),
        interaction_type: kind,
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}

pub fn product(id: &str, category: &str, brand: &str, price: f64, description: &str) -> ProductRecord {
    ProductRecord {
        id: id.to_string(),
        name: format!("Product {id}"),
        description: Some(description.to_string()),
        price,
        brand: Some(brand.to_string()),
        category: Some(category.to_string()),
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn fetch_interactions(&self) -> Result<Vec<InteractionRecord>> {
        Ok(self.interactions.clone())
    }

    async fn fetch_products(&self) -> Result<Vec<ProductRecord>> {
        Ok(self.products.clone())
    }

    async fn fetch_recent_items(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        if self.fail_recent {
            return Err(store_failure());
        }

        let mut events: Vec<(&String, DateTime<Utc>)> = self
            .interactions
            .iter()
            .filter(|record| record.user_id == user_id)
            .map(|record| (&record.item_id, record.timestamp))
            .collect();
        events.sort_by(|a, b| b.1.cmp(&a.1));

        let mut seen = HashSet::new();
        Ok(events
            .into_iter()
            .filter(|(item_id, _)| seen.insert((*item_id).clone()))
            .take(limit)
            .map(|(item_id, _)| item_id.clone())
            .collect())
    }

    async fn fetch_last_viewed(&self, user_id: &str) -> Result<Option<String>> {
        if self.fail_last_viewed {
            return Err(store_failure());
        }

        Ok(self
            .interactions
            .iter()
            .filter(|record| {
                record.user_id == user_id && record.interaction_type == InteractionType::View
            })
            .max_by_key(|record| record.timestamp)
            .map(|record| record.item_id.clone()))
    }

    async fn fetch_product_details(&self, item_ids: &[String]) -> Result<Vec<ProductDetails>> {
        if self.fail_details {
            return Err(store_failure());
        }

        Ok(self
            .products
            .iter()
            .filter(|product| item_ids.contains(&product.id))
            .map(|product| ProductDetails {
                id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                discount_price: None,
                images: Vec::new(),
                average_rating: 0.0,
                review_count: 0,
            })
            .collect())
    }

    async fn fetch_trending(&self, limit: usize, window_days: i64) -> Result<Vec<String>> {
        if self.fail_trending {
            return Err(store_failure());
        }

        let since = Utc::now() - Duration::days(window_days);
        let mut totals: Vec<(String, i64)> = Vec::new();
        for record in &self.interactions {
            if record.timestamp < since {
                continue;
            }
            let weight = record.interaction_type.trending_weight();
            match totals.iter_mut().find(|(id, _)| *id == record.item_id) {
                Some(entry) => entry.1 += weight,
                None => totals.push((record.item_id.clone(), weight)),
            }
        }

        totals.sort_by(|a, b| b.1.cmp(&a.1));
        totals.truncate(limit);
        Ok(totals.into_iter().map(|(id, _)| id).collect())
    }
}

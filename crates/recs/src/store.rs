//! Store adapter: the interaction and catalog queries the engine consumes
//!
//! The engine only sees this trait; the PostgreSQL implementation lives here
//! so that training, trending, and detail resolution share one connection
//! pool. Each call acquires and releases its connection within the call.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{PgPool, Row};
use storefront_core::{
    InteractionRecord, InteractionType, ProductDetails, ProductRecord, Result,
};
use tracing::debug;

/// Data-access boundary between the engine and the relational store
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// All historical interaction events, most recent first. Events with
    /// unrecognized type strings are skipped.
    async fn fetch_interactions(&self) -> Result<Vec<InteractionRecord>>;

    /// Active catalog records for content-feature extraction
    async fn fetch_products(&self) -> Result<Vec<ProductRecord>>;

    /// The user's most recent distinct interacted items, most recent first
    async fn fetch_recent_items(&self, user_id: &str, limit: usize) -> Result<Vec<String>>;

    /// The user's most recently viewed item, if any
    async fn fetch_last_viewed(&self, user_id: &str) -> Result<Option<String>>;

    /// Detail records for the given ids, restricted to active products.
    /// Result order is unspecified; callers re-rank.
    async fn fetch_product_details(&self, item_ids: &[String]) -> Result<Vec<ProductDetails>>;

    /// Item ids ranked by weighted interaction count over the trailing window
    async fn fetch_trending(&self, limit: usize, window_days: i64) -> Result<Vec<String>>;
}

/// PostgreSQL-backed store adapter
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    async fn fetch_interactions(&self) -> Result<Vec<InteractionRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, product_id, interaction_type, timestamp
            FROM user_interactions
            ORDER BY timestamp DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut interactions = Vec::with_capacity(rows.len());
        for row in rows {
            let type_str: String = row.get("interaction_type");
            let Some(interaction_type) = InteractionType::parse(&type_str) else {
                debug!(interaction_type = %type_str, "skipping unrecognized interaction type");
                continue;
            };
            interactions.push(InteractionRecord {
                user_id: row.get("user_id"),
                item_id: row.get("product_id"),
                interaction_type,
                timestamp: row.get("timestamp"),
            });
        }

        Ok(interactions)
    }

    async fn fetch_products(&self) -> Result<Vec<ProductRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT
                p.id AS product_id,
                p.name,
                p.description,
                p.price,
                p.brand,
                c.name AS category
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.id
            WHERE p.is_active = true
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ProductRecord {
                id: row.get("product_id"),
                name: row.get("name"),
                description: row.get("description"),
                price: row.get("price"),
                brand: row.get("brand"),
                category: row.get("category"),
            })
            .collect())
    }

    async fn fetch_recent_items(&self, user_id: &str, limit: usize) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, MAX(timestamp) AS last_seen
            FROM user_interactions
            WHERE user_id = $1
            GROUP BY product_id
            ORDER BY last_seen DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("product_id")).collect())
    }

    async fn fetch_last_viewed(&self, user_id: &str) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT product_id
            FROM user_interactions
            WHERE user_id = $1 AND interaction_type = 'view'
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get("product_id")))
    }

    async fn fetch_product_details(&self, item_ids: &[String]) -> Result<Vec<ProductDetails>> {
        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT id, name, price, discount_price, images, average_rating, review_count
            FROM products
            WHERE id = ANY($1) AND is_active = true
            "#,
        )
        .bind(item_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ProductDetails {
                id: row.get("id"),
                name: row.get("name"),
                price: row.get("price"),
                discount_price: row.get("discount_price"),
                images: row
                    .get::<Option<Vec<String>>, _>("images")
                    .unwrap_or_default(),
                average_rating: row
                    .get::<Option<f64>, _>("average_rating")
                    .unwrap_or(0.0),
                review_count: row.get("review_count"),
            })
            .collect())
    }

    async fn fetch_trending(&self, limit: usize, window_days: i64) -> Result<Vec<String>> {
        let since = Utc::now() - Duration::days(window_days);

        let rows = sqlx::query(
            r#"
            SELECT
                product_id,
                SUM(CASE WHEN interaction_type = 'purchase' THEN 3
                         WHEN interaction_type = 'add_to_cart' THEN 2
                         ELSE 1 END) AS weighted_score
            FROM user_interactions
            WHERE timestamp >= $1
            GROUP BY product_id
            ORDER BY weighted_score DESC
            LIMIT $2
            "#,
        )
        .bind(since)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("product_id")).collect())
    }
}

//! # Storefront Core
//!
//! Shared building blocks for the storefront recommendation platform:
//! error taxonomy, configuration loading, the PostgreSQL pool, vector math,
//! and the domain models exchanged between the store adapter and the engine.

pub mod config;
pub mod database;
pub mod error;
pub mod math;
pub mod models;

pub use config::{env_parse, env_var, load_dotenv, ConfigLoader, DatabaseConfig, ServiceConfig};
pub use database::{DatabasePool, PoolStats};
pub use error::StorefrontError;
pub use math::{cosine_similarity, dot_product, pairwise_cosine_rows};
pub use models::{
    aggregate_interactions, InteractionRecord, InteractionType, ProductDetails, ProductRecord,
};

/// Result type alias for storefront operations
pub type Result<T> = std::result::Result<T, StorefrontError>;

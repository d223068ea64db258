//! Domain models shared across the recommendation platform

pub mod interaction;
pub mod product;

pub use interaction::{aggregate_interactions, InteractionRecord, InteractionType};
pub use product::{ProductDetails, ProductRecord};

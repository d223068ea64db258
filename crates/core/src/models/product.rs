//! Product models for the storefront recommendation platform

use serde::{Deserialize, Serialize};

/// Raw catalog record used as training input for the content-based model.
///
/// `category` and `brand` come from a left join against the category table, so
/// both are optional; a missing value simply contributes no indicator feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub brand: Option<String>,
    pub category: Option<String>,
}

/// Product detail record returned by the service API surface.
///
/// Only active products are resolved into details; recommendations for items
/// that have since been deactivated silently drop out of the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetails {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub images: Vec<String>,
    pub average_rating: f64,
    pub review_count: i64,
}

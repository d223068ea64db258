//! Content-based similarity over product feature vectors
//!
//! Each product is encoded as a fixed-width vector: one-hot category, one-hot
//! brand, a standardized price scalar, and a bounded TF-IDF block over the
//! description text. The feature schema (vocabularies and price scaling) is
//! frozen at preparation time; products with attributes unseen during training
//! degrade to zero indicators rather than erroring.

use ndarray::{Array1, Array2};
use std::collections::HashMap;
use storefront_core::{pairwise_cosine_rows, ProductRecord, Result, StorefrontError};
use tracing::debug;

/// Maximum number of description terms kept in the TF-IDF vocabulary
pub const MAX_TFIDF_TERMS: usize = 100;

/// Frozen feature schema built once per training pass
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    pub(crate) categories: Vec<String>,
    pub(crate) category_index: HashMap<String, usize>,
    pub(crate) brands: Vec<String>,
    pub(crate) brand_index: HashMap<String, usize>,
    pub(crate) price_mean: f64,
    pub(crate) price_std: f64,
    pub(crate) vocabulary: Vec<String>,
    pub(crate) vocabulary_index: HashMap<String, usize>,
    pub(crate) idf: Vec<f64>,
}

impl FeatureSchema {
    /// Total feature vector width: categories + brands + price + text terms
    pub fn width(&self) -> usize {
        self.categories.len() + self.brands.len() + 1 + self.vocabulary.len()
    }

    /// Encode one product against the frozen schema.
    ///
    /// Unknown categories, brands, and terms contribute nothing.
    pub fn vectorize(&self, product: &ProductRecord) -> Array1<f64> {
        let mut features = Array1::<f64>::zeros(self.width());

        if let Some(category) = product.category.as_deref() {
            if let Some(&idx) = self.category_index.get(category) {
                features[idx] = 1.0;
            }
        }
        if let Some(brand) = product.brand.as_deref() {
            if let Some(&idx) = self.brand_index.get(brand) {
                features[self.categories.len() + idx] = 1.0;
            }
        }

        let price_slot = self.categories.len() + self.brands.len();
        features[price_slot] = if self.price_std > 0.0 {
            (product.price - self.price_mean) / self.price_std
        } else {
            0.0
        };

        let text_offset = price_slot + 1;
        let mut term_counts: HashMap<usize, f64> = HashMap::new();
        for token in tokenize(product.description.as_deref().unwrap_or("")) {
            if let Some(&idx) = self.vocabulary_index.get(&token) {
                *term_counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut norm = 0.0;
        for (&idx, &count) in &term_counts {
            let weighted = count * self.idf[idx];
            norm += weighted * weighted;
        }
        let norm = norm.sqrt();
        if norm > 0.0 {
            for (idx, count) in term_counts {
                features[text_offset + idx] = count * self.idf[idx] / norm;
            }
        }

        features
    }
}

/// Content-based recommendation model
#[derive(Debug, Clone)]
pub struct ContentModel {
    pub(crate) item_ids: Vec<String>,
    pub(crate) item_index: HashMap<String, usize>,
    pub(crate) schema: FeatureSchema,
    pub(crate) features: Array2<f64>,
    pub(crate) similarity: Option<Array2<f64>>,
}

impl ContentModel {
    /// Build the feature schema and per-product feature matrix.
    ///
    /// Fails with a `Data` error when the catalog is empty. The schema is
    /// frozen after this call.
    pub fn prepare(products: &[ProductRecord]) -> Result<Self> {
        if products.is_empty() {
            return Err(StorefrontError::data(
                "cannot prepare content model from an empty product catalog",
            ));
        }

        let mut item_ids: Vec<String> = Vec::with_capacity(products.len());
        let mut item_index: HashMap<String, usize> = HashMap::new();
        for product in products {
            item_index.insert(product.id.clone(), item_ids.len());
            item_ids.push(product.id.clone());
        }

        let schema = build_schema(products);
        let mut features = Array2::<f64>::zeros((products.len(), schema.width()));
        for (row, product) in products.iter().enumerate() {
            features.row_mut(row).assign(&schema.vectorize(product));
        }

        debug!(
            n_products = item_ids.len(),
            feature_width = schema.width(),
            "prepared content feature matrix"
        );

        Ok(Self {
            item_ids,
            item_index,
            schema,
            features,
            similarity: None,
        })
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Frozen feature schema
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Compute the symmetric item-item cosine similarity matrix over feature
    /// vectors
    pub fn train(&mut self) {
        self.similarity = Some(pairwise_cosine_rows(self.features.view()));
    }

    /// Top-`n` content-similar items, excluding the queried item itself.
    ///
    /// Unknown item ids or an untrained similarity matrix yield an empty list.
    pub fn similar_items(&self, item_id: &str, n: usize) -> Vec<(String, f64)> {
        let Some(&i) = self.item_index.get(item_id) else {
            return Vec::new();
        };
        let Some(similarity) = self.similarity.as_ref() else {
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
}

/// Lowercase alphanumeric tokens of at least two characters
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() >= 2)
        .map(|token| token.to_lowercase())
}

fn build_schema(products: &[ProductRecord]) -> FeatureSchema {
    let mut categories: Vec<String> = products
        .iter()
        .filter_map(|p| p.category.clone())
        .collect();
    categories.sort();
    categories.dedup();
    let category_index = categories
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.clone(), idx))
        .collect();

    let mut brands: Vec<String> = products.iter().filter_map(|p| p.brand.clone()).collect();
    brands.sort();
    brands.dedup();
    let brand_index = brands
        .iter()
        .enumerate()
        .map(|(idx, b)| (b.clone(), idx))
        .collect();

    let n = products.len() as f64;
    let price_mean = products.iter().map(|p| p.price).sum::<f64>() / n;
    let price_variance = products
        .iter()
        .map(|p| (p.price - price_mean).powi(2))
        .sum::<f64>()
        / n;
    let price_std = price_variance.sqrt();

    // Corpus statistics: total term count for vocabulary selection, document
    // frequency for the smoothed idf.
    let mut corpus_counts: HashMap<String, (u64, u64)> = HashMap::new();
    for product in products {
        let mut seen_in_doc: HashMap<String, u64> = HashMap::new();
        for token in tokenize(product.description.as_deref().unwrap_or("")) {
            *seen_in_doc.entry(token).or_insert(0) += 1;
        }
        for (token, count) in seen_in_doc {
            let entry = corpus_counts.entry(token).or_insert((0, 0));
            entry.0 += count;
            entry.1 += 1;
        }
    }

    // Keep the most frequent terms, ties broken alphabetically, capped width.
    let mut ranked: Vec<(String, u64, u64)> = corpus_counts
        .into_iter()
        .map(|(token, (total, docs))| (token, total, docs))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(MAX_TFIDF_TERMS);

    let mut vocabulary: Vec<String> = ranked.iter().map(|(token, _, _)| token.clone()).collect();
    let doc_freq: HashMap<String, u64> = ranked
        .iter()
        .map(|(token, _, docs)| (token.clone(), *docs))
        .collect();
    vocabulary.sort();

    let idf: Vec<f64> = vocabulary
        .iter()
        .map(|token| {
            let df = doc_freq[token] as f64;
            ((1.0 + n) / (1.0 + df)).ln() + 1.0
        })
        .collect();
    let vocabulary_index = vocabulary
        .iter()
        .enumerate()
        .map(|(idx, token)| (token.clone(), idx))
        .collect();

    FeatureSchema {
        categories,
        category_index,
        brands,
        brand_index,
        price_mean,
        price_std,
        vocabulary,
        vocabulary_index,
        idf,
    }
}

//! Versioned binary model artifacts
//!
//! Trained models are persisted as bincode blobs with an explicit
//! `format_version` field checked on load, so compatibility of saved models is
//! verifiable instead of implicit. Loading is all-or-nothing: a missing file,
//! a version mismatch, or a decode failure is `ModelUnavailable` and the
//! service starts with that model absent.

use crate::collaborative::CollaborativeModel;
use crate::content::{ContentModel, FeatureSchema};
use crate::factorization::LatentFactors;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use storefront_core::{Result, StorefrontError};
use tracing::info;

/// Current artifact format version
pub const ARTIFACT_VERSION: u32 = 1;

/// Default collaborative artifact file name
pub const COLLABORATIVE_ARTIFACT: &str = "cf_model.bin";
/// Default content artifact file name
pub const CONTENT_ARTIFACT: &str = "cb_model.bin";

/// Flat serialized form of a dense matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatrixData {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl MatrixData {
    fn from_array(array: &Array2<f64>) -> Self {
        Self {
            rows: array.nrows(),
            cols: array.ncols(),
            data: array.iter().copied().collect(),
        }
    }

    fn into_array(self) -> Result<Array2<f64>> {
        Array2::from_shape_vec((self.rows, self.cols), self.data).map_err(|e| {
            StorefrontError::data(format!("matrix shape mismatch in artifact: {e}"))
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CollaborativePayload {
    format_version: u32,
    user_ids: Vec<String>,
    item_ids: Vec<String>,
    matrix: MatrixData,
    user_similarity: Option<MatrixData>,
    item_similarity: Option<MatrixData>,
    user_factors: Option<MatrixData>,
    item_factors: Option<MatrixData>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPayload {
    format_version: u32,
    item_ids: Vec<String>,
    categories: Vec<String>,
    brands: Vec<String>,
    price_mean: f64,
    price_std: f64,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    features: MatrixData,
    similarity: Option<MatrixData>,
}

/// Persist a collaborative model, replacing any existing artifact wholesale
pub fn save_collaborative(model: &CollaborativeModel, path: &Path) -> Result<()> {
    let payload = CollaborativePayload {
        format_version: ARTIFACT_VERSION,
        user_ids: model.user_ids.clone(),
        item_ids: model.item_ids.clone(),
        matrix: MatrixData::from_array(&model.matrix),
        user_similarity: model.user_similarity.as_ref().map(MatrixData::from_array),
        item_similarity: model.item_similarity.as_ref().map(MatrixData::from_array),
        user_factors: model
            .factors
            .as_ref()
            .map(|f| MatrixData::from_array(&f.user_factors)),
        item_factors: model
            .factors
            .as_ref()
            .map(|f| MatrixData::from_array(&f.item_factors)),
    };
    write_artifact(path, &bincode::serialize(&payload)?)?;
    info!(path = %path.display(), "saved collaborative model artifact");
    Ok(())
}

/// Load a collaborative model artifact
pub fn load_collaborative(path: &Path) -> Result<CollaborativeModel> {
    let payload: CollaborativePayload = read_artifact(path)?;
    check_version(path, payload.format_version)?;

    let factors = match (payload.user_factors, payload.item_factors) {
        (Some(user), Some(item)) => Some(LatentFactors {
            user_factors: user.into_array()?,
            item_factors: item.into_array()?,
        }),
        _ => None,
    };

    Ok(CollaborativeModel {
        user_index: index_of(&payload.user_ids),
        item_index: index_of(&payload.item_ids),
        user_ids: payload.user_ids,
        item_ids: payload.item_ids,
        matrix: payload.matrix.into_array()?,
        user_similarity: transpose_option(payload.user_similarity)?,
        item_similarity: transpose_option(payload.item_similarity)?,
        factors,
    })
}

/// Persist a content model, replacing any existing artifact wholesale
pub fn save_content(model: &ContentModel, path: &Path) -> Result<()> {
    let payload = ContentPayload {
        format_version: ARTIFACT_VERSION,
        item_ids: model.item_ids.clone(),
        categories: model.schema.categories.clone(),
        brands: model.schema.brands.clone(),
        price_mean: model.schema.price_mean,
        price_std: model.schema.price_std,
        vocabulary: model.schema.vocabulary.clone(),
        idf: model.schema.idf.clone(),
        features: MatrixData::from_array(&model.features),
        similarity: model.similarity.as_ref().map(MatrixData::from_array),
    };
    write_artifact(path, &bincode::serialize(&payload)?)?;
    info!(path = %path.display(), "saved content model artifact");
    Ok(())
}

/// Load a content model artifact
pub fn load_content(path: &Path) -> Result<ContentModel> {
    let payload: ContentPayload = read_artifact(path)?;
    check_version(path, payload.format_version)?;

    let schema = FeatureSchema {
        category_index: index_of(&payload.categories),
        categories: payload.categories,
        brand_index: index_of(&payload.brands),
        brands: payload.brands,
        price_mean: payload.price_mean,
        price_std: payload.price_std,
        vocabulary_index: index_of(&payload.vocabulary),
        vocabulary: payload.vocabulary,
        idf: payload.idf,
    };

    Ok(ContentModel {
        item_index: index_of(&payload.item_ids),
        item_ids: payload.item_ids,
        schema,
        features: payload.features.into_array()?,
        similarity: transpose_option(payload.similarity)?,
    })
}

fn index_of(ids: &[String]) -> HashMap<String, usize> {
    ids.iter()
        .enumerate()
        .map(|(idx, id)| (id.clone(), idx))
        .collect()
}

fn transpose_option(matrix: Option<MatrixData>) -> Result<Option<Array2<f64>>> {
    matrix.map(MatrixData::into_array).transpose()
}

fn check_version(path: &Path, version: u32) -> Result<()> {
    if version != ARTIFACT_VERSION {
        return Err(StorefrontError::model_unavailable(
            path.display().to_string(),
            format!("unsupported artifact version {version}, expected {ARTIFACT_VERSION}"),
        ));
    }
    Ok(())
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // Write-then-rename so a crashed training run never leaves a torn file.
    let staging = path.with_extension("bin.tmp");
    fs::write(&staging, bytes)?;
    fs::rename(&staging, path)?;
    Ok(())
}

fn read_artifact<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).map_err(|e| {
        StorefrontError::model_unavailable(path.display().to_string(), e.to_string())
    })?;
    bincode::deserialize(&bytes).map_err(|e| {
        StorefrontError::model_unavailable(path.display().to_string(), e.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborative::PredictionStrategy;
    use storefront_core::ProductRecord;

    fn trained_collaborative() -> CollaborativeModel {
        let mut model = CollaborativeModel::prepare(&[
            ("u1".to_string(), "p1".to_string(), 5.0),
            ("u1".to_string(), "p2".to_string(), 1.0),
            ("u2".to_string(), "p1".to_string(), 1.0),
        ])
        .unwrap();
        model.train_user_similarity();
        model.train_item_similarity();
        model.train_factorization(1).unwrap();
        model
    }

    fn trained_content() -> ContentModel {
        let products = vec![
            ProductRecord {
                id: "p1".to_string(),
                name: "Headphones".to_string(),
                description: Some("wireless headphones".to_string()),
                price: 100.0,
                brand: Some("acme".to_string()),
                category: Some("audio".to_string()),
            },
            ProductRecord {
                id: "p2".to_string(),
                name: "Earbuds".to_string(),
                description: Some("wireless earbuds".to_string()),
                price: 120.0,
                brand: Some("acme".to_string()),
                category: Some("audio".to_string()),
            },
        ];
        let mut model = ContentModel::prepare(&products).unwrap();
        model.train();
        model
    }

    #[test]
    fn test_collaborative_round_trip_reproduces_predictions() {
        let model = trained_collaborative();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COLLABORATIVE_ARTIFACT);

        save_collaborative(&model, &path).unwrap();
        let loaded = load_collaborative(&path).unwrap();

        for strategy in [
            PredictionStrategy::Factorization,
            PredictionStrategy::UserBased,
            PredictionStrategy::ItemBased,
        ] {
            for user in ["u1", "u2"] {
                for item in ["p1", "p2"] {
                    assert_eq!(
                        model.predict(user, item, strategy),
                        loaded.predict(user, item, strategy),
                        "prediction drifted for {user}/{item}"
                    );
                }
            }
        }

        assert_eq!(model.matrix, loaded.matrix);
        assert_eq!(model.recommend("u2", 5), loaded.recommend("u2", 5));
    }

    #[test]
    fn test_content_round_trip_reproduces_similarity() {
        let model = trained_content();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONTENT_ARTIFACT);

        save_content(&model, &path).unwrap();
        let loaded = load_content(&path).unwrap();

        assert_eq!(model.features, loaded.features);
        assert_eq!(model.similar_items("p1", 5), loaded.similar_items("p1", 5));
        assert_eq!(model.schema(), loaded.schema());
    }

    #[test]
    fn test_missing_artifact_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_collaborative(&dir.path().join("absent.bin"));
        assert!(matches!(
            result,
            Err(StorefrontError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_corrupt_artifact_is_model_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a model").unwrap();

        assert!(matches!(
            load_collaborative(&path),
            Err(StorefrontError::ModelUnavailable { .. })
        ));
        assert!(matches!(
            load_content(&path),
            Err(StorefrontError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_fails_closed() {
        let model = trained_collaborative();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(COLLABORATIVE_ARTIFACT);
        save_collaborative(&model, &path).unwrap();

        // Corrupt the leading version field
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[0] = 99;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            load_collaborative(&path),
            Err(StorefrontError::ModelUnavailable { .. })
        ));
    }
}

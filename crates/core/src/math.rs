//! Vector and matrix math utilities for similarity computation
//!
//! Cosine similarity here follows the convention used throughout the engine:
//! the similarity of an all-zero vector with anything is 0, never NaN.

use ndarray::{Array2, ArrayView2};

/// Dot product of two equal-length slices
pub fn dot_product(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Cosine similarity between two vectors, 0.0 when either vector is all-zero
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot = dot_product(a, b);
    let norm_a = dot_product(a, a).sqrt();
    let norm_b = dot_product(b, b).sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Pairwise cosine similarity over the rows of a matrix.
///
/// Returns a symmetric n x n matrix. Diagonal entries are fixed at 1.0 so that
/// self-similarity is well defined even for all-zero rows.
pub fn pairwise_cosine_rows(rows: ArrayView2<'_, f64>) -> Array2<f64> {
    let n = rows.nrows();
    let mut similarity = Array2::<f64>::zeros((n, n));

    let norms: Vec<f64> = (0..n)
        .map(|i| rows.row(i).dot(&rows.row(i)).sqrt())
        .collect();

    for i in 0..n {
        similarity[[i, i]] = 1.0;
        for j in (i + 1)..n {
            let value = if norms[i] == 0.0 || norms[j] == 0.0 {
                0.0
            } else {
                rows.row(i).dot(&rows.row(j)) / (norms[i] * norms[j])
            };
            similarity[[i, j]] = value;
            similarity[[j, i]] = value;
        }
    }

    similarity
}

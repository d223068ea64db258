//! Truncated SVD of the user-item interaction matrix
//!
//! Decomposes the interaction matrix into rank-k latent factors whose product
//! approximates the original matrix. Singular vectors are extracted by power
//! iteration with deflation on the item-side Gram matrix; singular values are
//! folded into the user factors, so a prediction is the plain dot product of a
//! user-factor row and an item-factor row.

use ndarray::{Array1, Array2};
use rand::Rng;
use storefront_core::{Result, StorefrontError};
use tracing::debug;

const MAX_POWER_ITERATIONS: usize = 300;
const CONVERGENCE_TOLERANCE: f64 = 1e-10;

/// Rank-k latent factor matrices
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactors {
    /// `n_users x k`, rows are U * Sigma
    pub user_factors: Array2<f64>,
    /// `n_items x k`, rows are V
    pub item_factors: Array2<f64>,
}

impl LatentFactors {
    /// Number of latent dimensions
    pub fn rank(&self) -> usize {
        self.user_factors.ncols()
    }

    /// Predicted score for a (user index, item index) pair
    pub fn predict(&self, user_idx: usize, item_idx: usize) -> f64 {
        self.user_factors
            .row(user_idx)
            .dot(&self.item_factors.row(item_idx))
    }
}

/// Compute a rank-`rank` truncated SVD of `matrix`.
///
/// `rank` must be strictly less than `min(n_users, n_items)`.
pub fn truncated_svd(matrix: &Array2<f64>, rank: usize) -> Result<LatentFactors> {
    let (n_users, n_items) = matrix.dim();
    let min_dim = n_users.min(n_items);

    if rank == 0 {
        return Err(StorefrontError::config("factorization rank must be positive"));
    }
    if rank >= min_dim {
        return Err(StorefrontError::config(format!(
            "factorization rank {rank} must be less than min(n_users={n_users}, n_items={n_items})"
        )));
    }

    // Item-side Gram matrix; its eigenvectors are the right singular vectors.
    let gram = matrix.t().dot(matrix);

    let mut right_vectors: Vec<Array1<f64>> = Vec::with_capacity(rank);
    let mut rng = rand::thread_rng();

    for factor in 0..rank {
        let mut v = Array1::from_shape_fn(n_items, |_| rng.gen_range(-1.0..1.0));
        orthogonalize(&mut v, &right_vectors);
        if !normalize(&mut v) {
            // Degenerate start vector; fall back to a basis vector.
            v.fill(0.0);
            v[factor % n_items] = 1.0;
            orthogonalize(&mut v, &right_vectors);
            normalize(&mut v);
        }

        let mut eigenvalue = 0.0;
        for iteration in 0..MAX_POWER_ITERATIONS {
            let mut next = gram.dot(&v);
            orthogonalize(&mut next, &right_vectors);

            if !normalize(&mut next) {
                // Remaining spectrum is numerically zero; keep the current
                // orthonormal direction with a zero singular value.
                eigenvalue = 0.0;
                break;
            }

            let next_eigenvalue = next.dot(&gram.dot(&next));
            let delta = (next_eigenvalue - eigenvalue).abs();
            v = next;
            eigenvalue = next_eigenvalue;

            if delta <= CONVERGENCE_TOLERANCE * eigenvalue.max(1.0) {
                debug!(factor, iteration, eigenvalue, "power iteration converged");
                break;
            }
        }

        right_vectors.push(v);
    }

    let mut item_factors = Array2::<f64>::zeros((n_items, rank));
    for (j, v) in right_vectors.iter().enumerate() {
        item_factors.column_mut(j).assign(v);
    }

    // A . V = U . Sigma, which carries the singular values on the user side.
    let user_factors = matrix.dot(&item_factors);

    Ok(LatentFactors {
        user_factors,
        item_factors,
    })
}

/// Remove the projection of `v` onto each vector in `basis`
fn orthogonalize(v: &mut Array1<f64>, basis: &[Array1<f64>]) {
    for b in basis {
        let projection = v.dot(b);
        v.scaled_add(-projection, b);
    }
}

/// Scale `v` to unit length; returns false if `v` is numerically zero
fn normalize(v: &mut Array1<f64>) -> bool {
    let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm <= f64::EPSILON {
        return false;
    }
    v.mapv_inplace(|x| x / norm);
    true
}

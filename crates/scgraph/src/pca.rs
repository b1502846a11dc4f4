//! Highly variable gene selection and principal component analysis.
//!
//! These build the per-batch reference space in which the consensus
//! cell-type graph is measured.

use distances::Number;
use linfa_linalg::{eigh::EighInto, lobpcg::TruncatedSvd, Order};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::prelude::*;
use rayon::prelude::*;

use crate::utils::{arg_max, mean};

/// The number of equal-width bins of mean expression used to normalise
/// dispersions.
const NUM_BINS: usize = 20;

/// The mean used for genes that are never expressed.
const MIN_MEAN: f64 = 1e-12;

/// Problems whose smaller side is less than this many times the number of
/// components are decomposed densely instead of iteratively.
const DENSE_FACTOR: usize = 5;

/// The precision of the iterative decomposition.
const PRECISION: f32 = 1e-5;

/// The maximum number of iterations of the iterative decomposition.
const MAX_ITERATIONS: usize = 1000;

/// Selects the most highly variable genes.
///
/// The input is log-normalised expression. Moments are taken of the
/// un-logged values (`expm1`), the dispersion of each gene is its variance
/// over its mean, and the log dispersion is z-scored against the genes in the
/// same bin of `log1p(mean)`. A bin holding a single gene gives that gene a
/// normalised dispersion of 1. Genes with zero dispersion, such as constant
/// or silent genes, have no normalised dispersion and are ranked last.
///
/// # Arguments
///
/// * `x` - Expression values with cells as rows and genes as columns.
/// * `n_top` - The number of genes to select.
///
/// # Returns
///
/// The indices of the selected genes, sorted in increasing order.
#[must_use]
pub fn highly_variable_genes(x: ArrayView2<f32>, n_top: usize) -> Vec<usize> {
    let n_genes = x.ncols();
    if n_top >= n_genes {
        return (0..n_genes).collect();
    }

    let stats = (0..n_genes)
        .into_par_iter()
        .map(|g| {
            let column = x.column(g).iter().map(|&v| v.as_f64().exp_m1()).collect::<Vec<_>>();
            let mu = mean(&column);
            if column.iter().all(|&v| v.total_cmp(&column[0]).is_eq()) {
                return (mu.ln_1p(), f64::NAN);
            }
            let var = sample_variance(&column, mu);
            let dispersion = var / if mu > 0.0 { mu } else { MIN_MEAN };
            let dispersion = if dispersion > 0.0 && dispersion.is_finite() {
                dispersion.ln()
            } else {
                f64::NAN
            };
            (mu.ln_1p(), dispersion)
        })
        .collect::<Vec<_>>();

    let normalized = normalize_dispersions(&stats);

    let mut order = (0..n_genes).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let (a, b) = (normalized[a], normalized[b]);
        match (a.is_nan(), b.is_nan()) {
            (true, true) => core::cmp::Ordering::Equal,
            (true, false) => core::cmp::Ordering::Greater,
            (false, true) => core::cmp::Ordering::Less,
            (false, false) => b.total_cmp(&a),
        }
    });

    let mut selected = order.into_iter().take(n_top).collect::<Vec<_>>();
    selected.sort_unstable();
    selected
}

/// The sample variance, with one degree of freedom removed.
fn sample_variance<T: Number>(values: &[T], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    values
        .iter()
        .map(|&v| v.as_f64() - mean)
        .map(|v| v * v)
        .sum::<f64>()
        / (values.len() - 1).as_f64()
}

/// Z-scores log dispersions within bins of (log) mean expression.
///
/// Genes without a dispersion stay `NaN`, as do the genes of a bin whose
/// dispersions are all equal.
fn normalize_dispersions(stats: &[(f64, f64)]) -> Vec<f64> {
    let (lo, hi) = stats
        .iter()
        .map(|&(m, _)| m)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), m| (lo.min(m), hi.max(m)));
    let width = (hi - lo) / NUM_BINS.as_f64();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bin_of = |m: f64| {
        if width > 0.0 {
            (((m - lo) / width).floor() as usize).min(NUM_BINS - 1)
        } else {
            0
        }
    };

    let mut bins = vec![Vec::new(); NUM_BINS];
    for (g, &(m, d)) in stats.iter().enumerate() {
        if !d.is_nan() {
            bins[bin_of(m)].push(g);
        }
    }

    let mut normalized = vec![f64::NAN; stats.len()];
    for genes in bins.iter().filter(|genes| !genes.is_empty()) {
        if genes.len() == 1 {
            normalized[genes[0]] = 1.0;
            continue;
        }
        let dispersions = genes.iter().map(|&g| stats[g].1).collect::<Vec<_>>();
        let mu = mean(&dispersions);
        let sd = sample_variance(&dispersions, mu).sqrt();
        if sd > 0.0 {
            for (&g, &d) in genes.iter().zip(dispersions.iter()) {
                normalized[g] = (d - mu) / sd;
            }
        }
    }

    normalized
}

/// A fitted principal component analysis.
#[derive(Debug, Clone)]
pub struct Pca {
    /// The mean of each input feature.
    means: Array1<f64>,
    /// The principal axes, one per column, with shape `(features, components)`.
    components: Array2<f64>,
    /// The variance explained by each component, in decreasing order.
    explained_variance: Vec<f64>,
}

impl Pca {
    /// Fits the principal components of `x`.
    ///
    /// The data are centred and decomposed with a truncated SVD (LOBPCG).
    /// Small problems, where fewer than five times `n_comps` samples or
    /// features are available, use a dense symmetric eigen decomposition
    /// instead. The sign of each component is fixed so that its largest
    /// loading is positive.
    ///
    /// Components with a numerically zero variance are dropped, so fewer
    /// than `n_comps` components may be returned.
    ///
    /// # Arguments
    ///
    /// * `x` - The data with samples as rows.
    /// * `n_comps` - The requested number of components. It is clipped to
    ///   `min(samples - 1, features)`.
    /// * `seed` - The seed for the starting subspace of the truncated SVD.
    ///
    /// # Errors
    ///
    /// * If fewer than two samples or no features are given.
    /// * If `n_comps` is zero.
    /// * If the decomposition fails.
    pub fn fit(x: ArrayView2<f32>, n_comps: usize, seed: u64) -> Result<Self, String> {
        let (n, d) = x.dim();
        if n < 2 || d == 0 {
            return Err(format!("Cannot fit PCA to data of shape ({n}, {d})."));
        }
        if n_comps == 0 {
            return Err("The number of components must be positive.".to_string());
        }
        let k = n_comps.min(n - 1).min(d);

        let x = x.mapv(|v| v.as_f64());
        let means = x.mean_axis(Axis(0)).ok_or("Cannot centre empty data.")?;
        let centred = &x - &means;

        let (mut components, explained_variance) = if n.min(d) < DENSE_FACTOR * k {
            dense_decomposition(&centred, k)?
        } else {
            truncated_decomposition(centred, k, seed)?
        };

        for mut column in components.axis_iter_mut(Axis(1)) {
            let abs = column.iter().map(|v| v.abs()).collect::<Vec<_>>();
            if let Some((i, _)) = arg_max(&abs) {
                if column[i] < 0.0 {
                    column.mapv_inplace(|v| -v);
                }
            }
        }

        ftlog::debug!(
            "Fitted {} principal components to data of shape ({n}, {d}).",
            components.ncols()
        );

        Ok(Self {
            means,
            components,
            explained_variance,
        })
    }

    /// Projects `x` onto the principal components.
    ///
    /// # Errors
    ///
    /// * If `x` does not have the same number of features as the fitted data.
    pub fn transform(&self, x: ArrayView2<f32>) -> Result<Array2<f32>, String> {
        if x.ncols() != self.means.len() {
            return Err(format!(
                "Expected {} features but found {}.",
                self.means.len(),
                x.ncols()
            ));
        }
        let centred = &x.mapv(|v| v.as_f64()) - &self.means;
        Ok(centred.dot(&self.components).mapv(|v| v.as_f32()))
    }

    /// The principal axes, with shape `(features, components)`.
    #[must_use]
    pub const fn components(&self) -> &Array2<f64> {
        &self.components
    }

    /// The variance explained by each component, in decreasing order.
    #[must_use]
    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    /// The number of fitted components.
    #[must_use]
    pub fn n_comps(&self) -> usize {
        self.components.ncols()
    }
}

/// The leading `k` right singular vectors of the centred data, found with
/// the seeded LOBPCG solver, and the variances they explain.
fn truncated_decomposition(
    centred: Array2<f64>,
    k: usize,
    seed: u64,
) -> Result<(Array2<f64>, Vec<f64>), String> {
    let n = centred.nrows();
    let (_, sigma, vt) = TruncatedSvd::new_with_rng(centred, Order::Largest, StdRng::seed_from_u64(seed))
        .precision(PRECISION)
        .maxiter(MAX_ITERATIONS)
        .decompose(k)
        .map_err(|e| e.to_string())?
        .values_vectors();

    let variances = sigma.iter().map(|s| s * s / (n - 1).as_f64()).collect();
    Ok((vt.reversed_axes(), variances))
}

/// The leading `k` eigenvectors of the covariance, found with a dense
/// symmetric eigen decomposition, and their eigenvalues.
///
/// With fewer samples than features, the smaller Gram matrix is decomposed
/// and its eigenvectors are mapped back to feature space.
fn dense_decomposition(centred: &Array2<f64>, k: usize) -> Result<(Array2<f64>, Vec<f64>), String> {
    let (n, d) = centred.dim();
    let scale = (n - 1).as_f64();

    let gram = n < d;
    let matrix = if gram {
        centred.dot(&centred.t()) / scale
    } else {
        centred.t().dot(centred) / scale
    };
    let (values, vectors) = matrix.eigh_into().map_err(|e| e.to_string())?;

    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    let cutoff = values[order[0]].max(0.0) * f64::EPSILON * d.max(n).as_f64();
    order.retain(|&i| values[i] > cutoff);
    order.truncate(k);

    let variances = order.iter().map(|&i| values[i]).collect::<Vec<_>>();
    let mut components = vectors.select(Axis(1), &order);
    if gram {
        // v = X^T u / sqrt(lambda * (n - 1))
        components = centred.t().dot(&components);
        for (mut column, &lambda) in components.axis_iter_mut(Axis(1)).zip(variances.iter()) {
            let norm = (lambda * scale).sqrt();
            column.mapv_inplace(|v| v / norm);
        }
    }

    Ok((components, variances))
}

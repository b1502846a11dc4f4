//! Correlation coefficients used to compare cell-type graphs.
//!
//! All functions return `NaN` when the coefficient is undefined, i.e. when
//! fewer than two pairs are given or when either vector is constant. Callers
//! are expected to skip such values with [`nan_mean`](crate::utils::nan_mean).

use distances::Number;

use crate::utils::{mean, ranks};

/// Pearson correlation coefficient.
///
/// Measures linear correlation between two vectors, where 1 is a perfect
/// positive correlation, 0 is no correlation, and -1 is a perfect negative
/// correlation.
///
/// Elements past the end of the shorter vector are ignored.
///
/// # Examples
///
/// ```
/// use scgraph::correlation::pearson;
///
/// let x = [1.0, 2.0, 3.0];
/// let y = [2.0, 4.0, 6.0];
///
/// assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
/// ```
pub fn pearson<T: Number>(x: &[T], y: &[T]) -> f64 {
    let n = x.len().min(y.len());
    let (x, y) = (&x[..n], &y[..n]);
    if n < 2 {
        return f64::NAN;
    }

    let x_mean = mean(x);
    let y_mean = mean(y);

    let (covariance, var_x, var_y) = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (xi.as_f64() - x_mean, yi.as_f64() - y_mean))
        .fold((0.0, 0.0, 0.0), |(c, vx, vy), (dx, dy)| {
            (dx.mul_add(dy, c), dx.mul_add(dx, vx), dy.mul_add(dy, vy))
        });

    if var_x <= 0.0 || var_y <= 0.0 {
        return f64::NAN;
    }

    (covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

/// Spearman rank correlation coefficient.
///
/// This is the Pearson correlation of the ranks of the values, with tied
/// values receiving their average rank.
pub fn spearman<T: Number>(x: &[T], y: &[T]) -> f64 {
    let n = x.len().min(y.len());
    let x = x[..n].iter().map(|&v| v.as_f64()).collect::<Vec<_>>();
    let y = y[..n].iter().map(|&v| v.as_f64()).collect::<Vec<_>>();
    pearson(&ranks(&x), &ranks(&y))
}

/// Weighted Pearson correlation coefficient.
///
/// The means, covariance and variances are all weighted by `w`. Pairs with a
/// non-finite or negative weight are ignored.
///
/// # Arguments
///
/// * `x`: A slice of numbers.
/// * `y`: A slice of numbers.
/// * `w`: The weight of each pair.
pub fn weighted_pearson<T: Number>(x: &[T], y: &[T], w: &[f64]) -> f64 {
    let triples = x
        .iter()
        .zip(y.iter())
        .zip(w.iter())
        .filter(|(_, &wi)| wi.is_finite() && wi >= 0.0)
        .map(|((&xi, &yi), &wi)| (xi.as_f64(), yi.as_f64(), wi))
        .collect::<Vec<_>>();

    let total = triples.iter().map(|&(_, _, wi)| wi).sum::<f64>();
    if triples.len() < 2 || total <= 0.0 {
        return f64::NAN;
    }

    let x_mean = triples.iter().map(|&(xi, _, wi)| xi * wi).sum::<f64>() / total;
    let y_mean = triples.iter().map(|&(_, yi, wi)| yi * wi).sum::<f64>() / total;

    let (covariance, var_x, var_y) = triples
        .iter()
        .map(|&(xi, yi, wi)| (xi - x_mean, yi - y_mean, wi))
        .fold((0.0, 0.0, 0.0), |(c, vx, vy), (dx, dy, wi)| {
            ((wi * dx).mul_add(dy, c), (wi * dx).mul_add(dx, vx), (wi * dy).mul_add(dy, vy))
        });

    if var_x <= 0.0 || var_y <= 0.0 {
        return f64::NAN;
    }

    (covariance / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0)
}

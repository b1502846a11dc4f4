//! Statistical helpers shared by the rest of the crate.

use core::cmp::Ordering;

use distances::Number;

/// Return the index and value of the maximum value in the given slice of values.
///
/// NAN values are ordered as smaller than all other values.
///
/// This will return `None` if the given slice is empty.
pub fn arg_max<T: PartialOrd + Copy>(values: &[T]) -> Option<(usize, T)> {
    values
        .iter()
        .enumerate()
        .max_by(|&(_, l), &(_, r)| l.partial_cmp(r).unwrap_or(Ordering::Less))
        .map(|(i, v)| (i, *v))
}

/// Return the mean value of the given slice of values.
///
/// The mean of an empty slice is `NaN`.
pub fn mean<T: Number>(values: &[T]) -> f64 {
    values.iter().map(|&v| v.as_f64()).sum::<f64>() / values.len().as_f64()
}

/// Return the population variance of the given slice of values.
pub fn variance<T: Number>(values: &[T], mean: f64) -> f64 {
    values
        .iter()
        .map(|&v| v.as_f64() - mean)
        .map(|v| v * v)
        .sum::<f64>()
        / values.len().as_f64()
}

/// Calculate the mean and population variance of the given values in a
/// single pass.
pub fn mean_variance<T: Number>(values: &[T]) -> (f64, f64) {
    let n = values.len().as_f64();
    let (sum, sum_squares) = values
        .iter()
        .map(|&x| x.as_f64())
        .fold((0.0, 0.0), |(sum, sum_squares), x| (sum + x, x.mul_add(x, sum_squares)));

    let mean = sum / n;
    let variance = mean.mul_add(-mean, sum_squares / n);

    (mean, variance)
}

/// Return the mean of the values that are not `NaN`.
///
/// Returns `NaN` if there are no such values.
#[must_use]
pub fn nan_mean(values: &[f64]) -> f64 {
    let (sum, count) = values
        .iter()
        .filter(|v| !v.is_nan())
        .fold((0.0, 0_usize), |(sum, count), &v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count.as_f64()
    }
}

/// Compute the trimmed mean of the given values.
///
/// The values are sorted and `floor(proportion * n)` values are cut from
/// each end before averaging the remainder.
///
/// # Arguments
///
/// * `values` - The values to average.
/// * `proportion` - The fraction to cut from each end, in `[0, 0.5)`.
///
/// # Errors
///
/// * If `values` is empty.
/// * If `proportion` is not in `[0, 0.5)`.
/// * If trimming would remove every value.
pub fn trimmed_mean<T: Number>(values: &[T], proportion: f64) -> Result<f64, String> {
    if values.is_empty() {
        return Err("Cannot compute the trimmed mean of an empty slice.".to_string());
    }
    if !(0.0..0.5).contains(&proportion) {
        return Err(format!("Trim proportion must be in [0, 0.5), got {proportion}."));
    }

    let n = values.len();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let low = (proportion * n.as_f64()).floor() as usize;
    let high = n - low;
    if low >= high {
        return Err(format!("Trim proportion {proportion} is too large for {n} values."));
    }

    let mut sorted = values.iter().map(|&v| v.as_f64()).collect::<Vec<_>>();
    sorted.sort_by(f64::total_cmp);

    Ok(mean(&sorted[low..high]))
}

/// Return the 1-based ranks of the given values.
///
/// Tied values all receive the average of the ranks they span.
#[must_use]
pub fn ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        // positions `start..end` share the average of ranks `start + 1..=end`
        let rank = (start + end + 1).as_f64() / 2.0;
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        start = end;
    }

    ranks
}

#[cfg(test)]
mod tests {
    use rand::prelude::*;
    use test_case::test_case;

    use super::*;

    #[test]
    fn test_mean_variance() {
        let seed = 42;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut test_cases: Vec<Vec<f64>> = vec![
            vec![0.0],
            vec![0.0, 0.0],
            vec![1.0],
            vec![1.0, 2.0],
            vec![0.0, 0.25, 0.25, 1.25, 1.5, 1.75, 2.75, 3.25],
        ];
        for cardinality in [10, 1_000, 100_000] {
            test_cases.push((0..cardinality).map(|_| rng.gen_range(-100.0..100.0)).collect());
        }

        for values in &test_cases {
            let (actual_mean, actual_variance) = mean_variance(values);
            let expected_mean = statistical::mean(values);
            let expected_variance = statistical::population_variance(values, Some(expected_mean));

            assert!(
                float_cmp::approx_eq!(f64, actual_mean, expected_mean, epsilon = 1e-9),
                "Means not equal. Actual: {actual_mean}. Expected: {expected_mean}."
            );
            assert!(
                float_cmp::approx_eq!(f64, actual_variance, expected_variance, epsilon = 1e-4),
                "Variances not equal. Actual: {actual_variance}. Expected: {expected_variance}."
            );
            assert!(float_cmp::approx_eq!(
                f64,
                variance(values, mean(values)),
                expected_variance,
                epsilon = 1e-4
            ));
        }
    }

    #[test]
    fn test_nan_mean() {
        assert!(nan_mean(&[]).is_nan());
        assert!(nan_mean(&[f64::NAN, f64::NAN]).is_nan());
        assert!((nan_mean(&[1.0, f64::NAN, 3.0]) - 2.0).abs() < f64::EPSILON);
    }

    // Expected values agree with `scipy.stats.trim_mean`.
    #[test_case(&[1., 2., 3., 4., 5., 6., 7., 8., 9., 10.], 0.0, 5.5 ; "no trim")]
    #[test_case(&[1., 2., 3., 4., 5., 6., 7., 8., 9., 100.], 0.1, 5.5 ; "outlier removed")]
    #[test_case(&[1., 2., 3., 4., 5., 6., 7., 8., 9., 100.], 0.05, 14.5 ; "nothing cut below one element")]
    #[test_case(&[10., 1., 5., 3.], 0.25, 4.0 ; "unsorted input")]
    #[test_case(&[7.], 0.45, 7.0 ; "single value")]
    fn test_trimmed_mean(values: &[f64], proportion: f64, expected: f64) -> Result<(), String> {
        let actual = trimmed_mean(values, proportion)?;
        assert!(
            float_cmp::approx_eq!(f64, actual, expected, ulps = 4),
            "expected: {expected}, actual: {actual}"
        );
        Ok(())
    }

    #[test]
    fn test_trimmed_mean_errors() {
        assert!(trimmed_mean::<f32>(&[], 0.1).is_err());
        assert!(trimmed_mean(&[1.0_f32, 2.0], 0.5).is_err());
        assert!(trimmed_mean(&[1.0_f32, 2.0], -0.1).is_err());
    }

    #[test]
    fn test_ranks() {
        assert_eq!(ranks(&[3.0, 1.0, 2.0]), vec![3.0, 1.0, 2.0]);
        assert_eq!(ranks(&[1.0, 2.0, 2.0, 4.0]), vec![1.0, 2.5, 2.5, 4.0]);
        assert_eq!(ranks(&[5.0, 5.0, 5.0]), vec![2.0, 2.0, 2.0]);
        assert!(ranks(&[]).is_empty());
    }

    #[test]
    fn test_arg_max() {
        assert_eq!(arg_max(&[1.0, f64::NAN, 3.0, 2.0]), Some((2, 3.0)));
        assert_eq!(arg_max::<f64>(&[]), None);
    }
}

//! Robust per-cell-type centroids.

use std::collections::{BTreeMap, BTreeSet};

use distances::Number;
use ndarray::{ArrayView2, Axis};
use rayon::prelude::*;

use crate::utils::trimmed_mean;

/// The centroid of each cell type in some embedding space.
///
/// Labels are kept in lexicographic order and every centroid has the same
/// dimensionality.
#[derive(Debug, Clone, PartialEq)]
pub struct Centroids {
    /// The cell-type labels, sorted.
    labels: Vec<String>,
    /// The centroid of each label, in the same order as `labels`.
    centroids: Vec<Vec<f32>>,
    /// The number of cells that contributed to each centroid.
    counts: Vec<usize>,
}

impl Centroids {
    /// Computes the trimmed-mean centroid of each cell type.
    ///
    /// Each dimension is trimmed independently, so a centroid is robust to
    /// outlying cells along any single axis.
    ///
    /// # Arguments
    ///
    /// * `data` - The cells as rows.
    /// * `labels` - The cell type of each row. Empty labels are ignored.
    /// * `trim_rate` - The proportion to cut from each end of each dimension.
    /// * `keep` - If given, only these cell types are used.
    ///
    /// # Errors
    ///
    /// * If the number of labels does not match the number of rows.
    /// * If `trim_rate` is not in `[0, 0.5)`.
    /// * If no cell type remains.
    pub fn trimmed<S: AsRef<str> + Sync>(
        data: ArrayView2<f32>,
        labels: &[S],
        trim_rate: f64,
        keep: Option<&BTreeSet<String>>,
    ) -> Result<Self, String> {
        if labels.len() != data.nrows() {
            return Err(format!(
                "Number of labels does not match the number of rows. {} vs {}",
                labels.len(),
                data.nrows()
            ));
        }

        let mut groups = BTreeMap::<&str, Vec<usize>>::new();
        for (i, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            if label.is_empty() || keep.is_some_and(|keep| !keep.contains(label)) {
                continue;
            }
            groups.entry(label).or_default().push(i);
        }

        if groups.is_empty() {
            return Err("No cell types remain to compute centroids for.".to_string());
        }

        let centroids = groups
            .par_iter()
            .map(|(_, rows)| {
                let members = data.select(Axis(0), rows);
                members
                    .axis_iter(Axis(1))
                    .map(|column| {
                        let values = column.to_vec();
                        trimmed_mean(&values, trim_rate).map(|v| v.as_f32())
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let counts = groups.values().map(Vec::len).collect();
        let labels = groups.into_keys().map(ToString::to_string).collect();

        Ok(Self {
            labels,
            centroids,
            counts,
        })
    }

    /// Builds `Centroids` from already computed vectors.
    ///
    /// # Errors
    ///
    /// * If the number of labels and vectors differ.
    /// * If the labels are not unique.
    /// * If the vectors do not all have the same dimensionality.
    pub fn from_vectors(pairs: Vec<(String, Vec<f32>)>) -> Result<Self, String> {
        let mut pairs = pairs;
        pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
        if pairs.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err("Centroid labels must be unique.".to_string());
        }
        if let Some((_, first)) = pairs.first() {
            let dim = first.len();
            if pairs.iter().any(|(_, v)| v.len() != dim) {
                return Err("All centroids must have the same dimensionality.".to_string());
            }
        }

        let counts = vec![1; pairs.len()];
        let (labels, centroids) = pairs.into_iter().unzip();
        Ok(Self {
            labels,
            centroids,
            counts,
        })
    }

    /// The cell-type labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The centroid vectors, in the order of `labels`.
    #[must_use]
    pub fn vectors(&self) -> &[Vec<f32>] {
        &self.centroids
    }

    /// The number of cells behind each centroid.
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// The centroid of the given cell type.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&[f32]> {
        self.labels
            .binary_search_by(|l| l.as_str().cmp(label))
            .ok()
            .map(|i| self.centroids[i].as_slice())
    }

    /// The number of cell types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether there are no cell types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// The dimensionality of the centroids.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.centroids.first().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use ndarray::array;

    use super::Centroids;

    #[test]
    fn trimmed() -> Result<(), String> {
        let data = array![
            [0.0_f32, 0.0],
            [1.0, 2.0],
            [2.0, 4.0],
            [100.0, -100.0],
            [10.0, 10.0],
            [12.0, 12.0],
        ];
        let labels = ["a", "a", "a", "a", "b", "b"];

        let centroids = Centroids::trimmed(data.view(), &labels, 0.25, None)?;
        assert_eq!(centroids.labels(), &["a".to_string(), "b".to_string()]);
        assert_eq!(centroids.counts(), &[4, 2]);
        assert_eq!(centroids.dimensionality(), 2);
        // one value cut from each end of each dimension for "a"
        assert_eq!(centroids.get("a"), Some([1.5_f32, 1.0].as_slice()));
        assert_eq!(centroids.get("b"), Some([11.0_f32, 11.0].as_slice()));
        assert_eq!(centroids.get("c"), None);

        let centroids = Centroids::trimmed(data.view(), &labels, 0.0, None)?;
        assert_eq!(centroids.get("a"), Some([25.75_f32, -23.5].as_slice()));

        Ok(())
    }

    #[test]
    fn keep_and_skip() -> Result<(), String> {
        let data = array![[0.0_f32], [1.0], [2.0], [3.0]];
        let labels = ["a", "", "b", "c"];

        let keep = ["a", "c"].iter().map(ToString::to_string).collect::<BTreeSet<_>>();
        let centroids = Centroids::trimmed(data.view(), &labels, 0.0, Some(&keep))?;
        assert_eq!(centroids.labels(), &["a".to_string(), "c".to_string()]);

        let keep = BTreeSet::new();
        assert!(Centroids::trimmed(data.view(), &labels, 0.0, Some(&keep)).is_err());
        assert!(Centroids::trimmed(data.view(), &labels[..2], 0.0, None).is_err());

        Ok(())
    }

    #[test]
    fn from_vectors() -> Result<(), String> {
        let centroids = Centroids::from_vectors(vec![("b".to_string(), vec![1.0]), ("a".to_string(), vec![0.0])])?;
        assert_eq!(centroids.labels(), &["a".to_string(), "b".to_string()]);
        assert_eq!(centroids.get("b"), Some([1.0_f32].as_slice()));

        assert!(Centroids::from_vectors(vec![("a".to_string(), vec![1.0]), ("a".to_string(), vec![0.0])]).is_err());
        assert!(Centroids::from_vectors(vec![("a".to_string(), vec![1.0]), ("b".to_string(), vec![])]).is_err());

        Ok(())
    }
}

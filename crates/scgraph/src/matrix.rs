//! The weighted cell-type graph, stored as a labelled distance matrix.

use std::{collections::BTreeSet, path::Path};

use ndarray::{Array2, Axis};
use rayon::prelude::*;

use crate::{utils::nan_mean, Centroids, Metric};

/// A square, symmetric matrix of distances between cell types.
///
/// Rows and columns share the same sorted labels. The diagonal is zero and
/// missing entries are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    /// The cell-type labels, sorted.
    labels: Vec<String>,
    /// The distances, with `values[[i, j]]` between `labels[i]` and `labels[j]`.
    values: Array2<f64>,
}

impl DistanceMatrix {
    /// Builds the matrix from raw values.
    ///
    /// # Errors
    ///
    /// * If `values` is not square or its size does not match `labels`.
    /// * If the labels are not sorted and unique.
    pub fn new(labels: Vec<String>, values: Array2<f64>) -> Result<Self, String> {
        if values.nrows() != labels.len() || values.ncols() != labels.len() {
            return Err(format!(
                "Matrix of shape {:?} does not match {} labels.",
                values.shape(),
                labels.len()
            ));
        }
        if labels.windows(2).any(|w| w[0] >= w[1]) {
            return Err("Matrix labels must be sorted and unique.".to_string());
        }
        Ok(Self { labels, values })
    }

    /// Computes the pairwise distances between centroids.
    #[must_use]
    pub fn from_centroids(centroids: &Centroids, metric: Metric) -> Self {
        let vectors = centroids.vectors();
        let n = vectors.len();

        let rows = vectors
            .par_iter()
            .enumerate()
            .map(|(i, x)| {
                vectors
                    .iter()
                    .enumerate()
                    .map(|(j, y)| if i == j { 0.0 } else { metric.distance(x, y) })
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>();

        let values = Array2::from_shape_fn((n, n), |(i, j)| rows[i][j]);
        Self {
            labels: centroids.labels().to_vec(),
            values,
        }
    }

    /// Divides each column by its maximum.
    ///
    /// Columns whose maximum is zero or undefined are left unchanged.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        for mut column in self.values.axis_iter_mut(Axis(1)) {
            let max = column
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .fold(f64::NEG_INFINITY, f64::max);
            if max.is_finite() && max > 0.0 {
                column.mapv_inplace(|v| v / max);
            }
        }
        self
    }

    /// Averages several matrices into a consensus graph.
    ///
    /// The result covers the union of all labels. Each entry is the mean of
    /// that entry over the matrices in which both labels appear. The result
    /// is then column-normalised with [`normalized`](Self::normalized).
    ///
    /// # Errors
    ///
    /// * If `matrices` is empty.
    pub fn consensus(matrices: &[Self]) -> Result<Self, String> {
        if matrices.is_empty() {
            return Err("Cannot build a consensus from zero matrices.".to_string());
        }

        let labels = matrices
            .iter()
            .flat_map(|m| m.labels.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect::<Vec<_>>();
        let n = labels.len();

        // the position of each consensus label in each input matrix
        let positions = matrices
            .iter()
            .map(|m| labels.iter().map(|l| m.index_of(l)).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let values = Array2::from_shape_fn((n, n), |(i, j)| {
            if i == j {
                return 0.0;
            }
            let entries = matrices
                .iter()
                .zip(positions.iter())
                .filter_map(|(m, pos)| match (pos[i], pos[j]) {
                    (Some(a), Some(b)) => Some(m.values[[a, b]]),
                    _ => None,
                })
                .collect::<Vec<_>>();
            nan_mean(&entries)
        });

        ftlog::debug!("Built consensus over {} matrices with {n} cell types.", matrices.len());

        Ok(Self { labels, values }.normalized())
    }

    /// Keeps only the given labels, in sorted order.
    ///
    /// # Errors
    ///
    /// * If any of the labels is not in the matrix.
    pub fn restrict<S: AsRef<str>>(&self, labels: &[S]) -> Result<Self, String> {
        let mut labels = labels.iter().map(|l| l.as_ref().to_string()).collect::<Vec<_>>();
        labels.sort();
        labels.dedup();

        let indices = labels
            .iter()
            .map(|l| {
                self.index_of(l)
                    .ok_or_else(|| format!("Label {l} is not in the matrix."))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let values = self.values.select(Axis(0), &indices).select(Axis(1), &indices);
        Ok(Self { labels, values })
    }

    /// The labels present in both matrices, sorted.
    #[must_use]
    pub fn shared_labels(&self, other: &Self) -> Vec<String> {
        self.labels
            .iter()
            .filter(|l| other.index_of(l).is_some())
            .cloned()
            .collect()
    }

    /// The index of the given label.
    #[must_use]
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).ok()
    }

    /// The distance between two cell types, if both are present.
    #[must_use]
    pub fn get(&self, row: &str, col: &str) -> Option<f64> {
        Some(self.values[[self.index_of(row)?, self.index_of(col)?]])
    }

    /// The distances from the `j`th cell type to every other cell type.
    ///
    /// The self-distance on the diagonal is excluded, so the result has one
    /// fewer element than there are labels.
    #[must_use]
    pub fn column(&self, j: usize) -> Vec<f64> {
        self.values
            .column(j)
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != j)
            .map(|(_, &v)| v)
            .collect()
    }

    /// The cell-type labels, sorted.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// The raw distances.
    #[must_use]
    pub const fn values(&self) -> &Array2<f64> {
        &self.values
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

    /// Writes the matrix to a `.csv` file with a header row of labels.
    ///
    /// Missing entries are written as `NaN`.
    ///
    /// # Errors
    ///
    /// * If the file cannot be created or written.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;

        let header = core::iter::once(String::new()).chain(self.labels.iter().cloned());
        writer.write_record(header).map_err(|e| e.to_string())?;

        for (label, row) in self.labels.iter().zip(self.values.axis_iter(Axis(0))) {
            let record = core::iter::once(label.clone()).chain(row.iter().map(ToString::to_string));
            writer.write_record(record).map_err(|e| e.to_string())?;
        }

        writer.flush().map_err(|e| e.to_string())
    }

    /// Reads a matrix written by [`write_csv`](Self::write_csv).
    ///
    /// # Errors
    ///
    /// * If the file cannot be read.
    /// * If a value cannot be parsed.
    /// * If the row labels do not match the header.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| e.to_string())?;

        let labels = reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .skip(1)
            .map(ToString::to_string)
            .collect::<Vec<_>>();

        let mut values = Vec::with_capacity(labels.len() * labels.len());
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| e.to_string())?;
            if record.get(0) != labels.get(i).map(String::as_str) {
                return Err(format!("Row {i} label does not match the header."));
            }
            for field in record.iter().skip(1) {
                let v = field
                    .parse::<f64>()
                    .map_err(|_| format!("Could not parse {field} as a distance."))?;
                values.push(v);
            }
        }

        let n = labels.len();
        if values.len() != n * n {
            return Err(format!("Expected {} values but found {}.", n * n, values.len()));
        }
        let values = Array2::from_shape_vec((n, n), values).map_err(|e| e.to_string())?;
        Self::new(labels, values)
    }

    /// The largest absolute difference between the matching entries of two
    /// matrices with the same labels.
    ///
    /// Returns `None` if the labels differ.
    #[must_use]
    pub fn max_abs_diff(&self, other: &Self) -> Option<f64> {
        if self.labels != other.labels {
            return None;
        }
        let diff = self
            .values
            .iter()
            .zip(other.values.iter())
            .filter(|(a, b)| !a.is_nan() && !b.is_nan())
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max);
        Some(diff)
    }

    /// The number of entries that are `NaN`, excluding the diagonal.
    #[must_use]
    pub fn num_missing(&self) -> usize {
        self.values
            .indexed_iter()
            .filter(|&((i, j), v)| i != j && v.is_nan())
            .count()
    }
}

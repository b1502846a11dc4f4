//! Configuration of the evaluation.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Metric;

/// Parameters controlling how the consensus graph is built and how
/// embeddings are scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// The obs column holding the batch of each cell.
    pub batch_key: String,
    /// The obs column holding the cell type of each cell.
    pub label_key: String,
    /// The proportion trimmed from each end of each dimension when computing
    /// centroids.
    pub trim_rate: f64,
    /// Batches with fewer cells than this do not contribute to the consensus.
    pub thres_batch: usize,
    /// Cell types with fewer cells than this are ignored everywhere.
    pub thres_celltype: usize,
    /// Only score embeddings whose key contains `umap`.
    pub only_umap: bool,
    /// The number of highly variable genes used for each batch's PCA.
    pub n_top_genes: usize,
    /// The number of principal components for each batch.
    pub n_comps: usize,
    /// The distance between centroids.
    pub metric: Metric,
    /// The seed for the PCA solver.
    pub seed: u64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            batch_key: "batch".to_string(),
            label_key: "cell_type".to_string(),
            trim_rate: 0.05,
            thres_batch: 100,
            thres_celltype: 10,
            only_umap: true,
            n_top_genes: 1000,
            n_comps: 10,
            metric: Metric::Euclidean,
            seed: 42,
        }
    }
}

impl Params {
    /// Sets the obs column holding the batch of each cell.
    #[must_use]
    pub fn with_batch_key(mut self, batch_key: &str) -> Self {
        self.batch_key = batch_key.to_string();
        self
    }

    /// Sets the obs column holding the cell type of each cell.
    #[must_use]
    pub fn with_label_key(mut self, label_key: &str) -> Self {
        self.label_key = label_key.to_string();
        self
    }

    /// Sets the trim rate.
    #[must_use]
    pub const fn with_trim_rate(mut self, trim_rate: f64) -> Self {
        self.trim_rate = trim_rate;
        self
    }

    /// Sets the minimum batch size.
    #[must_use]
    pub const fn with_thres_batch(mut self, thres_batch: usize) -> Self {
        self.thres_batch = thres_batch;
        self
    }

    /// Sets the minimum cell-type size.
    #[must_use]
    pub const fn with_thres_celltype(mut self, thres_celltype: usize) -> Self {
        self.thres_celltype = thres_celltype;
        self
    }

    /// Sets whether only UMAP embeddings are scored.
    #[must_use]
    pub const fn with_only_umap(mut self, only_umap: bool) -> Self {
        self.only_umap = only_umap;
        self
    }

    /// Sets the number of highly variable genes.
    #[must_use]
    pub const fn with_n_top_genes(mut self, n_top_genes: usize) -> Self {
        self.n_top_genes = n_top_genes;
        self
    }

    /// Sets the number of principal components.
    #[must_use]
    pub const fn with_n_comps(mut self, n_comps: usize) -> Self {
        self.n_comps = n_comps;
        self
    }

    /// Sets the distance between centroids.
    #[must_use]
    pub const fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the random seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks that the parameters are usable.
    ///
    /// # Errors
    ///
    /// * If `trim_rate` is not in `[0, 0.5)`.
    /// * If `n_comps` or `n_top_genes` is zero.
    /// * If the batch and label keys are empty or equal.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..0.5).contains(&self.trim_rate) {
            return Err(format!("trim_rate must be in [0, 0.5), got {}", self.trim_rate));
        }
        if self.n_comps == 0 {
            return Err("n_comps must be positive".to_string());
        }
        if self.n_top_genes == 0 {
            return Err("n_top_genes must be positive".to_string());
        }
        if self.batch_key.is_empty() || self.label_key.is_empty() {
            return Err("batch_key and label_key must not be empty".to_string());
        }
        if self.batch_key == self.label_key {
            return Err(format!("batch_key and label_key are both {}", self.batch_key));
        }
        Ok(())
    }

    /// Whether an embedding with the given key should be scored.
    #[must_use]
    pub fn selects(&self, key: &str) -> bool {
        !self.only_umap || key.to_lowercase().contains("umap")
    }

    /// Parses parameters from a JSON file without validating them. Missing
    /// fields take their default values.
    ///
    /// Use this when the values are to be adjusted before use, and call
    /// [`Params::validate`] afterwards.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed.
    pub fn parse_json<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&contents).map_err(|e| e.to_string())
    }

    /// Reads parameters from a JSON file. Missing fields take their default
    /// values.
    ///
    /// # Errors
    ///
    /// * If the file cannot be read or parsed.
    /// * If the parameters are invalid.
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let params = Self::parse_json(path)?;
        params.validate()?;
        Ok(params)
    }

    /// Writes the parameters to a JSON file.
    ///
    /// # Errors
    ///
    /// * If the parameters cannot be serialized or the file cannot be written.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        std::fs::write(path, contents).map_err(|e| e.to_string())
    }
}

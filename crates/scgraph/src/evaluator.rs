//! The `ScGraph` evaluator.

use std::{
    collections::{BTreeMap, BTreeSet},
    path::Path,
};

use ndarray::Axis;
use rayon::prelude::*;

use crate::{
    correlation::{pearson, spearman, weighted_pearson},
    pca::{highly_variable_genes, Pca},
    report::CellTypeScore,
    utils::nan_mean,
    AnnData, Centroids, DistanceMatrix, Evaluation, Params, Report,
};

/// Evaluates single-cell embeddings using graph-based relationships.
///
/// Cell types are the vertices of a weighted graph whose edges are the
/// distances between trimmed-mean centroids. Each sufficiently large batch
/// yields such a graph in its own PCA space, and the graphs are averaged into
/// a consensus. An embedding is scored by how well, for each cell type, its
/// distances to the other cell types correlate with the consensus.
///
/// # Examples
///
/// ```no_run
/// use scgraph::{Params, ScGraph};
///
/// let params = Params::default().with_label_key("celltype").with_only_umap(false);
/// let mut graph = ScGraph::from_dir("data", params)?;
/// let report = graph.run()?;
/// report.write_csv("report.csv")?;
/// # Ok::<(), String>(())
/// ```
#[derive(Debug, Clone)]
pub struct ScGraph {
    /// The cells.
    adata: AnnData,
    /// The configuration.
    params: Params,
    /// Cell types with enough cells to be scored.
    kept_celltypes: BTreeSet<String>,
    /// Cell types with too few cells.
    ignored_celltypes: BTreeSet<String>,
    /// The rows of each batch large enough to join the consensus.
    batches: BTreeMap<String, Vec<usize>>,
    /// Batches with too few cells.
    skipped_batches: Vec<String>,
    /// The consensus graph, once built.
    consensus: Option<DistanceMatrix>,
}

impl ScGraph {
    /// Prepares the evaluation of the embeddings in `adata`.
    ///
    /// Cell types with fewer than `thres_celltype` cells are ignored and
    /// batches with fewer than `thres_batch` cells are left out of the
    /// consensus. Cells with an empty label are ignored.
    ///
    /// # Errors
    ///
    /// * If the parameters are invalid.
    /// * If the batch or label column is missing.
    /// * If no cell type or no batch passes its threshold.
    pub fn new(adata: AnnData, params: Params) -> Result<Self, String> {
        params.validate()?;

        let labels = adata.obs_column(&params.label_key)?;
        let mut celltype_counts = BTreeMap::<&str, usize>::new();
        for label in labels.iter().filter(|l| !l.is_empty()) {
            *celltype_counts.entry(label).or_default() += 1;
        }
        let (kept, ignored): (Vec<_>, Vec<_>) = celltype_counts
            .into_iter()
            .partition(|&(_, count)| count >= params.thres_celltype);
        let kept_celltypes = kept.into_iter().map(|(l, _)| l.to_string()).collect::<BTreeSet<_>>();
        let ignored_celltypes = ignored.into_iter().map(|(l, _)| l.to_string()).collect::<BTreeSet<_>>();
        if kept_celltypes.is_empty() {
            return Err(format!(
                "No cell type in column {} has at least {} cells.",
                params.label_key, params.thres_celltype
            ));
        }

        let mut all_batches = BTreeMap::<String, Vec<usize>>::new();
        for (i, batch) in adata.obs_column(&params.batch_key)?.iter().enumerate() {
            all_batches.entry(batch.clone()).or_default().push(i);
        }
        let (batches, skipped): (BTreeMap<_, _>, BTreeMap<_, _>) = all_batches
            .into_iter()
            .partition(|(_, rows)| rows.len() >= params.thres_batch);
        let skipped_batches = skipped.into_keys().collect::<Vec<_>>();
        if batches.is_empty() {
            return Err(format!(
                "No batch in column {} has at least {} cells.",
                params.batch_key, params.thres_batch
            ));
        }

        ftlog::info!(
            "Keeping {} cell types and {} batches. Ignoring cell types {:?} and batches {:?}.",
            kept_celltypes.len(),
            batches.len(),
            ignored_celltypes,
            skipped_batches
        );

        Ok(Self {
            adata,
            params,
            kept_celltypes,
            ignored_celltypes,
            batches,
            skipped_batches,
            consensus: None,
        })
    }

    /// Reads the data from a directory and prepares the evaluation.
    ///
    /// See [`AnnData::read_dir`] for the expected layout.
    ///
    /// # Errors
    ///
    /// See [`AnnData::read_dir`] and [`ScGraph::new`].
    pub fn from_dir<P: AsRef<Path>>(dir: P, params: Params) -> Result<Self, String> {
        Self::new(AnnData::read_dir(dir)?, params)
    }

    /// The cells being evaluated.
    #[must_use]
    pub const fn adata(&self) -> &AnnData {
        &self.adata
    }

    /// The configuration.
    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Cell types with enough cells to be scored.
    #[must_use]
    pub const fn kept_celltypes(&self) -> &BTreeSet<String> {
        &self.kept_celltypes
    }

    /// Cell types with too few cells.
    #[must_use]
    pub const fn ignored_celltypes(&self) -> &BTreeSet<String> {
        &self.ignored_celltypes
    }

    /// Batches that contribute to the consensus.
    #[must_use]
    pub fn batches(&self) -> Vec<&str> {
        self.batches.keys().map(String::as_str).collect()
    }

    /// Batches with too few cells.
    #[must_use]
    pub fn skipped_batches(&self) -> &[String] {
        &self.skipped_batches
    }

    /// The keys of the embeddings that [`run`](Self::run) will score.
    #[must_use]
    pub fn selected_embeddings(&self) -> Vec<&str> {
        self.adata
            .obsm()
            .keys()
            .filter(|k| self.params.selects(k))
            .map(String::as_str)
            .collect()
    }

    /// The cell-type graph of one batch in its own PCA space.
    ///
    /// Returns `None` if the batch holds none of the kept cell types.
    fn batch_graph(&self, batch: &str, rows: &[usize]) -> Result<Option<DistanceMatrix>, String> {
        let all_labels = self.adata.obs_column(&self.params.label_key)?;
        let labels = rows.iter().map(|&i| all_labels[i].as_str()).collect::<Vec<_>>();
        if !labels.iter().any(|l| self.kept_celltypes.contains(*l)) {
            ftlog::warn!("Batch {batch} has none of the kept cell types.");
            return Ok(None);
        }

        let x = self.adata.x_rows(rows);
        let genes = highly_variable_genes(x.view(), self.params.n_top_genes);
        let x = x.select(Axis(1), &genes);

        let pca = Pca::fit(x.view(), self.params.n_comps, self.params.seed)?;
        let embedded = pca.transform(x.view())?;

        let centroids = Centroids::trimmed(
            embedded.view(),
            labels.as_slice(),
            self.params.trim_rate,
            Some(&self.kept_celltypes),
        )?;
        ftlog::debug!(
            "Batch {batch}: {} cells, {} genes, {} components, {} cell types.",
            rows.len(),
            genes.len(),
            pca.n_comps(),
            centroids.len()
        );

        Ok(Some(
            DistanceMatrix::from_centroids(&centroids, self.params.metric).normalized(),
        ))
    }

    /// Builds the consensus graph from the per-batch graphs.
    fn build_consensus(&self) -> Result<DistanceMatrix, String> {
        ftlog::info!("Building consensus graph over {} batches...", self.batches.len());

        let graphs = self
            .batches
            .par_iter()
            .map(|(batch, rows)| self.batch_graph(batch, rows))
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();

        let consensus = DistanceMatrix::consensus(&graphs)?;
        if consensus.num_missing() > 0 {
            ftlog::warn!(
                "Consensus graph has {} missing edges between cell types that never share a batch.",
                consensus.num_missing()
            );
        }
        ftlog::info!("Consensus graph covers {} cell types.", consensus.len());
        Ok(consensus)
    }

    /// The consensus graph, built on first use.
    ///
    /// # Errors
    ///
    /// * If the PCA or the centroids of any batch cannot be computed.
    pub fn consensus(&mut self) -> Result<&DistanceMatrix, String> {
        if self.consensus.is_none() {
            self.consensus = Some(self.build_consensus()?);
        }
        self.consensus
            .as_ref()
            .ok_or_else(|| "Consensus graph was not built.".to_string())
    }

    /// The normalised cell-type graph of an embedding.
    ///
    /// # Errors
    ///
    /// * If there is no embedding with the given key.
    /// * If none of the kept cell types appear in it.
    pub fn embedding_graph(&self, key: &str) -> Result<DistanceMatrix, String> {
        let embedding = self.adata.embedding(key)?;
        let labels = self.adata.obs_column(&self.params.label_key)?;
        let centroids = Centroids::trimmed(embedding, labels, self.params.trim_rate, Some(&self.kept_celltypes))?;
        Ok(DistanceMatrix::from_centroids(&centroids, self.params.metric).normalized())
    }

    /// Scores one embedding against the consensus graph.
    ///
    /// # Errors
    ///
    /// * If the consensus graph cannot be built.
    /// * If there is no embedding with the given key.
    pub fn evaluate(&mut self, key: &str) -> Result<Evaluation, String> {
        self.consensus()?;
        let consensus = self
            .consensus
            .as_ref()
            .ok_or_else(|| "Consensus graph was not built.".to_string())?;
        let graph = self.embedding_graph(key)?;
        compare(key, &graph, consensus)
    }

    /// Scores every selected embedding.
    ///
    /// With `only_umap` set, only embeddings whose key contains `umap` are
    /// scored.
    ///
    /// # Errors
    ///
    /// * If the consensus graph cannot be built.
    /// * If any embedding cannot be scored.
    pub fn run(&mut self) -> Result<Report, String> {
        self.consensus()?;
        let consensus = self
            .consensus
            .as_ref()
            .ok_or_else(|| "Consensus graph was not built.".to_string())?;

        let keys = self.selected_embeddings();
        let skipped = self.adata.obsm().len() - keys.len();
        if skipped > 0 {
            ftlog::info!("Skipping {skipped} embeddings whose keys do not contain 'umap'.");
        }
        if keys.is_empty() {
            ftlog::warn!("No embeddings to evaluate.");
        }

        let rows = keys
            .par_iter()
            .map(|&key| {
                ftlog::info!("Evaluating {key}...");
                self.embedding_graph(key)
                    .and_then(|graph| compare(key, &graph, consensus))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Report::new(rows))
    }
}

/// Compares the graph of an embedding with the consensus graph.
///
/// Only cell types present in both graphs are compared, and for each cell
/// type only the edges that are defined in the consensus. The weighted score
/// weighs each edge by the inverse of its consensus length, so that
/// neighbouring cell types count the most.
fn compare(key: &str, graph: &DistanceMatrix, consensus: &DistanceMatrix) -> Result<Evaluation, String> {
    let shared = graph.shared_labels(consensus);
    if shared.len() < 3 {
        ftlog::warn!(
            "Embedding {key} shares only {} cell types with the consensus. Its scores are undefined.",
            shared.len()
        );
    }
    let graph = graph.restrict(&shared)?;
    let consensus = consensus.restrict(&shared)?;

    let per_celltype = shared
        .iter()
        .enumerate()
        .map(|(j, cell_type)| {
            let (x, y): (Vec<_>, Vec<_>) = graph
                .column(j)
                .into_iter()
                .zip(consensus.column(j))
                .filter(|(_, c)| !c.is_nan())
                .unzip();
            let w = y
                .iter()
                .map(|&c| if c > 0.0 { c.recip() } else { f64::NAN })
                .collect::<Vec<_>>();

            CellTypeScore {
                cell_type: cell_type.clone(),
                rank_pca: spearman(&x, &y),
                corr_pca: pearson(&x, &y),
                corr_weighted: weighted_pearson(&x, &y, &w),
            }
        })
        .collect::<Vec<_>>();

    let mean_of = |f: fn(&CellTypeScore) -> f64| nan_mean(&per_celltype.iter().map(f).collect::<Vec<_>>());
    let (rank_pca, corr_pca, corr_weighted) = (
        mean_of(|s| s.rank_pca),
        mean_of(|s| s.corr_pca),
        mean_of(|s| s.corr_weighted),
    );
    let evaluation = Evaluation {
        embedding: key.to_string(),
        rank_pca,
        corr_pca,
        corr_weighted,
        per_celltype,
    };

    ftlog::info!(
        "{key}: rank_pca = {:.4}, corr_pca = {:.4}, corr_weighted = {:.4}",
        evaluation.rank_pca,
        evaluation.corr_pca,
        evaluation.corr_weighted
    );
    Ok(evaluation)
}

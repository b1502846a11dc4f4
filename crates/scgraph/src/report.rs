//! Scores for evaluated embeddings.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// The scores of a single cell type within one embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellTypeScore {
    /// The cell type.
    pub cell_type: String,
    /// Spearman correlation of its distances against the consensus.
    pub rank_pca: f64,
    /// Pearson correlation of its distances against the consensus.
    pub corr_pca: f64,
    /// Pearson correlation weighted towards close cell types.
    pub corr_weighted: f64,
}

/// The scores of one embedding against the consensus graph.
///
/// Each score is the mean over cell types, skipping cell types whose score
/// is undefined. Higher is better, with a maximum of 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// The key of the embedding.
    pub embedding: String,
    /// Mean Spearman correlation.
    pub rank_pca: f64,
    /// Mean Pearson correlation.
    pub corr_pca: f64,
    /// Mean weighted Pearson correlation.
    pub corr_weighted: f64,
    /// The scores behind the means.
    pub per_celltype: Vec<CellTypeScore>,
}

/// The header of the report `.csv` file.
const HEADER: [&str; 4] = ["embedding", "rank_pca", "corr_pca", "corr_weighted"];

/// Evaluations of several embeddings, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// The evaluations.
    rows: Vec<Evaluation>,
}

impl Report {
    /// Creates a report, sorting the evaluations by embedding key.
    #[must_use]
    pub fn new(mut rows: Vec<Evaluation>) -> Self {
        rows.sort_by(|a, b| a.embedding.cmp(&b.embedding));
        Self { rows }
    }

    /// The evaluations.
    #[must_use]
    pub fn rows(&self) -> &[Evaluation] {
        &self.rows
    }

    /// The evaluation of the given embedding.
    #[must_use]
    pub fn get(&self, embedding: &str) -> Option<&Evaluation> {
        self.rows.iter().find(|r| r.embedding == embedding)
    }

    /// Whether the report has no evaluations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the summary scores to a `.csv` file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be created or written.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
        writer.write_record(HEADER).map_err(|e| e.to_string())?;
        for row in &self.rows {
            writer
                .write_record([
                    row.embedding.clone(),
                    row.rank_pca.to_string(),
                    row.corr_pca.to_string(),
                    row.corr_weighted.to_string(),
                ])
                .map_err(|e| e.to_string())?;
        }
        writer.flush().map_err(|e| e.to_string())
    }

    /// Writes the per-cell-type scores of every embedding to a `.csv` file.
    ///
    /// # Errors
    ///
    /// * If the file cannot be created or written.
    pub fn write_detail_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| e.to_string())?;
        writer
            .write_record(["embedding", "cell_type", "rank_pca", "corr_pca", "corr_weighted"])
            .map_err(|e| e.to_string())?;
        for row in &self.rows {
            for score in &row.per_celltype {
                writer
                    .write_record([
                        row.embedding.clone(),
                        score.cell_type.clone(),
                        score.rank_pca.to_string(),
                        score.corr_pca.to_string(),
                        score.corr_weighted.to_string(),
                    ])
                    .map_err(|e| e.to_string())?;
            }
        }
        writer.flush().map_err(|e| e.to_string())
    }
}

impl core::fmt::Display for Report {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let width = self
            .rows
            .iter()
            .map(|r| r.embedding.len())
            .chain(core::iter::once(HEADER[0].len()))
            .max()
            .unwrap_or_default();

        writeln!(
            f,
            "{:<width$}  {:>13}  {:>13}  {:>13}",
            HEADER[0], HEADER[1], HEADER[2], HEADER[3]
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<width$}  {:>13.4}  {:>13.4}  {:>13.4}",
                row.embedding, row.rank_pca, row.corr_pca, row.corr_weighted
            )?;
        }
        Ok(())
    }
}

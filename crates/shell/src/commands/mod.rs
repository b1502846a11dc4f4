//! The commands under the `scgraph` CLI.

mod consensus;
mod evaluate;

use std::path::PathBuf;

use clap::{Args, Subcommand};

pub use consensus::write_consensus;
pub use evaluate::evaluate_embeddings;

/// The subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score every embedding against the consensus graph.
    Evaluate {
        /// The path to the input directory holding `X.npy`, `obs.csv` and
        /// `obsm/`.
        #[arg(short('i'), long)]
        inp_dir: PathBuf,

        /// The path to the output `.csv` file for the scores.
        #[arg(short('o'), long)]
        out_path: Option<PathBuf>,

        /// The path to the output `.csv` file for the per-cell-type scores.
        #[arg(long)]
        detail_out: Option<PathBuf>,

        /// The path to the output `.csv` file for the consensus graph.
        #[arg(long)]
        consensus_out: Option<PathBuf>,

        /// The path to the output `.json` file for the parameters used.
        #[arg(long)]
        params_out: Option<PathBuf>,

        #[command(flatten)]
        options: ParamsArgs,
    },
    /// Build the consensus graph and write it to a `.csv` file.
    Consensus {
        /// The path to the input directory holding `X.npy`, `obs.csv` and
        /// `obsm/`.
        #[arg(short('i'), long)]
        inp_dir: PathBuf,

        /// The path to the output `.csv` file.
        #[arg(short('o'), long)]
        out_path: PathBuf,

        #[command(flatten)]
        options: ParamsArgs,
    },
}

/// Options shared by the subcommands. Those given override the values in
/// the `--params` file, which in turn override the defaults.
#[derive(Args, Debug)]
pub struct ParamsArgs {
    /// A JSON file of parameters.
    #[arg(short('p'), long)]
    params: Option<PathBuf>,

    /// The obs column holding the batch of each cell. [default: batch]
    #[arg(long)]
    batch_key: Option<String>,

    /// The obs column holding the cell type of each cell. [default: cell_type]
    #[arg(long)]
    label_key: Option<String>,

    /// The proportion trimmed from each end when computing centroids.
    /// [default: 0.05]
    #[arg(long)]
    trim_rate: Option<f64>,

    /// The minimum number of cells for a batch to join the consensus.
    /// [default: 100]
    #[arg(long)]
    thres_batch: Option<usize>,

    /// The minimum number of cells for a cell type to be scored.
    /// [default: 10]
    #[arg(long)]
    thres_celltype: Option<usize>,

    /// The number of highly variable genes per batch. [default: 1000]
    #[arg(long)]
    n_top_genes: Option<usize>,

    /// The number of principal components per batch. [default: 10]
    #[arg(long)]
    n_comps: Option<usize>,

    /// The distance between centroids. [default: euclidean]
    #[arg(short('m'), long)]
    metric: Option<crate::metrics::Metric>,

    /// Score every embedding instead of only those whose key contains
    /// `umap`. Pass `false` to restore the filter. [default: false]
    #[arg(short('a'), long, num_args = 0..=1, default_missing_value = "true")]
    all_embeddings: Option<bool>,
}

impl ParamsArgs {
    /// Builds the parameters from the file, the given options and the seed.
    ///
    /// # Errors
    ///
    /// * If the parameters file cannot be read.
    /// * If the resulting parameters are invalid.
    pub fn into_params(self, seed: Option<u64>) -> Result<scgraph::Params, String> {
        let mut params = match &self.params {
            Some(path) => scgraph::Params::parse_json(path)?,
            None => scgraph::Params::default(),
        };

        if let Some(batch_key) = self.batch_key {
            params.batch_key = batch_key;
        }
        if let Some(label_key) = self.label_key {
            params.label_key = label_key;
        }
        if let Some(trim_rate) = self.trim_rate {
            params.trim_rate = trim_rate;
        }
        if let Some(thres_batch) = self.thres_batch {
            params.thres_batch = thres_batch;
        }
        if let Some(thres_celltype) = self.thres_celltype {
            params.thres_celltype = thres_celltype;
        }
        if let Some(n_top_genes) = self.n_top_genes {
            params.n_top_genes = n_top_genes;
        }
        if let Some(n_comps) = self.n_comps {
            params.n_comps = n_comps;
        }
        if let Some(metric) = self.metric {
            params.metric = metric.scgraph_metric();
        }
        if let Some(all_embeddings) = self.all_embeddings {
            params.only_umap = !all_embeddings;
        }
        if let Some(seed) = seed {
            params.seed = seed;
        }

        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::ParamsArgs;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        options: ParamsArgs,
    }

    fn params_from(args: &[&str]) -> Result<scgraph::Params, String> {
        let cli = Cli::try_parse_from(std::iter::once("scgraph").chain(args.iter().copied()))
            .map_err(|e| e.to_string())?;
        cli.options.into_params(None)
    }

    #[test]
    fn defaults() -> Result<(), String> {
        assert_eq!(params_from(&[])?, scgraph::Params::default());
        Ok(())
    }

    #[test]
    fn file_then_flags() -> Result<(), String> {
        let tmp_dir = tempdir::TempDir::new("shell").map_err(|e| e.to_string())?;
        let path = tmp_dir.path().join("params.json");
        std::fs::write(&path, r#"{ "only_umap": false, "n_comps": 5, "trim_rate": 0.7 }"#)
            .map_err(|e| e.to_string())?;
        let path = path.to_string_lossy().to_string();

        // the file's trim rate is only checked after the flags are applied
        assert!(params_from(&["-p", path.as_str()]).is_err());

        let params = params_from(&["-p", path.as_str(), "--trim-rate", "0.1"])?;
        assert!(!params.only_umap);
        assert_eq!(params.n_comps, 5);
        assert!((params.trim_rate - 0.1).abs() < f64::EPSILON);

        let params = params_from(&["-p", path.as_str(), "--trim-rate", "0.1", "-a"])?;
        assert!(!params.only_umap);

        let params = params_from(&["-p", path.as_str(), "--trim-rate", "0.1", "--all-embeddings", "false"])?;
        assert!(params.only_umap);

        let params = params_from(&["-a", "--n-comps", "3"])?;
        assert!(!params.only_umap);
        assert_eq!(params.n_comps, 3);

        Ok(())
    }
}

//! Scoring embeddings.

use std::path::Path;

use scgraph::{Params, ScGraph};

/// Scores the embeddings stored in `inp_dir`.
///
/// The scores are printed as a table and, if requested, written to `.csv`
/// files along with the consensus graph.
///
/// # Errors
///
/// * If the data cannot be read.
/// * If the evaluation fails.
/// * If any of the outputs cannot be written.
pub fn evaluate_embeddings(
    inp_dir: &Path,
    out_path: Option<&Path>,
    detail_out: Option<&Path>,
    consensus_out: Option<&Path>,
    params: Params,
) -> Result<(), String> {
    ftlog::info!("Evaluating embeddings in {inp_dir:?} with {params:?}");

    let mut graph = ScGraph::from_dir(inp_dir, params)?;

    if let Some(path) = consensus_out {
        graph.consensus()?.write_csv(path)?;
        ftlog::info!("Wrote consensus graph to {path:?}");
    }

    let report = graph.run()?;
    println!("{report}");

    if let Some(path) = out_path {
        report.write_csv(path)?;
        ftlog::info!("Wrote scores to {path:?}");
    }
    if let Some(path) = detail_out {
        report.write_detail_csv(path)?;
        ftlog::info!("Wrote per-cell-type scores to {path:?}");
    }

    Ok(())
}

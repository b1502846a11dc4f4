//! Building the consensus graph alone.

use std::path::Path;

use scgraph::{Params, ScGraph};

/// Builds the consensus graph of the data in `inp_dir` and writes it to
/// `out_path`.
///
/// # Errors
///
/// * If the data cannot be read.
/// * If the consensus graph cannot be built or written.
pub fn write_consensus(inp_dir: &Path, out_path: &Path, params: Params) -> Result<(), String> {
    let mut graph = ScGraph::from_dir(inp_dir, params)?;
    let skipped = graph.skipped_batches().to_vec();

    let consensus = graph.consensus()?;
    consensus.write_csv(out_path)?;

    ftlog::info!(
        "Wrote consensus graph over {} cell types to {out_path:?}. Skipped batches: {skipped:?}",
        consensus.len()
    );
    Ok(())
}

mod common;

use float_cmp::approx_eq;
use scgraph::{DistanceMatrix, Metric, Params, ScGraph};
use test_case::test_case;

#[test]
fn thresholds() -> Result<(), String> {
    let graph = ScGraph::new(common::synthetic(42), Params::default())?;

    assert_eq!(graph.batches(), vec!["b0", "b1", "b2"]);
    assert_eq!(graph.skipped_batches(), &["small".to_string()]);
    assert_eq!(graph.ignored_celltypes().iter().collect::<Vec<_>>(), vec!["rare"]);
    assert_eq!(
        graph.kept_celltypes().iter().cloned().collect::<Vec<_>>(),
        common::cell_types()
    );
    assert_eq!(graph.selected_embeddings(), vec!["X_random_umap", "X_true_umap"]);

    let graph = ScGraph::new(common::synthetic(42), Params::default().with_only_umap(false))?;
    assert_eq!(graph.selected_embeddings().len(), 3);

    Ok(())
}

#[test]
fn consensus_graph() -> Result<(), String> {
    let mut graph = ScGraph::new(common::synthetic(42), Params::default())?;
    let consensus = graph.consensus()?.clone();

    assert_eq!(consensus.labels(), common::cell_types().as_slice());
    assert_eq!(consensus.num_missing(), 0);
    for j in 0..consensus.len() {
        assert!(approx_eq!(f64, consensus.values()[[j, j]], 0.0));
        let max = consensus.column(j).into_iter().fold(f64::NEG_INFINITY, f64::max);
        assert!(approx_eq!(f64, max, 1.0, epsilon = 1e-9));
    }

    // cached
    assert_eq!(graph.consensus()?, &consensus);

    Ok(())
}

#[test_case(42 ; "seed_42")]
#[test_case(7 ; "seed_7")]
fn scores(seed: u64) -> Result<(), String> {
    let mut graph = ScGraph::new(common::synthetic(seed), Params::default())?;
    let report = graph.run()?;

    assert_eq!(report.rows().len(), 2);
    assert!(report.get("X_pca").is_none());

    let good = report.get("X_true_umap").ok_or("missing X_true_umap")?;
    let random = report.get("X_random_umap").ok_or("missing X_random_umap")?;

    assert_eq!(good.per_celltype.len(), 6);
    assert!(good.rank_pca > 0.9, "rank_pca: {}", good.rank_pca);
    assert!(good.corr_pca > 0.9, "corr_pca: {}", good.corr_pca);
    assert!(good.corr_weighted > 0.9, "corr_weighted: {}", good.corr_weighted);
    assert!(good.corr_pca > random.corr_pca);
    assert!(good.rank_pca > random.rank_pca);

    for score in [good.rank_pca, good.corr_pca, good.corr_weighted, random.rank_pca, random.corr_pca] {
        assert!((-1.0..=1.0).contains(&score));
    }

    Ok(())
}

#[test]
fn other_metrics() -> Result<(), String> {
    // PCA preserves only euclidean geometry, so these are checked for range only
    for metric in [Metric::Cosine, Metric::Manhattan] {
        let mut graph = ScGraph::new(common::synthetic(42), Params::default().with_metric(metric))?;
        let report = graph.run()?;
        assert_eq!(report.rows().len(), 2);
        for row in report.rows() {
            assert!((-1.0..=1.0).contains(&row.corr_pca), "{metric}: {}", row.corr_pca);
        }
    }
    Ok(())
}

#[test]
fn deterministic() -> Result<(), String> {
    let params = Params::default().with_only_umap(false).with_seed(7);
    let first = ScGraph::new(common::synthetic(3), params.clone())?.run()?;
    let second = ScGraph::new(common::synthetic(3), params)?.run()?;
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn single_evaluation() -> Result<(), String> {
    let mut graph = ScGraph::new(common::synthetic(42), Params::default())?;

    // `evaluate` ignores `only_umap`
    let evaluation = graph.evaluate("X_pca")?;
    assert_eq!(evaluation.embedding, "X_pca");
    assert!(evaluation.per_celltype.iter().all(|s| s.cell_type != "rare"));

    let report = graph.run()?;
    let good = graph.evaluate("X_true_umap")?;
    assert_eq!(report.get("X_true_umap"), Some(&good));

    assert!(graph.evaluate("X_missing").is_err());
    Ok(())
}

#[test]
fn invalid_inputs() {
    let adata = common::synthetic(42);

    assert!(ScGraph::new(adata.clone(), Params::default().with_label_key("celltype")).is_err());
    assert!(ScGraph::new(adata.clone(), Params::default().with_batch_key("donor")).is_err());
    assert!(ScGraph::new(adata.clone(), Params::default().with_thres_batch(10_000)).is_err());
    assert!(ScGraph::new(adata.clone(), Params::default().with_thres_celltype(10_000)).is_err());
    assert!(ScGraph::new(adata, Params::default().with_trim_rate(0.6)).is_err());
}

#[test]
fn from_dir() -> Result<(), String> {
    let adata = common::synthetic(11);
    let tmp_dir = tempdir::TempDir::new("scgraph").map_err(|e| e.to_string())?;
    adata.write_dir(tmp_dir.path())?;

    let mut in_memory = ScGraph::new(adata, Params::default())?;
    let mut from_disk = ScGraph::from_dir(tmp_dir.path(), Params::default())?;
    assert_eq!(in_memory.run()?, from_disk.run()?);

    let path = tmp_dir.path().join("consensus.csv");
    from_disk.consensus()?.write_csv(&path)?;
    let read = DistanceMatrix::read_csv(&path)?;
    let diff = read.max_abs_diff(in_memory.consensus()?).ok_or("labels differ")?;
    assert!(diff < 1e-9, "diff: {diff}");

    let report_path = tmp_dir.path().join("report.csv");
    from_disk.run()?.write_csv(&report_path)?;
    let contents = std::fs::read_to_string(&report_path).map_err(|e| e.to_string())?;
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.starts_with("embedding,rank_pca,corr_pca,corr_weighted"));

    Ok(())
}

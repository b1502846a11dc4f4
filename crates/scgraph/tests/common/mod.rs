#![allow(dead_code)]

//! Synthetic single-cell data for testing.

use std::collections::BTreeMap;

use ndarray::Array2;
use rand::prelude::*;
use scgraph::{data::Obs, AnnData};

/// The number of genes in the synthetic data.
pub const NUM_GENES: usize = 40;

/// The dimensionality of the latent space the cell types live in.
const LATENT_DIM: usize = 3;

/// The names of the well-populated cell types.
pub fn cell_types() -> Vec<String> {
    (0..6).map(|i| format!("type_{i}")).collect()
}

/// Cells spread over three large batches and one small batch.
///
/// Every cell type has a position in a small latent space which a random
/// linear map lifts to gene space. Each batch adds its own shift to every
/// gene. Batch `b0` also holds five cells of the `rare` cell type.
///
/// The embeddings are:
///
/// * `X_true_umap` - the noise-free expression of each cell's type.
/// * `X_random_umap` - uniform noise.
/// * `X_pca` - the latent position of each cell with some noise.
pub fn synthetic(seed: u64) -> AnnData {
    let mut rng = StdRng::seed_from_u64(seed);

    let loadings = (0..NUM_GENES)
        .map(|_| (0..LATENT_DIM).map(|_| rng.gen_range(-1.0..1.0)).collect::<Vec<f32>>())
        .collect::<Vec<_>>();
    let lift = |z: &[f32]| {
        loadings
            .iter()
            .map(|row| 5.0 + row.iter().zip(z).map(|(a, b)| a * b).sum::<f32>())
            .collect::<Vec<_>>()
    };

    let mut latent = cell_types()
        .into_iter()
        .map(|t| (t, (0..LATENT_DIM).map(|_| rng.gen_range(-4.0..4.0)).collect::<Vec<f32>>()))
        .collect::<Vec<_>>();
    latent.push(("rare".to_string(), vec![0.0; LATENT_DIM]));

    // (batch, cell type index, number of cells)
    let mut plan = Vec::new();
    for batch in ["b0", "b1", "b2"] {
        for t in 0..6 {
            plan.push((batch, t, 30));
        }
    }
    plan.push(("b0", 6, 5));
    for t in 0..6 {
        plan.push(("small", t, 3));
    }

    let shifts = ["b0", "b1", "b2", "small"]
        .into_iter()
        .map(|b| (b, (0..NUM_GENES).map(|_| rng.gen_range(-0.5..0.5)).collect::<Vec<f32>>()))
        .collect::<BTreeMap<_, _>>();

    let (mut x, mut true_umap, mut random_umap, mut pca) = (Vec::new(), Vec::new(), Vec::new(), Vec::new());
    let (mut batches, mut labels) = (Vec::new(), Vec::new());
    for (batch, t, n) in plan {
        let (label, z) = &latent[t];
        let signal = lift(z);
        for _ in 0..n {
            x.extend(
                signal
                    .iter()
                    .zip(&shifts[batch])
                    .map(|(s, shift)| s + shift + rng.gen_range(-0.5..0.5)),
            );
            true_umap.extend_from_slice(&signal);
            random_umap.extend((0..2).map(|_| rng.gen_range(0.0..10.0_f32)));
            pca.extend(z.iter().map(|v| v + rng.gen_range(-0.5..0.5)));
            batches.push(batch.to_string());
            labels.push(label.clone());
        }
    }

    let n_obs = labels.len();
    let obs = Obs::with_rows(n_obs)
        .with_column("batch", &batches)
        .and_then(|obs| obs.with_column("cell_type", &labels))
        .unwrap_or_else(|e| unreachable!("{e}"));

    let mut obsm = BTreeMap::new();
    for (key, values, dim) in [
        ("X_true_umap", true_umap, NUM_GENES),
        ("X_random_umap", random_umap, 2),
        ("X_pca", pca, LATENT_DIM),
    ] {
        let emb = Array2::from_shape_vec((n_obs, dim), values).unwrap_or_else(|e| unreachable!("{e}"));
        obsm.insert(key.to_string(), emb);
    }

    let x = Array2::from_shape_vec((n_obs, NUM_GENES), x).unwrap_or_else(|e| unreachable!("{e}"));
    AnnData::new(x, obs, obsm).unwrap_or_else(|e| unreachable!("{e}"))
}

#![deny(clippy::correctness)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::pedantic,
    clippy::nursery,
    clippy::missing_docs_in_private_items,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::cast_lossless
)]
#![doc = include_str!("../README.md")]

pub mod centroids;
pub mod correlation;
pub mod data;
mod evaluator;
pub mod matrix;
pub mod metric;
mod params;
pub mod pca;
pub mod report;
pub mod utils;

pub use centroids::Centroids;
pub use data::AnnData;
pub use evaluator::ScGraph;
pub use matrix::DistanceMatrix;
pub use metric::Metric;
pub use params::Params;
pub use report::{Evaluation, Report};

/// The items brought into scope by `use scgraph::prelude::*`.
pub mod prelude {
    pub use crate::ScGraph;
}

/// The current version of the crate.
pub const VERSION: &str = "0.1.3";

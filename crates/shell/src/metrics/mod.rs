//! Distances between centroids available from the command line.

/// The distance between cell-type centroids.
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum Metric {
    /// Euclidean distance.
    #[clap(name = "euclidean")]
    Euclidean,
    /// Cosine distance.
    #[clap(name = "cosine")]
    Cosine,
    /// Manhattan distance.
    #[clap(name = "manhattan")]
    Manhattan,
}

impl Metric {
    /// The library metric.
    pub const fn scgraph_metric(self) -> scgraph::Metric {
        match self {
            Self::Euclidean => scgraph::Metric::Euclidean,
            Self::Cosine => scgraph::Metric::Cosine,
            Self::Manhattan => scgraph::Metric::Manhattan,
        }
    }
}

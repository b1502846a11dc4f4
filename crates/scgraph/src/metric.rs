//! Distance functions for measuring edges between cell-type centroids.

use distances::Number;
use serde::{Deserialize, Serialize};

/// The available metrics for building cell-type graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// The L2 norm of the difference.
    #[default]
    Euclidean,
    /// One minus the cosine similarity.
    Cosine,
    /// The L1 norm of the difference.
    Manhattan,
}

impl Metric {
    /// All supported metrics.
    pub const ALL: [Self; 3] = [Self::Euclidean, Self::Cosine, Self::Manhattan];

    /// The name of the metric.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
            Self::Manhattan => "manhattan",
        }
    }

    /// Compute the distance between two vectors.
    ///
    /// Elements in the longer vector past the end of the shorter vector are
    /// ignored.
    #[must_use]
    pub fn distance(&self, x: &[f32], y: &[f32]) -> f64 {
        match self {
            Self::Euclidean => distances::vectors::euclidean::<_, f64>(x, y),
            Self::Cosine => distances::vectors::cosine::<_, f64>(x, y),
            Self::Manhattan => distances::vectors::manhattan(x, y).as_f64(),
        }
    }
}

impl core::fmt::Display for Metric {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl core::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown metric: {s}"))
    }
}

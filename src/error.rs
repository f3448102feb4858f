//! Error taxonomy for the segmentation pipeline.
//!
//! Ingestion and normalization failures are fatal to a run; a degenerate
//! silhouette is not (labels are still valid, only the quality metric is
//! unavailable).

use thiserror::Error;

/// The three RFM features, used to name the offending column in
/// normalization failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureName {
    Recency,
    Frequency,
    Monetary,
}

impl std::fmt::Display for FeatureName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureName::Recency => write!(f, "Recency"),
            FeatureName::Frequency => write!(f, "Frequency"),
            FeatureName::Monetary => write!(f, "Monetary"),
        }
    }
}

/// Fatal failures while reading the transaction source.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// One or more required columns are absent from the header row.
    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A numeric cell could not be parsed. Dates degrade to a null
    /// sentinel instead; quantities and prices feed Monetary directly, so
    /// a bad cell here is a hard error rather than a silent zero.
    #[error("row {row}: invalid number {value:?} in column {column:?}")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },

    #[error("I/O error reading transaction source")]
    Io(#[from] std::io::Error),

    #[error("CSV error in transaction source")]
    Csv(#[from] csv::Error),
}

/// A feature with zero variance cannot be standardized. Surfaced rather
/// than guarded with an epsilon so callers can detect a dataset that lacks
/// the variance to segment.
#[derive(Debug, Error)]
#[error("feature {feature} has zero variance; dataset cannot be standardized")]
pub struct DegenerateFeatureError {
    pub feature: FeatureName,
}

/// Silhouette is undefined for k < 2 or k >= n. Cluster labels are still
/// produced; only the quality metric is unavailable.
#[derive(Debug, Error)]
#[error("silhouette undefined for k={k} over {n_customers} customers")]
pub struct DegenerateClusteringError {
    pub k: usize,
    pub n_customers: usize,
}

/// Umbrella error for a full pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    #[error(transparent)]
    DegenerateFeature(#[from] DegenerateFeatureError),

    /// The cluster count must lie in [2, 9]; out-of-range values are
    /// rejected at the boundary, never clamped.
    #[error("cluster count {k} outside the accepted range [2, 9]")]
    InvalidClusterCount { k: usize },
}

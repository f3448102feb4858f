//! Segmentr: customer segmentation from transactional sales data.
//!
//! Derives RFM (Recency, Frequency, Monetary) features per customer,
//! standardizes them, clusters with seeded K-Means, and labels the clusters
//! with positional tier names. The pipeline is a pure function of
//! (dataset, k, seed); every run recomputes scaling and clustering from
//! scratch.

pub mod cli;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pipeline;
pub mod rfm;
pub mod scale;
pub mod segments;
pub mod viz;

pub use cli::Args;
pub use error::{
    DegenerateClusteringError, DegenerateFeatureError, FeatureName, IngestionError, PipelineError,
};
pub use ingest::{filter_by_years, read_transactions, ColumnMap, TransactionRecord};
pub use model::{cluster, optimize_k, ClusterModel};
pub use pipeline::{run_from_path, PipelineConfig, SegmentationReport};
pub use rfm::{build_rfm, CustomerRfm};
pub use scale::{normalize, ScalerStats};
pub use segments::{label_segments, tier_name, ClusterSummary, SegmentedCustomer};

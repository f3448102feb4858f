//! End-to-end orchestration: ingest -> filter -> RFM -> normalize ->
//! elbow diagnostic -> cluster -> label. A run is a pure function of
//! (dataset, k, seed); nothing is cached between runs.

use std::io::Read;
use std::ops::RangeInclusive;
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::ingest::{self, ColumnMap};
use crate::model::{self, DEFAULT_ELBOW_RANGE, DEFAULT_SEED};
use crate::rfm;
use crate::scale::{self, DEFAULT_IMPUTATION_DAYS};
use crate::segments::{self, ClusterSummary, SegmentedCustomer};

/// Caller-facing bounds on the cluster count. Out-of-range values are
/// rejected before the engine runs, never clamped.
pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 9;

/// Analysis parameters. Defaults reproduce the source system's constants.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub columns: ColumnMap,
    /// Inclusive calendar-year window for recency.
    pub year_range: RangeInclusive<i32>,
    /// Anchor date recency is measured against.
    pub reference_date: NaiveDate,
    /// Stand-in recency for customers with no in-window activity.
    pub imputation_days: i64,
    pub seed: u64,
    pub elbow_range: RangeInclusive<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            columns: ColumnMap::default(),
            year_range: 2020..=2023,
            reference_date: NaiveDate::from_ymd_opt(2023, 12, 1).expect("valid anchor date"),
            imputation_days: DEFAULT_IMPUTATION_DAYS,
            seed: DEFAULT_SEED,
            elbow_range: DEFAULT_ELBOW_RANGE,
        }
    }
}

/// Everything the presentation layer needs to render one analysis.
#[derive(Debug, Serialize)]
pub struct SegmentationReport {
    pub k: usize,
    pub customers: Vec<SegmentedCustomer>,
    pub summaries: Vec<ClusterSummary>,
    pub segment_counts: Vec<(String, usize)>,
    /// (k, inertia) elbow diagnostic points.
    pub elbow: Vec<(usize, f64)>,
    pub inertia: f64,
    /// `None` when silhouette is undefined for this (k, population); the
    /// assignments above are still valid.
    pub silhouette: Option<f64>,
}

/// Run the full pipeline over an already-opened transaction source.
pub fn run<R: Read>(
    source: R,
    k: usize,
    config: &PipelineConfig,
) -> Result<SegmentationReport, PipelineError> {
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(PipelineError::InvalidClusterCount { k });
    }

    let records = ingest::read_transactions(source, &config.columns)?;
    let filtered = ingest::filter_by_years(&records, &config.year_range);
    info!(
        total = records.len(),
        in_window = filtered.len(),
        "ingested transactions"
    );

    let rfm_table = rfm::build_rfm(&records, &filtered, config.reference_date);
    let (scaled, _stats) = scale::normalize(&rfm_table, config.imputation_days)?;

    let elbow = model::optimize_k(&scaled, config.elbow_range.clone(), config.seed);
    let fitted = model::cluster(&scaled, k, config.seed);

    let silhouette = match fitted.silhouette {
        Ok(score) => Some(score),
        Err(ref err) => {
            warn!(%err, "silhouette unavailable; assignments are still valid");
            None
        }
    };

    let labeled = segments::label_segments(
        &rfm_table,
        &fitted.cluster_ids(),
        config.imputation_days,
    );
    info!(
        customers = labeled.customers.len(),
        k,
        inertia = fitted.inertia,
        "segmentation complete"
    );

    Ok(SegmentationReport {
        k,
        customers: labeled.customers,
        summaries: labeled.summaries,
        segment_counts: labeled.segment_counts,
        elbow,
        inertia: fitted.inertia,
        silhouette,
    })
}

/// Run the full pipeline over a file on disk.
pub fn run_from_path<P: AsRef<Path>>(
    path: P,
    k: usize,
    config: &PipelineConfig,
) -> Result<SegmentationReport, PipelineError> {
    let file = std::fs::File::open(path).map_err(crate::error::IngestionError::from)?;
    run(file, k, config)
}

//! Command-line interface definitions and argument parsing.

use chrono::NaiveDate;
use clap::Parser;

use crate::ingest::ColumnMap;
use crate::pipeline::PipelineConfig;

/// Customer segmentation from transactional sales data: RFM features,
/// K-Means clustering, tier labeling.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the semicolon-delimited transaction CSV
    pub input: String,

    /// Number of clusters for K-Means
    #[arg(short = 'k', long = "clusters", default_value_t = 4,
          value_parser = clap::value_parser!(u8).range(2..=9))]
    pub clusters: u8,

    /// Seed for reproducible K-Means initialization
    #[arg(long, default_value_t = 20)]
    pub seed: u64,

    /// Anchor date recency is measured against (YYYY-MM-DD)
    #[arg(long, default_value = "2023-12-01")]
    pub reference_date: NaiveDate,

    /// First calendar year accepted by the recency window
    #[arg(long, default_value_t = 2020)]
    pub year_start: i32,

    /// Last calendar year accepted by the recency window
    #[arg(long, default_value_t = 2023)]
    pub year_end: i32,

    /// Recency stand-in for customers with no in-window activity
    #[arg(long, default_value_t = 5)]
    pub impute_days: i64,

    /// Output path for the elbow curve plot
    #[arg(long, default_value = "elbow.png")]
    pub elbow_plot: String,

    /// Output path for the segment distribution plot
    #[arg(long, default_value = "segments.png")]
    pub segments_plot: String,

    /// Write the full report as JSON to this path
    #[arg(long)]
    pub json: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Pipeline configuration assembled from the parsed flags.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            columns: ColumnMap::default(),
            year_range: self.year_start..=self.year_end,
            reference_date: self.reference_date,
            imputation_days: self.impute_days,
            seed: self.seed,
            ..PipelineConfig::default()
        }
    }
}

//! Segmentr CLI: runs the segmentation pipeline over a transaction CSV and
//! renders the result tables and charts.

use anyhow::{Context, Result};
use clap::Parser;
use segmentr::pipeline::{self, SegmentationReport};
use segmentr::{viz, Args};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let config = args.pipeline_config();
    let k = args.clusters as usize;
    let report = pipeline::run_from_path(&args.input, k, &config)
        .with_context(|| format!("segmentation of {:?} failed", args.input))?;

    print_report(&report);

    viz::render_elbow_curve(&report.elbow, &args.elbow_plot)
        .with_context(|| format!("writing elbow plot to {:?}", args.elbow_plot))?;
    viz::render_segment_distribution(&report, &args.segments_plot)
        .with_context(|| format!("writing segment plot to {:?}", args.segments_plot))?;
    println!("\nElbow plot saved to: {}", args.elbow_plot);
    println!("Segment plot saved to: {}", args.segments_plot);

    if let Some(json_path) = &args.json {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(json_path, json)
            .with_context(|| format!("writing JSON report to {json_path:?}"))?;
        println!("JSON report saved to: {json_path}");
    }

    Ok(())
}

fn print_report(report: &SegmentationReport) {
    println!("=== Customer Segments (k = {}) ===", report.k);
    println!("{:>12} | {:>8} | {:>9} | {:>12} | cluster | segment", "customer", "recency", "frequency", "monetary");
    for customer in &report.customers {
        let recency = customer
            .recency
            .map(|days| days.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>12} | {:>8} | {:>9} | {:>12.2} | {:>7} | {}",
            customer.customer_id,
            recency,
            customer.frequency,
            customer.monetary,
            customer.cluster_id,
            customer.segment
        );
    }

    println!("\n=== Average RFM Values by Cluster ===");
    println!("cluster | segment   | recency | frequency | monetary | members");
    for summary in &report.summaries {
        println!(
            "{:>7} | {:<9} | {:>7.1} | {:>9.2} | {:>8.2} | {:>7}",
            summary.cluster_id,
            summary.segment,
            summary.mean_recency,
            summary.mean_frequency,
            summary.mean_monetary,
            summary.member_count
        );
    }

    println!("\n=== Segment Population ===");
    for (segment, count) in &report.segment_counts {
        println!("{segment:<9} {count}");
    }

    println!("\nInertia: {:.2}", report.inertia);
    match report.silhouette {
        Some(score) => println!("Silhouette score: {score:.3}"),
        None => println!("Silhouette score: unavailable for this k and population size"),
    }
}

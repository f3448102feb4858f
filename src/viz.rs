//! Chart rendering with Plotters: the elbow diagnostic and the segment
//! population distribution.

use plotters::prelude::*;

use crate::pipeline::SegmentationReport;

/// Color palette cycled across segments.
const SEGMENT_COLORS: [RGBColor; 9] = [
    RED,
    BLUE,
    GREEN,
    MAGENTA,
    CYAN,
    RGBColor(255, 165, 0),
    RGBColor(128, 0, 128),
    RGBColor(139, 69, 19),
    BLACK,
];

/// Render the (k, inertia) elbow curve as a line chart with point markers.
pub fn render_elbow_curve(elbow: &[(usize, f64)], output_path: &str) -> anyhow::Result<()> {
    anyhow::ensure!(!elbow.is_empty(), "elbow curve has no points to plot");

    let k_min = elbow.first().map(|(k, _)| *k).unwrap_or(1) as f64;
    let k_max = elbow.last().map(|(k, _)| *k).unwrap_or(1) as f64;
    let inertia_max = elbow
        .iter()
        .map(|(_, inertia)| *inertia)
        .fold(f64::NEG_INFINITY, f64::max);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Elbow Method for Optimal k", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(k_min - 0.5..k_max + 0.5, 0.0..inertia_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Number of Clusters")
        .y_desc("Inertia")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    chart.draw_series(LineSeries::new(
        elbow.iter().map(|(k, inertia)| (*k as f64, *inertia)),
        &BLUE,
    ))?;
    chart.draw_series(
        elbow
            .iter()
            .map(|(k, inertia)| Circle::new((*k as f64, *inertia), 4, BLUE.filled())),
    )?;

    root.present()?;
    Ok(())
}

/// Render a bar chart of customer counts per segment label.
pub fn render_segment_distribution(report: &SegmentationReport, output_path: &str) -> anyhow::Result<()> {
    let counts = &report.segment_counts;
    anyhow::ensure!(!counts.is_empty(), "no segments to plot");

    let max_count = counts.iter().map(|(_, count)| *count).max().unwrap_or(1) as f64;
    let labels: Vec<String> = counts.iter().map(|(segment, _)| segment.clone()).collect();

    let root = BitMapBackend::new(output_path, (800, 500)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Customers per Segment", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..counts.len() as f64 - 0.5, 0.0..max_count * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Segment")
        .y_desc("Customers")
        .x_labels(counts.len())
        .x_label_formatter(&|x| {
            let i = x.round() as isize;
            if i >= 0 && (i as usize) < labels.len() {
                labels[i as usize].clone()
            } else {
                String::new()
            }
        })
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (i, (_, count)) in counts.iter().enumerate() {
        let color = &SEGMENT_COLORS[i % SEGMENT_COLORS.len()];
        chart.draw_series(std::iter::once(Rectangle::new(
            [(i as f64 - 0.35, 0.0), (i as f64 + 0.35, *count as f64)],
            color.filled(),
        )))?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{run, PipelineConfig};
    use std::path::Path;
    use tempfile::tempdir;

    const CSV: &str = "\
kdplg;nota;tanggal;jumlah;hgjual
C001;N001;2023-11-21;2;250
C001;N002;2023-10-01;1;500
C002;N003;2023-05-20;1;50
C003;N004;2023-11-19;3;200
C003;N005;2023-08-08;1;100
";

    #[test]
    fn elbow_chart_is_written_to_disk() {
        let report = run(CSV.as_bytes(), 2, &PipelineConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("elbow.png");
        render_elbow_curve(&report.elbow, path.to_str().unwrap()).unwrap();
        assert!(Path::new(&path).exists());
    }

    #[test]
    fn segment_chart_is_written_to_disk() {
        let report = run(CSV.as_bytes(), 2, &PipelineConfig::default()).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("segments.png");
        render_segment_distribution(&report, path.to_str().unwrap()).unwrap();
        assert!(Path::new(&path).exists());
    }

    #[test]
    fn empty_elbow_is_an_error() {
        assert!(render_elbow_curve(&[], "/tmp/unused.png").is_err());
    }
}

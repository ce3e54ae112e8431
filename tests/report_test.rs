//! Integration tests for chart rendering and PDF export

use std::path::Path;
use std::time::Duration;

use brand_insights_rust::aggregator::aggregate;
use brand_insights_rust::config::{AppConfig, ReportConfig, SliceWeighting};
use brand_insights_rust::converter::PdfConverter;
use brand_insights_rust::models::DOWNLOAD_MIME;
use brand_insights_rust::report::ReportRenderer;
use brand_insights_rust::{AccountInsight, BusinessRecord, InsightsError};
use tempfile::tempdir;

fn insight() -> AccountInsight {
    let records = vec![
        BusinessRecord {
            business_id: "b1".to_string(),
            name: "Acme".to_string(),
            address: "1 Main St".to_string(),
            postal_code: "10001".to_string(),
            business_ratings: Some(4.0),
            csat: Some(88.0),
            nps: Some(40.0),
            strengths: Some("clean clean fast".to_string()),
            areas_for_improvement: Some("parking".to_string()),
        },
        BusinessRecord {
            business_id: "b2".to_string(),
            name: "Acme".to_string(),
            address: "2 Main St".to_string(),
            postal_code: "10002".to_string(),
            business_ratings: Some(3.0),
            csat: None,
            nps: None,
            strengths: Some("clean".to_string()),
            areas_for_improvement: Some("wait times".to_string()),
        },
    ];
    aggregate(&records).expect("non-empty")
}

fn report_config(dir: &Path) -> ReportConfig {
    let mut config = AppConfig::default().report;
    config.output_directory = dir.display().to_string();
    config
}

#[test]
fn test_chart_files_named_after_account() {
    let dir = tempdir().expect("Failed to create temp directory");
    let renderer = ReportRenderer::new(&report_config(dir.path()), None).expect("renderer");
    assert!(!renderer.can_export_pdf());

    let charts = renderer.render_charts(&insight()).expect("charts");
    assert_eq!(charts.ratings.path, dir.path().join("Acme_ratings_distribution.png"));
    assert_eq!(charts.strengths.path, dir.path().join("Acme_strengths_pie.png"));
    assert_eq!(charts.areas.path, dir.path().join("Acme_areas_pie.png"));
}

#[test]
fn test_count_weighting_reaches_the_pies() {
    let dir = tempdir().expect("Failed to create temp directory");
    let mut config = report_config(dir.path());
    config.slice_weighting = SliceWeighting::Counts;
    let renderer = ReportRenderer::new(&config, None).expect("renderer");

    let slices = renderer.strength_slices(&insight());
    let values: Vec<f64> = slices.iter().map(|s| s.value).collect();
    assert_eq!(values, vec![3.0, 1.0]);
}

#[test]
fn test_retally_weighting_is_uniform() {
    let dir = tempdir().expect("Failed to create temp directory");
    let renderer = ReportRenderer::new(&report_config(dir.path()), None).expect("renderer");

    let slices = renderer.strength_slices(&insight());
    assert!(slices.iter().all(|s| (s.value - 1.0).abs() < f64::EPSILON));
}

#[tokio::test]
async fn test_export_without_converter_fails_cleanly() {
    let dir = tempdir().expect("Failed to create temp directory");
    let renderer = ReportRenderer::new(&report_config(dir.path()), None).expect("renderer");

    let result = renderer.export_pdf(&insight()).await;
    assert!(matches!(result, Err(InsightsError::Render(_))));
    assert!(!dir.path().join("Acme_report.pdf").exists());
}

#[cfg(unix)]
fn fake_converter(dir: &Path, body: &str, timeout: Duration) -> PdfConverter {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-wkhtmltopdf");
    std::fs::write(&script, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).expect("chmod");

    let path = script.display().to_string();
    PdfConverter::resolve(Some(&path), timeout).expect("resolve")
}

#[cfg(unix)]
#[tokio::test]
async fn test_export_pdf_with_converter() {
    let bin_dir = tempdir().expect("Failed to create temp directory");
    let out_dir = tempdir().expect("Failed to create temp directory");
    // The output file is the last argument
    let converter = fake_converter(
        bin_dir.path(),
        "for last; do :; done\nprintf '%%PDF-1.4 fake' > \"$last\"",
        Duration::from_secs(10),
    );
    let renderer =
        ReportRenderer::new(&report_config(out_dir.path()), Some(converter)).expect("renderer");
    assert!(renderer.can_export_pdf());

    let artifact = renderer.export_pdf(&insight()).await.expect("pdf");
    assert_eq!(artifact.file_name, "Acme_report.pdf");
    assert_eq!(artifact.mime, DOWNLOAD_MIME);
    assert_eq!(artifact.path, out_dir.path().join("Acme_report.pdf"));
    assert!(artifact.bytes.starts_with(b"%PDF"));
    assert_eq!(std::fs::read(&artifact.path).expect("read"), artifact.bytes);
}

#[cfg(unix)]
#[tokio::test]
async fn test_failing_converter_leaves_no_document() {
    let bin_dir = tempdir().expect("Failed to create temp directory");
    let out_dir = tempdir().expect("Failed to create temp directory");
    let converter = fake_converter(
        bin_dir.path(),
        "echo 'cannot render' >&2\nexit 1",
        Duration::from_secs(10),
    );
    let renderer =
        ReportRenderer::new(&report_config(out_dir.path()), Some(converter)).expect("renderer");

    let result = renderer.export_pdf(&insight()).await;
    assert!(matches!(result, Err(InsightsError::Render(msg)) if msg.contains("cannot render")));
    assert!(!out_dir.path().join("Acme_report.pdf").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_converter_writing_nothing_is_an_error() {
    let bin_dir = tempdir().expect("Failed to create temp directory");
    let out_dir = tempdir().expect("Failed to create temp directory");
    let converter = fake_converter(bin_dir.path(), "exit 0", Duration::from_secs(10));
    let renderer =
        ReportRenderer::new(&report_config(out_dir.path()), Some(converter)).expect("renderer");

    let result = renderer.export_pdf(&insight()).await;
    assert!(matches!(result, Err(InsightsError::Render(_))));
    assert!(!out_dir.path().join("Acme_report.pdf").exists());
}

#[cfg(unix)]
#[tokio::test]
async fn test_slow_converter_times_out() {
    let bin_dir = tempdir().expect("Failed to create temp directory");
    let out_dir = tempdir().expect("Failed to create temp directory");
    let converter = fake_converter(bin_dir.path(), "sleep 30", Duration::from_secs(1));
    let renderer =
        ReportRenderer::new(&report_config(out_dir.path()), Some(converter)).expect("renderer");

    let started = std::time::Instant::now();
    let result = renderer.export_pdf(&insight()).await;

    assert!(matches!(&result, Err(InsightsError::Render(msg)) if msg.contains("timed out")));
    assert!(started.elapsed() < Duration::from_secs(10));
    assert!(!out_dir.path().join("Acme_report.pdf").exists());
}

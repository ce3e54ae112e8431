//! Report composition: summary text, chart images and the PDF document.
//!
//! Files are staged as temporaries inside the output directory and only
//! renamed into place once complete, so a failed export never leaves a
//! half-written chart or `<name>_report.pdf` behind.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Local;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::aggregator::InsightAggregator;
use crate::charts::{self, HistogramBin, PieSlice, PALETTE};
use crate::config::{ReportConfig, SliceWeighting};
use crate::converter::PdfConverter;
use crate::error::{InsightsError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{AccountInsight, BusinessRecord, ReportArtifact, DOWNLOAD_MIME};
use crate::validation::InputValidator;

/// A chart written to disk and its base64 PNG payload
#[derive(Debug, Clone)]
pub struct ChartImage {
    pub path: PathBuf,
    pub base64: String,
}

/// The three report charts and the slices drawn in the pies
#[derive(Debug, Clone)]
pub struct RenderedCharts {
    pub ratings: ChartImage,
    pub strengths: ChartImage,
    pub areas: ChartImage,
    pub strength_slices: Vec<PieSlice>,
    pub area_slices: Vec<PieSlice>,
}

/// Turns an [`AccountInsight`] into charts and a PDF document
pub struct ReportRenderer {
    output_dir: PathBuf,
    histogram_bins: usize,
    weighting: SliceWeighting,
    aggregator: InsightAggregator,
    converter: Option<PdfConverter>,
    metrics: MetricsCollector,
}

impl ReportRenderer {
    /// Create a renderer. Without a converter, charts still render but PDF export fails.
    pub fn new(config: &ReportConfig, converter: Option<PdfConverter>) -> Result<Self> {
        Ok(Self {
            output_dir: PathBuf::from(&config.output_directory),
            histogram_bins: config.histogram_bins,
            weighting: config.slice_weighting,
            aggregator: InsightAggregator::new(config.top_terms)?,
            converter,
            metrics: MetricsCollector::default(),
        })
    }

    /// True when a PDF converter was resolved
    #[must_use]
    pub const fn can_export_pdf(&self) -> bool {
        self.converter.is_some()
    }

    /// Directory charts and documents are written to
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of ranked terms shown per feedback field
    #[must_use]
    pub const fn top_terms(&self) -> usize {
        self.aggregator.term_limit()
    }

    /// Ratings histogram for the account
    #[must_use]
    pub fn ratings_histogram(&self, insight: &AccountInsight) -> Vec<HistogramBin> {
        charts::histogram(&insight.ratings(), self.histogram_bins)
    }

    /// Pie slices for the top strengths
    #[must_use]
    pub fn strength_slices(&self, insight: &AccountInsight) -> Vec<PieSlice> {
        charts::pie_slices(&insight.top_strengths, self.weighting, &self.aggregator)
    }

    /// Pie slices for the top improvement areas
    #[must_use]
    pub fn area_slices(&self, insight: &AccountInsight) -> Vec<PieSlice> {
        charts::pie_slices(&insight.top_improvement_areas, self.weighting, &self.aggregator)
    }

    /// Write the three charts as PNG files and return them base64 encoded
    pub fn render_charts(&self, insight: &AccountInsight) -> Result<RenderedCharts> {
        let timer = OperationTimer::new("render_charts");
        fs::create_dir_all(&self.output_dir)?;
        let stem = InputValidator::sanitize_file_stem(&insight.name);

        let strength_slices = self.strength_slices(insight);
        let area_slices = self.area_slices(insight);

        let ratings_tmp = self.staging_file(".png")?;
        charts::draw_histogram(ratings_tmp.path(), &self.ratings_histogram(insight))?;
        let strengths_tmp = self.staging_file(".png")?;
        charts::draw_pie(strengths_tmp.path(), &strength_slices)?;
        let areas_tmp = self.staging_file(".png")?;
        charts::draw_pie(areas_tmp.path(), &area_slices)?;

        // Only publish once all three rendered
        let charts = RenderedCharts {
            ratings: self.publish_chart(ratings_tmp, &format!("{stem}_ratings_distribution.png"))?,
            strengths: self.publish_chart(strengths_tmp, &format!("{stem}_strengths_pie.png"))?,
            areas: self.publish_chart(areas_tmp, &format!("{stem}_areas_pie.png"))?,
            strength_slices,
            area_slices,
        };
        timer.finish();
        Ok(charts)
    }

    fn staging_file(&self, suffix: &str) -> Result<NamedTempFile> {
        Ok(tempfile::Builder::new()
            .prefix(".staging-")
            .suffix(suffix)
            .tempfile_in(&self.output_dir)?)
    }

    fn publish_chart(&self, staged: NamedTempFile, file_name: &str) -> Result<ChartImage> {
        let bytes = fs::read(staged.path())?;
        let path = self.output_dir.join(file_name);
        staged.persist(&path).map_err(|e| InsightsError::Io(e.error))?;

        Ok(ChartImage {
            path,
            base64: base64::engine::general_purpose::STANDARD.encode(bytes),
        })
    }

    /// HTML document embedding the charts and summary statistics
    #[must_use]
    pub fn compose_html(&self, insight: &AccountInsight, charts: &RenderedCharts) -> String {
        let mut html = String::new();
        let name = escape_html(&insight.name);

        let _ = writeln!(html, "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>Business Report for {name}</title></head>\n<body>");
        let _ = writeln!(html, "<h1>Business Report for {name}</h1>");
        for line in summary_lines(insight) {
            let _ = writeln!(html, "<p>{}</p>", escape_html(&line));
        }

        let _ = writeln!(html, "<h2>Distribution of Business Ratings:</h2>");
        let _ = writeln!(
            html,
            "<img src=\"data:image/png;base64,{}\" alt=\"Ratings Distribution\">",
            charts.ratings.base64
        );

        let strengths_heading = top_terms_heading(self.top_terms(), "strengths");
        let areas_heading = top_terms_heading(self.top_terms(), "areas for improvement");
        let sections = [
            (
                strengths_heading.as_str(),
                insight.strength_terms(),
                &charts.strengths,
                &charts.strength_slices,
                "Strengths Pie Chart",
            ),
            (
                areas_heading.as_str(),
                insight.improvement_terms(),
                &charts.areas,
                &charts.area_slices,
                "Areas for Improvement Pie Chart",
            ),
        ];
        for (title, terms, image, slices, alt) in sections {
            let _ = writeln!(html, "<h2>{title}</h2>");
            let _ = writeln!(html, "<p>{}</p>", escape_html(&terms.join(", ")));
            let _ = writeln!(
                html,
                "<img src=\"data:image/png;base64,{}\" alt=\"{alt}\">",
                image.base64
            );
            let _ = writeln!(html, "{}", legend_html(slices));
        }

        let _ = writeln!(
            html,
            "<p><small>Generated {}</small></p>\n</body>\n</html>",
            Local::now().format("%Y-%m-%d %H:%M")
        );
        html
    }

    /// Render charts, compose the document and convert it to `<name>_report.pdf`
    pub async fn export_pdf(&self, insight: &AccountInsight) -> Result<ReportArtifact> {
        let Some(converter) = self.converter.as_ref() else {
            return Err(InsightsError::Render(
                "no PDF converter available; set report.converter_path or WKHTMLTOPDF_PATH".to_string(),
            ));
        };

        let timer = OperationTimer::new("export_pdf");
        let charts = self.render_charts(insight)?;
        let html = self.compose_html(insight, &charts);

        let file_name = report_file_name(&insight.name);
        let path = self.output_dir.join(&file_name);
        let staged = self.staging_file(".pdf")?;

        if let Err(err) = converter.convert(&html, staged.path()).await {
            warn!(account = %insight.name, error = %err, "PDF conversion failed");
            self.metrics.record_error("render", "export_pdf");
            return Err(err);
        }

        let bytes = tokio::fs::read(staged.path()).await?;
        if bytes.is_empty() {
            self.metrics.record_error("render", "export_pdf");
            return Err(InsightsError::Render(
                "PDF converter produced an empty document".to_string(),
            ));
        }
        staged.persist(&path).map_err(|e| InsightsError::Io(e.error))?;

        info!(account = %insight.name, path = %path.display(), bytes = bytes.len(), "PDF report generated");
        self.metrics.record_report(bytes.len(), timer.finish());

        Ok(ReportArtifact {
            file_name,
            mime: DOWNLOAD_MIME,
            path,
            bytes,
        })
    }
}

/// File name of the exported document for an account
#[must_use]
pub fn report_file_name(name: &str) -> String {
    format!("{}_report.pdf", InputValidator::sanitize_file_stem(name))
}

/// Section heading for a ranked term list, e.g. `Top 3 strengths across all locations:`
#[must_use]
pub fn top_terms_heading(count: usize, subject: &str) -> String {
    format!("Top {count} {subject} across all locations:")
}

/// Summary statistics as display lines
#[must_use]
pub fn summary_lines(insight: &AccountInsight) -> Vec<String> {
    let mut lines = vec![format!(
        "Total locations analyzed: {}",
        insight.location_count()
    )];

    match insight.avg_rating {
        Some(avg) => lines.push(format!("Average business rating: {avg:.2}")),
        None => lines.push("Average business rating: n/a".to_string()),
    }
    if let Some(record) = &insight.highest_rated {
        lines.push(format!("Highest rated location: {}", location_line(record)));
    }
    if let Some(record) = &insight.lowest_rated {
        lines.push(format!("Lowest rated location: {}", location_line(record)));
    }
    if let Some(csat) = insight.csat {
        lines.push(format!(
            "CSAT: average {:.2} (min {}, max {})",
            csat.mean,
            format_score(csat.min),
            format_score(csat.max)
        ));
    }
    if let Some(nps) = insight.nps {
        lines.push(format!(
            "NPS: average {:.2} (min {}, max {})",
            nps.mean,
            format_score(nps.min),
            format_score(nps.max)
        ));
    }
    lines
}

fn location_line(record: &BusinessRecord) -> String {
    format!(
        "{} (Rating: {})",
        record.address,
        record.rating().map_or_else(|| "n/a".to_string(), format_score)
    )
}

/// Whole numbers keep one decimal, e.g. `4.0`
#[must_use]
pub fn format_score(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

fn legend_html(slices: &[PieSlice]) -> String {
    let total: f64 = slices.iter().map(|s| s.value).sum();
    let mut html = String::from("<ul>");
    for (i, slice) in slices.iter().enumerate() {
        let color = PALETTE[i % PALETTE.len()];
        let _ = write!(
            html,
            "<li><span style=\"color:#{:02x}{:02x}{:02x}\">&#9632;</span> {} ({:.1}%)</li>",
            color.0,
            color.1,
            color.2,
            escape_html(&slice.label),
            slice.percent(total)
        );
    }
    html.push_str("</ul>");
    html
}

/// Escape text for inclusion in HTML element content or attribute values
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

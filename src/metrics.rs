use anyhow::Result;
use metrics::{counter, histogram};
use std::time::Duration;

/// Metric names emitted by the dashboard
pub struct MetricsCollector {
    // Store metrics
    pub store_queries_total: &'static str,
    pub store_query_duration: &'static str,

    // Session metrics
    pub logins_total: &'static str,

    // Insight metrics
    pub insights_computed_total: &'static str,
    pub insight_records: &'static str,

    // Report metrics
    pub reports_generated_total: &'static str,
    pub report_duration: &'static str,
    pub report_size_bytes: &'static str,

    // Error metrics
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            store_queries_total: "brand_insights_store_queries_total",
            store_query_duration: "brand_insights_store_query_duration_seconds",

            logins_total: "brand_insights_logins_total",

            insights_computed_total: "brand_insights_insights_computed_total",
            insight_records: "brand_insights_insight_records",

            reports_generated_total: "brand_insights_reports_generated_total",
            report_duration: "brand_insights_report_duration_seconds",
            report_size_bytes: "brand_insights_report_size_bytes",

            errors_total: "brand_insights_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Initialize metrics collection with a no-op recorder.
    ///
    /// Fails if a recorder is already installed.
    pub fn init() -> Result<()> {
        metrics::set_global_recorder(metrics::NoopRecorder)
            .map_err(|e| anyhow::anyhow!("Failed to initialize metrics recorder: {e}"))?;

        Ok(())
    }

    /// Record a store query
    pub fn record_store_query(&self, operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(self.store_queries_total, "operation" => operation, "status" => status).increment(1);
        histogram!(self.store_query_duration, "operation" => operation).record(duration.as_secs_f64());

        if !success {
            self.record_error("store", operation);
        }
    }

    /// Record a login attempt
    pub fn record_login(&self, success: bool) {
        let status = if success { "success" } else { "rejected" };
        counter!(self.logins_total, "status" => status).increment(1);
    }

    /// Record an aggregation over `records` rows
    pub fn record_insight(&self, records: usize) {
        counter!(self.insights_computed_total).increment(1);
        #[allow(clippy::cast_precision_loss)]
        let records = records as f64;
        histogram!(self.insight_records).record(records);
    }

    /// Record a finished report export
    pub fn record_report(&self, size_bytes: usize, duration: Duration) {
        counter!(self.reports_generated_total).increment(1);
        histogram!(self.report_duration).record(duration.as_secs_f64());
        #[allow(clippy::cast_precision_loss)]
        let size_bytes = size_bytes as f64;
        histogram!(self.report_size_bytes).record(size_bytes);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

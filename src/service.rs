use tracing::{info, warn};

use crate::aggregator::InsightAggregator;
use crate::auth::CredentialVerifier;
use crate::error::{InsightsError, Result};
use crate::logging::OperationTimer;
use crate::metrics::MetricsCollector;
use crate::models::{AccountInsight, ReportArtifact};
use crate::report::ReportRenderer;
use crate::repository::RecordStore;
use crate::session::Session;
use crate::validation::InputValidator;

/// Wires the record store, credential check, aggregation and rendering together
pub struct InsightService {
    store: Box<dyn RecordStore>,
    verifier: Box<dyn CredentialVerifier>,
    aggregator: InsightAggregator,
    renderer: ReportRenderer,
    metrics: MetricsCollector,
}

impl InsightService {
    /// Create a service over a store and credential check
    #[must_use]
    pub fn new(
        store: Box<dyn RecordStore>,
        verifier: Box<dyn CredentialVerifier>,
        aggregator: InsightAggregator,
        renderer: ReportRenderer,
    ) -> Self {
        Self {
            store,
            verifier,
            aggregator,
            renderer,
            metrics: MetricsCollector::default(),
        }
    }

    /// Renderer used for charts and exports
    #[must_use]
    pub const fn renderer(&self) -> &ReportRenderer {
        &self.renderer
    }

    /// Names offered on the login form
    pub async fn account_names(&self) -> Result<Vec<String>> {
        self.store.list_distinct_names().await
    }

    /// Submit the login form from `session`, returning the next session state
    pub fn login(&self, session: &Session, name: &str, password: &str) -> Result<Session> {
        InputValidator::validate_account_name(name)
            .map_err(|e| InsightsError::InvalidInput(e.to_string()))?;
        InputValidator::validate_password(password)
            .map_err(|e| InsightsError::InvalidInput(e.to_string()))?;

        let next = session.submit(name, password, self.verifier.as_ref());
        match &next {
            Ok(_) => info!(account = name, "Login successful"),
            Err(err) => warn!(account = name, error = %err, "Login rejected"),
        }
        self.metrics.record_login(next.is_ok());
        next
    }

    /// Fetch and aggregate the selected account's records.
    ///
    /// An account without records is `NoRecordsFound`, distinct from a store failure.
    pub async fn insight_for(&self, name: &str) -> Result<AccountInsight> {
        let records = self.store.fetch_records(name).await?;

        let timer = OperationTimer::new("aggregate");
        let insight = self
            .aggregator
            .aggregate(&records)
            .ok_or_else(|| InsightsError::NoRecordsFound(name.to_string()))?;
        timer.finish();

        self.metrics.record_insight(insight.location_count());
        Ok(insight)
    }

    /// Insight for the account the session is logged in as
    pub async fn details(&self, session: &Session) -> Result<AccountInsight> {
        let account = session.account().ok_or_else(|| {
            InsightsError::InvalidTransition("details require a logged-in session".to_string())
        })?;
        self.insight_for(account).await
    }

    /// Export the insight as a PDF document
    pub async fn export_pdf(&self, insight: &AccountInsight) -> Result<ReportArtifact> {
        self.renderer.export_pdf(insight).await
    }
}

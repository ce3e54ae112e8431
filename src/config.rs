use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::schema::brand_insights;
use crate::validation::InputValidator;

/// Application configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub table: String,
    pub max_connections: u32,
    pub connection_timeout_secs: u64,
    pub query_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: Option<String>,
    pub format: String, // "json" or "text"
}

/// How pie slices are weighted in the feedback charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceWeighting {
    /// Re-tally the joined top terms, giving each term one equal slice
    Retally,
    /// Use the occurrence counts from the full feedback text
    Counts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub output_directory: String,
    pub converter_path: Option<String>,
    pub converter_timeout_secs: u64,
    pub histogram_bins: usize,
    pub top_terms: usize,
    pub slice_weighting: SliceWeighting,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "data/brand_analysis.db".to_string(),
                table: brand_insights::TABLE.to_string(),
                max_connections: 4,
                connection_timeout_secs: 5,
                query_timeout_secs: 10,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
                format: "text".to_string(),
            },
            report: ReportConfig {
                output_directory: "./output".to_string(),
                converter_path: None,
                converter_timeout_secs: 60,
                histogram_bins: 10,
                top_terms: 3,
                slice_weighting: SliceWeighting::Retally,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources with precedence
    pub fn load() -> Result<Self> {
        let defaults = Config::try_from(&Self::default())
            .map_err(|e| anyhow::anyhow!("Failed to serialize default configuration: {e}"))?;

        let config = Config::builder()
            // Start with default values
            .add_source(defaults)
            // Add config file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(File::with_name("config").required(false))
            // Add environment variables with prefix
            .add_source(
                Environment::with_prefix("BRAND_INSIGHTS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize configuration: {e}"))?;

        // Validate configuration
        app_config.validate()?;

        Ok(app_config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Validate database config
        if self.database.path.trim().is_empty() {
            return Err(anyhow::anyhow!("database path must not be empty"));
        }
        InputValidator::validate_identifier(&self.database.table)
            .map_err(|e| anyhow::anyhow!("Invalid table name: {e}"))?;
        if self.database.max_connections == 0 {
            return Err(anyhow::anyhow!("max_connections must be greater than 0"));
        }
        if self.database.connection_timeout_secs == 0 {
            return Err(anyhow::anyhow!("connection_timeout_secs must be greater than 0"));
        }
        if self.database.query_timeout_secs == 0 {
            return Err(anyhow::anyhow!("query_timeout_secs must be greater than 0"));
        }

        // Validate logging config
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level: {}. Must be one of: {:?}",
                self.logging.level,
                valid_levels
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log format: {}. Must be one of: {:?}",
                self.logging.format,
                valid_formats
            ));
        }

        // Validate report config
        if self.report.output_directory.trim().is_empty() {
            return Err(anyhow::anyhow!("output_directory must not be empty"));
        }
        if self.report.converter_timeout_secs == 0 {
            return Err(anyhow::anyhow!("converter_timeout_secs must be greater than 0"));
        }
        if self.report.histogram_bins == 0 {
            return Err(anyhow::anyhow!("histogram_bins must be greater than 0"));
        }
        if self.report.top_terms == 0 {
            return Err(anyhow::anyhow!("top_terms must be greater than 0"));
        }

        Ok(())
    }

    /// Get database path from environment or config
    #[must_use]
    pub fn get_database_path(&self) -> String {
        std::env::var("DATABASE_PATH").unwrap_or_else(|_| self.database.path.clone())
    }

    /// Get converter binary path from environment or config
    #[must_use]
    pub fn get_converter_path(&self) -> Option<String> {
        std::env::var("WKHTMLTOPDF_PATH")
            .ok()
            .or_else(|| self.report.converter_path.clone())
    }

    /// Get log level from environment or config
    #[must_use]
    pub fn get_log_level(&self) -> String {
        std::env::var("RUST_LOG").unwrap_or_else(|_| self.logging.level.clone())
    }
}

//! Data models for account records and derived insights
//!
//! This module contains all data structures used throughout the application,
//! from store rows to the per-account insight the dashboard renders.

use serde::{Deserialize, Serialize};

/// One location of a named account, as stored in the records table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    /// Unique identifier of the location
    pub business_id: String,
    /// Account name shared by all locations of the account
    pub name: String,
    /// Street address
    pub address: String,
    /// Postal code
    pub postal_code: String,
    /// Business rating, `None` when missing or not numeric
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub business_ratings: Option<f64>,
    /// Customer satisfaction score
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub csat: Option<f64>,
    /// Net promoter score
    #[serde(default, deserialize_with = "csv::invalid_option")]
    pub nps: Option<f64>,
    /// Free-text strengths
    #[serde(default)]
    pub strengths: Option<String>,
    /// Free-text areas for improvement
    #[serde(default)]
    pub areas_for_improvement: Option<String>,
}

impl BusinessRecord {
    /// Rating usable for statistics: present and finite
    #[must_use]
    pub fn rating(&self) -> Option<f64> {
        self.business_ratings.filter(|r| r.is_finite())
    }
}

/// A term and the number of times it occurred
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermCount {
    /// Lowercased token
    pub term: String,
    /// Occurrences in the joined source text
    pub count: usize,
}

/// Mean, minimum and maximum over the present values of one numeric column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Smallest value
    pub min: f64,
    /// Largest value
    pub max: f64,
    /// Number of values that contributed
    pub samples: usize,
}

/// Statistics and ranked feedback terms for one account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountInsight {
    /// Account name the insight was computed for
    pub name: String,
    /// Every fetched record, including those without a rating
    pub records: Vec<BusinessRecord>,
    /// Mean rating over records with a rating
    pub avg_rating: Option<f64>,
    /// First record holding the highest rating
    pub highest_rated: Option<BusinessRecord>,
    /// First record holding the lowest rating
    pub lowest_rated: Option<BusinessRecord>,
    /// Most frequent strength terms, best first
    pub top_strengths: Vec<TermCount>,
    /// Most frequent improvement terms, best first
    pub top_improvement_areas: Vec<TermCount>,
    /// Customer satisfaction summary
    pub csat: Option<ScoreSummary>,
    /// Net promoter score summary
    pub nps: Option<ScoreSummary>,
}

impl AccountInsight {
    /// Number of locations analyzed
    #[must_use]
    pub fn location_count(&self) -> usize {
        self.records.len()
    }

    /// Ratings in record order, skipping missing ones
    #[must_use]
    pub fn ratings(&self) -> Vec<f64> {
        self.records.iter().filter_map(BusinessRecord::rating).collect()
    }

    /// Top strength terms without counts
    #[must_use]
    pub fn strength_terms(&self) -> Vec<&str> {
        self.top_strengths.iter().map(|t| t.term.as_str()).collect()
    }

    /// Top improvement terms without counts
    #[must_use]
    pub fn improvement_terms(&self) -> Vec<&str> {
        self.top_improvement_areas
            .iter()
            .map(|t| t.term.as_str())
            .collect()
    }
}

/// A finished document offered for download
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    /// Suggested file name, e.g. `Acme_report.pdf`
    pub file_name: String,
    /// MIME type advertised with the bytes
    pub mime: &'static str,
    /// Where the document was written
    pub path: std::path::PathBuf,
    /// Document contents
    pub bytes: Vec<u8>,
}

/// MIME type used for report downloads
pub const DOWNLOAD_MIME: &str = "application/octet-stream";

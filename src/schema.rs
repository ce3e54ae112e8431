//! Database schema definitions
//!
//! This module provides constants for the table and column names used with
//! rusqlite. The table name itself comes from configuration.

/// Business records table schema
pub mod brand_insights {
    /// Default table name
    pub const TABLE: &str = "brand_insights";
    /// Primary key column
    pub const BUSINESS_ID: &str = "business_id";
    /// Account name column
    pub const NAME: &str = "name";
    /// Street address column
    pub const ADDRESS: &str = "address";
    /// Postal code column
    pub const POSTAL_CODE: &str = "postal_code";
    /// Rating column
    pub const BUSINESS_RATINGS: &str = "business_ratings";
    /// Customer satisfaction column
    pub const CSAT: &str = "csat";
    /// Net promoter score column
    pub const NPS: &str = "nps";
    /// Free-text strengths column
    pub const STRENGTHS: &str = "strengths";
    /// Free-text improvement areas column
    pub const AREAS_FOR_IMPROVEMENT: &str = "areas_for_improvement";

    /// All columns in select order
    pub const COLUMNS: [&str; 9] = [
        BUSINESS_ID,
        NAME,
        ADDRESS,
        POSTAL_CODE,
        BUSINESS_RATINGS,
        CSAT,
        NPS,
        STRENGTHS,
        AREAS_FOR_IMPROVEMENT,
    ];
}

//! Brand Insights - Account Dashboard and Reporting
//!
//! A Rust library for summarizing per-account business records: ratings
//! statistics, the most common feedback terms, charts and PDF reports.
//!
//! # Features
//!
//! - Read business records from a SQLite store with connection pooling
//! - Derived-password login gating a per-account details view
//! - Average, highest and lowest rated locations plus top feedback terms
//! - Ratings histogram and feedback pie charts rendered as PNG
//! - PDF export through an external HTML to PDF converter

/// Word tallies and per-account statistics
pub mod aggregator;
/// Credential verification
pub mod auth;
/// Chart data and rasterization
pub mod charts;
/// Configuration management
pub mod config;
/// External PDF converter
pub mod converter;
/// Database operations and connection pooling
pub mod db;
/// Error types
pub mod error;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Report composition and PDF export
pub mod report;
/// Repository pattern for data access
pub mod repository;
/// Database schema definitions
pub mod schema;
/// Login form and details view wiring
pub mod service;
/// Session state machine
pub mod session;
/// Terminal dashboard
pub mod ui;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use aggregator::InsightAggregator;
pub use db::Database;
pub use error::{InsightsError, Result};
pub use models::{AccountInsight, BusinessRecord, ReportArtifact, TermCount};
pub use service::InsightService;
pub use session::Session;

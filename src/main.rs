use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use brand_insights_rust::auth::DerivedPasswordVerifier;
use brand_insights_rust::config::AppConfig;
use brand_insights_rust::converter::PdfConverter;
use brand_insights_rust::logging::{init_logging, OperationTimer};
use brand_insights_rust::metrics::MetricsCollector;
use brand_insights_rust::report::ReportRenderer;
use brand_insights_rust::repository::{read_records_csv, SqliteRecordStore};
use brand_insights_rust::ui::{print_insight, Dashboard};
use brand_insights_rust::{Database, InsightAggregator, InsightService, Session};
use clap::{Parser, Subcommand};
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard,
    /// List the account names in the record store
    Names,
    /// Print one account's insight without the interactive prompts
    Report {
        /// Account name
        #[arg(short, long)]
        name: String,

        /// Account password
        #[arg(short, long)]
        password: String,

        /// Also export the PDF report
        #[arg(long)]
        pdf: bool,

        /// Print the insight as JSON instead of tables
        #[arg(long)]
        json: bool,
    },
    /// Load records from a CSV file into the store, creating it if needed
    Import {
        /// CSV file with a header row naming the record columns
        #[arg(short, long)]
        csv: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = init_logging(
        Some(&config.get_log_level()),
        config.logging.file_path.as_deref().map(Path::new),
        config.logging.format == "json",
    )?;

    if let Err(e) = MetricsCollector::init() {
        debug!("Metrics recorder not installed: {e}");
    }

    info!("Starting brand-insights-rust application");

    // Parse command line arguments
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => {
            let service = build_service(&config, false)?;
            Dashboard::new(&service).run().await?;
        }
        Commands::Names => list_names(&config).await?,
        Commands::Report {
            name,
            password,
            pdf,
            json,
        } => run_report(&config, &name, &password, pdf, json).await?,
        Commands::Import { csv } => import_records(&config, &csv)?,
    }

    Ok(())
}

/// Wire the store, converter and renderer into a service.
///
/// With `require_converter` an unresolvable converter is an error; otherwise it
/// is logged and only PDF export becomes unavailable.
fn build_service(config: &AppConfig, require_converter: bool) -> Result<InsightService> {
    let db_path = PathBuf::from(config.get_database_path());
    let database = Database::open(&db_path, &config.database)
        .with_context(|| format!("Failed to open record store at {}", db_path.display()))?;
    let store = SqliteRecordStore::new(
        database,
        Duration::from_secs(config.database.query_timeout_secs),
    );

    let converter_path = config.get_converter_path();
    let converter = match PdfConverter::resolve(
        converter_path.as_deref(),
        Duration::from_secs(config.report.converter_timeout_secs),
    ) {
        Ok(converter) => Some(converter),
        Err(e) if require_converter => return Err(e).context("PDF export requested"),
        Err(e) => {
            warn!("PDF export disabled: {e}");
            None
        }
    };

    let renderer = ReportRenderer::new(&config.report, converter)?;
    let aggregator = InsightAggregator::new(config.report.top_terms)?;

    Ok(InsightService::new(
        Box::new(store),
        Box::new(DerivedPasswordVerifier::new()),
        aggregator,
        renderer,
    ))
}

#[allow(clippy::print_stdout)]
async fn list_names(config: &AppConfig) -> Result<()> {
    let service = build_service(config, false)?;
    let names = service.account_names().await?;
    if names.is_empty() {
        warn!("Record store has no accounts");
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
async fn run_report(
    config: &AppConfig,
    name: &str,
    password: &str,
    pdf: bool,
    json: bool,
) -> Result<()> {
    let service = build_service(config, pdf)?;

    let session = service.login(&Session::default(), name, password)?;
    let insight = service.details(&session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&insight)?);
    } else {
        print_insight(&insight, &service);
    }

    if pdf {
        let artifact = service.export_pdf(&insight).await?;
        info!(path = %artifact.path.display(), "Report written");
        if !json {
            println!("\nPDF report: {}", artifact.path.display());
        }
    }

    Ok(())
}

fn import_records(config: &AppConfig, csv_path: &Path) -> Result<()> {
    let timer = OperationTimer::new("import_records");

    let records = read_records_csv(csv_path)
        .with_context(|| format!("Failed to read {}", csv_path.display()))?;

    let db_path = PathBuf::from(config.get_database_path());
    let database = Database::create(&db_path, &config.database)?;
    let inserted = database.insert_records(&records)?;

    info!(
        inserted,
        path = %db_path.display(),
        elapsed_secs = timer.finish().as_secs_f64(),
        "Imported records"
    );
    Ok(())
}

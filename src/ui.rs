//! Interactive terminal dashboard.
//!
//! Tables and summaries go to stdout; diagnostics stay on the tracing
//! subscriber's stderr stream.
#![allow(clippy::print_stdout)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Password, Select};
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::charts::{HistogramBin, PieSlice};
use crate::error::InsightsError;
use crate::models::{AccountInsight, BusinessRecord, ReportArtifact};
use crate::report::{format_score, summary_lines, top_terms_heading};
use crate::service::InsightService;
use crate::session::{Session, View};

const BAR_WIDTH: usize = 40;

/// Drives the login form and details view until the user quits
pub struct Dashboard<'a> {
    service: &'a InsightService,
    theme: ColorfulTheme,
}

enum DetailsAction {
    GeneratePdf,
    Logout,
    Quit,
}

impl<'a> Dashboard<'a> {
    /// Create a dashboard over `service`
    #[must_use]
    pub fn new(service: &'a InsightService) -> Self {
        Self {
            service,
            theme: ColorfulTheme::default(),
        }
    }

    /// Run until the user quits
    pub async fn run(&self) -> Result<()> {
        println!("Brand Insights Login");
        let mut session = Session::default();

        loop {
            let next = match session.view() {
                View::Login => self.login_form(&session).await?,
                View::Details(_) => self.details_view(&session).await?,
            };
            match next {
                Some(next) => session = next,
                None => break,
            }
        }

        Ok(())
    }

    async fn login_form(&self, session: &Session) -> Result<Option<Session>> {
        let names = self
            .service
            .account_names()
            .await
            .context("Could not load account names")?;
        if names.is_empty() {
            println!("No accounts found in the record store.");
            return Ok(None);
        }

        let Some(choice) = Select::with_theme(&self.theme)
            .with_prompt("Select your unique name (Esc to quit)")
            .items(&names)
            .default(0)
            .interact_opt()?
        else {
            return Ok(None);
        };
        let name = &names[choice];

        let password = Password::with_theme(&self.theme)
            .with_prompt("Enter your password")
            .allow_empty_password(true)
            .interact()?;

        match self.service.login(session, name, &password) {
            Ok(next) => {
                println!("Login successful! Redirecting to details page...");
                Ok(Some(next))
            }
            Err(err) if !err.is_fatal() => {
                println!("Error: {err}");
                Ok(Some(session.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn details_view(&self, session: &Session) -> Result<Option<Session>> {
        let account = session.account().unwrap_or_default();
        println!("\nWelcome, {account}!");

        // Computed fresh every time the view is shown
        let insight = match self.service.details(session).await {
            Ok(insight) => {
                print_insight(&insight, self.service);
                Some(insight)
            }
            Err(err @ (InsightsError::NoRecordsFound(_) | InsightsError::StoreUnavailable(_))) => {
                println!("Error: {err}");
                None
            }
            Err(err) => return Err(err.into()),
        };

        match self.choose_action(insight.is_some())? {
            DetailsAction::GeneratePdf => {
                if let Some(insight) = &insight {
                    self.generate_pdf(insight).await?;
                }
                Ok(Some(session.clone()))
            }
            DetailsAction::Logout => {
                println!("Logged out. Please log in again.");
                Ok(Some(session.logout()))
            }
            DetailsAction::Quit => Ok(None),
        }
    }

    fn choose_action(&self, has_insight: bool) -> Result<DetailsAction> {
        let mut actions = Vec::new();
        if has_insight {
            actions.push(("Generate PDF", DetailsAction::GeneratePdf));
        }
        actions.push(("Logout", DetailsAction::Logout));
        actions.push(("Quit", DetailsAction::Quit));

        let labels: Vec<&str> = actions.iter().map(|(label, _)| *label).collect();
        let choice = Select::with_theme(&self.theme)
            .with_prompt("Action")
            .items(&labels)
            .default(0)
            .interact_opt()?;

        Ok(choice.map_or(DetailsAction::Quit, |i| actions.swap_remove(i).1))
    }

    async fn generate_pdf(&self, insight: &AccountInsight) -> Result<()> {
        match self.service.export_pdf(insight).await {
            Ok(artifact) => {
                println!("PDF report generated: {}", artifact.file_name);
                self.offer_download(&artifact).await
            }
            Err(err @ InsightsError::Render(_)) => {
                println!("Error: {err}");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn offer_download(&self, artifact: &ReportArtifact) -> Result<()> {
        let wanted = Confirm::with_theme(&self.theme)
            .with_prompt(format!("Download PDF ({})?", artifact.mime))
            .default(true)
            .interact()?;
        if !wanted {
            return Ok(());
        }

        let destination: String = Input::with_theme(&self.theme)
            .with_prompt("Save as")
            .default(artifact.file_name.clone())
            .interact_text()?;
        let destination = PathBuf::from(destination);

        tokio::fs::write(&destination, &artifact.bytes)
            .await
            .with_context(|| format!("Failed to save {}", destination.display()))?;
        println!(
            "Saved {} bytes to {}",
            artifact.bytes.len(),
            destination.display()
        );
        Ok(())
    }
}

/// Print the full details view for an insight
pub fn print_insight(insight: &AccountInsight, service: &InsightService) {
    println!("Business Details for All Locations:");
    println!("{}", records_table(&insight.records));

    for line in summary_lines(insight) {
        println!("{line}");
    }

    let renderer = service.renderer();
    println!("\nDistribution of Business Ratings:");
    print!("{}", histogram_text(&renderer.ratings_histogram(insight)));

    println!("\n{}", top_terms_heading(renderer.top_terms(), "strengths"));
    print!("{}", slices_text(&renderer.strength_slices(insight)));

    println!(
        "\n{}",
        top_terms_heading(renderer.top_terms(), "areas for improvement")
    );
    print!("{}", slices_text(&renderer.area_slices(insight)));
}

/// Records as a terminal table
#[must_use]
pub fn records_table(records: &[BusinessRecord]) -> String {
    let mut builder = Builder::default();
    builder.push_record([
        "business_id",
        "name",
        "address",
        "postal_code",
        "business_ratings",
        "csat",
        "nps",
        "strengths",
        "areas_for_improvement",
    ]);

    let number = |v: Option<f64>| v.map_or_else(String::new, format_score);
    for record in records {
        builder.push_record([
            record.business_id.clone(),
            record.name.clone(),
            record.address.clone(),
            record.postal_code.clone(),
            number(record.business_ratings),
            number(record.csat),
            number(record.nps),
            record.strengths.clone().unwrap_or_default(),
            record.areas_for_improvement.clone().unwrap_or_default(),
        ]);
    }

    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Horizontal bar rendering of histogram bins
#[must_use]
pub fn histogram_text(bins: &[HistogramBin]) -> String {
    if bins.is_empty() {
        return "  (no ratings)\n".to_string();
    }

    let max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    bins.iter()
        .map(|b| {
            let width = b.count * BAR_WIDTH / max;
            format!(
                "  {:>6.2} - {:<6.2} | {:<BAR_WIDTH$} {}\n",
                b.lower,
                b.upper,
                "#".repeat(width),
                b.count
            )
        })
        .collect()
}

/// Pie slices as a percentage list
#[must_use]
pub fn slices_text(slices: &[PieSlice]) -> String {
    if slices.is_empty() {
        return "  (no feedback)\n".to_string();
    }

    let total: f64 = slices.iter().map(|s| s.value).sum();
    slices
        .iter()
        .map(|s| format!("  {:<20} {:>5.1}%\n", s.label, s.percent(total)))
        .collect()
}

//! HTML to PDF conversion through an external `wkhtmltopdf`-compatible binary.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{InsightsError, Result};

/// Binary looked up on `PATH` when no converter is configured
pub const DEFAULT_CONVERTER: &str = "wkhtmltopdf";

/// A resolved converter binary with a deadline per conversion
#[derive(Debug, Clone)]
pub struct PdfConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl PdfConverter {
    /// Resolve the converter from an explicit path or `PATH`.
    ///
    /// A configured value containing a path separator must point at an
    /// existing file; a bare name is searched on `PATH`.
    pub fn resolve(configured: Option<&str>, timeout: Duration) -> Result<Self> {
        let wanted = configured.unwrap_or(DEFAULT_CONVERTER);
        let candidate = Path::new(wanted);

        let found = if candidate.components().count() > 1 || candidate.is_absolute() {
            candidate.is_file().then(|| candidate.to_path_buf())
        } else {
            find_on_path(wanted)
        };
        let binary = found.ok_or_else(|| {
            InsightsError::Render(format!(
                "PDF converter '{wanted}' not found; install wkhtmltopdf or set report.converter_path / WKHTMLTOPDF_PATH"
            ))
        })?;

        info!(converter = %binary.display(), "Resolved PDF converter");
        Ok(Self { binary, timeout })
    }

    /// Path of the resolved binary
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Convert `html` into a PDF written at `output`.
    ///
    /// The child is killed if it outlives the timeout.
    pub async fn convert(&self, html: &str, output: &Path) -> Result<()> {
        let input = tempfile::Builder::new()
            .prefix("report-")
            .suffix(".html")
            .tempfile()?;
        tokio::fs::write(input.path(), html).await?;

        debug!(input = %input.path().display(), output = %output.display(), "Running PDF converter");
        let run = Command::new(&self.binary)
            .arg("--quiet")
            .arg("--enable-local-file-access")
            .arg(input.path())
            .arg(output)
            .kill_on_drop(true)
            .output();

        let out = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| {
                InsightsError::Render(format!(
                    "PDF converter timed out after {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| {
                InsightsError::Render(format!(
                    "failed to run {}: {e}",
                    self.binary.display()
                ))
            })?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(InsightsError::Render(format!(
                "PDF converter exited with {}: {}",
                out.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths).find_map(|dir| {
        let plain = dir.join(name);
        if plain.is_file() {
            return Some(plain);
        }
        let exe = dir.join(format!("{name}.exe"));
        exe.is_file().then_some(exe)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_explicit_path_fails_fast() {
        let err = PdfConverter::resolve(Some("/nonexistent/bin/wkhtmltopdf"), Duration::from_secs(1));
        assert!(matches!(err, Err(InsightsError::Render(msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_unknown_bare_name_fails_fast() {
        let err = PdfConverter::resolve(Some("no-such-converter-binary-xyz"), Duration::from_secs(1));
        assert!(err.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_converter_surfaces_render_error() {
        // `false` exits non-zero without writing anything
        let Ok(converter) = PdfConverter::resolve(Some("false"), Duration::from_secs(5)) else {
            return;
        };
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let output = dir.path().join("out.pdf");
        let err = converter.convert("<h1>x</h1>", &output).await;
        assert!(matches!(err, Err(InsightsError::Render(_))));
        assert!(!output.exists());
    }
}

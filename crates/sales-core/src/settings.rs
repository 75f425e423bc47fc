use clap::Parser;
use std::path::PathBuf;

use crate::error::ReportError;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Compare two periods of sales line-items and print a summary report
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sales-report",
    about = "Compare two periods of sales line-items and print a summary report",
    version
)]
pub struct Settings {
    /// Previous-period export (CSV, XLS or XLSX)
    #[arg(long, env = "SALES_REPORT_PREVIOUS")]
    pub previous: Option<PathBuf>,

    /// Current-period export (CSV, XLS or XLSX)
    #[arg(long, env = "SALES_REPORT_CURRENT")]
    pub current: PathBuf,

    /// Label assigned to previous-period rows without a period column
    #[arg(long, default_value = "previous")]
    pub previous_label: String,

    /// Label assigned to current-period rows without a period column
    #[arg(long, default_value = "current")]
    pub current_label: String,

    /// Number of keys kept in each period comparison
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub top_n: u32,

    /// Number of gainers and losers listed in the narrative summary
    #[arg(long, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub movers: u32,

    /// Number of categories used for the concentration ratio
    #[arg(long, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=50))]
    pub top_categories: u32,

    /// Output format
    #[arg(long, default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse settings from the process arguments.
    pub fn load() -> Self {
        Settings::parse()
    }

    /// Check cross-field constraints clap cannot express.
    ///
    /// Overlapping gainer/loser lists are allowed but logged, since a key can
    /// only appear in both when fewer than `2 * movers` keys are compared.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.previous.is_some() && self.previous_label == self.current_label {
            return Err(ReportError::Config(format!(
                "period labels must differ (both are '{}')",
                self.current_label
            )));
        }
        if self.top_n < self.movers * 2 {
            tracing::warn!(
                top_n = self.top_n,
                movers = self.movers,
                "top-n is smaller than twice the mover count; gainer and loser lists may overlap"
            );
        }
        Ok(())
    }

    /// The effective log level, honouring `--debug`.
    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "DEBUG"
        } else {
            &self.log_level
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

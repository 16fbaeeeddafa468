pub mod analyze;
pub mod compare;
pub mod gaps;
pub mod init;
pub mod trend;
pub mod validate;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;

use examlens_core::model::ExamResult;
use examlens_core::parser::{filter_date_range, load_results};

use crate::config::{load_config_from, ExamlensConfig};

/// Arguments shared by the analysis commands.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path to a results JSON file or directory (defaults to `results_dir` from the config)
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Only include exams on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Only include exams on or before this date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Output format: text, json, markdown (defaults to the config value)
    #[arg(long)]
    pub format: Option<String>,

    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Everything a command needs after loading.
pub struct Loaded {
    pub results: Vec<ExamResult>,
    pub config: ExamlensConfig,
    pub format: String,
}

impl InputArgs {
    /// Load the config and the date-bounded results.
    pub fn load(self) -> Result<Loaded> {
        let config = load_config_from(self.config.as_deref())?;

        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                anyhow::bail!("--from {from} is after --to {to}");
            }
        }

        let input = config.input_or_default(self.input)?;
        let all = load_results(&input)?;
        let total = all.len();
        let results = filter_date_range(all, self.from, self.to);
        tracing::info!(
            "loaded {} exam results from {} ({} in range)",
            total,
            input.display(),
            results.len()
        );

        let format = config.format_or_default(self.format);
        Ok(Loaded {
            results,
            config,
            format,
        })
    }
}

/// Print `value` as pretty JSON.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Reject format names no command understands.
pub fn check_format(format: &str) -> Result<()> {
    match format {
        "text" | "json" | "markdown" | "md" => Ok(()),
        other => anyhow::bail!("unknown format: {other} (expected text, json or markdown)"),
    }
}

//! examlens CLI — learner performance analytics from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use examlens_core::metrics::TimePeriod;

mod commands;
mod config;

use commands::InputArgs;

#[derive(Parser)]
#[command(name = "examlens", version, about = "Learner performance analytics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and print a learner report
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// Also save the report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the score trend, patterns and moving average
    Trend {
        #[command(flatten)]
        input: InputArgs,

        /// Bucket size for the period table: daily, weekly, monthly
        #[arg(long, default_value = "weekly")]
        period: TimePeriod,

        /// Moving-average window (overrides config)
        #[arg(long)]
        window: Option<usize>,
    },

    /// Show knowledge gaps, learning paths and a study plan
    Gaps {
        #[command(flatten)]
        input: InputArgs,

        /// Weekly study budget in hours (overrides config)
        #[arg(long)]
        hours_per_week: Option<f64>,
    },

    /// Compare two saved learner reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if any metric declined
        #[arg(long)]
        fail_on_decline: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check exam result files for problems
    Validate {
        /// Path to a results JSON file or directory
        #[arg(long)]
        input: PathBuf,

        /// Exit code 1 if any record would distort the metrics
        #[arg(long)]
        strict: bool,
    },

    /// Create a starter config and sample results
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("examlens=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze { input, output } => commands::analyze::execute(input, output),
        Commands::Trend {
            input,
            period,
            window,
        } => commands::trend::execute(input, period, window),
        Commands::Gaps {
            input,
            hours_per_week,
        } => commands::gaps::execute(input, hours_per_week),
        Commands::Compare {
            baseline,
            current,
            fail_on_decline,
            format,
        } => commands::compare::execute(baseline, current, fail_on_decline, format),
        Commands::Validate { input, strict } => commands::validate::execute(input, strict),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

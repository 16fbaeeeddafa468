//! Build a learner report from a results file and print it as markdown.
//!
//! ```bash
//! cargo run -p examlens-core --example quick_report [path/to/results.json]
//! ```

use std::path::PathBuf;

use examlens_core::parser::{load_results, validate_results};
use examlens_core::report::{build_report, AnalysisOptions};

fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../sample-data/learner.json")
        });

    let results = load_results(&path)?;
    for warning in validate_results(&results) {
        eprintln!("warning: {}: {}", warning.result_id, warning.error);
    }

    let options = AnalysisOptions {
        hours_per_week: 6.0,
        ..AnalysisOptions::default()
    };

    let report = build_report(&results, &options);
    println!("{}", report.to_markdown());
    Ok(())
}

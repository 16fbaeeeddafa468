//! The `examlens validate` command.

use std::path::PathBuf;

use anyhow::Result;

use examlens_core::parser::{load_results, validate_results};

pub fn execute(input: PathBuf, strict: bool) -> Result<()> {
    let results = load_results(&input)?;
    println!("{} exam result(s) in {}", results.len(), input.display());

    let warnings = validate_results(&results);
    for w in &warnings {
        println!("  [{}] WARNING: {}", w.result_id, w.error);
    }

    if warnings.is_empty() {
        println!("All results valid.");
        return Ok(());
    }

    println!("\n{} warning(s) found.", warnings.len());

    let distorting = warnings.iter().filter(|w| w.error.distorts_metrics()).count();
    if strict && distorting > 0 {
        anyhow::bail!("{distorting} record(s) would distort the metrics");
    }

    Ok(())
}

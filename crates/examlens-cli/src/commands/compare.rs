//! The `examlens compare` command.

use std::path::PathBuf;

use anyhow::Result;

use examlens_core::report::LearnerReport;

use super::check_format;

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_decline: bool,
    format: String,
) -> Result<()> {
    check_format(&format)?;

    let baseline = LearnerReport::load_json(&baseline_path)?;
    let current = LearnerReport::load_json(&current_path)?;

    let comparison = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", comparison.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        _ => {
            let (prev, cur) = (&comparison.previous, &comparison.current);
            println!(
                "Accuracy: {:.1}% -> {:.1}% ({:+.1}%)",
                prev.accuracy, cur.accuracy, comparison.change_percentage
            );
            println!(
                "Avg time/question: {:.1}s -> {:.1}s",
                prev.average_time, cur.average_time
            );
            println!(
                "Consistency: {:.1} -> {:.1}",
                prev.consistency, cur.consistency
            );

            if !comparison.improvement_areas.is_empty() {
                println!("\nImproved: {}", comparison.improvement_areas.join(", "));
            }
            if !comparison.declining_areas.is_empty() {
                println!("Declined: {}", comparison.declining_areas.join(", "));
            }
        }
    }

    if fail_on_decline && comparison.has_declines() {
        std::process::exit(1);
    }

    Ok(())
}

//! The `examlens analyze` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examlens_core::report::{build_report, LearnerReport};

use super::{check_format, print_json, InputArgs};

pub fn execute(input: InputArgs, output: Option<PathBuf>) -> Result<()> {
    let loaded = input.load()?;
    check_format(&loaded.format)?;

    let report = build_report(&loaded.results, &loaded.config.analysis_options());

    if let Some(path) = &output {
        report.save_json(path)?;
        tracing::info!("report saved to {}", path.display());
    }

    match loaded.format.as_str() {
        "json" => print_json(&report)?,
        "markdown" | "md" => println!("{}", report.to_markdown()),
        _ => print_text(&report),
    }

    Ok(())
}

fn print_text(report: &LearnerReport) {
    let overall = &report.performance.overall;
    println!("Exams analyzed: {}", report.result_count);
    if let (Some(first), Some(last)) = (report.first_exam, report.last_exam) {
        println!(
            "Period: {} to {}",
            first.format("%Y-%m-%d"),
            last.format("%Y-%m-%d")
        );
    }
    println!(
        "Accuracy: {:.1}%  Avg time/question: {:.1}s  Consistency: {:.1}  Streak: {}",
        overall.accuracy, overall.average_time, overall.consistency, overall.streak
    );
    println!(
        "Trend: {:?} ({:?}), next score ~{:.0}",
        report.trend.direction, report.trend.strength, report.trend.prediction
    );

    if !report.performance.by_topic.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            "Topic",
            "Accuracy",
            "Consistency",
            "Mastery",
            "Questions",
            "Exams",
        ]);
        for t in &report.performance.by_topic {
            table.add_row(vec![
                Cell::new(&t.topic),
                Cell::new(format!("{:.1}%", t.metrics.accuracy)),
                Cell::new(format!("{:.1}", t.metrics.consistency)),
                Cell::new(format!("{:.1}", t.mastery_level)),
                Cell::new(t.question_count),
                Cell::new(t.attempts),
            ]);
        }
        println!("\n{table}");
    }

    let gap_count = report.gaps.all_gaps().count();
    println!(
        "\n{} knowledge gap(s), {} mastered topic(s)",
        gap_count,
        report.gaps.mastery_areas.len()
    );
    for week in &report.study_plan {
        let topics: Vec<&str> = week.topics.iter().map(|t| t.as_str()).collect();
        println!(
            "  Week {}: {} ({}h, {})",
            week.week,
            topics.join(", "),
            week.total_hours,
            week.focus
        );
    }

    let eff = &report.efficiency;
    println!(
        "\nQuestions/hour: {:.1}  Best session length: {} min",
        eff.questions_per_hour, eff.optimal_study_duration
    );
    if !eff.peak_performance_times.is_empty() {
        println!("Peak hours: {}", eff.peak_performance_times.join(", "));
    }
}

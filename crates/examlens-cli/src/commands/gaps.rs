//! The `examlens gaps` command.

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use examlens_core::gaps::{
    analyze_knowledge_gaps, detect_conceptual_gaps, generate_learning_paths_with,
    generate_study_plan_from, ConceptualGap, GapAnalysis, LearningPath, StudyPlan,
};
use examlens_core::metrics::calculate_topic_performance;

use super::{check_format, print_json, InputArgs};

#[derive(Serialize)]
struct GapsOutput {
    gaps: GapAnalysis,
    learning_paths: Vec<LearningPath>,
    study_plan: Vec<StudyPlan>,
    conceptual_gaps: Vec<ConceptualGap>,
}

pub fn execute(input: InputArgs, hours_per_week: Option<f64>) -> Result<()> {
    let loaded = input.load()?;
    check_format(&loaded.format)?;

    let mut options = loaded.config.analysis_options();
    if let Some(hours) = hours_per_week {
        if !hours.is_finite() || hours <= 0.0 {
            anyhow::bail!("--hours-per-week must be positive, got {hours}");
        }
        options.hours_per_week = hours;
    }

    let topics = calculate_topic_performance(&loaded.results);
    let gaps = analyze_knowledge_gaps(&topics);
    let learning_paths = generate_learning_paths_with(&gaps, &options.prerequisites);
    let output = GapsOutput {
        study_plan: generate_study_plan_from(&gaps, &learning_paths, options.hours_per_week),
        learning_paths,
        conceptual_gaps: detect_conceptual_gaps(&topics, &options.concepts),
        gaps,
    };

    match loaded.format.as_str() {
        "json" => print_json(&output)?,
        "markdown" | "md" => print_markdown(&output),
        _ => print_text(&output),
    }

    Ok(())
}

fn print_text(output: &GapsOutput) {
    if output.gaps.improvement_priority.is_empty() {
        println!("No knowledge gaps found.");
    } else {
        let mut table = Table::new();
        table.set_header(vec![
            "#",
            "Topic",
            "Severity",
            "Accuracy",
            "Priority",
            "Next step",
        ]);
        for (rank, p) in output.gaps.improvement_priority.iter().enumerate() {
            let Some(gap) = output.gaps.all_gaps().find(|g| g.topic == p.topic) else {
                continue;
            };
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(&gap.topic),
                Cell::new(format!("{:?}", gap.severity())),
                Cell::new(format!("{:.1}%", gap.accuracy_rate * 100.0)),
                Cell::new(format!("{:.0}", p.priority_score)),
                Cell::new(gap.recommended_actions.first().map_or("", |a| a.as_str())),
            ]);
        }
        println!("{table}");
    }

    if !output.gaps.mastery_areas.is_empty() {
        let mastered: Vec<String> = output
            .gaps
            .mastery_areas
            .iter()
            .map(|m| format!("{} ({:.0}%)", m.topic, m.mastery_level))
            .collect();
        println!("\nMastered: {}", mastered.join(", "));
    }

    for path in &output.learning_paths {
        println!(
            "\n{}: {:.0}% -> {:.0}%, ~{}h",
            path.topic, path.current_level, path.target_level, path.estimated_time
        );
        if !path.prerequisites.is_empty() {
            println!("  Prerequisites: {}", path.prerequisites.join(", "));
        }
        for (i, step) in path.difficulty_progression.iter().enumerate() {
            println!("  {}. {step}", i + 1);
        }
    }

    if !output.study_plan.is_empty() {
        println!("\nStudy plan:");
        for week in &output.study_plan {
            let topics: Vec<&str> = week.topics.iter().map(|t| t.as_str()).collect();
            println!(
                "  Week {}: {} ({}h, {})",
                week.week,
                topics.join(", "),
                week.total_hours,
                week.focus
            );
        }
    }

    for c in &output.conceptual_gaps {
        match c.related_accuracy {
            Some(acc) => println!(
                "Related concept {} for {} is weak ({acc:.0}%)",
                c.related_concept, c.topic
            ),
            None => println!(
                "Related concept {} for {} has not been tested",
                c.related_concept, c.topic
            ),
        }
    }
}

fn print_markdown(output: &GapsOutput) {
    println!("| Topic | Severity | Accuracy | Priority |");
    println!("|---|---|---|---|");
    for p in &output.gaps.improvement_priority {
        if let Some(gap) = output.gaps.all_gaps().find(|g| g.topic == p.topic) {
            println!(
                "| {} | {:?} | {:.1}% | {:.0} |",
                gap.topic,
                gap.severity(),
                gap.accuracy_rate * 100.0,
                p.priority_score
            );
        }
    }
    println!();
    for week in &output.study_plan {
        let topics: Vec<&str> = week.topics.iter().map(|t| t.as_str()).collect();
        println!("- Week {}: {} ({}h)", week.week, topics.join(", "), week.total_hours);
    }
}

//! The `examlens trend` command.

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use examlens_core::metrics::{
    calculate_time_based_performance, performance_trends, TimeBasedPerformance, TimePeriod,
};
use examlens_core::trends::{
    analyze_performance_trend, calculate_moving_average, detect_patterns, MovingAveragePoint,
    PatternDetection, TrendAnalysis,
};

use super::{check_format, print_json, InputArgs};

#[derive(Serialize)]
struct TrendOutput {
    trend: TrendAnalysis,
    patterns: PatternDetection,
    moving_average: Vec<MovingAveragePoint>,
    periods: Vec<TimeBasedPerformance>,
}

pub fn execute(input: InputArgs, period: TimePeriod, window: Option<usize>) -> Result<()> {
    let loaded = input.load()?;
    check_format(&loaded.format)?;

    let window = window.unwrap_or(loaded.config.moving_average_window);
    let series = performance_trends(&loaded.results);
    let output = TrendOutput {
        trend: analyze_performance_trend(&series),
        patterns: detect_patterns(&series),
        moving_average: calculate_moving_average(&series, window),
        periods: calculate_time_based_performance(&loaded.results, period),
    };

    match loaded.format.as_str() {
        "json" => print_json(&output)?,
        "markdown" | "md" => print_markdown(&output, period),
        _ => print_text(&output, period, window),
    }

    Ok(())
}

fn print_text(output: &TrendOutput, period: TimePeriod, window: usize) {
    let t = &output.trend;
    println!(
        "Trend: {:?} ({:?}), slope {:+.2}/exam, r² {:.2}, confidence {:.0}%",
        t.direction, t.strength, t.slope, t.r_squared, t.confidence
    );
    println!("Predicted next score: {:.1}", t.prediction);

    if !output.periods.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            format!("Period ({period})"),
            "Exams".to_string(),
            "Accuracy".to_string(),
            "Time".to_string(),
        ]);
        for p in &output.periods {
            table.add_row(vec![
                Cell::new(p.date),
                Cell::new(p.exams_taken),
                Cell::new(format!("{:.1}%", p.metrics.accuracy)),
                Cell::new(format!("{:.0} min", p.total_time / 60.0)),
            ]);
        }
        println!("\n{table}");
    }

    if !output.patterns.weekly_patterns.is_empty() {
        println!("\nWeekly pattern:");
        for w in &output.patterns.weekly_patterns {
            println!(
                "  {:<9} avg {:.1} over {} exam(s)",
                w.day_name, w.average_performance, w.activity_level
            );
        }
    }

    for s in &output.patterns.seasonal_trends {
        println!(
            "  {} avg {:.1} ({:?})",
            s.period, s.average_performance, s.trend_direction
        );
    }

    for c in &output.patterns.performance_cycles {
        println!(
            "Cycle: ~{:.1} exams long, amplitude {:.1}",
            c.cycle_length, c.amplitude
        );
    }

    if !output.patterns.anomalies.is_empty() {
        println!("\nAnomalies:");
        for a in &output.patterns.anomalies {
            println!(
                "  {} {:?}: {:.0} (expected {:.0}) - {}",
                a.date.format("%Y-%m-%d"),
                a.kind,
                a.score,
                a.expected_score,
                a.possible_causes.join("; ")
            );
        }
    }

    if let Some(last) = output.moving_average.last() {
        println!(
            "\nMoving average ({window} exams): score {:.1}, time {:.0}s",
            last.score, last.time_spent
        );
    }
}

fn print_markdown(output: &TrendOutput, period: TimePeriod) {
    let t = &output.trend;
    println!(
        "**Trend:** {:?} ({:?}), slope {:+.2}, prediction {:.1}\n",
        t.direction, t.strength, t.slope, t.prediction
    );
    println!("| {period} | Exams | Accuracy |");
    println!("|---|---|---|");
    for p in &output.periods {
        println!(
            "| {} | {} | {:.1}% |",
            p.date, p.exams_taken, p.metrics.accuracy
        );
    }
}

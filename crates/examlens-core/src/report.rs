//! Learner report: one run of the whole engine, with JSON persistence and
//! comparison against an earlier report.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::gaps::{
    analyze_knowledge_gaps, default_prerequisites, detect_conceptual_gaps,
    generate_learning_paths_with, generate_study_plan_from, ConceptGraph, ConceptualGap,
    GapAnalysis, LearningPath, PrerequisiteMap, StudyPlan, DEFAULT_HOURS_PER_WEEK,
};
use crate::metrics::{
    calculate_comparison, calculate_detailed_performance, calculate_study_efficiency,
    DetailedPerformance, PerformanceComparison, StudyEfficiency,
};
use crate::model::ExamResult;
use crate::trends::{
    analyze_performance_trend, calculate_moving_average, detect_patterns, MovingAveragePoint,
    PatternDetection, TrendAnalysis, DEFAULT_MOVING_AVERAGE_WINDOW,
};

/// Knobs for [`build_report`].
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Weekly study budget for the study plan.
    pub hours_per_week: f64,
    /// Window of the moving average series.
    pub moving_average_window: usize,
    /// Topic → prerequisites for learning paths.
    pub prerequisites: PrerequisiteMap,
    /// Topic → related concepts for conceptual-gap detection.
    pub concepts: ConceptGraph,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            hours_per_week: DEFAULT_HOURS_PER_WEEK,
            moving_average_window: DEFAULT_MOVING_AVERAGE_WINDOW,
            prerequisites: default_prerequisites(),
            concepts: ConceptGraph::new(),
        }
    }
}

/// A complete learner report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearnerReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Number of exam results analyzed.
    pub result_count: usize,
    /// Date of the earliest analyzed exam.
    pub first_exam: Option<DateTime<Utc>>,
    /// Date of the latest analyzed exam.
    pub last_exam: Option<DateTime<Utc>>,
    pub performance: DetailedPerformance,
    pub trend: TrendAnalysis,
    pub patterns: PatternDetection,
    pub moving_average: Vec<MovingAveragePoint>,
    pub gaps: GapAnalysis,
    pub learning_paths: Vec<LearningPath>,
    pub study_plan: Vec<StudyPlan>,
    pub conceptual_gaps: Vec<ConceptualGap>,
    pub efficiency: StudyEfficiency,
}

/// Run every engine stage over `results`.
pub fn build_report(results: &[ExamResult], options: &AnalysisOptions) -> LearnerReport {
    let performance = calculate_detailed_performance(results);
    let trend = analyze_performance_trend(&performance.trends);
    let patterns = detect_patterns(&performance.trends);
    let moving_average =
        calculate_moving_average(&performance.trends, options.moving_average_window);

    let gaps = analyze_knowledge_gaps(&performance.by_topic);
    let learning_paths = generate_learning_paths_with(&gaps, &options.prerequisites);
    let study_plan = generate_study_plan_from(&gaps, &learning_paths, options.hours_per_week);
    let conceptual_gaps = detect_conceptual_gaps(&performance.by_topic, &options.concepts);

    tracing::info!(
        results = results.len(),
        topics = performance.by_topic.len(),
        gaps = gaps.improvement_priority.len(),
        "learner report built"
    );

    LearnerReport {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        result_count: results.len(),
        first_exam: performance.trends.first().map(|t| t.date),
        last_exam: performance.trends.last().map(|t| t.date),
        efficiency: calculate_study_efficiency(results),
        performance,
        trend,
        patterns,
        moving_average,
        gaps,
        learning_paths,
        study_plan,
        conceptual_gaps,
    }
}

impl LearnerReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: LearnerReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report's overall metrics against a baseline report.
    pub fn compare(&self, baseline: &LearnerReport) -> PerformanceComparison {
        calculate_comparison(&self.performance.overall, &baseline.performance.overall)
    }

    /// Format the report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        let overall = &self.performance.overall;

        md.push_str("# Learner report\n\n");
        md.push_str(&format!(
            "**Summary:** {} exams, accuracy {:.1}%, consistency {:.1}, streak {}\n\n",
            self.result_count, overall.accuracy, overall.consistency, overall.streak
        ));
        md.push_str(&format!(
            "**Trend:** {:?} ({:?}), slope {:+.2}/exam, next score ~{:.0} ({:.0}% confidence)\n\n",
            self.trend.direction,
            self.trend.strength,
            self.trend.slope,
            self.trend.prediction,
            self.trend.confidence
        ));

        if !self.performance.by_topic.is_empty() {
            md.push_str("## Topics\n\n");
            md.push_str("| Topic | Accuracy | Consistency | Mastery | Questions |\n");
            md.push_str("|-------|----------|-------------|---------|-----------|\n");
            for t in &self.performance.by_topic {
                md.push_str(&format!(
                    "| {} | {:.1}% | {:.1} | {:.1} | {} |\n",
                    t.topic,
                    t.metrics.accuracy,
                    t.metrics.consistency,
                    t.mastery_level,
                    t.question_count
                ));
            }
            md.push('\n');
        }

        if !self.gaps.improvement_priority.is_empty() {
            md.push_str("## Knowledge gaps\n\n");
            md.push_str("| Priority | Topic | Severity | Accuracy | Difficulty |\n");
            md.push_str("|----------|-------|----------|----------|------------|\n");
            for (rank, p) in self.gaps.improvement_priority.iter().enumerate() {
                if let Some(gap) = self.gaps.all_gaps().find(|g| g.topic == p.topic) {
                    md.push_str(&format!(
                        "| {} | {} | {:?} | {:.1}% | {} |\n",
                        rank + 1,
                        gap.topic,
                        gap.severity(),
                        gap.accuracy_rate * 100.0,
                        gap.difficulty_level
                    ));
                }
            }
            md.push('\n');
        }

        if !self.study_plan.is_empty() {
            md.push_str("## Study plan\n\n");
            for week in &self.study_plan {
                let topics: Vec<&str> = week.topics.iter().map(|t| t.as_str()).collect();
                md.push_str(&format!(
                    "- Week {} ({}h, {}): {}\n",
                    week.week,
                    week.total_hours,
                    week.focus,
                    topics.join(", ")
                ));
            }
            md.push('\n');
        }

        if !self.patterns.anomalies.is_empty() {
            md.push_str("## Anomalies\n\n");
            for a in &self.patterns.anomalies {
                md.push_str(&format!(
                    "- {}: score {:.0} ({:+.1}), possible causes: {}\n",
                    a.date.format("%Y-%m-%d"),
                    a.score,
                    a.deviation,
                    a.possible_causes.join("; ")
                ));
            }
        }

        md
    }
}

impl PerformanceComparison {
    /// Format the comparison as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** accuracy {:.1}% -> {:.1}% ({:+.1}%)\n\n",
            self.previous.accuracy, self.current.accuracy, self.change_percentage
        ));
        md.push_str("| Metric | Previous | Current |\n");
        md.push_str("|--------|----------|---------|\n");
        md.push_str(&format!(
            "| Accuracy | {:.1}% | {:.1}% |\n",
            self.previous.accuracy, self.current.accuracy
        ));
        md.push_str(&format!(
            "| Average time | {:.1}s | {:.1}s |\n",
            self.previous.average_time, self.current.average_time
        ));
        md.push_str(&format!(
            "| Consistency | {:.1} | {:.1} |\n\n",
            self.previous.consistency, self.current.consistency
        ));

        if !self.improvement_areas.is_empty() {
            md.push_str(&format!("Improved: {}\n", self.improvement_areas.join(", ")));
        }
        if !self.declining_areas.is_empty() {
            md.push_str(&format!("Declined: {}\n", self.declining_areas.join(", ")));
        }

        md
    }

    /// Returns true if any tracked metric got worse.
    pub fn has_declines(&self) -> bool {
        !self.declining_areas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::{at, result};
    use crate::model::Difficulty;

    fn history() -> Vec<ExamResult> {
        let mut results = Vec::new();
        for day in 1..=12u32 {
            let score = 50.0 + day as f64 * 3.0;
            let correct = (score / 5.0).round() as u32;
            results.push(result(
                &format!("alg-{day}"),
                at(day, 9),
                score,
                20,
                correct,
                1200.0,
                &["algebra"],
                Difficulty::Medium,
            ));
        }
        for day in 1..=4u32 {
            results.push(result(
                &format!("calc-{day}"),
                at(day, 15),
                20.0,
                10,
                2,
                1800.0,
                &["calculus"],
                Difficulty::Hard,
            ));
        }
        results
    }

    #[test]
    fn report_runs_every_stage() {
        let results = history();
        let report = build_report(&results, &AnalysisOptions::default());

        assert_eq!(report.result_count, 16);
        assert_eq!(report.performance.by_topic.len(), 2);
        assert_eq!(report.performance.by_difficulty.len(), 3);
        assert_eq!(report.first_exam, Some(at(1, 9)));
        assert_eq!(report.last_exam, Some(at(12, 9)));
        assert_eq!(report.moving_average.len(), 16 - 7 + 1);
        assert!(!report.gaps.critical_gaps.is_empty());
        assert_eq!(report.learning_paths[0].topic.as_str(), "calculus");
        assert!(!report.study_plan.is_empty());
        assert!(report.conceptual_gaps.is_empty());
    }

    #[test]
    fn study_plan_covers_exactly_the_learning_paths() {
        let mut options = AnalysisOptions::default();
        options.prerequisites.insert("calculus".into(), vec!["limits".into()]);
        let report = build_report(&history(), &options);

        assert_eq!(report.learning_paths[0].prerequisites, vec!["limits"]);
        let mut planned: Vec<_> = report
            .study_plan
            .iter()
            .flat_map(|w| w.topics.clone())
            .collect();
        let mut paths: Vec<_> = report.learning_paths.iter().map(|p| p.topic.clone()).collect();
        planned.sort();
        paths.sort();
        assert_eq!(planned, paths);
    }

    #[test]
    fn empty_history_degrades_gracefully() {
        let report = build_report(&[], &AnalysisOptions::default());
        assert_eq!(report.result_count, 0);
        assert_eq!(report.performance.overall.consistency, 100.0);
        assert_eq!(report.trend.confidence, 0.0);
        assert!(report.gaps.improvement_priority.is_empty());
        assert!(report.study_plan.is_empty());
        assert_eq!(report.first_exam, None);
    }

    #[test]
    fn json_roundtrip() {
        let report = build_report(&history(), &AnalysisOptions::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = LearnerReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.result_count, 16);
        assert_eq!(
            loaded.gaps.improvement_priority.len(),
            report.gaps.improvement_priority.len()
        );
        assert_eq!(loaded.study_plan, report.study_plan);
    }

    #[test]
    fn compare_against_baseline() {
        let all = history();
        let baseline = build_report(&all[12..], &AnalysisOptions::default());
        let current = build_report(&all, &AnalysisOptions::default());

        let cmp = current.compare(&baseline);
        assert!(cmp.change_percentage > 0.0);
        assert!(cmp.improvement_areas.contains(&"Accuracy".to_string()));
        assert!(cmp.to_markdown().contains("Accuracy"));
    }

    #[test]
    fn markdown_output() {
        let report = build_report(&history(), &AnalysisOptions::default());
        let md = report.to_markdown();
        assert!(md.contains("# Learner report"));
        assert!(md.contains("| algebra |"));
        assert!(md.contains("Knowledge gaps"));
        assert!(md.contains("Week 1"));
    }
}

//! Knowledge-gap detection, learning paths and study planning.
//!
//! Consumes the per-topic metrics produced by
//! [`crate::metrics::calculate_topic_performance`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::TopicPerformance;
use crate::model::{Difficulty, TopicId};

/// Accuracy below which a topic is a gap.
pub const GAP_ACCURACY_THRESHOLD: f64 = 80.0;
/// Level every learning path aims for.
pub const TARGET_LEVEL: f64 = 85.0;
/// Default weekly study budget in hours.
pub const DEFAULT_HOURS_PER_WEEK: f64 = 10.0;

const CRITICAL_THRESHOLD: f64 = 0.7;
const MODERATE_THRESHOLD: f64 = 0.4;
const MAX_ACTIONS: usize = 4;
const SLOW_ANSWER_SECS: f64 = 120.0;
const MIN_MASTERY_QUESTIONS: u32 = 2;

/// Severity bucket of a gap, by `improvement_needed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapSeverity {
    Critical,
    Moderate,
    Minor,
}

impl GapSeverity {
    pub fn from_improvement_needed(need: f64) -> Self {
        if need >= CRITICAL_THRESHOLD {
            GapSeverity::Critical
        } else if need >= MODERATE_THRESHOLD {
            GapSeverity::Moderate
        } else {
            GapSeverity::Minor
        }
    }
}

/// A topic the learner has not yet got to 80% accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeGap {
    pub topic: TopicId,
    pub difficulty_level: Difficulty,
    /// 0–1.
    pub accuracy_rate: f64,
    pub question_count: u32,
    /// 0–1; higher means more work needed.
    pub improvement_needed: f64,
    pub recommended_actions: Vec<String>,
}

impl KnowledgeGap {
    pub fn severity(&self) -> GapSeverity {
        GapSeverity::from_improvement_needed(self.improvement_needed)
    }

    /// Score used to rank gaps for study priority.
    pub fn priority_score(&self) -> f64 {
        let volume = (f64::from(self.question_count) * 2.0).min(20.0);
        let accuracy = if self.accuracy_rate < 0.3 {
            30.0
        } else if self.accuracy_rate < 0.5 {
            20.0
        } else if self.accuracy_rate < 0.7 {
            10.0
        } else {
            0.0
        };
        let difficulty = match self.difficulty_level {
            Difficulty::Hard => 15.0,
            Difficulty::Medium => 10.0,
            Difficulty::Easy => 0.0,
        };
        self.improvement_needed * 100.0 + volume + accuracy + difficulty
    }
}

/// A topic the learner has mastered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicMastery {
    pub topic: TopicId,
    /// Accuracy on the topic, 80–100.
    pub mastery_level: f64,
    pub questions_attempted: u32,
    pub questions_correct: u32,
    pub average_time: f64,
    pub last_practiced: DateTime<Utc>,
    pub improvement_rate: f64,
}

/// A gap with its rank score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedGap {
    pub topic: TopicId,
    pub priority_score: f64,
}

/// Gaps split by severity, mastered topics and the study priority order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub critical_gaps: Vec<KnowledgeGap>,
    pub moderate_gaps: Vec<KnowledgeGap>,
    pub minor_gaps: Vec<KnowledgeGap>,
    pub mastery_areas: Vec<TopicMastery>,
    /// Every gap, highest priority first.
    pub improvement_priority: Vec<PrioritizedGap>,
}

impl GapAnalysis {
    /// All gaps, critical first.
    pub fn all_gaps(&self) -> impl Iterator<Item = &KnowledgeGap> {
        self.critical_gaps
            .iter()
            .chain(&self.moderate_gaps)
            .chain(&self.minor_gaps)
    }
}

/// A sequence of study steps to close one gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningPath {
    pub topic: TopicId,
    pub severity: GapSeverity,
    /// Current accuracy, 0–100.
    pub current_level: f64,
    pub target_level: f64,
    /// Estimated hours of study.
    pub estimated_time: u32,
    pub prerequisites: Vec<String>,
    pub recommended_actions: Vec<String>,
    pub difficulty_progression: Vec<String>,
}

/// One week of a study plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    /// 1-based week number.
    pub week: u32,
    pub topics: Vec<TopicId>,
    pub total_hours: u32,
    pub focus: String,
}

/// A weak topic whose related concept is itself weak or untested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptualGap {
    pub topic: TopicId,
    pub related_concept: TopicId,
    /// Accuracy on the related concept, or `None` if it was never tested.
    pub related_accuracy: Option<f64>,
}

/// Topic label → prerequisite topic labels. Keys are lowercase.
pub type PrerequisiteMap = BTreeMap<String, Vec<String>>;

/// Topic → related concepts.
pub type ConceptGraph = BTreeMap<TopicId, Vec<TopicId>>;

/// Classify topics into gaps and mastery areas and rank the gaps.
pub fn analyze_knowledge_gaps(topics: &[TopicPerformance]) -> GapAnalysis {
    let gaps: Vec<KnowledgeGap> = topics
        .iter()
        .filter(|t| t.metrics.accuracy < GAP_ACCURACY_THRESHOLD)
        .map(knowledge_gap)
        .collect();

    let mut scored: Vec<PrioritizedGap> = gaps
        .iter()
        .map(|g| PrioritizedGap {
            topic: g.topic.clone(),
            priority_score: g.priority_score(),
        })
        .collect();
    // stable: ties keep input order
    scored.sort_by(|a, b| b.priority_score.total_cmp(&a.priority_score));

    let mut analysis = GapAnalysis {
        improvement_priority: scored,
        mastery_areas: mastery_areas(topics),
        ..GapAnalysis::default()
    };
    for gap in gaps {
        match gap.severity() {
            GapSeverity::Critical => analysis.critical_gaps.push(gap),
            GapSeverity::Moderate => analysis.moderate_gaps.push(gap),
            GapSeverity::Minor => analysis.minor_gaps.push(gap),
        }
    }

    tracing::debug!(
        critical = analysis.critical_gaps.len(),
        moderate = analysis.moderate_gaps.len(),
        minor = analysis.minor_gaps.len(),
        mastered = analysis.mastery_areas.len(),
        "knowledge gaps analyzed"
    );
    analysis
}

fn knowledge_gap(t: &TopicPerformance) -> KnowledgeGap {
    let m = &t.metrics;
    let speed_penalty = if m.average_time > SLOW_ANSWER_SECS { 0.3 } else { 0.0 };
    let improvement_needed =
        ((85.0 - m.accuracy) / 85.0 + (80.0 - m.consistency) / 80.0 + speed_penalty)
            .clamp(0.0, 1.0);

    let difficulty_level = if m.accuracy < 50.0 {
        Difficulty::Hard
    } else if m.accuracy < 70.0 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    };

    KnowledgeGap {
        topic: t.topic.clone(),
        difficulty_level,
        accuracy_rate: m.accuracy / 100.0,
        question_count: t.question_count,
        improvement_needed,
        recommended_actions: recommended_actions(t),
    }
}

fn recommended_actions(t: &TopicPerformance) -> Vec<String> {
    let m = &t.metrics;
    let topic = &t.topic;
    let mut actions = Vec::new();

    if m.accuracy < 50.0 {
        actions.push(format!("Review the fundamental concepts of {topic}"));
        actions.push("Work through guided examples step by step".to_string());
    } else if m.accuracy < 70.0 {
        actions.push(format!("Practice targeted problems on {topic}"));
        actions.push("Review explanations for every missed question".to_string());
    } else {
        actions.push(format!("Focus on edge cases and tricky questions in {topic}"));
    }

    if m.average_time > SLOW_ANSWER_SECS {
        actions.push("Practice timed drills to improve speed".to_string());
    }

    if m.consistency < 60.0 {
        actions.push("Study in shorter, regular sessions to build consistency".to_string());
    }

    if t.question_count < 10 {
        actions.push(format!("Attempt more practice questions on {topic}"));
    }

    actions.truncate(MAX_ACTIONS);
    actions
}

fn mastery_areas(topics: &[TopicPerformance]) -> Vec<TopicMastery> {
    let mut mastered: Vec<TopicMastery> = topics
        .iter()
        .filter(|t| {
            t.metrics.accuracy >= GAP_ACCURACY_THRESHOLD && t.question_count >= MIN_MASTERY_QUESTIONS
        })
        .map(|t| TopicMastery {
            topic: t.topic.clone(),
            mastery_level: t.metrics.accuracy,
            questions_attempted: t.question_count,
            questions_correct: t.questions_correct,
            average_time: t.metrics.average_time,
            last_practiced: t.last_practiced,
            improvement_rate: t.metrics.improvement,
        })
        .collect();
    mastered.sort_by(|a, b| b.mastery_level.total_cmp(&a.mastery_level));
    mastered
}

/// Built-in prerequisite table used when the caller supplies none.
pub fn default_prerequisites() -> PrerequisiteMap {
    let table: &[(&str, &[&str])] = &[
        ("algebra", &["arithmetic"]),
        ("geometry", &["arithmetic"]),
        ("trigonometry", &["algebra", "geometry"]),
        ("functions", &["algebra"]),
        ("calculus", &["algebra", "functions", "trigonometry"]),
        ("linear algebra", &["algebra"]),
        ("probability", &["arithmetic", "combinatorics"]),
        ("statistics", &["algebra", "probability"]),
        ("physics", &["algebra", "trigonometry"]),
        ("chemistry", &["algebra"]),
        ("organic chemistry", &["chemistry"]),
        ("algorithms", &["data structures"]),
        ("data structures", &["programming fundamentals"]),
        ("machine learning", &["linear algebra", "statistics", "calculus"]),
    ];
    table
        .iter()
        .map(|(topic, prereqs)| {
            (
                topic.to_string(),
                prereqs.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect()
}

fn difficulty_progression(level: Difficulty) -> Vec<String> {
    let steps: &[&str] = match level {
        Difficulty::Easy => &[
            "Review key concepts",
            "Practice medium-difficulty questions",
            "Attempt challenging problems",
            "Take a timed assessment",
        ],
        Difficulty::Medium => &[
            "Revisit core definitions",
            "Work through guided examples",
            "Practice easy questions until confident",
            "Progress to medium-difficulty questions",
            "Take a mixed-difficulty assessment",
        ],
        Difficulty::Hard => &[
            "Study foundational material",
            "Review prerequisite topics",
            "Work through solved examples",
            "Practice basic questions",
            "Progress to intermediate questions",
            "Attempt advanced questions",
            "Take a comprehensive assessment",
        ],
    };
    steps.iter().map(|s| s.to_string()).collect()
}

/// Learning paths for every critical and moderate gap, using the built-in
/// prerequisite table.
pub fn generate_learning_paths(analysis: &GapAnalysis) -> Vec<LearningPath> {
    generate_learning_paths_with(analysis, &default_prerequisites())
}

/// Learning paths for every critical and moderate gap, largest distance to
/// target first.
pub fn generate_learning_paths_with(
    analysis: &GapAnalysis,
    prerequisites: &PrerequisiteMap,
) -> Vec<LearningPath> {
    let mut paths: Vec<LearningPath> = analysis
        .critical_gaps
        .iter()
        .chain(&analysis.moderate_gaps)
        .map(|gap| {
            let multiplier = match gap.difficulty_level {
                Difficulty::Hard => 1.5,
                Difficulty::Medium => 1.2,
                Difficulty::Easy => 1.0,
            };
            let estimated_time = ((10.0 + gap.improvement_needed * 20.0) * multiplier).round();
            LearningPath {
                topic: gap.topic.clone(),
                severity: gap.severity(),
                current_level: gap.accuracy_rate * 100.0,
                target_level: TARGET_LEVEL,
                estimated_time: estimated_time as u32,
                prerequisites: prerequisites
                    .get(&gap.topic.as_str().to_lowercase())
                    .cloned()
                    .unwrap_or_default(),
                recommended_actions: gap.recommended_actions.clone(),
                difficulty_progression: difficulty_progression(gap.difficulty_level),
            }
        })
        .collect();

    paths.sort_by(|a, b| {
        (b.target_level - b.current_level).total_cmp(&(a.target_level - a.current_level))
    });
    paths
}

/// Pack the learning paths of `analysis`, in priority order, into weeks of
/// at most `hours_per_week` hours.
///
/// A path longer than the weekly budget gets a week to itself.
pub fn generate_study_plan(analysis: &GapAnalysis, hours_per_week: f64) -> Vec<StudyPlan> {
    generate_study_plan_from(analysis, &generate_learning_paths(analysis), hours_per_week)
}

/// Like [`generate_study_plan`], over learning paths that were already built.
pub fn generate_study_plan_from(
    analysis: &GapAnalysis,
    paths: &[LearningPath],
    hours_per_week: f64,
) -> Vec<StudyPlan> {
    let rank: HashMap<&TopicId, usize> = analysis
        .improvement_priority
        .iter()
        .enumerate()
        .map(|(i, p)| (&p.topic, i))
        .collect();

    let mut ordered: Vec<&LearningPath> = paths.iter().collect();
    ordered.sort_by_key(|p| rank.get(&p.topic).copied().unwrap_or(usize::MAX));

    let mut plan = Vec::new();
    let mut week: Vec<&LearningPath> = Vec::new();
    let mut hours = 0u32;

    for path in ordered {
        let fits = f64::from(hours.saturating_add(path.estimated_time)) <= hours_per_week;
        if !fits && !week.is_empty() {
            plan.push(close_week(plan.len() as u32 + 1, &week, hours));
            week.clear();
            hours = 0;
        }
        week.push(path);
        hours = hours.saturating_add(path.estimated_time);
    }
    if !week.is_empty() {
        plan.push(close_week(plan.len() as u32 + 1, &week, hours));
    }
    plan
}

fn close_week(number: u32, paths: &[&LearningPath], hours: u32) -> StudyPlan {
    let focus = if paths.iter().any(|p| p.severity == GapSeverity::Critical) {
        "Critical improvement"
    } else if paths.iter().any(|p| p.severity == GapSeverity::Moderate) {
        "Skill building"
    } else {
        "Refinement and mastery"
    };
    StudyPlan {
        week: number,
        topics: paths.iter().map(|p| p.topic.clone()).collect(),
        total_hours: hours,
        focus: focus.to_string(),
    }
}

/// Flag weak topics whose related concepts are untested or below 60%.
pub fn detect_conceptual_gaps(
    topics: &[TopicPerformance],
    relationships: &ConceptGraph,
) -> Vec<ConceptualGap> {
    let accuracy: HashMap<&TopicId, f64> = topics
        .iter()
        .map(|t| (&t.topic, t.metrics.accuracy))
        .collect();

    let mut seen = HashSet::new();
    let mut gaps = Vec::new();
    for t in topics.iter().filter(|t| t.metrics.accuracy < 70.0) {
        let Some(related) = relationships.get(&t.topic) else {
            continue;
        };
        for concept in related {
            let related_accuracy = accuracy.get(concept).copied();
            let weak = related_accuracy.map_or(true, |acc| acc < 60.0);
            if weak && seen.insert((t.topic.clone(), concept.clone())) {
                gaps.push(ConceptualGap {
                    topic: t.topic.clone(),
                    related_concept: concept.clone(),
                    related_accuracy,
                });
            }
        }
    }
    gaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::tests::{at, result};
    use crate::metrics::{calculate_topic_performance, PerformanceMetrics};

    const EPS: f64 = 1e-9;

    fn topic(
        name: &str,
        accuracy: f64,
        consistency: f64,
        avg_time: f64,
        count: u32,
    ) -> TopicPerformance {
        TopicPerformance {
            topic: TopicId::from(name),
            metrics: PerformanceMetrics {
                accuracy,
                average_time: avg_time,
                consistency,
                ..PerformanceMetrics::empty()
            },
            question_count: count,
            questions_correct: (accuracy / 100.0 * f64::from(count)).round() as u32,
            time_spent: avg_time * f64::from(count),
            mastery_level: accuracy * consistency / 100.0,
            last_practiced: at(1, 9),
            attempts: 1,
        }
    }

    fn sample_topics() -> Vec<TopicPerformance> {
        vec![
            topic("calculus", 30.0, 40.0, 150.0, 20),
            topic("algebra", 60.0, 70.0, 60.0, 30),
            topic("geometry", 75.0, 90.0, 40.0, 12),
            topic("statistics", 90.0, 95.0, 30.0, 20),
            topic("history", 95.0, 100.0, 20.0, 1),
            topic("physics", 85.0, 90.0, 30.0, 8),
        ]
    }

    #[test]
    fn algebra_scenario_is_a_medium_gap() {
        let scores = [40.0, 45.0, 50.0, 55.0, 60.0];
        let results: Vec<_> = scores
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let correct = (s / 5.0) as u32;
                result(
                    &format!("r{i}"),
                    at(i as u32 + 1, 9),
                    *s,
                    20,
                    correct,
                    600.0,
                    &["algebra"],
                    Difficulty::Medium,
                )
            })
            .collect();
        let topics = calculate_topic_performance(&results);
        assert!((topics[0].metrics.accuracy - 50.0).abs() < EPS);

        let analysis = analyze_knowledge_gaps(&topics);
        let gaps: Vec<_> = analysis.all_gaps().collect();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].topic.as_str(), "algebra");
        assert_eq!(gaps[0].difficulty_level, Difficulty::Medium);
    }

    #[test]
    fn improvement_needed_formula() {
        let analysis = analyze_knowledge_gaps(&[topic("algebra", 60.0, 70.0, 60.0, 30)]);
        let gap = analysis.all_gaps().next().unwrap();
        let expected = 25.0 / 85.0 + 10.0 / 80.0;
        assert!((gap.improvement_needed - expected).abs() < EPS);
        assert_eq!(gap.severity(), GapSeverity::Moderate);
        assert!((gap.accuracy_rate - 0.6).abs() < EPS);
    }

    #[test]
    fn improvement_needed_is_clamped() {
        let analysis = analyze_knowledge_gaps(&[
            topic("calculus", 10.0, 0.0, 300.0, 20),
            topic("geometry", 79.0, 100.0, 10.0, 20),
        ]);
        let critical = &analysis.critical_gaps[0];
        assert_eq!(critical.improvement_needed, 1.0);
        let minor = &analysis.minor_gaps[0];
        assert_eq!(minor.improvement_needed, 0.0);
    }

    #[test]
    fn buckets_partition_all_gaps() {
        let topics = sample_topics();
        let analysis = analyze_knowledge_gaps(&topics);
        let expected = topics.iter().filter(|t| t.metrics.accuracy < 80.0).count();

        let total =
            analysis.critical_gaps.len() + analysis.moderate_gaps.len() + analysis.minor_gaps.len();
        assert_eq!(total, expected);
        assert_eq!(analysis.improvement_priority.len(), expected);

        assert!(analysis.critical_gaps.iter().all(|g| g.improvement_needed >= 0.7));
        assert!(analysis
            .moderate_gaps
            .iter()
            .all(|g| (0.4..0.7).contains(&g.improvement_needed)));
        assert!(analysis.minor_gaps.iter().all(|g| g.improvement_needed < 0.4));

        let mut names: Vec<_> = analysis.all_gaps().map(|g| g.topic.clone()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), expected);
    }

    #[test]
    fn priority_is_non_increasing() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let scores: Vec<f64> = analysis
            .improvement_priority
            .iter()
            .map(|p| p.priority_score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(analysis.improvement_priority[0].topic.as_str(), "calculus");

        for p in &analysis.improvement_priority {
            let gap = analysis.all_gaps().find(|g| g.topic == p.topic).unwrap();
            assert!((gap.priority_score() - p.priority_score).abs() < EPS);
        }
    }

    #[test]
    fn priority_ties_keep_input_order() {
        let analysis = analyze_knowledge_gaps(&[
            topic("first", 60.0, 70.0, 60.0, 30),
            topic("second", 60.0, 70.0, 60.0, 30),
        ]);
        let order: Vec<_> = analysis
            .improvement_priority
            .iter()
            .map(|p| p.topic.as_str())
            .collect();
        assert_eq!(order, vec!["first", "second"]);
    }

    #[test]
    fn mastery_requires_accuracy_and_volume() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let mastered: Vec<_> = analysis
            .mastery_areas
            .iter()
            .map(|m| m.topic.as_str())
            .collect();
        // history has only one question
        assert_eq!(mastered, vec!["statistics", "physics"]);
        let stats = &analysis.mastery_areas[0];
        assert!(stats.mastery_level >= 80.0 && stats.mastery_level <= 100.0);
        assert_eq!(stats.questions_attempted, 20);
        assert_eq!(stats.questions_correct, 18);
    }

    #[test]
    fn actions_follow_rule_order_and_cap() {
        let analysis = analyze_knowledge_gaps(&[topic("calculus", 30.0, 40.0, 150.0, 5)]);
        let actions = &analysis.critical_gaps[0].recommended_actions;
        assert_eq!(actions.len(), 4);
        assert_eq!(actions[0], "Review the fundamental concepts of calculus");
        assert_eq!(actions[2], "Practice timed drills to improve speed");
        assert_eq!(actions[3], "Study in shorter, regular sessions to build consistency");
    }

    #[test]
    fn learning_paths_for_critical_and_moderate_only() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let paths = generate_learning_paths(&analysis);
        let expected = analysis.critical_gaps.len() + analysis.moderate_gaps.len();
        assert_eq!(paths.len(), expected);

        let gaps: Vec<f64> = paths.iter().map(|p| p.target_level - p.current_level).collect();
        assert!(gaps.windows(2).all(|w| w[0] >= w[1]));

        let calculus = &paths[0];
        assert_eq!(calculus.topic.as_str(), "calculus");
        assert_eq!(calculus.target_level, 85.0);
        assert!((calculus.current_level - 30.0).abs() < EPS);
        // hard, improvement_needed 1.0 => 30 * 1.5
        assert_eq!(calculus.estimated_time, 45);
        assert_eq!(calculus.difficulty_progression.len(), 7);
        assert_eq!(
            calculus.prerequisites,
            vec!["algebra", "functions", "trigonometry"]
        );
    }

    #[test]
    fn progression_length_by_difficulty() {
        assert_eq!(difficulty_progression(Difficulty::Easy).len(), 4);
        assert_eq!(difficulty_progression(Difficulty::Medium).len(), 5);
        assert_eq!(difficulty_progression(Difficulty::Hard).len(), 7);
    }

    #[test]
    fn custom_prerequisites_may_be_empty() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let paths = generate_learning_paths_with(&analysis, &PrerequisiteMap::new());
        assert!(paths.iter().all(|p| p.prerequisites.is_empty()));
    }

    #[test]
    fn study_plan_packs_weeks_greedily() {
        let analysis = analyze_knowledge_gaps(&[
            topic("a", 60.0, 70.0, 60.0, 30),
            topic("b", 60.0, 70.0, 60.0, 30),
            topic("c", 60.0, 70.0, 60.0, 30),
        ]);
        // each path: medium, need ~0.419 => round(18.38 * 1.2) = 22h
        let plan = generate_study_plan(&analysis, 50.0);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].week, 1);
        assert_eq!(plan[0].topics.len(), 2);
        assert_eq!(plan[0].total_hours, 44);
        assert_eq!(plan[0].focus, "Skill building");
        assert_eq!(plan[1].week, 2);
        assert_eq!(plan[1].topics.len(), 1);
    }

    #[test]
    fn oversized_path_gets_its_own_week() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let plan = generate_study_plan(&analysis, DEFAULT_HOURS_PER_WEEK);
        let paths = generate_learning_paths(&analysis);
        assert_eq!(plan.len(), paths.len());
        assert_eq!(plan[0].topics[0].as_str(), "calculus");
        assert_eq!(plan[0].focus, "Critical improvement");
        assert!(plan.iter().all(|w| !w.topics.is_empty()));
    }

    #[test]
    fn empty_analysis_has_no_plan() {
        let analysis = analyze_knowledge_gaps(&[]);
        assert!(generate_learning_paths(&analysis).is_empty());
        assert!(generate_study_plan(&analysis, 10.0).is_empty());
    }

    #[test]
    fn conceptual_gaps_flag_weak_or_missing_concepts() {
        let topics = vec![
            topic("calculus", 40.0, 60.0, 60.0, 20),
            topic("algebra", 55.0, 60.0, 60.0, 20),
            topic("geometry", 90.0, 90.0, 60.0, 20),
        ];
        let mut graph = ConceptGraph::new();
        graph.insert(
            TopicId::from("calculus"),
            vec![
                TopicId::from("algebra"),
                TopicId::from("limits"),
                TopicId::from("geometry"),
                TopicId::from("algebra"),
            ],
        );
        graph.insert(TopicId::from("geometry"), vec![TopicId::from("limits")]);

        let gaps = detect_conceptual_gaps(&topics, &graph);
        assert_eq!(gaps.len(), 2);
        assert_eq!(gaps[0].related_concept.as_str(), "algebra");
        assert_eq!(gaps[0].related_accuracy, Some(55.0));
        assert_eq!(gaps[1].related_concept.as_str(), "limits");
        assert_eq!(gaps[1].related_accuracy, None);
    }

    #[test]
    fn partition_and_priority_hold_across_grid() {
        let mut topics = Vec::new();
        for accuracy in [0.0, 25.0, 45.0, 55.0, 65.0, 75.0, 79.9, 80.0, 95.0, 100.0] {
            for consistency in [0.0, 40.0, 70.0, 90.0, 100.0] {
                for avg_time in [30.0, 121.0, 300.0] {
                    for count in [0, 1, 2, 5, 10, 40] {
                        let name = format!("t{}", topics.len());
                        topics.push(topic(&name, accuracy, consistency, avg_time, count));
                    }
                }
            }
        }
        let analysis = analyze_knowledge_gaps(&topics);

        let expected_gaps = topics.iter().filter(|t| t.metrics.accuracy < 80.0).count();
        assert_eq!(analysis.all_gaps().count(), expected_gaps);
        assert_eq!(analysis.improvement_priority.len(), expected_gaps);
        assert!(analysis.critical_gaps.iter().all(|g| g.improvement_needed >= 0.7));
        assert!(analysis
            .moderate_gaps
            .iter()
            .all(|g| (0.4..0.7).contains(&g.improvement_needed)));
        assert!(analysis.minor_gaps.iter().all(|g| g.improvement_needed < 0.4));
        assert!(analysis
            .all_gaps()
            .all(|g| (0.0..=1.0).contains(&g.improvement_needed) && g.recommended_actions.len() <= 4));

        let scores: Vec<f64> = analysis
            .improvement_priority
            .iter()
            .map(|p| p.priority_score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));

        let expected_mastery = topics
            .iter()
            .filter(|t| t.metrics.accuracy >= 80.0 && t.question_count >= 2)
            .count();
        assert_eq!(analysis.mastery_areas.len(), expected_mastery);
        assert!(analysis
            .mastery_areas
            .iter()
            .all(|m| (80.0..=100.0).contains(&m.mastery_level)));
    }

    #[test]
    fn mastery_reports_summed_correct_answers() {
        let results = vec![
            result("a", at(1, 9), 90.0, 10, 9, 600.0, &["algebra"], Difficulty::Easy),
            result("b", at(2, 9), 80.0, 10, 8, 600.0, &["algebra"], Difficulty::Easy),
            result("c", at(3, 9), 85.0, 7, 6, 600.0, &["algebra"], Difficulty::Easy),
        ];
        let analysis = analyze_knowledge_gaps(&calculate_topic_performance(&results));
        let algebra = &analysis.mastery_areas[0];
        assert_eq!(algebra.questions_attempted, 27);
        assert_eq!(algebra.questions_correct, 23);
    }

    #[test]
    fn study_plan_from_prebuilt_paths() {
        let analysis = analyze_knowledge_gaps(&sample_topics());
        let paths = generate_learning_paths_with(&analysis, &PrerequisiteMap::new());

        let plan = generate_study_plan_from(&analysis, &paths, DEFAULT_HOURS_PER_WEEK);
        assert_eq!(plan, generate_study_plan(&analysis, DEFAULT_HOURS_PER_WEEK));

        let only_first = generate_study_plan_from(&analysis, &paths[..1], 1000.0);
        assert_eq!(only_first.len(), 1);
        assert_eq!(only_first[0].topics, vec![paths[0].topic.clone()]);
    }
}

//! Aggregate and segmented performance metrics.
//!
//! Everything here is a pure function over a slice of [`ExamResult`]s. Empty
//! input yields neutral values rather than an error.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Difficulty, ExamResult, PerformanceTrend, TopicId};
use crate::statistics::{clamp_pct, mean, safe_div, std_dev};

/// Score at or above which an exam counts as passed (streaks, success rate).
pub const PASSING_SCORE: f64 = 70.0;

/// Standard deviation treated as "maximally inconsistent" on a 0–100 scale.
const MAX_PLAUSIBLE_DEVIATION: f64 = 50.0;

/// Sessions longer than this (seconds) are inspected for fatigue.
const FATIGUE_SESSION_SECS: f64 = 3600.0;

/// Fallback for `optimal_study_duration` when there is no history.
const DEFAULT_STUDY_MINUTES: u32 = 30;

/// Aggregate metrics for a set of exam results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Percentage of answered questions that were correct (0–100).
    pub accuracy: f64,
    /// Seconds spent per answered question.
    pub average_time: f64,
    /// Mean score of the later half minus mean score of the earlier half.
    pub improvement: f64,
    /// 100 for perfectly uniform scores, falling towards 0 as they spread.
    pub consistency: f64,
    /// Questions per minute weighted by score.
    pub efficiency: f64,
    /// Consecutive recent passing exams with at most one day between them.
    pub streak: u32,
}

impl PerformanceMetrics {
    /// Metrics for an empty history.
    pub fn empty() -> Self {
        Self {
            accuracy: 0.0,
            average_time: 0.0,
            improvement: 0.0,
            consistency: 100.0,
            efficiency: 0.0,
            streak: 0,
        }
    }
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self::empty()
    }
}

/// Metrics for one topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicPerformance {
    pub topic: TopicId,
    pub metrics: PerformanceMetrics,
    /// Total questions answered across exams covering this topic.
    pub question_count: u32,
    /// Total questions answered correctly across those exams.
    pub questions_correct: u32,
    /// Seconds spent across exams covering this topic.
    pub time_spent: f64,
    /// `accuracy * consistency / 100`, capped at 100.
    pub mastery_level: f64,
    pub last_practiced: DateTime<Utc>,
    /// Number of exams covering this topic.
    pub attempts: u32,
}

/// Metrics for one difficulty bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifficultyPerformance {
    pub difficulty: Difficulty,
    pub metrics: PerformanceMetrics,
    pub question_count: u32,
    /// Percentage of exams in the bucket that scored at least 70.
    pub success_rate: f64,
    /// Mean questions answered per exam in the bucket.
    pub average_attempts: f64,
}

/// Granularity of a time-based group-by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    Daily,
    Weekly,
    Monthly,
}

impl TimePeriod {
    /// The calendar date that identifies the bucket containing `date`.
    fn bucket(self, date: NaiveDate) -> NaiveDate {
        match self {
            TimePeriod::Daily => date,
            TimePeriod::Weekly => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            TimePeriod::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

impl fmt::Display for TimePeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimePeriod::Daily => write!(f, "daily"),
            TimePeriod::Weekly => write!(f, "weekly"),
            TimePeriod::Monthly => write!(f, "monthly"),
        }
    }
}

impl FromStr for TimePeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" | "day" => Ok(TimePeriod::Daily),
            "weekly" | "week" => Ok(TimePeriod::Weekly),
            "monthly" | "month" => Ok(TimePeriod::Monthly),
            other => Err(format!("unknown time period: {other}")),
        }
    }
}

/// Metrics for one calendar bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBasedPerformance {
    pub period: TimePeriod,
    /// First day of the bucket.
    pub date: NaiveDate,
    pub metrics: PerformanceMetrics,
    pub exams_taken: u32,
    pub total_time: f64,
}

/// Overall metrics plus every segmentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedPerformance {
    pub overall: PerformanceMetrics,
    pub by_topic: Vec<TopicPerformance>,
    pub by_difficulty: Vec<DifficultyPerformance>,
    pub by_time_period: Vec<TimeBasedPerformance>,
    pub trends: Vec<PerformanceTrend>,
}

/// Side-by-side comparison of two metric snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceComparison {
    pub current: PerformanceMetrics,
    pub previous: PerformanceMetrics,
    /// Relative accuracy change in percent.
    pub change_percentage: f64,
    pub improvement_areas: Vec<String>,
    pub declining_areas: Vec<String>,
}

/// A long session showing signs of fatigue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueIndicator {
    /// Session length in seconds.
    pub session_duration: f64,
    pub accuracy_decline: f64,
    pub response_time_increase: f64,
    pub error_rate_increase: f64,
}

/// How productively the learner uses study time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyEfficiency {
    pub questions_per_hour: f64,
    pub accuracy_per_minute: f64,
    /// Session length in minutes with the best mean score.
    pub optimal_study_duration: u32,
    pub fatigue_indicators: Vec<FatigueIndicator>,
    /// Up to three hours of day, best first, formatted `"H:00"`.
    pub peak_performance_times: Vec<String>,
}

/// Compute aggregate metrics for a set of results.
pub fn calculate_overall_metrics(results: &[ExamResult]) -> PerformanceMetrics {
    if results.is_empty() {
        return PerformanceMetrics::empty();
    }

    let total_answered: f64 = results.iter().map(|r| f64::from(r.questions_answered)).sum();
    let total_correct: f64 = results.iter().map(|r| f64::from(r.questions_correct)).sum();
    let total_time: f64 = results.iter().map(|r| r.total_time).sum();

    let accuracy = clamp_pct(safe_div(100.0 * total_correct, total_answered));
    let average_time = safe_div(total_time, total_answered);

    let scores: Vec<f64> = results.iter().map(|r| r.score).collect();

    PerformanceMetrics {
        accuracy,
        average_time,
        improvement: calculate_improvement(results),
        consistency: calculate_consistency(&scores),
        efficiency: calculate_efficiency(results),
        streak: calculate_streak(results),
    }
}

/// Sum of a per-result count, saturating at `u32::MAX`.
fn count_sum<'a>(
    results: impl IntoIterator<Item = &'a ExamResult>,
    count: impl Fn(&ExamResult) -> u32,
) -> u32 {
    results
        .into_iter()
        .fold(0u32, |total, r| total.saturating_add(count(r)))
}

fn chronological(results: &[ExamResult]) -> Vec<&ExamResult> {
    let mut sorted: Vec<&ExamResult> = results.iter().collect();
    sorted.sort_by_key(|r| r.date);
    sorted
}

fn calculate_improvement(results: &[ExamResult]) -> f64 {
    if results.len() < 2 {
        return 0.0;
    }
    let sorted = chronological(results);
    let (first, second) = sorted.split_at(sorted.len() / 2);
    let first: Vec<f64> = first.iter().map(|r| r.score).collect();
    let second: Vec<f64> = second.iter().map(|r| r.score).collect();
    mean(&second) - mean(&first)
}

fn calculate_consistency(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 100.0;
    }
    let deviation = std_dev(scores);
    clamp_pct(100.0 - 100.0 * deviation / MAX_PLAUSIBLE_DEVIATION)
}

fn calculate_efficiency(results: &[ExamResult]) -> f64 {
    let per_result: Vec<f64> = results
        .iter()
        .map(|r| {
            let per_minute = safe_div(f64::from(r.questions_answered), r.total_time / 60.0);
            per_minute * (r.score / 100.0)
        })
        .collect();
    mean(&per_result)
}

fn calculate_streak(results: &[ExamResult]) -> u32 {
    let mut sorted = chronological(results);
    sorted.reverse();

    let mut streak = 0;
    let mut later_day: Option<NaiveDate> = None;
    for r in sorted {
        if r.score < PASSING_SCORE {
            break;
        }
        let day = r.date.date_naive();
        if let Some(later) = later_day {
            if (later - day).num_days() > 1 {
                break;
            }
        }
        streak += 1;
        later_day = Some(day);
    }
    streak
}

/// Compute overall metrics plus per-topic, per-difficulty and per-day
/// breakdowns and the chronological trend series.
pub fn calculate_detailed_performance(results: &[ExamResult]) -> DetailedPerformance {
    DetailedPerformance {
        overall: calculate_overall_metrics(results),
        by_topic: calculate_topic_performance(results),
        by_difficulty: calculate_difficulty_performance(results),
        by_time_period: calculate_time_based_performance(results, TimePeriod::Daily),
        trends: performance_trends(results),
    }
}

/// Group results by every topic they cover and compute metrics per topic,
/// ordered by topic label.
pub fn calculate_topic_performance(results: &[ExamResult]) -> Vec<TopicPerformance> {
    let mut groups: BTreeMap<&TopicId, Vec<ExamResult>> = BTreeMap::new();
    for r in results {
        for topic in &r.topics_covered {
            let group = groups.entry(topic).or_default();
            // an exam listing the same topic twice still counts once
            if !group.iter().any(|g| g.id == r.id && g.date == r.date) {
                group.push(r.clone());
            }
        }
    }

    groups
        .into_iter()
        .filter_map(|(topic, group)| {
            let last_practiced = group.iter().map(|r| r.date).max()?;
            let metrics = calculate_overall_metrics(&group);
            let mastery_level = clamp_pct(metrics.accuracy * (metrics.consistency / 100.0));
            Some(TopicPerformance {
                topic: topic.clone(),
                question_count: count_sum(&group, |r| r.questions_answered),
                questions_correct: count_sum(&group, |r| r.questions_correct),
                time_spent: group.iter().map(|r| r.total_time).sum(),
                mastery_level,
                last_practiced,
                attempts: group.len() as u32,
                metrics,
            })
        })
        .collect()
}

/// Metrics for the easy, medium and hard buckets, always in that order and
/// always all three.
pub fn calculate_difficulty_performance(results: &[ExamResult]) -> Vec<DifficultyPerformance> {
    Difficulty::ALL
        .iter()
        .map(|&difficulty| {
            let bucket: Vec<ExamResult> = results
                .iter()
                .filter(|r| r.difficulty_level == difficulty)
                .cloned()
                .collect();
            let n = bucket.len() as f64;
            let passed = bucket.iter().filter(|r| r.score >= PASSING_SCORE).count() as f64;
            let answered: f64 = bucket.iter().map(|r| f64::from(r.questions_answered)).sum();
            DifficultyPerformance {
                difficulty,
                metrics: calculate_overall_metrics(&bucket),
                question_count: count_sum(&bucket, |r| r.questions_answered),
                success_rate: safe_div(100.0 * passed, n),
                average_attempts: safe_div(answered, n),
            }
        })
        .collect()
}

/// Group results into calendar buckets of the given granularity, ascending.
pub fn calculate_time_based_performance(
    results: &[ExamResult],
    period: TimePeriod,
) -> Vec<TimeBasedPerformance> {
    let mut groups: BTreeMap<NaiveDate, Vec<ExamResult>> = BTreeMap::new();
    for r in results {
        groups
            .entry(period.bucket(r.date.date_naive()))
            .or_default()
            .push(r.clone());
    }

    groups
        .into_iter()
        .map(|(date, group)| TimeBasedPerformance {
            period,
            date,
            metrics: calculate_overall_metrics(&group),
            exams_taken: group.len() as u32,
            total_time: group.iter().map(|r| r.total_time).sum(),
        })
        .collect()
}

/// Project results into the chronological trend series.
pub fn performance_trends(results: &[ExamResult]) -> Vec<PerformanceTrend> {
    chronological(results)
        .into_iter()
        .map(PerformanceTrend::from)
        .collect()
}

/// Compare two metric snapshots.
///
/// Accuracy and consistency improve upwards; average time improves
/// downwards. A metric that did not move lands in neither list.
pub fn calculate_comparison(
    current: &PerformanceMetrics,
    previous: &PerformanceMetrics,
) -> PerformanceComparison {
    let change_percentage = safe_div(
        100.0 * (current.accuracy - previous.accuracy),
        previous.accuracy,
    );

    let mut improvement_areas = Vec::new();
    let mut declining_areas = Vec::new();

    let checks = [
        ("Accuracy", current.accuracy - previous.accuracy),
        ("Response time", previous.average_time - current.average_time),
        ("Consistency", current.consistency - previous.consistency),
    ];
    for (label, gain) in checks {
        if gain > 0.0 {
            improvement_areas.push(label.to_string());
        } else if gain < 0.0 {
            declining_areas.push(label.to_string());
        }
    }

    PerformanceComparison {
        current: current.clone(),
        previous: previous.clone(),
        change_percentage,
        improvement_areas,
        declining_areas,
    }
}

/// Derive study-efficiency indicators from session lengths and scores.
pub fn calculate_study_efficiency(results: &[ExamResult]) -> StudyEfficiency {
    let total_answered: f64 = results.iter().map(|r| f64::from(r.questions_answered)).sum();
    let total_time: f64 = results.iter().map(|r| r.total_time).sum();

    let per_minute: Vec<f64> = results
        .iter()
        .map(|r| safe_div(r.score / 100.0, r.total_time / 60.0))
        .collect();

    let fatigue_indicators = results
        .iter()
        .filter(|r| r.total_time > FATIGUE_SESSION_SECS)
        .map(|r| FatigueIndicator {
            session_duration: r.total_time,
            accuracy_decline: (80.0 - r.score).max(0.0),
            response_time_increase: (safe_div(r.total_time, f64::from(r.questions_answered))
                - 60.0)
                .max(0.0),
            error_rate_increase: ((100.0 - r.score) - 20.0).max(0.0),
        })
        .collect();

    StudyEfficiency {
        questions_per_hour: safe_div(total_answered, total_time / 3600.0),
        accuracy_per_minute: mean(&per_minute),
        optimal_study_duration: optimal_study_duration(results),
        fatigue_indicators,
        peak_performance_times: peak_performance_times(results),
    }
}

/// Ten-minute bucket (labelled by its upper edge) with the best mean score.
fn optimal_study_duration(results: &[ExamResult]) -> u32 {
    let mut buckets: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for r in results {
        let minutes = r.total_time.max(0.0) / 60.0;
        // bucketed in f64 so huge sessions cannot overflow
        let bucket = ((minutes / 10.0).ceil().max(1.0) * 10.0).min(f64::from(u32::MAX)) as u32;
        buckets.entry(bucket).or_default().push(r.score);
    }

    let mut best: Option<(u32, f64)> = None;
    for (bucket, scores) in &buckets {
        let avg = mean(scores);
        if best.map_or(true, |(_, best_avg)| avg > best_avg) {
            best = Some((*bucket, avg));
        }
    }
    best.map_or(DEFAULT_STUDY_MINUTES, |(bucket, _)| bucket)
}

fn peak_performance_times(results: &[ExamResult]) -> Vec<String> {
    let mut by_hour: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for r in results {
        by_hour.entry(r.date.hour()).or_default().push(r.score);
    }

    let mut ranked: Vec<(u32, f64)> = by_hour
        .into_iter()
        .map(|(hour, scores)| (hour, mean(&scores)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    ranked
        .into_iter()
        .take(3)
        .map(|(hour, _)| format!("{hour}:00"))
        .collect()
}

//! Trend fitting and pattern detection over a score time series.
//!
//! Inputs are [`PerformanceTrend`] points in any order; every function sorts
//! a private copy chronologically before looking at it.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::model::{PerformanceTrend, TopicId};
use crate::statistics::{linear_regression, mean, safe_div, std_dev, variance};

/// Default window of [`calculate_moving_average`].
pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 7;

const MIN_TREND_POINTS: usize = 3;
const MIN_SEASONAL_POINTS: usize = 30;
const MIN_CYCLE_POINTS: usize = 14;
const MIN_ANOMALY_POINTS: usize = 10;
const CYCLE_WINDOW: usize = 7;

/// Which way scores are heading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// How well a straight line explains the scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendStrength {
    Weak,
    Moderate,
    Strong,
}

/// Result of fitting a trend line to the score series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendAnalysis {
    pub direction: TrendDirection,
    pub strength: TrendStrength,
    /// 0–100.
    pub confidence: f64,
    /// Score change per exam.
    pub slope: f64,
    pub r_squared: f64,
    /// Forecast score of the next exam, 0–100.
    pub prediction: f64,
}

/// Performance aggregated by day of week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPattern {
    /// 0 = Sunday … 6 = Saturday.
    pub day_of_week: u32,
    pub day_name: String,
    pub average_performance: f64,
    pub consistency: f64,
    /// Number of exams taken on this weekday.
    pub activity_level: u32,
}

/// Direction of a month relative to the overall average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeasonalDirection {
    Up,
    Down,
    Stable,
}

/// Performance of one calendar month against the overall average.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalTrend {
    /// `YYYY-MM`.
    pub period: String,
    pub average_performance: f64,
    pub deviation: f64,
    pub trend_direction: SeasonalDirection,
    pub confidence: f64,
}

/// A recurring rise and fall in the smoothed score series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceCycle {
    /// Mean distance between consecutive peaks, in exams.
    pub cycle_length: f64,
    pub peak_performance_day: f64,
    pub low_performance_day: f64,
    pub amplitude: f64,
}

/// Whether an anomaly lies above or below the mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnomalyKind {
    Spike,
    Drop,
}

/// A score more than two standard deviations from the mean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub date: DateTime<Utc>,
    pub score: f64,
    /// Mean score of the series.
    pub expected_score: f64,
    /// `score - expected_score`.
    pub deviation: f64,
    pub kind: AnomalyKind,
    pub possible_causes: Vec<String>,
}

/// Every pattern found in a series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternDetection {
    pub weekly_patterns: Vec<WeeklyPattern>,
    pub seasonal_trends: Vec<SeasonalTrend>,
    pub performance_cycles: Vec<PerformanceCycle>,
    pub anomalies: Vec<Anomaly>,
}

/// One point of a moving average, tagged with the date of its window's last
/// exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovingAveragePoint {
    pub date: DateTime<Utc>,
    pub score: f64,
    pub time_spent: f64,
    pub questions_answered: f64,
}

fn sorted(trends: &[PerformanceTrend]) -> Vec<&PerformanceTrend> {
    let mut sorted: Vec<&PerformanceTrend> = trends.iter().collect();
    sorted.sort_by_key(|t| t.date);
    sorted
}

/// Fit a least-squares line through the scores against their position.
pub fn analyze_performance_trend(trends: &[PerformanceTrend]) -> TrendAnalysis {
    let points = sorted(trends);

    if points.len() < MIN_TREND_POINTS {
        return TrendAnalysis {
            direction: TrendDirection::Stable,
            strength: TrendStrength::Weak,
            confidence: 0.0,
            slope: 0.0,
            r_squared: 0.0,
            prediction: points.last().map_or(0.0, |t| t.score),
        };
    }

    let scores: Vec<f64> = points.iter().map(|t| t.score).collect();
    let n = scores.len() as f64;
    let fit = linear_regression(&scores);

    let direction = if fit.slope.abs() < 0.1 {
        TrendDirection::Stable
    } else if fit.slope > 0.0 {
        TrendDirection::Improving
    } else {
        TrendDirection::Declining
    };

    let strength = if fit.r_squared < 0.3 {
        TrendStrength::Weak
    } else if fit.r_squared < 0.7 {
        TrendStrength::Moderate
    } else {
        TrendStrength::Strong
    };

    TrendAnalysis {
        direction,
        strength,
        confidence: fit.r_squared * (n / 20.0).min(1.0) * 100.0,
        slope: fit.slope,
        r_squared: fit.r_squared,
        prediction: (fit.slope * n + fit.intercept).clamp(0.0, 100.0),
    }
}

/// Run every pattern detector. Detectors that need more history than is
/// available return an empty list.
pub fn detect_patterns(trends: &[PerformanceTrend]) -> PatternDetection {
    let points = sorted(trends);
    PatternDetection {
        weekly_patterns: weekly_patterns(&points),
        seasonal_trends: seasonal_trends(&points),
        performance_cycles: performance_cycles(&points),
        anomalies: anomalies(&points),
    }
}

fn weekly_patterns(points: &[&PerformanceTrend]) -> Vec<WeeklyPattern> {
    let mut by_day: BTreeMap<u32, (Weekday, Vec<f64>)> = BTreeMap::new();
    for t in points {
        let weekday = t.date.weekday();
        by_day
            .entry(weekday.num_days_from_sunday())
            .or_insert_with(|| (weekday, Vec::new()))
            .1
            .push(t.score);
    }

    by_day
        .into_iter()
        .map(|(day, (weekday, scores))| WeeklyPattern {
            day_of_week: day,
            day_name: day_name(weekday).to_string(),
            average_performance: mean(&scores),
            consistency: (100.0 - variance(&scores).sqrt()).max(0.0),
            activity_level: scores.len() as u32,
        })
        .collect()
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Sun => "Sunday",
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
    }
}

fn seasonal_trends(points: &[&PerformanceTrend]) -> Vec<SeasonalTrend> {
    if points.len() < MIN_SEASONAL_POINTS {
        tracing::debug!(points = points.len(), "too few points for seasonal trends");
        return Vec::new();
    }

    let all_scores: Vec<f64> = points.iter().map(|t| t.score).collect();
    let overall = mean(&all_scores);

    let mut by_month: BTreeMap<(i32, u32), Vec<f64>> = BTreeMap::new();
    for t in points {
        by_month
            .entry((t.date.year(), t.date.month()))
            .or_default()
            .push(t.score);
    }

    by_month
        .into_iter()
        .map(|((year, month), scores)| {
            let average = mean(&scores);
            let deviation = average - overall;
            let trend_direction = if deviation.abs() < 2.0 {
                SeasonalDirection::Stable
            } else if deviation > 0.0 {
                SeasonalDirection::Up
            } else {
                SeasonalDirection::Down
            };
            SeasonalTrend {
                period: format!("{year:04}-{month:02}"),
                average_performance: average,
                deviation,
                trend_direction,
                confidence: (scores.len() as f64 * 5.0).min(100.0),
            }
        })
        .collect()
}

fn performance_cycles(points: &[&PerformanceTrend]) -> Vec<PerformanceCycle> {
    if points.len() < MIN_CYCLE_POINTS {
        tracing::debug!(points = points.len(), "too few points for cycle detection");
        return Vec::new();
    }

    let scores: Vec<f64> = points.iter().map(|t| t.score).collect();
    let smoothed: Vec<f64> = scores.windows(CYCLE_WINDOW).map(mean).collect();

    let mut peaks = Vec::new();
    let mut valleys = Vec::new();
    for i in 1..smoothed.len().saturating_sub(1) {
        let (prev, cur, next) = (smoothed[i - 1], smoothed[i], smoothed[i + 1]);
        if cur > prev && cur > next {
            peaks.push(i);
        } else if cur < prev && cur < next {
            valleys.push(i);
        }
    }

    if peaks.len() < 2 || valleys.len() < 2 {
        return Vec::new();
    }

    let gaps: Vec<f64> = peaks.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let day_of = |indices: &[usize]| -> f64 {
        let days: Vec<f64> = indices.iter().map(|i| (i % 7) as f64).collect();
        mean(&days)
    };
    let values_at = |indices: &[usize]| -> Vec<f64> { indices.iter().map(|&i| smoothed[i]).collect() };

    vec![PerformanceCycle {
        cycle_length: mean(&gaps),
        peak_performance_day: day_of(&peaks),
        low_performance_day: day_of(&valleys),
        amplitude: mean(&values_at(&peaks)) - mean(&values_at(&valleys)),
    }]
}

fn anomalies(points: &[&PerformanceTrend]) -> Vec<Anomaly> {
    if points.len() < MIN_ANOMALY_POINTS {
        tracing::debug!(points = points.len(), "too few points for anomaly detection");
        return Vec::new();
    }

    let scores: Vec<f64> = points.iter().map(|t| t.score).collect();
    let avg = mean(&scores);
    let sigma = std_dev(&scores);

    let times: Vec<f64> = points.iter().map(|t| t.time_spent).collect();
    let avg_time = mean(&times);

    points
        .iter()
        .enumerate()
        .filter(|(_, t)| (t.score - avg).abs() > 2.0 * sigma)
        .map(|(i, t)| {
            let previous = i.checked_sub(1).map(|p| points[p]);
            Anomaly {
                date: t.date,
                score: t.score,
                expected_score: avg,
                deviation: t.score - avg,
                kind: if t.score > avg {
                    AnomalyKind::Spike
                } else {
                    AnomalyKind::Drop
                },
                possible_causes: possible_causes(t, previous, points, avg_time),
            }
        })
        .collect()
}

fn possible_causes(
    point: &PerformanceTrend,
    previous: Option<&PerformanceTrend>,
    all: &[&PerformanceTrend],
    avg_time: f64,
) -> Vec<String> {
    let mut causes = Vec::new();

    if matches!(point.date.weekday(), Weekday::Sat | Weekday::Sun) {
        causes.push("Weekend session".to_string());
    }

    if avg_time > 0.0 {
        if point.time_spent > avg_time * 1.5 {
            causes.push("Unusually long session".to_string());
        } else if point.time_spent < avg_time * 0.5 {
            causes.push("Unusually short session".to_string());
        }
    }

    if let Some(prev) = previous {
        if point.date - prev.date > Duration::days(3) {
            causes.push("Return after a break".to_string());
        }
    }

    if has_uncommon_topic(point, all) {
        causes.push("New or uncommon topics".to_string());
    }

    if causes.is_empty() {
        causes.push("Unknown factors".to_string());
    }
    causes
}

/// A topic is uncommon when fewer than 30% of the other records cover it.
fn has_uncommon_topic(point: &PerformanceTrend, all: &[&PerformanceTrend]) -> bool {
    let others: Vec<HashSet<&TopicId>> = all
        .iter()
        .filter(|t| !std::ptr::eq(**t, point))
        .map(|t| t.topics_covered.iter().collect())
        .collect();

    point.topics_covered.iter().any(|topic| {
        let covering = others.iter().filter(|set| set.contains(topic)).count();
        safe_div(covering as f64, others.len() as f64) < 0.3
    })
}

/// Sliding-window average of score, time and question count.
///
/// Produces `max(0, n - window + 1)` points; a zero window produces none.
pub fn calculate_moving_average(
    trends: &[PerformanceTrend],
    window: usize,
) -> Vec<MovingAveragePoint> {
    if window == 0 {
        return Vec::new();
    }
    let points = sorted(trends);

    points
        .windows(window)
        .map(|w| {
            let n = w.len() as f64;
            MovingAveragePoint {
                date: w[w.len() - 1].date,
                score: w.iter().map(|t| t.score).sum::<f64>() / n,
                time_spent: w.iter().map(|t| t.time_spent).sum::<f64>() / n,
                questions_answered: w
                    .iter()
                    .map(|t| f64::from(t.questions_answered))
                    .sum::<f64>()
                    / n,
            }
        })
        .collect()
}

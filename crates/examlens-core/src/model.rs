//! Core data model types for examlens.
//!
//! These are the input records the engine consumes. They are produced by an
//! external exam-session collaborator and are never mutated by the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A topic label, used as the key of every per-topic group-by.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicId(String);

impl TopicId {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TopicId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TopicId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Difficulty bucket of an exam or a knowledge gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// All buckets in reporting order.
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// One completed exam attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamResult {
    /// Identifier assigned by the exam-session store.
    pub id: String,
    /// When the attempt was completed.
    pub date: DateTime<Utc>,
    /// Score in the range 0–100.
    pub score: f64,
    pub questions_answered: u32,
    pub questions_correct: u32,
    /// Total time spent in seconds.
    pub total_time: f64,
    /// Topics covered, in the order the exam presented them.
    #[serde(default)]
    pub topics_covered: Vec<TopicId>,
    pub difficulty_level: Difficulty,
}

/// A chronologically ordered projection of an [`ExamResult`].
///
/// This is the unit consumed by the trend analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceTrend {
    pub date: DateTime<Utc>,
    pub score: f64,
    pub questions_answered: u32,
    /// Seconds spent on the attempt.
    pub time_spent: f64,
    pub topics_covered: Vec<TopicId>,
}

impl From<&ExamResult> for PerformanceTrend {
    fn from(r: &ExamResult) -> Self {
        Self {
            date: r.date,
            score: r.score,
            questions_answered: r.questions_answered,
            time_spent: r.total_time,
            topics_covered: r.topics_covered.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_roundtrip_lowercase() {
        let json = serde_json::to_string(&Difficulty::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
        let parsed: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(parsed, Difficulty::Hard);
    }

    #[test]
    fn difficulty_from_str() {
        assert_eq!("Easy".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("expert".parse::<Difficulty>().is_err());
    }

    #[test]
    fn topic_id_is_transparent() {
        let json = r#"{
            "id": "r1",
            "date": "2024-03-01T10:00:00Z",
            "score": 75.0,
            "questions_answered": 10,
            "questions_correct": 8,
            "total_time": 600.0,
            "topics_covered": ["algebra", "geometry"],
            "difficulty_level": "medium"
        }"#;
        let r: ExamResult = serde_json::from_str(json).unwrap();
        assert_eq!(r.topics_covered[0], TopicId::from("algebra"));
        assert_eq!(r.topics_covered[1].as_str(), "geometry");
    }

    #[test]
    fn malformed_date_is_rejected() {
        let json = r#"{
            "id": "r1",
            "date": "yesterday",
            "score": 75.0,
            "questions_answered": 10,
            "questions_correct": 8,
            "total_time": 600.0,
            "difficulty_level": "easy"
        }"#;
        assert!(serde_json::from_str::<ExamResult>(json).is_err());
    }
}

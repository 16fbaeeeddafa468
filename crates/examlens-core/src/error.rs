//! Record-level input problems.
//!
//! The engine itself never raises these: it degrades to neutral values on
//! odd input. They are surfaced at the loading boundary by
//! [`crate::parser::validate_results`] so callers can decide what to reject.

use thiserror::Error;

/// A structural problem with a single exam-result record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    /// The score lies outside 0–100 or is not a finite number.
    #[error("score {0} is outside 0-100")]
    ScoreOutOfRange(f64),

    /// More questions were marked correct than were answered.
    #[error("{correct} correct answers exceed {answered} answered questions")]
    CorrectExceedsAnswered { correct: u32, answered: u32 },

    /// Total time is negative or not a finite number.
    #[error("total_time {0}s is invalid")]
    InvalidDuration(f64),

    /// The record lists no topics, so it contributes to no topic group.
    #[error("no topics covered")]
    NoTopics,

    /// Two records share the same identifier.
    #[error("duplicate result id: {0}")]
    DuplicateId(String),
}

impl InputError {
    /// Returns `true` if the problem would distort computed metrics, as
    /// opposed to merely reducing coverage.
    pub fn distorts_metrics(&self) -> bool {
        matches!(
            self,
            InputError::ScoreOutOfRange(_)
                | InputError::CorrectExceedsAnswered { .. }
                | InputError::InvalidDuration(_)
        )
    }
}

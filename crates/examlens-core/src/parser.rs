//! JSON exam-result loader.
//!
//! Loads exam results from JSON files and directories, bounds them by date,
//! and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::InputError;
use crate::model::ExamResult;

/// Accepted top-level shapes of a results file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonResultsFile {
    Bare(Vec<ExamResult>),
    Wrapped { results: Vec<ExamResult> },
}

/// Parse a single JSON file of exam results.
pub fn parse_exam_results(path: &Path) -> Result<Vec<ExamResult>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read results file: {}", path.display()))?;

    parse_exam_results_str(&content, path)
}

/// Parse a JSON string of exam results (useful for testing).
///
/// Accepts either a bare array or an object with a `results` array.
pub fn parse_exam_results_str(content: &str, source_path: &Path) -> Result<Vec<ExamResult>> {
    let parsed: JsonResultsFile = serde_json::from_str(content)
        .with_context(|| format!("failed to parse results JSON: {}", source_path.display()))?;

    Ok(match parsed {
        JsonResultsFile::Bare(results) => results,
        JsonResultsFile::Wrapped { results } => results,
    })
}

/// Recursively load all `.json` result files from a directory.
///
/// Files that fail to parse are skipped with a warning.
pub fn load_results_directory(dir: &Path) -> Result<Vec<ExamResult>> {
    let mut results = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            results.extend(load_results_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "json") {
            match parse_exam_results(&path) {
                Ok(batch) => results.extend(batch),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(results)
}

/// Load results from a file or a directory.
pub fn load_results(path: &Path) -> Result<Vec<ExamResult>> {
    if path.is_dir() {
        load_results_directory(path)
    } else {
        parse_exam_results(path)
    }
}

/// Keep results whose calendar date falls within `from..=to`. Either bound
/// may be open.
pub fn filter_date_range(
    results: Vec<ExamResult>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<ExamResult> {
    results
        .into_iter()
        .filter(|r| {
            let day = r.date.date_naive();
            from.map_or(true, |f| day >= f) && to.map_or(true, |t| day <= t)
        })
        .collect()
}

/// A warning from result validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The result ID.
    pub result_id: String,
    pub error: InputError,
}

/// Check every record for structural problems.
///
/// The engine tolerates all of these; the warnings exist so that callers can
/// decide what to reject before analysis.
pub fn validate_results(results: &[ExamResult]) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut push = |id: &str, error: InputError| {
        warnings.push(ValidationWarning {
            result_id: id.to_string(),
            error,
        })
    };

    let mut seen_ids = HashSet::new();
    for r in results {
        if !seen_ids.insert(r.id.as_str()) {
            push(&r.id, InputError::DuplicateId(r.id.clone()));
        }
        if !(0.0..=100.0).contains(&r.score) {
            push(&r.id, InputError::ScoreOutOfRange(r.score));
        }
        if r.questions_correct > r.questions_answered {
            push(
                &r.id,
                InputError::CorrectExceedsAnswered {
                    correct: r.questions_correct,
                    answered: r.questions_answered,
                },
            );
        }
        if !r.total_time.is_finite() || r.total_time < 0.0 {
            push(&r.id, InputError::InvalidDuration(r.total_time));
        }
        if r.topics_covered.is_empty() {
            push(&r.id, InputError::NoTopics);
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const VALID_JSON: &str = r#"[
  {
    "id": "exam-1",
    "date": "2024-03-01T09:00:00Z",
    "score": 72.5,
    "questions_answered": 20,
    "questions_correct": 15,
    "total_time": 1200,
    "topics_covered": ["algebra", "functions"],
    "difficulty_level": "medium"
  },
  {
    "id": "exam-2",
    "date": "2024-03-05T18:30:00Z",
    "score": 40,
    "questions_answered": 10,
    "questions_correct": 4,
    "total_time": 900,
    "topics_covered": ["calculus"],
    "difficulty_level": "hard"
  }
]"#;

    #[test]
    fn parse_valid_json() {
        let results = parse_exam_results_str(VALID_JSON, &PathBuf::from("test.json")).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "exam-1");
        assert_eq!(results[0].topics_covered.len(), 2);
        assert_eq!(results[1].total_time, 900.0);
    }

    #[test]
    fn parse_wrapped_json() {
        let wrapped = format!(r#"{{ "results": {VALID_JSON} }}"#);
        let results = parse_exam_results_str(&wrapped, &PathBuf::from("test.json")).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn parse_malformed_json() {
        let bad = "[{ this is not json";
        let result = parse_exam_results_str(bad, &PathBuf::from("bad.json"));
        assert!(result.is_err());
    }

    #[test]
    fn load_directory_skips_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), VALID_JSON).unwrap();
        std::fs::write(dir.path().join("broken.json"), "nope").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(nested.join("b.json"), VALID_JSON).unwrap();

        let results = load_results(dir.path()).unwrap();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn date_range_is_inclusive() {
        let results = parse_exam_results_str(VALID_JSON, &PathBuf::from("test.json")).unwrap();
        let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap();

        assert_eq!(filter_date_range(results.clone(), Some(day(1)), Some(day(1))).len(), 1);
        assert_eq!(filter_date_range(results.clone(), Some(day(2)), None).len(), 1);
        assert_eq!(filter_date_range(results.clone(), None, Some(day(5))).len(), 2);
        assert_eq!(filter_date_range(results, None, None).len(), 2);
    }

    #[test]
    fn validate_clean_results() {
        let results = parse_exam_results_str(VALID_JSON, &PathBuf::from("test.json")).unwrap();
        assert!(validate_results(&results).is_empty());
    }

    #[test]
    fn validate_reports_each_problem() {
        let mut results = parse_exam_results_str(VALID_JSON, &PathBuf::from("test.json")).unwrap();
        results[1].id = "exam-1".into();
        results[1].score = 140.0;
        results[1].questions_correct = 12;
        results[1].topics_covered.clear();

        let warnings = validate_results(&results);
        let errors: Vec<_> = warnings.iter().map(|w| w.error.clone()).collect();
        assert_eq!(
            errors,
            vec![
                InputError::DuplicateId("exam-1".into()),
                InputError::ScoreOutOfRange(140.0),
                InputError::CorrectExceedsAnswered {
                    correct: 12,
                    answered: 10
                },
                InputError::NoTopics,
            ]
        );
        assert!(warnings[1].error.distorts_metrics());
        assert!(!warnings[3].error.distorts_metrics());
    }
}

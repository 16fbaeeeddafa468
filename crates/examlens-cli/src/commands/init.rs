//! The `examlens init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("examlens.toml").exists() {
        println!("examlens.toml already exists, skipping.");
    } else {
        std::fs::write("examlens.toml", SAMPLE_CONFIG)?;
        println!("Created examlens.toml");
    }

    std::fs::create_dir_all("results")?;
    let sample_path = std::path::Path::new("results/sample.json");
    if sample_path.exists() {
        println!("results/sample.json already exists, skipping.");
    } else {
        std::fs::write(sample_path, SAMPLE_RESULTS)?;
        println!("Created results/sample.json");
    }

    println!("\nNext steps:");
    println!("  1. Export your exam results as JSON into results/");
    println!("  2. Run: examlens validate --input results");
    println!("  3. Run: examlens analyze");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# examlens configuration

hours_per_week = 10.0
moving_average_window = 7
default_format = "text"

# Used when --input is omitted. ${VAR} references are expanded.
results_dir = "results"

# Extra prerequisites, merged over the built-in table.
[prerequisites]
"number theory" = ["arithmetic", "algebra"]

# Related concepts checked when a topic is weak.
[concepts]
calculus = ["algebra", "functions"]
statistics = ["probability"]
"#;

const SAMPLE_RESULTS: &str = r#"[
  {
    "id": "sample-1",
    "date": "2024-03-04T09:00:00Z",
    "score": 62,
    "questions_answered": 20,
    "questions_correct": 12,
    "total_time": 1500,
    "topics_covered": ["algebra", "functions"],
    "difficulty_level": "medium"
  },
  {
    "id": "sample-2",
    "date": "2024-03-05T18:00:00Z",
    "score": 45,
    "questions_answered": 10,
    "questions_correct": 4,
    "total_time": 1800,
    "topics_covered": ["calculus"],
    "difficulty_level": "hard"
  },
  {
    "id": "sample-3",
    "date": "2024-03-07T09:30:00Z",
    "score": 70,
    "questions_answered": 20,
    "questions_correct": 14,
    "total_time": 1320,
    "topics_covered": ["algebra"],
    "difficulty_level": "medium"
  },
  {
    "id": "sample-4",
    "date": "2024-03-09T11:00:00Z",
    "score": 88,
    "questions_answered": 15,
    "questions_correct": 13,
    "total_time": 900,
    "topics_covered": ["geometry"],
    "difficulty_level": "easy"
  },
  {
    "id": "sample-5",
    "date": "2024-03-11T09:00:00Z",
    "score": 76,
    "questions_answered": 20,
    "questions_correct": 15,
    "total_time": 1260,
    "topics_covered": ["algebra", "functions"],
    "difficulty_level": "medium"
  },
  {
    "id": "sample-6",
    "date": "2024-03-12T19:00:00Z",
    "score": 52,
    "questions_answered": 10,
    "questions_correct": 5,
    "total_time": 2100,
    "topics_covered": ["calculus"],
    "difficulty_level": "hard"
  }
]
"#;

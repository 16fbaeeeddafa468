//! `examlens.toml` configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use examlens_core::gaps::{default_prerequisites, ConceptGraph, PrerequisiteMap};
use examlens_core::model::TopicId;
use examlens_core::report::AnalysisOptions;
use examlens_core::trends::DEFAULT_MOVING_AVERAGE_WINDOW;

/// Top-level examlens configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamlensConfig {
    /// Weekly study budget used by the study plan.
    #[serde(default = "default_hours_per_week")]
    pub hours_per_week: f64,
    /// Moving-average window, in exams.
    #[serde(default = "default_window")]
    pub moving_average_window: usize,
    /// Output format when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,
    /// Results file or directory used when `--input` is not given.
    /// `${VAR}` references are expanded from the environment.
    #[serde(default)]
    pub results_dir: Option<String>,
    /// Extra prerequisite entries, merged over the built-in table.
    #[serde(default)]
    pub prerequisites: BTreeMap<String, Vec<String>>,
    /// Topic → related concepts.
    #[serde(default)]
    pub concepts: BTreeMap<String, Vec<String>>,
}

fn default_hours_per_week() -> f64 {
    examlens_core::gaps::DEFAULT_HOURS_PER_WEEK
}
fn default_window() -> usize {
    DEFAULT_MOVING_AVERAGE_WINDOW
}
fn default_format() -> String {
    "text".to_string()
}

impl Default for ExamlensConfig {
    fn default() -> Self {
        Self {
            hours_per_week: default_hours_per_week(),
            moving_average_window: default_window(),
            default_format: default_format(),
            results_dir: None,
            prerequisites: BTreeMap::new(),
            concepts: BTreeMap::new(),
        }
    }
}

impl ExamlensConfig {
    /// Engine options derived from this config.
    pub fn analysis_options(&self) -> AnalysisOptions {
        let mut prerequisites: PrerequisiteMap = default_prerequisites();
        for (topic, prereqs) in &self.prerequisites {
            prerequisites.insert(topic.to_lowercase(), prereqs.clone());
        }

        let concepts: ConceptGraph = self
            .concepts
            .iter()
            .map(|(topic, related)| {
                (
                    TopicId::new(topic.as_str()),
                    related.iter().map(|r| TopicId::new(r.as_str())).collect(),
                )
            })
            .collect();

        AnalysisOptions {
            hours_per_week: self.hours_per_week,
            moving_average_window: self.moving_average_window,
            prerequisites,
            concepts,
        }
    }

    /// The `--format` value if given, else the configured default.
    pub fn format_or_default(&self, format: Option<String>) -> String {
        format.unwrap_or_else(|| self.default_format.clone())
    }

    /// The `--input` path if given, else the configured `results_dir`.
    pub fn input_or_default(&self, input: Option<PathBuf>) -> Result<PathBuf> {
        input
            .or_else(|| self.results_dir.as_deref().map(PathBuf::from))
            .context("no input given: pass --input or set results_dir in examlens.toml")
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to an empty string.
pub fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load config from an explicit path, or search the default locations.
///
/// Search order:
/// 1. `examlens.toml` in the current directory
/// 2. `~/.config/examlens/config.toml`
///
/// Falls back to defaults when neither exists.
pub fn load_config_from(path: Option<&Path>) -> Result<ExamlensConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("examlens.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => ExamlensConfig::default(),
    };

    config.results_dir = config.results_dir.as_deref().map(resolve_env_vars);

    Ok(config)
}

fn parse_config(content: &str) -> Result<ExamlensConfig> {
    let config: ExamlensConfig = toml::from_str(content)?;
    if !config.hours_per_week.is_finite() || config.hours_per_week <= 0.0 {
        anyhow::bail!("hours_per_week must be positive, got {}", config.hours_per_week);
    }
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("examlens"))
}

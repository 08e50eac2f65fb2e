//! TOML-based configuration for datachat.
//!
//! Supports a config file (datachat.toml) with environment variable
//! expansion in demo file paths.
//!
//! Example configuration:
//! ```toml
//! [lineage]
//! datasets_table = "bank_datasets"
//! edges_table = "bank_lineage"
//! jobs_table = "bank_jobs"
//!
//! [layout]
//! width = 1100.0
//! height = 1200.0
//! link_distance = 150.0
//!
//! [query]
//! preview_limit = 100
//!
//! [[demos]]
//! title = "Bank lineage"
//! body = "Datasets, jobs and lineage edges of a retail bank"
//! file = "${DATACHAT_DEMOS}/bank.sqlite3"
//! questions = ["Which jobs feed the loans mart?"]
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::LayoutConfig;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Demo not found: {0}")]
    DemoNotFound(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Relations the lineage graph is built from.
    pub lineage: LineageSettings,

    /// Force layout constants.
    pub layout: LayoutConfig,

    /// Ad-hoc query settings.
    pub query: QuerySettings,

    /// Sample datasets offered to the user.
    pub demos: Vec<DemoSettings>,
}

/// Names of the three relations that drive the lineage graph.
///
/// Any relations with these shapes work; only the names are configured.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LineageSettings {
    pub datasets_table: String,
    pub dataset_id_column: String,
    pub dataset_name_column: String,
    pub category_column: String,

    pub edges_table: String,
    pub edge_source_column: String,
    pub edge_target_column: String,
    pub edge_job_column: String,

    pub jobs_table: String,
    pub job_id_column: String,
    pub job_name_column: String,
}

impl Default for LineageSettings {
    fn default() -> Self {
        Self {
            datasets_table: "bank_datasets".to_string(),
            dataset_id_column: "dataset_id".to_string(),
            dataset_name_column: "dataset_name".to_string(),
            category_column: "category".to_string(),
            edges_table: "bank_lineage".to_string(),
            edge_source_column: "source_dataset".to_string(),
            edge_target_column: "target_dataset".to_string(),
            edge_job_column: "job_id".to_string(),
            jobs_table: "bank_jobs".to_string(),
            job_id_column: "job_id".to_string(),
            job_name_column: "job_name".to_string(),
        }
    }
}

/// Ad-hoc query settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Rows shown when previewing a result set.
    pub preview_limit: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { preview_limit: 100 }
    }
}

/// A sample dataset.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoSettings {
    pub title: String,

    #[serde(default)]
    pub body: String,

    /// Path to the file (supports ${ENV_VAR} expansion).
    pub file: String,

    /// Free-text context about the dataset.
    #[serde(default)]
    pub context: Option<String>,

    /// Suggested questions.
    #[serde(default)]
    pub questions: Vec<String>,
}

impl DemoSettings {
    /// The file path with environment variables expanded.
    pub fn resolved_file(&self) -> Result<PathBuf, SettingsError> {
        expand_env_vars(&self.file).map(PathBuf::from)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `DATACHAT_CONFIG`
    /// 2. `./datachat.toml`
    /// 3. `~/.config/datachat/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("DATACHAT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("datachat.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("datachat").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Find a demo by title (case-insensitive).
    pub fn demo(&self, title: &str) -> Result<&DemoSettings, SettingsError> {
        self.demos
            .iter()
            .find(|d| d.title.eq_ignore_ascii_case(title))
            .ok_or_else(|| SettingsError::DemoNotFound(title.to_string()))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A lone `$` is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let mut var_name = String::new();
        if chars.peek() == Some(&'{') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                var_name.push(ch);
                chars.next();
            }
            if var_name.is_empty() {
                result.push('$');
                continue;
            }
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}

//! Configuration loading, validation, and management for ctxwarden.
//!
//! Loads configuration from `<project>/.ctxwarden/config.toml` with
//! environment variable overrides. Validates all settings at startup.

use ctxwarden_core::CapacityLimits;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the per-project state directory.
pub const STATE_DIR: &str = ".ctxwarden";

/// The root configuration structure.
///
/// Maps directly to `<project>/.ctxwarden/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Capacity budget and pruning settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Relevance scoring table
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Hard ceiling on admitted bytes
    #[serde(default = "default_max_context_size")]
    pub max_context_size: usize,

    /// Soft ceiling; above it `optimize` prunes low-relevance items
    #[serde(default = "default_warning_threshold")]
    pub warning_threshold: usize,

    /// Items scoring strictly below this are pruned by `optimize`
    #[serde(default = "default_relevance_floor")]
    pub relevance_floor: f32,

    /// How many items the report ranks
    #[serde(default = "default_report_top_n")]
    pub report_top_n: usize,
}

fn default_max_context_size() -> usize {
    180_000
}
fn default_warning_threshold() -> usize {
    150_000
}
fn default_relevance_floor() -> f32 {
    0.3
}
fn default_report_top_n() -> usize {
    10
}

impl ContextConfig {
    pub fn limits(&self) -> CapacityLimits {
        CapacityLimits::new(self.max_context_size, self.warning_threshold)
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_context_size: default_max_context_size(),
            warning_threshold: default_warning_threshold(),
            relevance_floor: default_relevance_floor(),
            report_top_n: default_report_top_n(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_base_score")]
    pub base_score: f32,

    /// Added once per task keyword found in the item's file name
    #[serde(default = "default_keyword_bonus")]
    pub keyword_bonus: f32,

    /// Bonus for unrecognized categories whose identity looks like source code
    #[serde(default = "default_code_bonus")]
    pub code_bonus: f32,

    /// Source modified less than a day ago
    #[serde(default = "default_recent_day_bonus")]
    pub recent_day_bonus: f32,

    /// Source modified less than a week ago
    #[serde(default = "default_recent_week_bonus")]
    pub recent_week_bonus: f32,

    #[serde(default = "default_code_extensions")]
    pub code_extensions: Vec<String>,

    /// Category label → additive bonus
    #[serde(default = "default_category_bonus")]
    pub category_bonus: BTreeMap<String, f32>,
}

fn default_base_score() -> f32 {
    0.5
}
fn default_keyword_bonus() -> f32 {
    0.2
}
fn default_code_bonus() -> f32 {
    0.1
}
fn default_recent_day_bonus() -> f32 {
    0.1
}
fn default_recent_week_bonus() -> f32 {
    0.05
}
fn default_code_extensions() -> Vec<String> {
    ["rs", "py", "js", "ts", "rb", "java", "go", "c", "cpp", "h"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_category_bonus() -> BTreeMap<String, f32> {
    BTreeMap::from([
        ("specs".to_string(), 0.4),
        ("standards".to_string(), 0.3),
        ("product".to_string(), 0.2),
        ("code".to_string(), 0.1),
    ])
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: default_base_score(),
            keyword_bonus: default_keyword_bonus(),
            code_bonus: default_code_bonus(),
            recent_day_bonus: default_recent_day_bonus(),
            recent_week_bonus: default_recent_week_bonus(),
            code_extensions: default_code_extensions(),
            category_bonus: default_category_bonus(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Whether the working set is loaded and saved between runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Snapshot location, relative to the project root unless absolute
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: PathBuf,

    /// Per-source timeout while revalidating a snapshot
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Sources re-read concurrently while revalidating
    #[serde(default = "default_load_concurrency")]
    pub load_concurrency: usize,
}

fn default_true() -> bool {
    true
}
fn default_snapshot_file() -> PathBuf {
    PathBuf::from(STATE_DIR).join("cache").join("context_cache.json")
}
fn default_read_timeout_ms() -> u64 {
    5_000
}
fn default_load_concurrency() -> usize {
    8
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snapshot_file: default_snapshot_file(),
            read_timeout_ms: default_read_timeout_ms(),
            load_concurrency: default_load_concurrency(),
        }
    }
}

impl AppConfig {
    /// Load configuration for the project rooted at `project_root`.
    ///
    /// Environment variables override the file:
    /// - `CTXWARDEN_MAX_CONTEXT_SIZE`
    /// - `CTXWARDEN_WARNING_THRESHOLD`
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let config_path = Self::config_path(project_root);
        let mut config = Self::load_unvalidated(&config_path)?;

        if let Some(size) = env_usize("CTXWARDEN_MAX_CONTEXT_SIZE")? {
            config.context.max_context_size = size;
        }
        if let Some(threshold) = env_usize("CTXWARDEN_WARNING_THRESHOLD")? {
            config.context.warning_threshold = threshold;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load_unvalidated(path)?;
        config.validate()?;
        Ok(config)
    }

    fn load_unvalidated(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// `<project>/.ctxwarden`
    pub fn state_dir(project_root: &Path) -> PathBuf {
        project_root.join(STATE_DIR)
    }

    /// `<project>/.ctxwarden/config.toml`
    pub fn config_path(project_root: &Path) -> PathBuf {
        Self::state_dir(project_root).join("config.toml")
    }

    /// Absolute snapshot location for a project.
    pub fn snapshot_path(&self, project_root: &Path) -> PathBuf {
        if self.persistence.snapshot_file.is_absolute() {
            self.persistence.snapshot_file.clone()
        } else {
            project_root.join(&self.persistence.snapshot_file)
        }
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let ctx = &self.context;
        if ctx.max_context_size == 0 {
            return Err(ConfigError::ValidationError(
                "context.max_context_size must be > 0".into(),
            ));
        }
        if ctx.warning_threshold > ctx.max_context_size {
            return Err(ConfigError::ValidationError(format!(
                "context.warning_threshold ({}) must not exceed max_context_size ({})",
                ctx.warning_threshold, ctx.max_context_size
            )));
        }
        if !(0.0..=1.0).contains(&ctx.relevance_floor) {
            return Err(ConfigError::ValidationError(
                "context.relevance_floor must be between 0.0 and 1.0".into(),
            ));
        }

        let s = &self.scoring;
        let fixed = [
            ("base_score", s.base_score),
            ("keyword_bonus", s.keyword_bonus),
            ("code_bonus", s.code_bonus),
            ("recent_day_bonus", s.recent_day_bonus),
            ("recent_week_bonus", s.recent_week_bonus),
        ];
        for (name, value) in fixed {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "scoring.{name} must be a non-negative number"
                )));
            }
        }
        for (category, bonus) in &s.category_bonus {
            if !bonus.is_finite() || *bonus < 0.0 {
                return Err(ConfigError::ValidationError(format!(
                    "scoring.category_bonus.{category} must be a non-negative number"
                )));
            }
        }

        if self.persistence.read_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "persistence.read_timeout_ms must be > 0".into(),
            ));
        }
        if self.persistence.load_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "persistence.load_concurrency must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Generate a default config TOML string (for `init`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn env_usize(var: &str) -> Result<Option<usize>, ConfigError> {
    match std::env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::ValidationError(format!("{var} must be a byte count, got {raw:?}"))),
        Err(_) => Ok(None),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for ctxwarden_core::Error {
    fn from(err: ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.context.max_context_size, 180_000);
        assert_eq!(config.context.warning_threshold, 150_000);
        assert_eq!(config.scoring.category_bonus.get("specs"), Some(&0.4));
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.context.max_context_size, config.context.max_context_size);
        assert_eq!(parsed.scoring.category_bonus, config.scoring.category_bonus);
        assert_eq!(parsed.persistence.snapshot_file, config.persistence.snapshot_file);
    }

    #[test]
    fn warning_above_capacity_rejected() {
        let mut config = AppConfig::default();
        config.context.warning_threshold = config.context.max_context_size + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_capacity_rejected() {
        let mut config = AppConfig::default();
        config.context.max_context_size = 0;
        config.context.warning_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_bonus_rejected() {
        let mut config = AppConfig::default();
        config.scoring.category_bonus.insert("legacy".into(), -0.2);
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.context.report_top_n, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(
            tmp,
            r#"
[context]
max_context_size = 4000
warning_threshold = 3000

[scoring.category_bonus]
runbooks = 0.35
"#
        )
        .unwrap();

        let config = AppConfig::load_from(tmp.path()).unwrap();
        assert_eq!(config.context.max_context_size, 4000);
        assert_eq!(config.context.relevance_floor, 0.3);
        assert_eq!(config.scoring.category_bonus.len(), 1);
        assert_eq!(config.scoring.category_bonus.get("runbooks"), Some(&0.35));
        assert_eq!(config.persistence.load_concurrency, 8);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "[context\nmax_context_size = ").unwrap();
        let err = AppConfig::load_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn config_error_converts_to_core_error() {
        let err: ctxwarden_core::Error =
            ConfigError::ValidationError("capacity must be positive".into()).into();
        match err {
            ctxwarden_core::Error::Config { message } => {
                assert!(message.contains("capacity must be positive"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_path_resolves_against_project_root() {
        let config = AppConfig::default();
        let path = config.snapshot_path(Path::new("/work/project"));
        assert_eq!(
            path,
            PathBuf::from("/work/project/.ctxwarden/cache/context_cache.json")
        );
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("max_context_size = 180000"));
        assert!(toml_str.contains("[scoring.category_bonus]"));
    }

    #[test]
    fn limits_follow_context_section() {
        let limits = ContextConfig::default().limits();
        assert_eq!(limits.capacity, 180_000);
        assert_eq!(limits.warning_threshold, 150_000);
    }
}

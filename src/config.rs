/// Configuration system for git-galaxy
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::change::FilterPolicy;
use crate::checkpoint::DEFAULT_CHUNK_THRESHOLD;
use crate::error::{ConfigError, GalaxyError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What to read and what to leave out
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Where and how to write chunks
    #[serde(default)]
    pub output: OutputConfig,
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Repository root (or any path inside the work tree)
    #[serde(default = "default_repo_path")]
    pub repo_path: PathBuf,

    /// Read every ref instead of a single default branch
    #[serde(default)]
    pub all_branches: bool,

    /// Authors whose commits are skipped (e-mail local part or full e-mail)
    #[serde(default)]
    pub exclude_authors: Vec<String>,

    /// Paths containing any of these substrings are skipped
    #[serde(default)]
    pub ignore_paths: Vec<String>,

    /// Branch names tried in order when not reading all branches
    #[serde(default = "default_branch_candidates")]
    pub branch_candidates: Vec<String>,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory holding `index.json` and the numbered chunks
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Touched-file count that triggers a chunk flush
    #[serde(default = "default_chunk_threshold")]
    pub chunk_threshold: usize,
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch_candidates() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("galaxy-data")
}

fn default_chunk_threshold() -> usize {
    DEFAULT_CHUNK_THRESHOLD
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            repo_path: default_repo_path(),
            all_branches: false,
            exclude_authors: Vec::new(),
            ignore_paths: Vec::new(),
            branch_candidates: default_branch_candidates(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            chunk_threshold: default_chunk_threshold(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, GalaxyError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location or create default
    pub fn load_or_default() -> Result<Self, GalaxyError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<(), GalaxyError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::SaveFailed(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ConfigError::SaveFailed(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), GalaxyError> {
        if self.output.chunk_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.chunk_threshold".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }

        if !self.extraction.all_branches && self.extraction.branch_candidates.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "extraction.branch_candidates".to_string(),
                reason: "must name at least one branch unless all_branches is set".to_string(),
            }
            .into());
        }

        // An empty substring would match every path
        if self.extraction.ignore_paths.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.ignore_paths".to_string(),
                reason: "entries must not be empty".to_string(),
            }
            .into());
        }

        if self.extraction.exclude_authors.iter().any(|a| a.is_empty()) {
            return Err(ConfigError::InvalidValue {
                key: "extraction.exclude_authors".to_string(),
                reason: "entries must not be empty".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(repo) = std::env::var("GIT_GALAXY_REPO") {
            self.extraction.repo_path = PathBuf::from(repo);
        }

        if let Ok(output) = std::env::var("GIT_GALAXY_OUTPUT") {
            self.output.output_dir = PathBuf::from(output);
        }

        if let Ok(all) = std::env::var("GIT_GALAXY_ALL_BRANCHES")
            && let Ok(all) = all.parse()
        {
            self.extraction.all_branches = all;
        }

        if let Ok(authors) = std::env::var("GIT_GALAXY_EXCLUDE_AUTHORS") {
            self.extraction.exclude_authors = split_list(&authors);
        }

        if let Ok(paths) = std::env::var("GIT_GALAXY_IGNORE_PATHS") {
            self.extraction.ignore_paths = split_list(&paths);
        }
    }

    /// Create a new Config with defaults and environment overrides
    pub fn new() -> Result<Self, GalaxyError> {
        let mut config = Self::load_or_default()?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Author and path filters for the change builder
    pub fn filter_policy(&self) -> FilterPolicy {
        FilterPolicy::new(
            self.extraction.exclude_authors.iter().cloned(),
            self.extraction.ignore_paths.iter().cloned(),
        )
    }
}

/// Comma-separated list, trimmed, empty items dropped
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Platform-specific path computation
///
/// Only the configuration location is platform dependent; output directories
/// are always given explicitly or relative to the working directory.
use std::path::PathBuf;

/// Name of the per-user configuration directory
pub const APP_DIR: &str = "git-galaxy";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
    }

    /// Returns: {config_dir}/git-galaxy
    pub fn project_config_dir() -> PathBuf {
        Self::config_dir().join(APP_DIR)
    }

    /// Get default config file path
    ///
    /// Returns: {config_dir}/git-galaxy/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::project_config_dir().join("config.toml")
    }
}

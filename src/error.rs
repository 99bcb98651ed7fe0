/// Centralized error types for git-galaxy using thiserror
///
/// Fatal conditions abort a run before the checkpoint advances. Malformed log
/// lines are not errors here: the parser reports them as values and moves on.
use thiserror::Error;

/// Main error type for extraction runs
#[derive(Error, Debug)]
pub enum GalaxyError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lock error: {0}")]
    Lock(#[from] LockError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to the repository and the external log command
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Failed to open git repository: {0}")]
    OpenFailed(String),

    #[error("None of the default branches exist (tried: {})", tried.join(", "))]
    MissingBranch { tried: Vec<String> },

    #[error("Failed to resolve refs: {0}")]
    RefResolution(String),

    #[error("Failed to run git: {0}")]
    CommandSpawn(String),

    #[error("git log exited with {status}: {stderr}")]
    CommandFailed { status: String, stderr: String },
}

/// Errors related to the checkpoint index and chunk files
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Failed to load checkpoint from '{path}': {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Failed to parse checkpoint '{path}': {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Failed to serialize {what}: {reason}")]
    SerializeFailed { what: String, reason: String },

    #[error("Failed to write '{path}': {reason}")]
    WriteFailed { path: String, reason: String },

    #[error("Failed to create output directory: {0}")]
    DirectoryCreationFailed(String),
}

/// Errors related to configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to the output directory run lock
#[derive(Error, Debug)]
pub enum LockError {
    #[error("Another extraction is already running against '{path}'")]
    AlreadyRunning { path: String },

    #[error("Failed to acquire lock '{path}': {reason}")]
    AcquireFailed { path: String, reason: String },
}

/// A log line that did not fit the fixed format
///
/// Recovered locally: the line is skipped and counted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed log line {line_no}: {reason}")]
pub struct MalformedLine {
    /// 1-based line number in the log output
    pub line_no: usize,
    /// The line started with the commit marker
    pub is_marker: bool,
    pub reason: String,
}

/// Result alias for library operations
pub type Result<T> = std::result::Result<T, GalaxyError>;

impl From<anyhow::Error> for GalaxyError {
    fn from(err: anyhow::Error) -> Self {
        GalaxyError::Other(format!("{:#}", err))
    }
}

impl GalaxyError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        GalaxyError::Other(msg.into())
    }

    /// Check if this is a user error (bad config, wrong repository) vs system error
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            GalaxyError::Config(_)
                | GalaxyError::Git(GitError::MissingBranch { .. })
                | GalaxyError::Git(GitError::RepoNotFound(_))
        )
    }

    /// Check if rerunning the extraction may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GalaxyError::Io(_)
                | GalaxyError::Lock(LockError::AlreadyRunning { .. })
                | GalaxyError::Git(GitError::CommandFailed { .. })
                | GalaxyError::Checkpoint(CheckpointError::WriteFailed { .. })
        )
    }
}

//! Git history input
//!
//! Reads commit history through the external `git log` command and parses
//! its fixed-format output into commit headers and path changes.

/// Fixed-format `git log --name-status` parser
pub mod log;
/// Repository discovery, branch resolution, and log invocation
pub mod repo;

pub use log::{ChangeStatus, CommitHeader, LogParser, LogRecord, PathChange};
pub use repo::{GitRepo, LogSource, RangeSpec, Scope};

//! # git-galaxy - Incremental commit history extraction
//!
//! Turns a repository's commit history into chunked JSON change events for a
//! "galaxy" visualization, where every directory is a galaxy and every file is
//! a star at a deterministic position.
//!
//! ## Overview
//!
//! An extraction run reads `git log` output for the commits not yet captured,
//! groups it into per-commit change events, places each touched file in the
//! sky, and writes the events in size-bounded chunks next to a resumable
//! `index.json`. Running it again only reads commits newer than the last one
//! recorded in the index.
//!
//! ## Architecture
//!
//! ```text
//! index.json ──► CheckpointStore ──► RangeSpec ──► LogSource (git log)
//!                      ▲                               │
//!                      │                           LogParser
//!                 chunk files                          │
//!                      ▲                      ChangeRecordBuilder ──► Sky
//!                      └──────── ChangeEvent ◄─────────┘        (galaxies, stars)
//! ```
//!
//! ## Modules
//!
//! - [`sky`]: Spatial hashing, directory registry, and file locator
//! - [`git`]: Repository discovery, log invocation, and log parsing
//! - [`change`]: Per-commit change events and filtering
//! - [`checkpoint`]: Resumable index and chunked output
//! - [`pipeline`]: The extraction run
//! - [`lock`]: Run lock on the output directory
//! - [`config`]: Configuration management with environment variable support
//! - [`error`]: Error types and result aliases
//! - [`paths`]: Platform configuration paths
//!
//! ## Usage Example
//!
//! ```no_run
//! use git_galaxy::config::Config;
//! use git_galaxy::pipeline::extract;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::new()?;
//!     let summary = extract(&config)?;
//!     println!("{} events written", summary.events_emitted);
//!     Ok(())
//! }
//! ```

/// Per-commit change events and author/path filtering
pub mod change;

/// Resumable index and chunked event output
pub mod checkpoint;

/// Configuration management with environment variable overrides
pub mod config;

/// Error types and utilities
pub mod error;

/// Git repository access and log parsing
pub mod git;

/// Advisory lock guarding an output directory
pub mod lock;

/// Platform configuration paths
pub mod paths;

/// The extraction run
pub mod pipeline;

/// Deterministic placement of directories and files
pub mod sky;

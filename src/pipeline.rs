//! Single-threaded extraction run
//!
//! load index → resolve tips → choose range → read log → build events →
//! buffer and flush → record tips. Each run owns a fresh [`Sky`]; nothing is shared between
//! extractors.

use crate::change::{BuildStats, ChangeRecordBuilder, FilterPolicy};
use crate::checkpoint::{CheckpointStore, DEFAULT_CHUNK_THRESHOLD};
use crate::config::Config;
use crate::error::Result;
use crate::git::{GitRepo, LogParser, LogRecord, LogSource, Scope};
use crate::lock::OutputLock;
use crate::sky::Sky;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// What one run saw, dropped, and wrote
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub repo_name: String,
    pub commits_seen: usize,
    pub events_emitted: usize,
    pub commits_unknown_author: usize,
    pub commits_excluded_author: usize,
    pub commits_empty: usize,
    pub paths_ignored: usize,
    pub malformed_lines: usize,
    pub chunks_written: usize,
    /// Files touched by the events emitted in this run
    pub files_touched: usize,
    /// Emitted events per canonical author
    pub authors: BTreeMap<String, usize>,
    /// Date range covered by the index after this run
    pub range: Option<(String, String)>,
    /// Newest commit captured in the index after this run
    pub last_commit: Option<String>,
}

impl RunSummary {
    fn absorb(&mut self, stats: &BuildStats) {
        self.commits_seen = stats.commits_seen;
        self.events_emitted = stats.events_emitted;
        self.commits_unknown_author = stats.commits_unknown_author;
        self.commits_excluded_author = stats.commits_excluded_author;
        self.commits_empty = stats.commits_empty;
        self.paths_ignored = stats.paths_ignored;
        self.malformed_lines = stats.malformed_lines;
    }
}

/// Drives one extraction from a log source into an output directory
#[derive(Debug, Clone)]
pub struct Extractor {
    output_dir: PathBuf,
    policy: FilterPolicy,
    all_branches: bool,
    branch_candidates: Vec<String>,
    threshold: usize,
}

impl Extractor {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            policy: FilterPolicy::default(),
            all_branches: false,
            branch_candidates: vec!["main".to_string(), "master".to_string()],
            threshold: DEFAULT_CHUNK_THRESHOLD,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            output_dir: config.output.output_dir.clone(),
            policy: config.filter_policy(),
            all_branches: config.extraction.all_branches,
            branch_candidates: config.extraction.branch_candidates.clone(),
            threshold: config.output.chunk_threshold,
        }
    }

    pub fn with_policy(mut self, policy: FilterPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_all_branches(mut self, all_branches: bool) -> Self {
        self.all_branches = all_branches;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Scope for a discovered repository; fails with `MissingBranch` in single-branch mode
    pub fn scope_for(&self, repo: &GitRepo) -> Result<Scope> {
        if self.all_branches {
            return Ok(Scope::All);
        }
        repo.resolve_default_branch(&self.branch_candidates)
            .map(Scope::Branch)
    }

    /// Resolve the scope for `repo` and run against it
    pub fn run_repo(&self, repo: &GitRepo) -> Result<RunSummary> {
        let scope = self.scope_for(repo)?;
        self.run(repo, &repo.display_name(), &scope)
    }

    /// One full ingestion pass
    ///
    /// The log is read completely before anything is written, so a failing
    /// log command leaves the output directory as it was.
    pub fn run(&self, source: &impl LogSource, repo_name: &str, scope: &Scope) -> Result<RunSummary> {
        let _lock = OutputLock::acquire(&self.output_dir)?;

        let mut store = CheckpointStore::open(&self.output_dir, repo_name)?.with_threshold(self.threshold);

        let tips = source.tips(scope)?;
        let range = store.resume_range(tips.clone());
        if range.seen().is_empty() {
            tracing::info!("No previous run recorded, reading full history");
        } else {
            tracing::info!("Resuming past {} recorded commits", range.seen().len());
        }

        // An empty repository has nothing to walk; `git log` without revisions would fall back to HEAD
        let text = if tips.is_empty() {
            tracing::info!("No commits reachable in scope {:?}", scope);
            String::new()
        } else {
            source.read_log(&range)?
        };

        let mut sky = Sky::new();
        let mut builder = ChangeRecordBuilder::new(self.policy.clone());
        let mut summary = RunSummary {
            repo_name: repo_name.to_string(),
            ..Default::default()
        };
        let mut newest_read = None;

        for record in LogParser::from_text(&text) {
            if let LogRecord::Header(header) = &record {
                newest_read = Some(header.commit.clone());
            }
            if let Some(event) = builder.push(record, &mut sky) {
                summary.files_touched += event.touched();
                *summary.authors.entry(event.author.clone()).or_insert(0) += 1;
                store.buffer(event);
                store.maybe_flush()?;
            }
        }
        if let Some(event) = builder.finish(&mut sky) {
            summary.files_touched += event.touched();
            *summary.authors.entry(event.author.clone()).or_insert(0) += 1;
            store.buffer(event);
        }

        store.complete(tips, newest_read)?;

        summary.absorb(builder.stats());
        summary.chunks_written = store.chunks_written();
        let checkpoint = store.checkpoint();
        summary.range = checkpoint.range_start.clone().zip(checkpoint.range_end.clone());
        summary.last_commit = checkpoint.last_commit.clone();

        tracing::info!(
            "Extracted {} events from {} commits into {} new chunks ({} files touched)",
            summary.events_emitted,
            summary.commits_seen,
            summary.chunks_written,
            summary.files_touched
        );
        Ok(summary)
    }
}

/// Discover the configured repository and run a full extraction
pub fn extract(config: &Config) -> Result<RunSummary> {
    let repo = GitRepo::discover(&config.extraction.repo_path)?;
    Extractor::from_config(config).run_repo(&repo)
}

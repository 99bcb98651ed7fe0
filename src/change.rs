//! Grouping of parsed log records into per-commit change events
//!
//! Records arrive as a flat stream: a commit header followed by its path
//! changes. The builder accumulates one commit at a time and finalizes it when
//! the next header (or the end of input) arrives.

use crate::error::MalformedLine;
use crate::git::{ChangeStatus, CommitHeader, LogRecord, PathChange};
use crate::sky::{Sky, Star};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// The file-level effect of one commit, after filtering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Dense, per-run sequence number over emitted events
    pub id: u64,
    pub date: String,
    pub commit: String,
    /// Canonical author id (local part of the e-mail)
    pub author: String,
    /// Added or modified files
    pub on: Vec<Arc<Star>>,
    /// Deleted files
    pub off: Vec<Arc<Star>>,
}

impl ChangeEvent {
    /// Number of files this event touches
    pub fn touched(&self) -> usize {
        self.on.len() + self.off.len()
    }
}

/// Which commits and paths make it into the output
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    /// Matched against the canonical author id and the full e-mail
    pub exclude_authors: HashSet<String>,
    /// Any path containing one of these substrings is dropped
    pub ignore_paths: Vec<String>,
}

impl FilterPolicy {
    pub fn new<A, P>(exclude_authors: A, ignore_paths: P) -> Self
    where
        A: IntoIterator,
        A::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            exclude_authors: exclude_authors.into_iter().map(Into::into).collect(),
            ignore_paths: ignore_paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore_paths.iter().any(|needle| path.contains(needle.as_str()))
    }

    pub fn is_excluded(&self, header: &CommitHeader) -> bool {
        self.exclude_authors.contains(&header.author_email)
            || header
                .author
                .as_ref()
                .is_some_and(|author| self.exclude_authors.contains(author))
    }
}

/// Counters describing what the builder saw and dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    pub commits_seen: usize,
    pub events_emitted: usize,
    pub commits_unknown_author: usize,
    pub commits_excluded_author: usize,
    pub commits_empty: usize,
    pub paths_ignored: usize,
    pub renames_dropped: usize,
    pub malformed_lines: usize,
}

#[derive(Debug)]
struct PendingCommit {
    header: CommitHeader,
    changes: Vec<PathChange>,
}

/// Accumulates log records and emits finished [`ChangeEvent`]s
#[derive(Debug)]
pub struct ChangeRecordBuilder {
    policy: FilterPolicy,
    pending: Option<PendingCommit>,
    /// Set after a malformed marker; path lines are dropped until the next header
    skipping: bool,
    next_id: u64,
    stats: BuildStats,
}

impl ChangeRecordBuilder {
    pub fn new(policy: FilterPolicy) -> Self {
        Self {
            policy,
            pending: None,
            skipping: false,
            next_id: 0,
            stats: BuildStats::default(),
        }
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    /// Feed one record; returns the previous commit's event if this record closed it
    pub fn push(&mut self, record: LogRecord, sky: &mut Sky) -> Option<ChangeEvent> {
        match record {
            LogRecord::Header(header) => {
                let finished = self.finish(sky);
                self.stats.commits_seen += 1;
                self.skipping = false;
                self.pending = Some(PendingCommit {
                    header,
                    changes: Vec::new(),
                });
                finished
            }
            LogRecord::Change(change) => {
                match self.pending.as_mut() {
                    Some(pending) if !self.skipping => pending.changes.push(change),
                    _ => {
                        tracing::warn!("Dropping path line outside a commit: {}", change.path);
                        self.stats.malformed_lines += 1;
                    }
                }
                None
            }
            LogRecord::Malformed(line) => self.on_malformed(line, sky),
        }
    }

    /// Finalize whatever is accumulated (end of input)
    pub fn finish(&mut self, sky: &mut Sky) -> Option<ChangeEvent> {
        let pending = self.pending.take()?;
        self.finalize(pending, sky)
    }

    fn on_malformed(&mut self, line: MalformedLine, sky: &mut Sky) -> Option<ChangeEvent> {
        tracing::warn!("{}", line);
        self.stats.malformed_lines += 1;
        if !line.is_marker {
            return None;
        }
        // A broken marker still ends the previous commit; its own paths are unattributable.
        let finished = self.finish(sky);
        self.skipping = true;
        finished
    }

    fn finalize(&mut self, pending: PendingCommit, sky: &mut Sky) -> Option<ChangeEvent> {
        let PendingCommit { header, changes } = pending;

        let Some(author) = header.author.clone() else {
            tracing::debug!(
                "Skipping commit {} with unknown author '{}'",
                header.commit,
                header.author_email
            );
            self.stats.commits_unknown_author += 1;
            return None;
        };
        if self.policy.is_excluded(&header) {
            tracing::debug!("Skipping commit {} by excluded author {}", header.commit, author);
            self.stats.commits_excluded_author += 1;
            return None;
        }

        let mut on = Vec::new();
        let mut off = Vec::new();
        for change in changes {
            if self.policy.is_ignored(&change.path) {
                self.stats.paths_ignored += 1;
                continue;
            }
            match change.status {
                ChangeStatus::Deleted => off.push(sky.locate_path(&change.path)),
                ChangeStatus::Renamed => self.stats.renames_dropped += 1,
                ChangeStatus::Added | ChangeStatus::Modified | ChangeStatus::Other(_) => {
                    on.push(sky.locate_path(&change.path))
                }
            }
        }

        if on.is_empty() && off.is_empty() {
            tracing::debug!("Skipping commit {} with no remaining files", header.commit);
            self.stats.commits_empty += 1;
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.stats.events_emitted += 1;

        Some(ChangeEvent {
            id,
            date: header.date,
            commit: header.commit,
            author,
            on,
            off,
        })
    }
}

/// Run every record through a fresh builder and collect the events
pub fn build_events<I>(records: I, policy: FilterPolicy, sky: &mut Sky) -> (Vec<ChangeEvent>, BuildStats)
where
    I: IntoIterator<Item = LogRecord>,
{
    let mut builder = ChangeRecordBuilder::new(policy);
    let mut events = Vec::new();
    for record in records {
        if let Some(event) = builder.push(record, sky) {
            events.push(event);
        }
    }
    if let Some(event) = builder.finish(sky) {
        events.push(event);
    }
    (events, builder.stats)
}

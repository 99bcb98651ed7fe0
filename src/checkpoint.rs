//! Resumable extraction index and chunked event output
//!
//! The index (`index.json`) is the only durable state of a run. It is
//! rewritten after every chunk that reaches disk, so a crash never leaves it
//! pointing past data that was not written.

use crate::change::ChangeEvent;
use crate::error::{CheckpointError, Result};
use crate::git::RangeSpec;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Well-known name of the index file inside the output directory
pub const INDEX_FILE: &str = "index.json";

/// Touched-file count at which buffered events are flushed to a chunk
pub const DEFAULT_CHUNK_THRESHOLD: usize = 10_000;

/// Persisted ingestion progress
///
/// Serialized as `{start, end, data, commit, counter, name, tips}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Date of the first event ever written
    #[serde(rename = "start", default)]
    pub range_start: Option<String>,
    /// Date of the last event written
    #[serde(rename = "end", default)]
    pub range_end: Option<String>,
    /// Chunk file names in write order
    #[serde(rename = "data", default)]
    pub chunk_files: Vec<String>,
    /// Newest commit already read; set per chunk, then to the newest header of a finished run
    #[serde(rename = "commit", default)]
    pub last_commit: Option<String>,
    /// Number used for the next chunk file name
    #[serde(rename = "counter", default)]
    pub chunk_counter: u64,
    /// Repository display name
    #[serde(rename = "name", default)]
    pub repo_name: String,
    /// Ref tips the last finished run read up to
    #[serde(default)]
    pub tips: Vec<String>,
}

impl Checkpoint {
    /// Load the index from `output_dir`, or an empty checkpoint if there is none
    pub fn load(output_dir: &Path) -> Result<Self> {
        let path = output_dir.join(INDEX_FILE);
        if !path.exists() {
            tracing::debug!("No index at {}, starting from scratch", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).map_err(|e| CheckpointError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let checkpoint: Checkpoint =
            serde_json::from_str(&content).map_err(|e| CheckpointError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        tracing::info!(
            "Loaded index with {} chunks, last commit {}",
            checkpoint.chunk_files.len(),
            checkpoint.last_commit.as_deref().unwrap_or("<none>")
        );
        Ok(checkpoint)
    }

    /// Commits the next run should read, given the tips resolved for it
    ///
    /// Everything reachable from the previous run's tips, or from the last
    /// commit of a chunk written by an interrupted run, is excluded.
    pub fn resume_range(&self, tips: Vec<String>) -> RangeSpec {
        let mut seen = self.tips.clone();
        if let Some(commit) = &self.last_commit
            && !seen.contains(commit)
        {
            seen.push(commit.clone());
        }
        if seen.is_empty() {
            RangeSpec::FullHistory { tips }
        } else {
            RangeSpec::After { tips, seen }
        }
    }
}

/// Owns the checkpoint and the in-memory event buffer of one run
#[derive(Debug)]
pub struct CheckpointStore {
    output_dir: PathBuf,
    checkpoint: Checkpoint,
    buffer: Vec<ChangeEvent>,
    buffered_files: usize,
    threshold: usize,
    chunks_written: usize,
}

impl CheckpointStore {
    /// Create the output directory if needed and load its index
    pub fn open(output_dir: impl Into<PathBuf>, repo_name: &str) -> Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).map_err(|e| {
            CheckpointError::DirectoryCreationFailed(format!("{}: {}", output_dir.display(), e))
        })?;

        let mut checkpoint = Checkpoint::load(&output_dir)?;
        if !checkpoint.repo_name.is_empty() && checkpoint.repo_name != repo_name {
            tracing::warn!(
                "Index in {} was written for '{}', continuing as '{}'",
                output_dir.display(),
                checkpoint.repo_name,
                repo_name
            );
        }
        checkpoint.repo_name = repo_name.to_string();

        Ok(Self {
            output_dir,
            checkpoint,
            buffer: Vec::new(),
            buffered_files: 0,
            threshold: DEFAULT_CHUNK_THRESHOLD,
            chunks_written: 0,
        })
    }

    /// Override the flush threshold (tests and benchmarks)
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    pub fn checkpoint(&self) -> &Checkpoint {
        &self.checkpoint
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn index_path(&self) -> PathBuf {
        self.output_dir.join(INDEX_FILE)
    }

    pub fn resume_range(&self, tips: Vec<String>) -> RangeSpec {
        self.checkpoint.resume_range(tips)
    }

    /// Events waiting for the next flush
    pub fn buffered(&self) -> &[ChangeEvent] {
        &self.buffer
    }

    /// Sum of touched files over the buffered events
    pub fn buffered_files(&self) -> usize {
        self.buffered_files
    }

    /// Chunk files written by this store
    pub fn chunks_written(&self) -> usize {
        self.chunks_written
    }

    /// Append an event; the first event ever seen fixes the range start
    pub fn buffer(&mut self, event: ChangeEvent) {
        if self.checkpoint.range_start.is_none() {
            self.checkpoint.range_start = Some(event.date.clone());
        }
        self.buffered_files += event.touched();
        self.buffer.push(event);
    }

    /// Flush if the buffered touched-file count has reached the threshold
    pub fn maybe_flush(&mut self) -> Result<bool> {
        self.flush(self.buffered_files >= self.threshold)
    }

    /// Write the buffer as the next chunk
    ///
    /// Unforced flushes are a no-op below the threshold. Returns whether a
    /// chunk was written. The buffer is only cleared once the chunk is on disk.
    pub fn flush(&mut self, force: bool) -> Result<bool> {
        if !force && self.buffered_files < self.threshold {
            return Ok(false);
        }
        let Some(last) = self.buffer.last() else {
            return Ok(false);
        };
        let (last_date, last_commit) = (last.date.clone(), last.commit.clone());

        let name = format!("{}.json", self.checkpoint.chunk_counter);
        let path = self.output_dir.join(&name);
        let content =
            serde_json::to_string(&self.buffer).map_err(|e| CheckpointError::SerializeFailed {
                what: name.clone(),
                reason: e.to_string(),
            })?;
        write_file(&path, &content)?;

        tracing::info!(
            "Wrote chunk {} ({} events, {} files)",
            name,
            self.buffer.len(),
            self.buffered_files
        );

        self.checkpoint.range_end = Some(last_date);
        self.checkpoint.last_commit = Some(last_commit);
        self.checkpoint.chunk_files.push(name);
        self.checkpoint.chunk_counter += 1;
        self.buffer.clear();
        self.buffered_files = 0;
        self.chunks_written += 1;

        self.persist_index()?;
        Ok(true)
    }

    /// Flush the trailing chunk, then record a finished pass and persist the index
    ///
    /// The tips are only recorded once every buffered event is on disk; from
    /// then on the next run excludes everything reachable from them.
    pub fn complete(&mut self, tips: Vec<String>, newest_read: Option<String>) -> Result<()> {
        self.flush(true)?;
        if let Some(commit) = newest_read {
            self.checkpoint.last_commit = Some(commit);
        }
        self.checkpoint.tips = tips;
        self.persist_index()
    }

    /// Write the checkpoint to `index.json`
    pub fn persist_index(&self) -> Result<()> {
        let path = self.index_path();
        let content = serde_json::to_string_pretty(&self.checkpoint).map_err(|e| {
            CheckpointError::SerializeFailed {
                what: INDEX_FILE.to_string(),
                reason: e.to_string(),
            }
        })?;
        write_file(&path, &content)?;
        tracing::info!("Saved index to {:?}", path);
        Ok(())
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| {
        CheckpointError::WriteFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

use crate::error::{GitError, Result};
use git2::{BranchType, ErrorCode, Repository};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Format string handed to `git log`; must stay in sync with the slicing
/// constants in [`crate::git::log`].
pub const LOG_FORMAT: &str = "--format==%ad %H %ae";

/// Which part of the branch graph to read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// One local branch
    Branch(String),
    /// Every ref (`--all`)
    All,
}

/// Which commits the log producer should emit
///
/// Both variants name the tips explicitly, so the commits read are exactly
/// the ones reachable from the refs resolved at the start of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// Whole history reachable from `tips`
    FullHistory { tips: Vec<String> },
    /// Commits reachable from `tips` but not from any commit in `seen`
    After { tips: Vec<String>, seen: Vec<String> },
}

impl RangeSpec {
    /// Revision arguments for `git log`
    pub fn to_args(&self) -> Vec<String> {
        match self {
            RangeSpec::FullHistory { tips } => tips.clone(),
            RangeSpec::After { tips, seen } => {
                let mut args = tips.clone();
                if !seen.is_empty() {
                    args.push("--not".to_string());
                    args.extend(seen.iter().cloned());
                }
                args
            }
        }
    }

    pub fn tips(&self) -> &[String] {
        match self {
            RangeSpec::FullHistory { tips } | RangeSpec::After { tips, .. } => tips,
        }
    }

    /// Commits whose ancestry is excluded from this range
    pub fn seen(&self) -> &[String] {
        match self {
            RangeSpec::After { seen, .. } => seen,
            RangeSpec::FullHistory { .. } => &[],
        }
    }
}

/// Anything that can produce raw log text for a range
///
/// The extractor only depends on this seam, so tests can script the log.
pub trait LogSource {
    /// Commit ids the refs in `scope` currently point at, sorted and deduplicated
    fn tips(&self, scope: &Scope) -> Result<Vec<String>>;

    fn read_log(&self, range: &RangeSpec) -> Result<String>;
}

/// A discovered repository plus the `git` executable that reads its log
pub struct GitRepo {
    repo: Repository,
    repo_path: PathBuf,
    git_executable: PathBuf,
}

impl GitRepo {
    /// Discover and open a git repository from any path within it
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| {
            let detail = format!("{}: {}", path.display(), e.message());
            if e.code() == ErrorCode::NotFound {
                GitError::RepoNotFound(detail)
            } else {
                GitError::OpenFailed(detail)
            }
        })?;

        let repo_path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        tracing::info!("Opened git repository at: {}", repo_path.display());

        Ok(Self {
            repo,
            repo_path,
            git_executable: PathBuf::from("git"),
        })
    }

    /// Use a specific `git` binary instead of the one on `PATH`
    pub fn with_git_executable(mut self, git: impl Into<PathBuf>) -> Self {
        self.git_executable = git.into();
        self
    }

    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Display name recorded in the index: the last component of the root
    pub fn display_name(&self) -> String {
        display_name_for(&self.repo_path)
    }

    /// First candidate that exists as a local branch
    pub fn resolve_default_branch(&self, candidates: &[String]) -> Result<String> {
        for name in candidates {
            if self.repo.find_branch(name, BranchType::Local).is_ok() {
                tracing::debug!("Using branch '{}'", name);
                return Ok(name.clone());
            }
        }
        Err(GitError::MissingBranch {
            tried: candidates.to_vec(),
        }
        .into())
    }

    /// Full argument list for one `git log` invocation
    pub fn log_args(&self, range: &RangeSpec) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "-C".to_string(),
            self.repo_path.display().to_string(),
            "-c".to_string(),
            "core.quotepath=off".to_string(),
            "log".to_string(),
            "--reverse".to_string(),
            "--no-renames".to_string(),
            "--name-status".to_string(),
            "--date=short".to_string(),
            LOG_FORMAT.to_string(),
        ];
        args.extend(range.to_args());
        args.push("--".to_string());
        args
    }
}

impl LogSource for GitRepo {
    fn tips(&self, scope: &Scope) -> Result<Vec<String>> {
        let failed = |e: git2::Error| GitError::RefResolution(e.message().to_string());

        let mut tips = match scope {
            Scope::Branch(name) => {
                let branch = self.repo.find_branch(name, BranchType::Local).map_err(failed)?;
                let commit = branch.get().peel_to_commit().map_err(failed)?;
                vec![commit.id().to_string()]
            }
            Scope::All => {
                // Same set `git log --all` walks: every ref under refs/ plus HEAD
                let mut tips = Vec::new();
                for reference in self.repo.references().map_err(failed)? {
                    let reference = reference.map_err(failed)?;
                    match reference.peel_to_commit() {
                        Ok(commit) => tips.push(commit.id().to_string()),
                        Err(_) => tracing::debug!(
                            "Skipping ref {} that does not point at a commit",
                            reference.name().unwrap_or("<non-utf8>")
                        ),
                    }
                }
                if let Ok(head) = self.repo.head()
                    && let Ok(commit) = head.peel_to_commit()
                {
                    tips.push(commit.id().to_string());
                }
                tips
            }
        };

        tips.sort();
        tips.dedup();
        tracing::debug!("Resolved {} tips for {:?}", tips.len(), scope);
        Ok(tips)
    }

    fn read_log(&self, range: &RangeSpec) -> Result<String> {
        let args = self.log_args(range);
        tracing::info!("Running git {}", args.join(" "));

        let output = Command::new(&self.git_executable)
            .args(&args)
            .output()
            .map_err(|e| GitError::CommandSpawn(format!("{}: {}", self.git_executable.display(), e)))?;

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        tracing::debug!("git log produced {} bytes", output.stdout.len());
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn display_name_for(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "repo".to_string());
    match name.strip_suffix(".git") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => name,
    }
}

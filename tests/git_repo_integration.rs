//! Extraction against real repositories built with the `git` executable
//!
//! Skipped when `git` is not installed.

use git_galaxy::checkpoint::Checkpoint;
use git_galaxy::config::Config;
use git_galaxy::error::{GalaxyError, GitError};
use git_galaxy::git::GitRepo;
use git_galaxy::pipeline::{Extractor, extract};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git_command(dir: &Path, args: &[&str]) -> Command {
    let mut command = Command::new("git");
    command
        .arg("-C")
        .arg(dir)
        .args([
            "-c",
            "user.name=Alice",
            "-c",
            "user.email=alice@example.com",
            "-c",
            "commit.gpgsign=false",
        ])
        .args(args);
    command
}

fn git(dir: &Path, args: &[&str]) {
    let status = git_command(dir, args).status().unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

/// Run git with author and committer dates pinned to `date` (YYYY-MM-DD)
fn git_at(dir: &Path, date: &str, args: &[&str]) {
    let stamp = format!("{}T12:00:00+0000", date);
    let status = git_command(dir, args)
        .env("GIT_AUTHOR_DATE", &stamp)
        .env("GIT_COMMITTER_DATE", &stamp)
        .status()
        .unwrap();
    assert!(status.success(), "git {:?} failed", args);
}

fn rev_parse(dir: &Path, rev: &str) -> String {
    let output = git_command(dir, &["rev-parse", rev]).output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap().trim().to_string()
}

fn init_repo(branch: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "-q"]);
    let head = format!("refs/heads/{}", branch);
    git(dir.path(), &["symbolic-ref", "HEAD", &head]);
    dir
}

fn commit_file(dir: &Path, rel: &str, content: &str, message: &str) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    git(dir, &["add", "-A"]);
    git(dir, &["commit", "-q", "-m", message]);
}

fn commit_file_at(dir: &Path, date: &str, rel: &str, message: &str) {
    std::fs::write(dir.join(rel), message).unwrap();
    git(dir, &["add", "-A"]);
    git_at(dir, date, &["commit", "-q", "-m", message]);
}

fn index_bytes(out: &Path) -> Vec<u8> {
    std::fs::read(out.join("index.json")).unwrap()
}

fn config_for(repo: &Path, out: &Path) -> Config {
    let mut config = Config::default();
    config.extraction.repo_path = repo.to_path_buf();
    config.output.output_dir = out.to_path_buf();
    config
}

#[test]
fn test_extract_and_resume_real_repository() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let repo = init_repo("main");
    commit_file(repo.path(), "src/lib.rs", "pub fn a() {}\n", "first");
    commit_file(repo.path(), "docs/guide.md", "# Guide\n", "second");

    let out = TempDir::new().unwrap();
    let config = config_for(repo.path(), out.path());

    let summary = extract(&config).unwrap();
    assert_eq!(summary.commits_seen, 2);
    assert_eq!(summary.events_emitted, 2);
    assert_eq!(summary.authors.get("alice"), Some(&2));
    assert_eq!(summary.chunks_written, 1);

    let first = Checkpoint::load(out.path()).unwrap();
    let name = repo
        .path()
        .file_name()
        .unwrap()
        .to_string_lossy()
        .into_owned();
    assert_eq!(first.repo_name, name);
    assert!(first.last_commit.is_some());

    std::fs::remove_file(repo.path().join("src/lib.rs")).unwrap();
    git(repo.path(), &["add", "-A"]);
    git(repo.path(), &["commit", "-q", "-m", "third"]);

    let summary = extract(&config).unwrap();
    assert_eq!(summary.commits_seen, 1);
    assert_eq!(summary.events_emitted, 1);

    let second = Checkpoint::load(out.path()).unwrap();
    assert_eq!(second.chunk_files, vec!["0.json", "1.json"]);
    assert_ne!(second.last_commit, first.last_commit);
    assert_eq!(second.range_start, first.range_start);

    let chunk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("1.json")).unwrap()).unwrap();
    assert_eq!(chunk[0]["off"][0]["n"], "lib.rs");
    assert_eq!(chunk[0]["off"][0]["g"], "src");
    assert_eq!(chunk[0]["on"], serde_json::json!([]));

    // Nothing new: no chunk, same index
    let summary = extract(&config).unwrap();
    assert_eq!(summary.chunks_written, 0);
    assert_eq!(Checkpoint::load(out.path()).unwrap(), second);
}

#[test]
fn test_missing_default_branch() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let repo = init_repo("trunk");
    commit_file(repo.path(), "a.txt", "a\n", "first");
    let out = TempDir::new().unwrap();

    let result = extract(&config_for(repo.path(), out.path()));
    match result {
        Err(GalaxyError::Git(GitError::MissingBranch { tried })) => {
            assert_eq!(tried, vec!["main", "master"]);
        }
        other => panic!("expected MissingBranch, got {:?}", other.map(|s| s.events_emitted)),
    }
    assert!(!out.path().join("index.json").exists());

    // Reading every branch needs no default branch
    let discovered = GitRepo::discover(repo.path()).unwrap();
    let summary = Extractor::new(out.path())
        .with_all_branches(true)
        .run_repo(&discovered)
        .unwrap();
    assert_eq!(summary.events_emitted, 1);
}

#[test]
fn test_discover_from_subdirectory() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let repo = init_repo("master");
    commit_file(repo.path(), "nested/deep/file.rs", "", "first");

    let discovered = GitRepo::discover(repo.path().join("nested/deep")).unwrap();
    let root = std::fs::canonicalize(repo.path()).unwrap();
    assert_eq!(std::fs::canonicalize(discovered.repo_path()).unwrap(), root);
    assert_eq!(
        discovered
            .resolve_default_branch(&["main".to_string(), "master".to_string()])
            .unwrap(),
        "master"
    );
}

#[test]
fn test_rerun_after_merge_tip_is_noop() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    // main: a (01-01) -> b (01-03) -> merge (01-04); feat: f (01-02) off a
    let repo = init_repo("main");
    commit_file_at(repo.path(), "2024-01-01", "a.txt", "a");
    git(repo.path(), &["checkout", "-q", "-b", "feat"]);
    commit_file_at(repo.path(), "2024-01-02", "f.txt", "f");
    git(repo.path(), &["checkout", "-q", "main"]);
    commit_file_at(repo.path(), "2024-01-03", "b.txt", "b");
    git_at(repo.path(), "2024-01-04", &["merge", "-q", "--no-ff", "-m", "merge", "feat"]);
    let merge = rev_parse(repo.path(), "HEAD");

    let out = TempDir::new().unwrap();
    let config = config_for(repo.path(), out.path());

    let first = extract(&config).unwrap();
    assert_eq!(first.events_emitted, 3);
    // The merge has no paths and is dropped, but it is how far the run read
    assert_eq!(first.commits_empty, 1);
    assert_eq!(first.last_commit.as_deref(), Some(merge.as_str()));
    let checkpoint = Checkpoint::load(out.path()).unwrap();
    assert_eq!(checkpoint.tips, vec![merge.clone()]);
    let before = index_bytes(out.path());

    for _ in 0..2 {
        let again = extract(&config).unwrap();
        assert_eq!(again.commits_seen, 0);
        assert_eq!(again.chunks_written, 0);
        assert_eq!(index_bytes(out.path()), before);
    }

    commit_file_at(repo.path(), "2024-01-05", "c.txt", "c");
    let next = extract(&config).unwrap();
    assert_eq!(next.commits_seen, 1);
    assert_eq!(next.events_emitted, 1);
}

#[test]
fn test_rerun_after_filtered_tip_reads_nothing() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let repo = init_repo("main");
    commit_file_at(repo.path(), "2024-01-01", "a.txt", "a");
    std::fs::write(repo.path().join("gen.txt"), "generated").unwrap();
    git(repo.path(), &["add", "-A"]);
    git(
        repo.path(),
        &["commit", "-q", "-m", "bump", "--author", "CI <ci@build.local>"],
    );
    let tip = rev_parse(repo.path(), "HEAD");

    let out = TempDir::new().unwrap();
    let mut config = config_for(repo.path(), out.path());
    config.extraction.exclude_authors = vec!["ci".to_string()];

    let first = extract(&config).unwrap();
    assert_eq!(first.events_emitted, 1);
    assert_eq!(first.commits_excluded_author, 1);
    assert_eq!(first.last_commit.as_deref(), Some(tip.as_str()));
    let before = index_bytes(out.path());

    let again = extract(&config).unwrap();
    assert_eq!(again.commits_seen, 0);
    assert_eq!(again.chunks_written, 0);
    assert_eq!(index_bytes(out.path()), before);
}

#[test]
fn test_all_branches_rerun_with_unmerged_branch_is_noop() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    // main: a -> b; feat: f off a, never merged
    let repo = init_repo("main");
    commit_file_at(repo.path(), "2024-01-01", "a.txt", "a");
    git(repo.path(), &["checkout", "-q", "-b", "feat"]);
    commit_file_at(repo.path(), "2024-01-02", "f.txt", "f");
    git(repo.path(), &["checkout", "-q", "main"]);
    commit_file_at(repo.path(), "2024-01-03", "b.txt", "b");

    let out = TempDir::new().unwrap();
    let mut config = config_for(repo.path(), out.path());
    config.extraction.all_branches = true;

    let first = extract(&config).unwrap();
    assert_eq!(first.events_emitted, 3);
    let mut expected_tips = vec![rev_parse(repo.path(), "main"), rev_parse(repo.path(), "feat")];
    expected_tips.sort();
    assert_eq!(Checkpoint::load(out.path()).unwrap().tips, expected_tips);
    let before = index_bytes(out.path());

    let again = extract(&config).unwrap();
    assert_eq!(again.commits_seen, 0);
    assert_eq!(again.chunks_written, 0);
    assert_eq!(index_bytes(out.path()), before);

    // New work on the side branch is picked up once
    git(repo.path(), &["checkout", "-q", "feat"]);
    commit_file_at(repo.path(), "2024-01-04", "g.txt", "g");
    let next = extract(&config).unwrap();
    assert_eq!(next.commits_seen, 1);
    assert_eq!(next.events_emitted, 1);
    let after = extract(&config).unwrap();
    assert_eq!(after.commits_seen, 0);
}

#[cfg(unix)]
#[test]
fn test_quoted_file_name_keeps_its_directory() {
    if !git_available() {
        eprintln!("git not available, skipping");
        return;
    }

    let repo = init_repo("main");
    commit_file(repo.path(), "dir/a\"b.txt", "quoted\n", "first");

    let out = TempDir::new().unwrap();
    extract(&config_for(repo.path(), out.path())).unwrap();

    let chunk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.path().join("0.json")).unwrap()).unwrap();
    assert_eq!(chunk[0]["on"][0]["g"], "dir");
    assert_eq!(chunk[0]["on"][0]["n"], "a\"b.txt");
}

use anyhow::{Context, Result};
use clap::Parser;
use git_galaxy::config::Config;
use git_galaxy::pipeline::{RunSummary, extract};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "git-galaxy",
    version,
    long_version = LONG_VERSION,
    about = "Extract commit history into resumable galaxy chunks"
)]
struct Cli {
    /// Path to the git repository (any path inside the work tree)
    repo_path: Option<PathBuf>,

    /// Output directory for index.json and chunk files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Skip commits by this author (e-mail local part or full e-mail); repeatable
    #[arg(long = "exclude-author", value_name = "AUTHOR")]
    exclude_authors: Vec<String>,

    /// Skip paths containing this substring; repeatable
    #[arg(long = "ignore", value_name = "SUBSTRING")]
    ignore_paths: Vec<String>,

    /// Read every branch instead of main/master
    #[arg(long)]
    all_branches: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Touched-file count per chunk
    #[arg(long, hide = true)]
    threshold: Option<usize>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => Config::load_or_default()?,
        };
        config.apply_env_overrides();

        if let Some(repo) = self.repo_path {
            config.extraction.repo_path = repo;
        }
        if let Some(output) = self.output {
            config.output.output_dir = output;
        }
        if self.all_branches {
            config.extraction.all_branches = true;
        }
        if let Some(threshold) = self.threshold {
            config.output.chunk_threshold = threshold;
        }
        config.extraction.exclude_authors.extend(self.exclude_authors);
        config.extraction.ignore_paths.extend(self.ignore_paths);

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let config = cli.into_config()?;
    tracing::info!(
        "Extracting {} into {}",
        config.extraction.repo_path.display(),
        config.output.output_dir.display()
    );

    // git2 and the log subprocess are blocking
    let summary = tokio::task::spawn_blocking(move || extract(&config))
        .await
        .context("Extraction task panicked")?
        .context("Extraction failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!("Repository:        {}", summary.repo_name);
    println!("Commits read:      {}", summary.commits_seen);
    println!("Events written:    {}", summary.events_emitted);
    println!("Files touched:     {}", summary.files_touched);
    println!("New chunks:        {}", summary.chunks_written);
    println!(
        "Skipped commits:   {} unknown author, {} excluded author, {} empty",
        summary.commits_unknown_author, summary.commits_excluded_author, summary.commits_empty
    );
    println!("Ignored paths:     {}", summary.paths_ignored);
    println!("Malformed lines:   {}", summary.malformed_lines);
    if let Some((start, end)) = &summary.range {
        println!("Range:             {} .. {}", start, end);
    }
    if let Some(commit) = &summary.last_commit {
        println!("Last commit:       {}", commit);
    }
    for (author, count) in &summary.authors {
        println!("  {:<24} {}", author, count);
    }
}

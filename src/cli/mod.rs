//! CLI definition and handler

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use repo_xray::config::{load_config_file, load_project_config};
use repo_xray::pipeline::Pipeline;
use repo_xray::reporters::{report_with_format, OutputFormat};

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// repo-xray - Dependency graph X-ray for Python codebases
#[derive(Parser, Debug)]
#[command(name = "repo-xray")]
#[command(
    version,
    about = "Map a Python codebase: import graph, layers, cycles, orphans and where to look first",
    after_help = "\
Examples:
  repo-xray .                              Analyze current directory
  repo-xray src --root-package app         Force the root package
  repo-xray . --format json -o xray.json   Full JSON report
  repo-xray . --no-git --top 10            Skip history, short ranking"
)]
pub struct Cli {
    /// Path to the codebase (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Root package prepended to module ids (default: auto-detect)
    #[arg(long)]
    pub root_package: Option<String>,

    /// Directory module ids are derived from, relative to PATH
    #[arg(long)]
    pub source_root: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Output file path (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Number of files in the priority ranking
    #[arg(long)]
    pub top: Option<usize>,

    /// Skip git history signals (risk, freshness)
    #[arg(long)]
    pub no_git: bool,

    /// Number of parallel parse workers (1-64)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Config file (default: xray.toml or .xrayrc.json in PATH)
    #[arg(long, env = "XRAY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG applies when unset
    #[arg(long, value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: Option<String>,
}

/// Create spinner progress style
fn create_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Run the analysis described by the parsed arguments
pub fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => load_config_file(path)?,
        None => load_project_config(&cli.path),
    };

    // Flags override file values
    if let Some(top) = cli.top {
        config.scoring.top_n = top;
    }
    let mut pipeline = Pipeline::new(config);
    if cli.no_git {
        pipeline = pipeline.without_git();
    }
    if let Some(pkg) = &cli.root_package {
        pipeline = pipeline.with_root_package(pkg.clone());
    }
    if let Some(dir) = &cli.source_root {
        pipeline = pipeline.with_source_root(dir.clone());
    }
    if let Some(workers) = cli.workers {
        pipeline = pipeline.with_workers(workers);
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(create_spinner_style());
    spinner.set_message(format!("Analyzing {}...", cli.path.display()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = pipeline.run(&cli.path);
    spinner.finish_and_clear();
    let report = result?;

    let format: OutputFormat = cli.format.parse()?;
    let rendered = report_with_format(&report, format)?;

    match &cli.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            eprintln!(
                "{}Report written to {}",
                style("✓ ").green(),
                style(path.display()).cyan()
            );
        }
        None => print!("{}", rendered),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_workers() {
        assert_eq!(parse_workers("4"), Ok(4));
        assert!(parse_workers("0").is_err());
        assert!(parse_workers("65").is_err());
        assert!(parse_workers("many").is_err());
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["repo-xray"]);
        assert_eq!(cli.path, PathBuf::from("."));
        assert_eq!(cli.format, "text");
        assert!(!cli.no_git);
        assert_eq!(cli.log_level, None);
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "repo-xray",
            "src",
            "--root-package",
            "app",
            "--format",
            "json",
            "--top",
            "5",
            "--no-git",
            "--workers",
            "3",
        ]);
        assert_eq!(cli.path, PathBuf::from("src"));
        assert_eq!(cli.root_package.as_deref(), Some("app"));
        assert_eq!(cli.format, "json");
        assert_eq!(cli.top, Some(5));
        assert!(cli.no_git);
        assert_eq!(cli.workers, Some(3));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["repo-xray", "--format", "sarif"]).is_err());
    }
}

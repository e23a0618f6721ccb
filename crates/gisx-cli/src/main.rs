//! gisx - GIS Addon Source Manager
//!
//! Usage:
//!   gisx resolve r.example --url github.com/user/r.example
//!   gisx fetch r.example v.example --preserve

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gisx_core::prelude::{FetchConfig, FetchError, FetchOperation, FetchOptions};

#[derive(Parser)]
#[command(name = "gisx")]
#[command(about = "GIS Addon Source Manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a source location without fetching it
    Resolve {
        /// Addon name
        name: String,

        /// Source location (URL, path, or repository slug);
        /// defaults to the official addon repository
        #[arg(long, short)]
        url: Option<String>,

        /// Branch to fetch from
        #[arg(long, short)]
        branch: Option<String>,

        /// Treat the source as a fork of the official repository
        #[arg(long)]
        fork: bool,
    },

    /// Fetch addon source code into a working directory
    Fetch {
        /// Addon names
        #[arg(required = true)]
        names: Vec<String>,

        /// Source location (URL, path, or repository slug);
        /// defaults to the official addon repository
        #[arg(long, short)]
        url: Option<String>,

        /// Branch to fetch from
        #[arg(long, short)]
        branch: Option<String>,

        /// Treat the source as a fork of the official repository
        #[arg(long)]
        fork: bool,

        /// Keep the working directory after fetching
        #[arg(long, short)]
        preserve: bool,

        /// Working directory override
        #[arg(long)]
        workdir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gisx=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run_cli(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_cli(command: Commands) -> Result<ExitCode> {
    let config = FetchConfig::load_or_default(&std::env::current_dir()?)?;

    match command {
        Commands::Resolve {
            name,
            url,
            branch,
            fork,
        } => {
            let op = FetchOperation::new(config);
            let options = build_options(&name, url.as_deref(), branch.as_deref(), fork, false);
            let source = op.resolve(&options)?;
            println!("{}\t{}", source.kind, source.location);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Fetch {
            names,
            url,
            branch,
            fork,
            preserve,
            workdir,
        } => {
            let config = match workdir {
                Some(dir) => config.with_workdir(dir),
                None => config,
            };
            let op = FetchOperation::new(config);

            let requests: Vec<FetchOptions> = names
                .iter()
                .map(|name| {
                    build_options(name, url.as_deref(), branch.as_deref(), fork, preserve)
                })
                .collect();

            // Official-repository fetches go through git; fail before
            // any real work starts when it is not installed.
            if needs_git(url.as_deref(), fork, &op.config().official_repo) {
                check_git_available()?;
            }

            let outcome = op.execute_batch(&requests);
            for report in &outcome.reports {
                println!("fetched\t{}", report.directory.display());
                for entry in &report.entries {
                    println!("  {}", entry);
                }
            }
            for (name, err) in &outcome.failures {
                eprintln!("failed\t{}: {:#}", name, err);
            }

            if outcome.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn build_options(
    name: &str,
    url: Option<&str>,
    branch: Option<&str>,
    fork: bool,
    preserve: bool,
) -> FetchOptions {
    let mut options = FetchOptions::new(name)
        .with_fork(fork)
        .with_preserve(preserve);
    if let Some(url) = url {
        options = options.with_source(url);
    }
    if let Some(branch) = branch {
        options = options.with_branch(branch);
    }
    options
}

/// True when the requested source will be fetched with git: the official
/// repository (no source given, or its canonical URL) or a fork of it.
fn needs_git(url: Option<&str>, fork: bool, official_repo: &str) -> bool {
    let source = url.map(str::trim).unwrap_or("");
    fork || source.is_empty() || source == official_repo
}

/// Fail early with an install hint when git is absent.
fn check_git_available() -> Result<()> {
    match std::process::Command::new("git").arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        _ => Err(FetchError::VersionControlClientMissing {
            program: "git".to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFICIAL: &str = "https://github.com/gisx/gisx-addons";

    #[test]
    fn official_sources_need_git() {
        assert!(needs_git(None, false, OFFICIAL));
        assert!(needs_git(Some("  "), false, OFFICIAL));
        assert!(needs_git(Some(OFFICIAL), false, OFFICIAL));
        assert!(needs_git(Some("github.com/user/fork"), true, OFFICIAL));
    }

    #[test]
    fn other_sources_do_not_need_git() {
        assert!(!needs_git(Some("github.com/user/r.example"), false, OFFICIAL));
        assert!(!needs_git(Some("/tmp/r.example.zip"), false, OFFICIAL));
    }
}

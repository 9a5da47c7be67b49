mod cli;
mod config;
mod error;
mod graph;
mod output;
mod parser;
mod rebuild;
mod resolver;
mod vcs;

use std::io::BufRead;
use std::process::ExitCode;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::DeltaConfig;
use error::AppError;
use graph::build_graph;
use output::{Report, print_packages};
use parser::BuildContext;
use rebuild::{modified_go_dirs, propagate};
use resolver::{FsProbe, GoImporter, toolchain_goroot};
use vcs::{CiProvider, GitRepository, commit_range};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            return ExitCode::FAILURE;
        }
        // --help / --version
        Err(err) => err.exit(),
    };

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("error: {:#}", anyhow::Error::from(err));
            code
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = DeltaConfig::load(&cli.config)?;

    let mut packages = read_packages(std::io::stdin().lock())?;
    packages.sort();

    let cwd = std::env::current_dir().map_err(AppError::WorkingDir)?;
    let repo = GitRepository::new(&cwd);
    if !repo.detect()? {
        return Err(AppError::NotARepository);
    }

    let Some((range, source)) = commit_range(
        cli.from.as_deref(),
        cli.to.as_deref(),
        &CiProvider::ALL,
        |key| std::env::var(key).ok(),
    ) else {
        warn!("no commit range given or detected; every package is reported");
        let report = Report {
            packages: &packages,
            affected: None,
        };
        return print_packages(&report, cli.json).map_err(AppError::Output);
    };
    info!(from = %range.from, to = %range.to, ?source, "commit range");

    let changed = repo.modified_files(&range).await?;
    let modified_dirs = modified_go_dirs(&changed, &cwd);
    let matchers = config.explicit_matchers(&changed);
    info!(
        changed_files = changed.len(),
        modified_dirs = modified_dirs.len(),
        explicit = matchers.len(),
        "changes"
    );

    let goroot = match cli.goroot {
        Some(goroot) => Some(goroot),
        None => toolchain_goroot().await,
    };
    let build = BuildContext::from_settings(cli.goos, cli.goarch);
    info!(goos = %build.goos, goarch = %build.goarch, "build context");
    let importer =
        GoImporter::from_settings(goroot, cli.gopath.as_deref()).with_build_context(build);
    let graph = build_graph(&packages, &cwd, &importer, &FsProbe, importer.search_roots())?;
    info!(
        packages = graph.package_count(),
        dependencies = graph.dependency_count(),
        entries = graph.entries.len(),
        "package graph"
    );

    let dirty = propagate(&graph, &modified_dirs, &matchers, &cwd);
    let affected = dirty.affected_packages(&graph, &cwd);
    info!(dirty = dirty.len(), affected = affected.len(), "rebuild set");

    let report = Report {
        packages: &packages,
        affected: Some(affected.as_slice()),
    };
    print_packages(&report, cli.json).map_err(AppError::Output)
}

/// Package import paths from `input`, one per line. Blank lines are skipped.
fn read_packages<R: BufRead>(input: R) -> Result<Vec<String>, AppError> {
    let mut packages = Vec::new();
    for line in input.lines() {
        let line = line.map_err(AppError::ReadPackages)?;
        let line = line.trim();
        if !line.is_empty() {
            packages.push(line.to_owned());
        }
    }
    Ok(packages)
}

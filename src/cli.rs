use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;

/// Work out which Go packages need a rebuild after a change.
///
/// Reads candidate package import paths from stdin, one per line, diffs the
/// commit range given by `--from`/`--to` (or detected from the CI
/// environment) and walks the import graph of every package to see whether
/// anything it depends on changed.
#[derive(Parser, Debug)]
#[command(name = "go-delta", version, about, long_about = None)]
pub struct Cli {
    /// Start of the commit range.
    #[arg(short, long, value_name = "REV")]
    pub from: Option<String>,

    /// End of the commit range.
    #[arg(short, long, value_name = "REV")]
    pub to: Option<String>,

    /// Config file with explicit (non-Go) dependencies.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Go workspace list (`:`-separated). Defaults to `$HOME/go`.
    #[arg(long, env = "GOPATH", value_name = "PATH")]
    pub gopath: Option<OsString>,

    /// Go installation root. Defaults to `go env GOROOT`.
    #[arg(long, env = "GOROOT", value_name = "PATH")]
    pub goroot: Option<PathBuf>,

    /// Target operating system for build constraints. Defaults to the host.
    #[arg(long, env = "GOOS", value_name = "OS")]
    pub goos: Option<String>,

    /// Target architecture for build constraints. Defaults to the host.
    #[arg(long, env = "GOARCH", value_name = "ARCH")]
    pub goarch: Option<String>,

    /// Print a JSON report with the input packages and the affected set.
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

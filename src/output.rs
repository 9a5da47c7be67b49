use std::io::{self, Write};

use serde::Serialize;

/// Machine-readable result of a run.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Report<'a> {
    /// Every package read from stdin, sorted.
    pub packages: &'a [String],
    /// Packages under the working directory that need a rebuild, sorted.
    /// Absent when no commit range was available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub affected: Option<&'a [String]>,
}

/// Write the package list to `out`.
///
/// - `json = false`: one package per line.
/// - `json = true`: a single pretty-printed [`Report`] object.
pub fn write_packages<W: Write>(out: &mut W, report: &Report<'_>, json: bool) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
    } else {
        for pkg in report.packages {
            writeln!(out, "{pkg}")?;
        }
    }
    out.flush()
}

/// [`write_packages`] to stdout.
pub fn print_packages(report: &Report<'_>, json: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut lock = stdout.lock();
    write_packages(&mut lock, report, json)
}

pub mod range;

pub use range::{CiProvider, CommitRange, commit_range};

use std::path::PathBuf;
use std::process::Stdio;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DiffError {
    #[error("could not start git")]
    Spawn(#[source] std::io::Error),

    #[error("could not read git output")]
    Read(#[source] std::io::Error),

    #[error("git diff exited with {status}: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },

    #[error("git output reader task failed")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
#[error("could not determine if .git exists in {}", dir.display())]
pub struct DetectError {
    pub dir: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// A git working copy rooted at `root`.
#[derive(Debug, Clone)]
pub struct GitRepository {
    root: PathBuf,
}

impl GitRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns true if `root` is the top of a git working copy (has a `.git` entry).
    pub fn detect(&self) -> Result<bool, DetectError> {
        match std::fs::symlink_metadata(self.root.join(".git")) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(DetectError {
                dir: self.root.clone(),
                source,
            }),
        }
    }

    /// Files changed between `range.from` and `range.to`, sorted and unique,
    /// as paths relative to the repository root.
    ///
    /// Stdout is drained on a separate task while the process runs; the lines
    /// are only returned once both the reader and the process have finished.
    pub async fn modified_files(&self, range: &CommitRange) -> Result<Vec<String>, DiffError> {
        let mut cmd = Command::new("git");
        cmd.arg("--no-pager")
            .arg("diff")
            .arg("--name-only")
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for rev in [&range.from, &range.to] {
            if !rev.is_empty() {
                cmd.arg(rev);
            }
        }

        let mut child = cmd.spawn().map_err(DiffError::Spawn)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DiffError::Read(std::io::Error::other("stdout not captured")))?;
        let stderr = child.stderr.take();

        let reader = tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            let mut files = Vec::new();
            while let Some(line) = lines.next_line().await? {
                files.push(line);
            }
            Ok::<_, std::io::Error>(files)
        });
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut buf).await;
            }
            buf
        });

        let status = child.wait().await.map_err(DiffError::Read)?;
        let files = reader.await?.map_err(DiffError::Read)?;
        let stderr = stderr_reader.await?;

        if !status.success() {
            return Err(DiffError::Failed {
                status,
                stderr: stderr.trim().to_owned(),
            });
        }

        let mut files: Vec<String> = files.into_iter().filter(|f| !f.is_empty()).collect();
        files.sort();
        files.dedup();
        debug!(count = files.len(), "changed files");
        Ok(files)
    }
}

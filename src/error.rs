use std::process::ExitCode;

use thiserror::Error;

use crate::config::ConfigError;
use crate::graph::GraphError;
use crate::vcs::{DetectError, DiffError};

/// Everything that can stop a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("error parsing config")]
    Config(#[from] ConfigError),

    #[error("could not read package list")]
    ReadPackages(#[source] std::io::Error),

    #[error("could not determine working directory")]
    WorkingDir(#[source] std::io::Error),

    #[error("could not detect repository type")]
    Detect(#[from] DetectError),

    #[error("not a git repository root")]
    NotARepository,

    #[error("could not determine modified files")]
    Diff(#[from] DiffError),

    #[error("could not build dependency trees")]
    Graph(#[from] GraphError),

    #[error("could not write output")]
    Output(#[source] std::io::Error),
}

impl AppError {
    /// Process exit status: 2 when run outside a repository root, 1 otherwise.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::NotARepository => ExitCode::from(2),
            _ => ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(AppError::NotARepository.exit_code(), ExitCode::from(2));
        let io = std::io::Error::other("boom");
        assert_eq!(AppError::ReadPackages(io).exit_code(), ExitCode::FAILURE);
    }

    #[test]
    fn test_message_includes_source_chain() {
        let err = AppError::WorkingDir(std::io::Error::other("gone"));
        let rendered = format!("{:#}", anyhow::Error::from(err));
        assert_eq!(rendered, "could not determine working directory: gone");
    }
}

use crate::services::{artifact_locator::LocateError, publisher::PublishError};
use std::{io, path::PathBuf};
use thiserror::Error;

/// Everything that can end a deploy run.
///
/// Nothing here is retried; the binary prints the error and exits non-zero.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(
        "Cannot find dist directory at {}. Please run from the repository root.",
        .path.display()
    )]
    MissingBuildDir { path: PathBuf },

    #[error(
        "Deployment-style app JS build not found in {}. Please run `{build_command}` first.",
        .dir.display()
    )]
    MissingArtifact { dir: PathBuf, build_command: String },

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error("failed to read {}", .path.display())]
    ReadArtifact {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to compress {}", .path.display())]
    Compress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("artifact {} cannot be used as an object key: {reason}", .path.display())]
    InvalidArtifactName { path: PathBuf, reason: &'static str },

    #[error("failed to publish bundle")]
    Publish(#[from] PublishError),

    #[error("failed to write to the console")]
    Output(#[source] io::Error),
}

pub type DeployResult<T> = Result<T, DeployError>;

impl DeployError {
    /// Errors the operator fixes by running the tool differently, reported as
    /// a single line rather than a cause chain.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DeployError::MissingBuildDir { .. }
                | DeployError::MissingArtifact { .. }
                | DeployError::Locate(LocateError::Ambiguous { .. })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_carry_remediation() {
        let err = DeployError::MissingBuildDir {
            path: PathBuf::from("./dist"),
        };
        assert!(err.is_precondition());
        assert_eq!(
            err.to_string(),
            "Cannot find dist directory at ./dist. Please run from the repository root."
        );

        let err = DeployError::MissingArtifact {
            dir: PathBuf::from("./dist"),
            build_command: "yarn build".into(),
        };
        assert!(err.is_precondition());
        assert!(err.to_string().contains("Please run `yarn build` first."));
    }

    #[test]
    fn io_failures_are_not_preconditions() {
        let err = DeployError::ReadArtifact {
            path: PathBuf::from("dist/app-1.js"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_precondition());
        assert_eq!(err.to_string(), "failed to read dist/app-1.js");
    }
}

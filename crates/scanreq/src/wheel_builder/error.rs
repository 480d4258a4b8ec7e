use crate::python_env::{FindPythonError, QueryEnvironmentError};
use std::path::PathBuf;

/// An error that can occur while checking build requirements or building a wheel
#[allow(missing_docs)]
#[derive(thiserror::Error, miette::Diagnostic, Debug)]
pub enum WheelBuildError {
    #[error(transparent)]
    FindPython(#[from] FindPythonError),

    #[error("could not query the build interpreter")]
    QueryEnvironment(#[from] QueryEnvironmentError),

    #[error("could not run command {0} to build wheel")]
    CouldNotRunCommand(String, #[source] std::io::Error),

    #[error("build backend hook {hook} failed ({status})\n{stderr}")]
    BackendHookFailed {
        hook: String,
        status: String,
        stderr: String,
    },

    #[error("could not parse {0}: {1}")]
    InvalidPyProjectToml(PathBuf, String),

    #[error("invalid build requirement '{0}': {1}")]
    InvalidBuildRequirement(String, String),

    #[error("could not read the result of build backend hook {0}")]
    UnreadableResult(String, #[source] serde_json::Error),

    #[error("build backend reported {0} but no such wheel was produced")]
    NoWheelProduced(PathBuf),

    #[error("could not build wheel")]
    IoError(#[from] std::io::Error),
}

use std::path::PathBuf;
use thiserror::Error;

/// Error that can occur while finding the python executable.
#[derive(Debug, Error, miette::Diagnostic)]
pub enum FindPythonError {
    /// Neither `python3` nor `python` is on the `PATH`
    #[error("could not find a python executable on the PATH (tried python3 and python)")]
    NotFound,
}

/// Finds the python executable of the current environment. `python3` is preferred because some
/// distributions do not ship a `python` alias.
pub fn system_python_executable() -> Result<PathBuf, FindPythonError> {
    which::which("python3")
        .or_else(|_| which::which("python"))
        .map_err(|_| FindPythonError::NotFound)
}

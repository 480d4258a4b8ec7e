//! The interpreter that build backends run in.

mod installed;
mod system_python;

pub use installed::{InstalledEnvironment, QueryEnvironmentError};
pub use system_python::{system_python_executable, FindPythonError};

use std::path::PathBuf;

/// Which python interpreter to use
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub enum PythonLocation {
    /// Use system interpreter
    #[default]
    System,
    /// Use custom interpreter
    Custom(PathBuf),
}

impl PythonLocation {
    /// Location of python executable
    pub fn executable(&self) -> Result<PathBuf, FindPythonError> {
        match self {
            PythonLocation::System => system_python_executable(),
            PythonLocation::Custom(path) => Ok(path.clone()),
        }
    }
}

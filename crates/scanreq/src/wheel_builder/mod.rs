//! Turns a source tree into a wheel by driving its PEP 517 build backend with an interpreter.

mod build_system;
mod error;
pub mod quiet;

pub use build_system::{BuildSystem, DEFAULT_BUILD_BACKEND, DEFAULT_BUILD_REQUIREMENTS};
pub use error::WheelBuildError;

use crate::python_env::{InstalledEnvironment, PythonLocation};
use crate::types::Requirement;
use crate::workspace::Workspace;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::sync::Arc;

const BUILD_FRONTEND_PY: &str = include_str!("./wheel_builder_frontend.py");

#[derive(Serialize)]
struct HookRequest<'a> {
    build_backend: &'a str,
    backend_path: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    wheel_directory: Option<&'a Path>,
}

#[derive(Deserialize)]
struct BuildWheelResult {
    wheel: String,
}

/// Checks build requirements of source trees and builds them into wheels.
///
/// The interpreter's environment is queried at most once per frontend.
#[derive(Debug)]
pub struct BuildFrontend {
    python: PythonLocation,
    show_build_output: bool,
    environment: Mutex<Option<Arc<InstalledEnvironment>>>,
}

impl BuildFrontend {
    /// Creates a frontend that builds with the given interpreter.
    pub fn new(python: PythonLocation) -> Self {
        Self {
            python,
            show_build_output: false,
            environment: Mutex::new(None),
        }
    }

    /// Creates a frontend whose interpreter environment is already known.
    pub fn with_environment(python: PythonLocation, environment: InstalledEnvironment) -> Self {
        Self {
            python,
            show_build_output: false,
            environment: Mutex::new(Some(Arc::new(environment))),
        }
    }

    /// Lets build backends write to the inherited stdout and stderr instead of capturing them.
    pub fn show_build_output(mut self, show: bool) -> Self {
        self.show_build_output = show;
        self
    }

    /// The environment of the build interpreter.
    pub fn environment(&self) -> Result<Arc<InstalledEnvironment>, WheelBuildError> {
        let mut environment = self.environment.lock();
        if let Some(environment) = environment.as_ref() {
            return Ok(environment.clone());
        }
        let python = self.python.executable()?;
        tracing::info!("using python executable at {}", python.display());
        let queried = Arc::new(InstalledEnvironment::from_python(&python)?);
        *environment = Some(queried.clone());
        Ok(queried)
    }

    /// Returns the build requirements of the project at `root` that the interpreter is lacking.
    ///
    /// The static requirements of the build system are checked first. Only when all of them are
    /// present is the backend asked for its dynamic requirements, since the backend cannot be
    /// imported otherwise.
    #[tracing::instrument(level = "debug", skip_all, fields(root = %root.display()))]
    pub fn check_dependencies(
        &self,
        workspace: &Workspace,
        root: &Path,
    ) -> Result<Vec<Requirement>, WheelBuildError> {
        let build_system = BuildSystem::from_project_root(root)?;
        let environment = self.environment()?;

        let missing = environment.missing(&build_system.requires);
        if !missing.is_empty() {
            return Ok(missing);
        }

        let output = self.run_hook(
            workspace,
            root,
            "get_requires_for_build_wheel",
            &HookRequest {
                build_backend: &build_system.build_backend,
                backend_path: &build_system.backend_path,
                wheel_directory: None,
            },
        )?;
        let extra_requirements: Vec<String> =
            serde_json::from_str(&output).map_err(|e| {
                WheelBuildError::UnreadableResult("get_requires_for_build_wheel".into(), e)
            })?;
        let extra_requirements = extra_requirements
            .into_iter()
            .map(|req| {
                Requirement::from_str(&req)
                    .map_err(|e| WheelBuildError::InvalidBuildRequirement(req, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(environment.missing(&extra_requirements))
    }

    /// Builds the project at `root` into a wheel inside `wheel_dir` and returns its path.
    #[tracing::instrument(level = "info", skip_all, fields(root = %root.display()))]
    pub fn build_wheel(
        &self,
        workspace: &Workspace,
        root: &Path,
        wheel_dir: &Path,
    ) -> Result<PathBuf, WheelBuildError> {
        let build_system = BuildSystem::from_project_root(root)?;
        let output = self.run_hook(
            workspace,
            root,
            "build_wheel",
            &HookRequest {
                build_backend: &build_system.build_backend,
                backend_path: &build_system.backend_path,
                wheel_directory: Some(wheel_dir),
            },
        )?;
        let result: BuildWheelResult = serde_json::from_str(&output)
            .map_err(|e| WheelBuildError::UnreadableResult("build_wheel".into(), e))?;

        let wheel = wheel_dir.join(result.wheel);
        if !wheel.is_file() {
            return Err(WheelBuildError::NoWheelProduced(wheel));
        }
        tracing::debug!("built {}", wheel.display());
        Ok(wheel)
    }

    /// Runs a single backend hook through the embedded frontend script and returns the contents
    /// of its result file.
    fn run_hook(
        &self,
        workspace: &Workspace,
        root: &Path,
        hook: &str,
        request: &HookRequest<'_>,
    ) -> Result<String, WheelBuildError> {
        let python = self.python.executable()?;

        let script = workspace.file();
        fs_err::write(&script, BUILD_FRONTEND_PY)?;
        let request_path = workspace.file();
        fs_err::write(
            &request_path,
            serde_json::to_vec(request)
                .map_err(|e| WheelBuildError::UnreadableResult(hook.into(), e))?,
        )?;
        let result_path = workspace.file();

        let mut command = Command::new(&python);
        command
            .current_dir(root)
            .arg(&script)
            .arg(hook)
            .arg(&request_path)
            .arg(&result_path);

        let output = if self.show_build_output {
            quiet::run(&mut command)
        } else {
            quiet::suppressed(|| quiet::run(&mut command))
        }
        .map_err(|e| WheelBuildError::CouldNotRunCommand(hook.into(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(WheelBuildError::BackendHookFailed {
                hook: hook.into(),
                status: output.status.to_string(),
                stderr: stderr.trim().to_owned(),
            });
        }

        Ok(fs_err::read_to_string(&result_path)?)
    }
}

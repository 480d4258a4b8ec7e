use crate::types::{NormalizedPackageName, Requirement, Version};
use pep508_rs::{MarkerEnvironment, VersionOrUrl};
use serde::Deserialize;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::process::ExitStatus;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum QueryEnvironmentError {
    #[error("python executable {0} does not exist")]
    PythonNotFound(String),

    #[error("failed to execute {0}")]
    FailedToExecute(String, #[source] std::io::Error),

    #[error("failed to parse the environment reported by python")]
    FailedToParse(#[from] serde_json::Error),

    #[error("querying the python environment failed with {0}: {1}")]
    FailedToRun(ExitStatus, String),
}

#[derive(Deserialize)]
struct RawEnvironment {
    markers: MarkerEnvironment,
    installed: HashMap<String, String>,
}

/// What an interpreter has to offer: its environment markers and the distributions installed
/// into it.
#[derive(Debug, Clone, Default)]
pub struct InstalledEnvironment {
    markers: Option<MarkerEnvironment>,
    installed: HashMap<NormalizedPackageName, Version>,
}

impl InstalledEnvironment {
    /// Constructs an environment from known values. Without markers every requirement marker is
    /// assumed to apply.
    pub fn new(
        markers: Option<MarkerEnvironment>,
        installed: impl IntoIterator<Item = (NormalizedPackageName, Version)>,
    ) -> Self {
        Self {
            markers,
            installed: installed.into_iter().collect(),
        }
    }

    /// Queries an interpreter by running a small script with it.
    #[tracing::instrument(level = "debug", skip_all, fields(python = %python.display()))]
    pub fn from_python(python: &Path) -> Result<Self, QueryEnvironmentError> {
        let script = include_str!("environment.py");

        let output = match std::process::Command::new(python)
            .arg("-c")
            .arg(script)
            .output()
        {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(QueryEnvironmentError::PythonNotFound(
                    python.display().to_string(),
                ))
            }
            Err(e) => {
                return Err(QueryEnvironmentError::FailedToExecute(
                    python.display().to_string(),
                    e,
                ))
            }
            Ok(output) => output,
        };

        if !output.status.success() {
            return Err(QueryEnvironmentError::FailedToRun(
                output.status,
                String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::from_json(stdout.trim())
    }

    /// Parses the output of the environment script.
    pub fn from_json(json: &str) -> Result<Self, QueryEnvironmentError> {
        let raw: RawEnvironment = serde_json::from_str(json)?;
        let mut installed = HashMap::with_capacity(raw.installed.len());
        for (name, version) in raw.installed {
            match (
                NormalizedPackageName::from_str(&name),
                Version::from_str(&version),
            ) {
                (Ok(name), Ok(version)) => {
                    installed.insert(name, version);
                }
                _ => tracing::debug!("ignoring installed distribution {name} {version}"),
            }
        }
        tracing::debug!("found {} installed distributions", installed.len());
        Ok(Self {
            markers: Some(raw.markers),
            installed,
        })
    }

    /// The environment markers of the interpreter, if known
    pub fn markers(&self) -> Option<&MarkerEnvironment> {
        self.markers.as_ref()
    }

    /// The installed version of a distribution
    pub fn installed_version(&self, name: &NormalizedPackageName) -> Option<&Version> {
        self.installed.get(name)
    }

    /// Returns every requirement that applies to this environment but is not satisfied by it.
    pub fn missing(&self, requirements: &[Requirement]) -> Vec<Requirement> {
        requirements
            .iter()
            .filter(|req| self.applies(req) && !self.satisfies(req))
            .cloned()
            .collect()
    }

    fn applies(&self, requirement: &Requirement) -> bool {
        match (&requirement.marker, &self.markers) {
            (Some(marker), Some(env)) => marker.evaluate(env, &[]),
            _ => true,
        }
    }

    fn satisfies(&self, requirement: &Requirement) -> bool {
        let Ok(name) = NormalizedPackageName::from_str(&requirement.name) else {
            return false;
        };
        let Some(installed) = self.installed.get(&name) else {
            return false;
        };
        match &requirement.version_or_url {
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => specifiers.contains(installed),
            _ => true,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const LINUX_JSON: &str = r##"{
        "markers": {
            "implementation_name": "cpython",
            "implementation_version": "3.11.4",
            "os_name": "posix",
            "platform_machine": "x86_64",
            "platform_python_implementation": "CPython",
            "platform_release": "6.1.0",
            "platform_system": "Linux",
            "platform_version": "#1 SMP",
            "python_full_version": "3.11.4",
            "python_version": "3.11",
            "sys_platform": "linux"
        },
        "installed": {
            "setuptools": "68.0.0",
            "Wheel": "0.41.2",
            "broken": "not a version"
        }
    }"##;

    fn requirements(reqs: &[&str]) -> Vec<Requirement> {
        reqs.iter().map(|r| Requirement::from_str(r).unwrap()).collect()
    }

    #[test]
    fn parses_environment_json() {
        let env = InstalledEnvironment::from_json(LINUX_JSON).unwrap();
        assert!(env.markers().is_some());
        assert_eq!(
            env.installed_version(&"wheel".parse().unwrap()),
            Some(&Version::from_str("0.41.2").unwrap())
        );
        assert_eq!(env.installed_version(&"broken".parse().unwrap()), None);
    }

    #[test]
    fn missing_requirements() {
        let env = InstalledEnvironment::from_json(LINUX_JSON).unwrap();
        let missing = env.missing(&requirements(&[
            "setuptools>=40.8.0",
            "wheel",
            "setuptools>=70",
            "flit_core>=3.2,<4",
            "pywin32; sys_platform == 'win32'",
            "tomli; python_version < '3.12'",
        ]));
        let names = missing
            .iter()
            .map(|r| r.to_string())
            .collect::<Vec<_>>();
        assert_eq!(names.len(), 3);
        assert!(names[0].starts_with("setuptools"));
        assert!(names[1].starts_with("flit_core"));
        assert!(names[2].starts_with("tomli"));
    }

    #[test]
    fn without_markers_everything_applies() {
        let env = InstalledEnvironment::new(
            None,
            [("wheel".parse().unwrap(), Version::from_str("0.41.2").unwrap())],
        );
        let missing = env.missing(&requirements(&["wheel", "pywin32; sys_platform == 'win32'"]));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].name, "pywin32");
    }
}

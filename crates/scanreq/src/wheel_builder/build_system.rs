use super::WheelBuildError;
use crate::types::Requirement;
use std::path::Path;
use std::str::FromStr;

/// Backend used for projects that do not declare one.
pub const DEFAULT_BUILD_BACKEND: &str = "setuptools.build_meta:__legacy__";

/// Build requirements of projects that do not declare any.
pub const DEFAULT_BUILD_REQUIREMENTS: [&str; 2] = ["setuptools>=40.8.0", "wheel"];

/// The `[build-system]` table of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSystem {
    /// Requirements that must be importable to run the backend
    pub requires: Vec<Requirement>,
    /// Entry point of the backend, `module:object`
    pub build_backend: String,
    /// In-tree directories that are prepended to `sys.path`
    pub backend_path: Vec<String>,
}

impl Default for BuildSystem {
    fn default() -> Self {
        Self {
            requires: DEFAULT_BUILD_REQUIREMENTS
                .iter()
                .filter_map(|req| Requirement::from_str(req).ok())
                .collect(),
            build_backend: DEFAULT_BUILD_BACKEND.to_owned(),
            backend_path: Vec::new(),
        }
    }
}

impl BuildSystem {
    /// Reads the build system of the project at `root`. Projects without a `pyproject.toml`, or
    /// without a `[build-system]` table in it, use the legacy setuptools backend.
    pub fn from_project_root(root: &Path) -> Result<Self, WheelBuildError> {
        let path = root.join("pyproject.toml");
        if !path.is_file() {
            return Ok(Self::default());
        }

        let source = fs_err::read_to_string(&path)?;
        let project = pyproject_toml::PyProjectToml::new(&source)
            .map_err(|e| WheelBuildError::InvalidPyProjectToml(path.clone(), e.to_string()))?;
        let Some(build_system) = project.build_system else {
            return Ok(Self::default());
        };

        let requires = build_system
            .requires
            .iter()
            .map(|req| {
                let req = req.to_string();
                Requirement::from_str(&req)
                    .map_err(|e| WheelBuildError::InvalidBuildRequirement(req, e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match build_system.build_backend {
            Some(build_backend) => Ok(Self {
                requires,
                build_backend,
                backend_path: build_system.backend_path.unwrap_or_default(),
            }),
            // Declared requirements still apply when only the backend is left out
            None => Ok(Self {
                requires,
                ..Self::default()
            }),
        }
    }
}

#![allow(dead_code)]

use parking_lot::Mutex;
use scanreq::index::{CandidateProvider, Fetch, FetchError, FindError};
use scanreq::python_env::{InstalledEnvironment, PythonLocation};
use scanreq::types::{ArchiveLink, Candidate, Requirement, Version, Yanked};
use scanreq::wheel_builder::BuildFrontend;
use scanreq::ProjectContext;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use url::Url;

/// Serves files from memory and counts how often each url was requested.
#[derive(Debug, Default)]
pub struct CountingFetch {
    files: HashMap<String, Vec<u8>>,
    requests: Mutex<HashMap<String, usize>>,
}

impl CountingFetch {
    pub fn with_file(mut self, url: &str, path: &Path) -> Self {
        self.files
            .insert(url.to_owned(), std::fs::read(path).unwrap());
        self
    }

    pub fn requests(&self, url: &str) -> usize {
        self.requests.lock().get(url).copied().unwrap_or_default()
    }
}

impl Fetch for CountingFetch {
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        *self.requests.lock().entry(url.to_string()).or_default() += 1;
        self.files
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.clone(),
                status: 404,
            })
    }
}

/// Hands out a fixed list of candidates.
#[derive(Debug)]
pub struct FixedCandidates(pub Vec<Candidate>);

impl CandidateProvider for FixedCandidates {
    fn candidates(&self, _requirement: &Requirement) -> Result<Vec<Candidate>, FindError> {
        Ok(self.0.clone())
    }
}

/// A frontend for an interpreter that has `installed` and nothing else. It never runs python as
/// long as a static build requirement is missing.
pub fn frontend(installed: &[(&str, &str)]) -> Arc<BuildFrontend> {
    let installed = installed
        .iter()
        .map(|(name, version)| (name.parse().unwrap(), Version::from_str(version).unwrap()));
    Arc::new(
        BuildFrontend::with_environment(
            PythonLocation::Custom(PathBuf::from("/nonexistent/python")),
            InstalledEnvironment::new(None, installed),
        )
        .show_build_output(true),
    )
}

pub fn context(fetch: Arc<dyn Fetch>) -> ProjectContext {
    ProjectContext {
        fetch,
        frontend: frontend(&[]),
    }
}

pub fn candidate(filename: &str, url: &str) -> Candidate {
    Candidate::try_from(ArchiveLink {
        filename: filename.to_owned(),
        url: url.parse().unwrap(),
        requires_python: None,
        yanked: Yanked::default(),
    })
    .unwrap()
}

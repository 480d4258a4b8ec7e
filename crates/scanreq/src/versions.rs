use crate::index::{CandidateProvider, FindError};
use crate::project::{Project, ProjectContext};
use crate::types::{Candidate, Requirement, Version};
use indexmap::IndexMap;

/// Collapses candidates into one unresolved [`Project`] per version, in the order the versions
/// are first seen. When a version is offered several times only its first candidate is kept,
/// regardless of whether it is a wheel or a source distribution.
pub fn versions(
    candidates: impl IntoIterator<Item = Candidate>,
    context: &ProjectContext,
) -> IndexMap<Version, Project> {
    let mut projects = IndexMap::new();
    for candidate in candidates {
        if projects.contains_key(&candidate.version) {
            tracing::trace!("skipping {candidate}, version already recorded");
            continue;
        }
        let project = Project::from_candidate(&candidate, context);
        projects.insert(candidate.version, project);
    }
    projects
}

/// The releases available for a requirement.
#[derive(Debug)]
pub struct Versions {
    requirement: Requirement,
    projects: IndexMap<Version, Project>,
}

impl Versions {
    /// Discovers the candidates of `requirement` and aggregates them by version. No metadata is
    /// resolved yet.
    pub fn for_requirement(
        provider: &dyn CandidateProvider,
        requirement: &Requirement,
        context: &ProjectContext,
    ) -> Result<Self, FindError> {
        let candidates = provider.candidates(requirement)?;
        Ok(Self {
            requirement: requirement.clone(),
            projects: versions(candidates, context),
        })
    }

    /// The requirement these versions were found for
    pub fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    /// Returns the project of a version
    pub fn get(&self, version: &Version) -> Option<&Project> {
        self.projects.get(version)
    }

    /// Iterates over versions and projects in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (&Version, &Project)> {
        self.projects.iter()
    }

    /// The number of distinct versions
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    /// Returns true if no candidate was found
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Returns the underlying map
    pub fn into_inner(self) -> IndexMap<Version, Project> {
        self.projects
    }
}

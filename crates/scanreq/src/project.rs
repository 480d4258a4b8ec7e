use crate::artifacts::{
    Location, SourceMetadataError, SourceProject, WheelMetadataError, WheelProject,
};
use crate::index::Fetch;
use crate::types::{ArtifactKind, Candidate, CoreMetadata, PackageName, Requirement, Version};
use crate::wheel_builder::BuildFrontend;
use std::sync::Arc;
use thiserror::Error;

/// How far metadata resolution of a project has progressed.
#[derive(Debug, Clone, Default)]
pub enum MetadataState {
    /// Nothing has been read yet, or the last attempt failed.
    #[default]
    Unresolved,
    /// The metadata record. Never recomputed.
    Resolved(Arc<CoreMetadata>),
    /// The source could not be built because these build requirements are missing.
    Unavailable(Vec<Requirement>),
}

impl MetadataState {
    /// Returns true unless resolution still has to happen.
    pub fn is_settled(&self) -> bool {
        !matches!(self, MetadataState::Unresolved)
    }
}

/// Everything a project needs to resolve its metadata.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Used to download remote archives
    pub fetch: Arc<dyn Fetch>,
    /// Used to build source distributions
    pub frontend: Arc<BuildFrontend>,
}

#[derive(Debug, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum ProjectError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Wheel(#[from] WheelMetadataError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceMetadataError),
}

/// A single release of a project, backed by either a wheel or a source distribution.
#[derive(Debug)]
pub enum Project {
    /// Metadata is read directly from the archive
    Wheel(WheelProject),
    /// Metadata is read from a wheel built from the source
    Source(SourceProject),
}

impl Project {
    /// Creates the project matching the kind of the candidate. Nothing is fetched yet.
    pub fn from_candidate(candidate: &Candidate, context: &ProjectContext) -> Self {
        match candidate.kind {
            ArtifactKind::Wheel => Project::Wheel(WheelProject::new(
                candidate.url.clone(),
                context.fetch.clone(),
            )),
            ArtifactKind::SourceDistribution => Project::Source(SourceProject::new(
                candidate.url.clone(),
                context.fetch.clone(),
                context.frontend.clone(),
            )),
        }
    }

    /// Wheel or source
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Project::Wheel(_) => ArtifactKind::Wheel,
            Project::Source(_) => ArtifactKind::SourceDistribution,
        }
    }

    /// Where the archive is read from
    pub fn location(&self) -> &Location {
        match self {
            Project::Wheel(wheel) => wheel.location(),
            Project::Source(source) => source.location(),
        }
    }

    /// The current resolution state
    pub fn state(&self) -> MetadataState {
        match self {
            Project::Wheel(wheel) => wheel.state(),
            Project::Source(source) => source.state(),
        }
    }

    /// Resolves the metadata on first access and returns the memoized record afterwards. `None`
    /// means the source could not be built because build requirements are missing.
    pub fn metadata(&self) -> Result<Option<Arc<CoreMetadata>>, ProjectError> {
        match self {
            Project::Wheel(wheel) => Ok(Some(wheel.metadata()?)),
            Project::Source(source) => Ok(source.metadata()?),
        }
    }

    /// The `Name` of the resolved metadata
    pub fn name(&self) -> Result<Option<PackageName>, ProjectError> {
        Ok(self.metadata()?.map(|m| m.name().clone()))
    }

    /// The `Version` of the resolved metadata
    pub fn version(&self) -> Result<Option<Version>, ProjectError> {
        Ok(self.metadata()?.map(|m| m.version().clone()))
    }

    /// The parsed `Requires-Dist` entries of the resolved metadata
    pub fn requirements(&self) -> Result<Option<Vec<Requirement>>, ProjectError> {
        Ok(self.metadata()?.map(|m| m.requires_dist()))
    }

    /// See [`SourceProject::missing_build_dependencies`]. Always `None` for wheels.
    pub fn missing_build_dependencies(&self) -> Option<Vec<Requirement>> {
        match self {
            Project::Wheel(_) => None,
            Project::Source(source) => source.missing_build_dependencies(),
        }
    }
}

use super::{IndexError, PackageIndex};
use crate::types::{Candidate, PackageName, ParsePackageNameError, Requirement};
use miette::Diagnostic;
use pep508_rs::VersionOrUrl;
use std::fmt::Debug;
use std::str::FromStr;
use thiserror::Error;

/// Supplies the candidates of a requirement in preference order.
pub trait CandidateProvider: Debug {
    /// Returns every acceptable candidate for `requirement`, best first.
    fn candidates(&self, requirement: &Requirement) -> Result<Vec<Candidate>, FindError>;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum FindError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    InvalidName(#[from] ParsePackageNameError),

    #[error("direct url requirements are not supported: {0}")]
    UrlRequirement(String),
}

/// Finds candidates on a single [`PackageIndex`].
#[derive(Debug, Clone)]
pub struct IndexFinder {
    index: PackageIndex,
}

impl IndexFinder {
    /// Constructs a new instance.
    pub fn new(index: PackageIndex) -> Self {
        Self { index }
    }
}

impl CandidateProvider for IndexFinder {
    #[tracing::instrument(level = "info", skip_all, fields(requirement = %requirement))]
    fn candidates(&self, requirement: &Requirement) -> Result<Vec<Candidate>, FindError> {
        let name = PackageName::from_str(&requirement.name)?;
        let specifiers = match &requirement.version_or_url {
            None => None,
            Some(VersionOrUrl::VersionSpecifier(specifiers)) => Some(specifiers),
            Some(_) => return Err(FindError::UrlRequirement(requirement.to_string())),
        };

        let mut candidates = Vec::new();
        for link in self.index.archive_links(&name)? {
            let filename = link.filename.clone();
            let candidate = match Candidate::try_from(link) {
                Ok(candidate) => candidate,
                Err(e) => {
                    tracing::warn!("skipping {filename}: {e}");
                    continue;
                }
            };

            if candidate.name != name {
                tracing::debug!("skipping {filename}: belongs to {}", candidate.name);
                continue;
            }
            if candidate.is_yanked {
                tracing::debug!("skipping {filename}: yanked");
                continue;
            }
            if let Some(specifiers) = specifiers {
                if !specifiers.contains(&candidate.version) {
                    continue;
                }
            }
            candidates.push(candidate);
        }

        // Stable, so files of the same version keep their index order.
        candidates.sort_by(|a, b| b.version.cmp(&a.version));
        tracing::info!("found {} candidates", candidates.len());
        Ok(candidates)
    }
}

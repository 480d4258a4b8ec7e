use super::{ArtifactName, PackageName, ParseArtifactNameError, Version, WheelTag};
use crate::artifacts::Location;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

/// A raw link to a distribution archive, as handed out by an index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLink {
    /// The filename of the archive, usually the last path segment of `url`.
    pub filename: String,
    /// Where the archive can be fetched from.
    pub url: Location,
    /// The `data-requires-python` constraint, unevaluated.
    pub requires_python: Option<String>,
    /// Yanked information
    pub yanked: Yanked,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum RawYanked {
    NoReason(bool),
    WithReason(String),
}

/// Struct that describes whether a package is yanked or not.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(from = "RawYanked")]
pub struct Yanked {
    /// This is true if the package is yanked.
    pub yanked: bool,
    /// Optional reason why the package is yanked.
    pub reason: Option<String>,
}

impl From<RawYanked> for Yanked {
    fn from(raw: RawYanked) -> Self {
        match raw {
            RawYanked::NoReason(yanked) => Self {
                yanked,
                reason: None,
            },
            RawYanked::WithReason(reason) => Self {
                yanked: true,
                reason: Some(reason),
            },
        }
    }
}

/// The two kinds of distribution archives.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// A prebuilt `.whl`
    Wheel,
    /// A source archive that has to be built before its metadata can be read
    SourceDistribution,
}

/// One discovered distribution archive of a project, identified purely by its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The original filename
    pub filename: String,
    /// Where to fetch the archive from
    pub url: Location,
    /// Wheel or sdist, decided by the filename suffix
    pub kind: ArtifactKind,
    /// The distribution name encoded in the filename
    pub name: PackageName,
    /// The version encoded in the filename
    pub version: Version,
    /// Compatibility tags. Always `Some` for wheels and `None` for source distributions.
    pub tags: Option<HashSet<WheelTag>>,
    /// Carried through without evaluating it
    pub requires_python: Option<String>,
    /// Whether the publisher withdrew this release
    pub is_yanked: bool,
    /// Why it was withdrawn, if a reason was given
    pub yanked_reason: Option<String>,
}

impl Candidate {
    /// Returns the parsed filename.
    pub fn artifact_name(&self) -> Result<ArtifactName, ParseArtifactNameError> {
        self.filename.parse()
    }
}

impl TryFrom<ArchiveLink> for Candidate {
    type Error = ParseArtifactNameError;

    fn try_from(link: ArchiveLink) -> Result<Self, Self::Error> {
        let (kind, name, version, tags) = match link.filename.parse::<ArtifactName>()? {
            ArtifactName::Wheel(wheel) => {
                let tags = wheel.all_tags();
                (
                    ArtifactKind::Wheel,
                    wheel.distribution,
                    wheel.version,
                    Some(tags),
                )
            }
            ArtifactName::SDist(sdist) => (
                ArtifactKind::SourceDistribution,
                sdist.distribution,
                sdist.version,
                None,
            ),
        };

        Ok(Candidate {
            filename: link.filename,
            url: link.url,
            kind,
            name,
            version,
            tags,
            requires_python: link.requires_python,
            is_yanked: link.yanked.yanked,
            yanked_reason: link.yanked.reason,
        })
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{}] at {}", self.name, self.version, self.url)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    fn link(filename: &str) -> ArchiveLink {
        ArchiveLink {
            filename: filename.to_owned(),
            url: Location::from_str(&format!("https://example.com/files/{filename}")).unwrap(),
            requires_python: Some(">=3.8".to_owned()),
            yanked: Yanked::default(),
        }
    }

    #[test]
    fn wheel_candidate_has_tags() {
        let candidate = Candidate::try_from(link("example_pkg-1.1-py3-none-any.whl")).unwrap();
        assert_eq!(candidate.kind, ArtifactKind::Wheel);
        assert_eq!(candidate.name.as_str(), "example-pkg");
        assert_eq!(candidate.version, Version::from_str("1.1").unwrap());
        assert_eq!(candidate.tags.as_ref().map(HashSet::len), Some(1));
        assert_eq!(candidate.requires_python.as_deref(), Some(">=3.8"));
        assert_eq!(
            candidate.to_string(),
            "example_pkg[1.1] at https://example.com/files/example_pkg-1.1-py3-none-any.whl"
        );
    }

    #[test]
    fn sdist_candidate_has_no_tags() {
        let candidate = Candidate::try_from(link("Example-Pkg-1.0.tar.gz")).unwrap();
        assert_eq!(candidate.kind, ArtifactKind::SourceDistribution);
        assert_eq!(candidate.name.as_str(), "example-pkg");
        assert!(candidate.tags.is_none());
    }

    #[test]
    fn malformed_link_is_rejected() {
        assert!(Candidate::try_from(link("example_pkg-1.1-none-any.whl")).is_err());
        assert!(Candidate::try_from(link("example_pkg.tar.gz")).is_err());
    }

    #[test]
    fn yanked_from_json() {
        let yanked: Yanked = serde_json::from_str("\"broken build\"").unwrap();
        assert_eq!(
            yanked,
            Yanked {
                yanked: true,
                reason: Some("broken build".to_owned())
            }
        );
        let yanked: Yanked = serde_json::from_str("false").unwrap();
        assert!(!yanked.yanked);
    }
}

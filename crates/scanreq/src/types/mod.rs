//! Types for names, filenames and metadata records of Python distributions. These follow the
//! PEPs and the PyPA packaging guide as closely as possible.

mod artifact_name;

mod candidate;

mod core_metadata;

mod package_name;

mod rfc822ish;

pub use artifact_name::{
    ArtifactName, BuildTag, ParseArtifactNameError, SDistFilename, SDistFormat, WheelFilename,
    WheelTag,
};

pub use candidate::{ArchiveLink, ArtifactKind, Candidate, Yanked};

pub use core_metadata::{CoreMetadata, CoreMetadataError};

pub use package_name::{NormalizedPackageName, PackageName, ParsePackageNameError};

pub use pep440_rs::{Version, VersionSpecifier, VersionSpecifiers};
pub use pep508_rs::{MarkerEnvironment, Requirement};

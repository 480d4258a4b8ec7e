use super::rfc822ish::RFC822ish;
use crate::types::{PackageName, ParsePackageNameError, Version, VersionSpecifiers};
use pep508_rs::Requirement;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// The core metadata of a distribution, as found in a wheel's `METADATA` file or an sdist's
/// `PKG-INFO`.
///
/// Every field is kept in the order it was written, repeated fields included: a dependency may be
/// declared several times with different environment markers. `Name` and `Version` are validated
/// eagerly, everything else is read on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreMetadata {
    name: PackageName,
    version: Version,
    fields: Vec<(String, String)>,
}

#[derive(Debug, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum CoreMetadataError {
    #[error("failed to parse metadata header block")]
    FailedToParseMetadata(#[from] peg::error::ParseError<peg::str::LineCol>),

    #[error("missing key {0} in METADATA")]
    MissingKey(&'static str),

    #[error("duplicate key {0} in METADATA")]
    DuplicateKey(&'static str),

    #[error("invalid Metadata-Version: {0}")]
    InvalidMetadataVersion(String),

    #[error("invalid Version: {0}")]
    InvalidVersion(String),

    #[error("unsupported METADATA version {0}")]
    UnsupportedVersion(Version),

    #[error(transparent)]
    InvalidPackageName(#[from] ParsePackageNameError),
}

impl CoreMetadata {
    /// The `Name` field.
    pub fn name(&self) -> &PackageName {
        &self.name
    }

    /// The `Version` field.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// All fields in file order.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// The first value of the given field, compared case-insensitively.
    pub fn get<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        self.get_all(key).next()
    }

    /// All values of the given field, compared case-insensitively, in file order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    /// The `Metadata-Version` field, if present and valid.
    pub fn metadata_version(&self) -> Option<Version> {
        self.get("Metadata-Version")
            .and_then(|v| Version::from_str(v).ok())
    }

    /// The raw `Requires-Dist` strings in file order.
    pub fn raw_requires_dist(&self) -> Vec<&str> {
        self.get_all("Requires-Dist").collect()
    }

    /// The parsed `Requires-Dist` entries. Entries that cannot be parsed are skipped.
    pub fn requires_dist(&self) -> Vec<Requirement> {
        let mut requires_dist = Vec::new();
        for req_str in self.get_all("Requires-Dist") {
            match Requirement::from_str(req_str) {
                Err(e) => {
                    tracing::warn!("ignoring Requires-Dist: {req_str}, failed to parse: {e}")
                }
                Ok(req) => requires_dist.push(req),
            }
        }
        requires_dist
    }

    /// The `Requires-Python` field. An unparseable value is treated as absent.
    pub fn requires_python(&self) -> Option<VersionSpecifiers> {
        let value = self.get("Requires-Python")?;
        match VersionSpecifiers::from_str(value) {
            Ok(specifiers) => Some(specifiers),
            Err(e) => {
                tracing::warn!("ignoring Requires-Python: {value}, failed to parse: {e}");
                None
            }
        }
    }

    /// The `Provides-Extra` values in file order.
    pub fn provides_extras(&self) -> Vec<&str> {
        self.get_all("Provides-Extra").collect()
    }
}

impl TryFrom<&[u8]> for CoreMetadata {
    type Error = CoreMetadataError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let input = String::from_utf8_lossy(value);
        let parsed = RFC822ish::from_str(&input)?;

        static NEXT_MAJOR_METADATA_VERSION: OnceLock<Version> = OnceLock::new();
        let next_major =
            NEXT_MAJOR_METADATA_VERSION.get_or_init(|| Version::from_str("3").unwrap());

        // Consumers MUST fail on a metadata version with a greater major version than they
        // support. An absent Metadata-Version is tolerated.
        if let Some(metadata_version) = single(&parsed, "Metadata-Version")? {
            let metadata_version = Version::from_str(metadata_version)
                .map_err(CoreMetadataError::InvalidMetadataVersion)?;
            if metadata_version >= *next_major {
                return Err(CoreMetadataError::UnsupportedVersion(metadata_version));
            }
        }

        let name = single(&parsed, "Name")?
            .ok_or(CoreMetadataError::MissingKey("Name"))?
            .parse()?;
        let version = single(&parsed, "Version")?
            .ok_or(CoreMetadataError::MissingKey("Version"))?;
        let version = Version::from_str(version).map_err(CoreMetadataError::InvalidVersion)?;

        Ok(CoreMetadata {
            name,
            version,
            fields: parsed.fields,
        })
    }
}

impl FromStr for CoreMetadata {
    type Err = CoreMetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoreMetadata::try_from(s.as_bytes())
    }
}

fn single<'a>(
    parsed: &'a RFC822ish,
    key: &'static str,
) -> Result<Option<&'a str>, CoreMetadataError> {
    let mut values = parsed.get_all(key);
    let first = values.next();
    if values.next().is_some() {
        return Err(CoreMetadataError::DuplicateKey(key));
    }
    Ok(first)
}

use super::{PackageName, ParsePackageNameError};
use crate::types::Version;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

/// The name of a distribution archive and everything that can be derived from the name alone.
///
/// A wheel carries its compatibility tags in the filename, a source distribution only carries
/// a name, a version and an archive format. Nothing here ever looks at the content of the file.
#[derive(Debug, Clone, PartialOrd, Ord, Eq, PartialEq, Serialize, Deserialize)]
pub enum ArtifactName {
    /// Wheel artifact
    Wheel(WheelFilename),
    /// Sdist artifact
    SDist(SDistFilename),
}

impl ArtifactName {
    /// Returns the distribution name encoded in the filename
    pub fn distribution(&self) -> &PackageName {
        match self {
            ArtifactName::Wheel(name) => &name.distribution,
            ArtifactName::SDist(name) => &name.distribution,
        }
    }

    /// Returns the version of the artifact
    pub fn version(&self) -> &Version {
        match self {
            ArtifactName::Wheel(name) => &name.version,
            ArtifactName::SDist(name) => &name.version,
        }
    }

    /// Returns this name as a wheel name
    pub fn as_wheel(&self) -> Option<&WheelFilename> {
        match self {
            ArtifactName::Wheel(wheel) => Some(wheel),
            ArtifactName::SDist(_) => None,
        }
    }

    /// Returns this name as a source distribution name
    pub fn as_sdist(&self) -> Option<&SDistFilename> {
        match self {
            ArtifactName::Wheel(_) => None,
            ArtifactName::SDist(sdist) => Some(sdist),
        }
    }
}

impl Display for ArtifactName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ArtifactName::Wheel(name) => write!(f, "{}", name),
            ArtifactName::SDist(name) => write!(f, "{}", name),
        }
    }
}

impl FromStr for ArtifactName {
    type Err = ParseArtifactNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with(".whl") {
            Ok(ArtifactName::Wheel(s.parse()?))
        } else {
            Ok(ArtifactName::SDist(s.parse()?))
        }
    }
}

/// A single `(interpreter, abi, platform)` compatibility triple.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct WheelTag {
    /// e.g. `py3`, `cp311`
    pub interpreter: String,
    /// e.g. `none`, `abi3`, `cp311`
    pub abi: String,
    /// e.g. `any`, `manylinux_2_17_x86_64`
    pub platform: String,
}

impl Display for WheelTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

/// Structure that contains the information that is contained in a wheel name
/// See: [File Name Convention](https://www.python.org/dev/peps/pep-0427/#file-name-convention),
/// and: [PyPA Conventions](https://packaging.python.org/en/latest/specifications/),
/// for more details regarding the structure of a wheel name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub struct WheelFilename {
    /// Distribution name, e.g. ‘django’, ‘pyramid’.
    pub distribution: PackageName,

    /// Distribution version, e.g. 1.0.
    pub version: Version,

    /// Optional build number.
    pub build_tag: Option<BuildTag>,

    /// Language implementation and version tag
    /// E.g. ‘py27’, ‘py2’, ‘py3’.
    pub py_tags: Vec<String>,

    /// ABI specific tags
    /// E.g. ‘cp33m’, ‘abi3’, ‘none’.
    pub abi_tags: Vec<String>,

    /// Architecture specific tags
    /// E.g. ‘linux_x86_64’, ‘any’, ‘manylinux_2_17_x86_64’
    pub arch_tags: Vec<String>,
}

impl WheelFilename {
    /// Creates a set of all tags that are contained in this wheel name.
    pub fn all_tags(&self) -> HashSet<WheelTag> {
        self.py_tags
            .iter()
            .cartesian_product(self.abi_tags.iter())
            .cartesian_product(self.arch_tags.iter())
            .map(|((py, abi), arch)| WheelTag {
                interpreter: py.clone(),
                abi: abi.clone(),
                platform: arch.clone(),
            })
            .collect()
    }
}

impl Display for WheelFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{dist}-{ver}{build}-{py_tags}-{abi_tags}-{arch_tags}.whl",
            dist = self.distribution.as_source_str(),
            ver = self.version,
            build = self
                .build_tag
                .as_ref()
                .map_or_else(String::new, |tag| format!("-{tag}")),
            py_tags = self.py_tags.join("."),
            abi_tags = self.abi_tags.join("."),
            arch_tags = self.arch_tags.join("."),
        )
    }
}

impl FromStr for WheelFilename {
    type Err = ParseArtifactNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some(file_stem) = s.strip_suffix(".whl") else {
            return Err(ParseArtifactNameError::InvalidExtension(s.to_string()));
        };

        // Dashes inside the name and version are escaped to underscores by every wheel builder,
        // so the stem has a fixed number of components.
        let parts = file_stem.split('-').collect::<Vec<_>>();
        let (distribution, version, build_tag, py_tags, abi_tags, arch_tags) = match parts[..] {
            [name, version, py, abi, arch] => (name, version, None, py, abi, arch),
            [name, version, build, py, abi, arch] => (name, version, Some(build), py, abi, arch),
            _ => return Err(ParseArtifactNameError::InvalidName(s.to_string())),
        };

        let distribution = PackageName::from_str(distribution)?;
        let version = Version::from_str(version).map_err(ParseArtifactNameError::InvalidVersion)?;
        let build_tag = build_tag.map(BuildTag::from_str).transpose()?;

        let split_tags = |tags: &str| -> Result<Vec<String>, ParseArtifactNameError> {
            if tags.is_empty() || tags.split('.').any(str::is_empty) {
                return Err(ParseArtifactNameError::InvalidName(s.to_string()));
            }
            Ok(tags.split('.').map(ToOwned::to_owned).collect())
        };

        Ok(Self {
            distribution,
            version,
            build_tag,
            py_tags: split_tags(py_tags)?,
            abi_tags: split_tags(abi_tags)?,
            arch_tags: split_tags(arch_tags)?,
        })
    }
}

/// A build number. Must start with a digit. Acts as a tie-breaker if two wheel file names are the
/// same in all other respects (i.e. name, version and other tags).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, SerializeDisplay, DeserializeFromStr)]
pub struct BuildTag {
    number: u32,
    name: String,
}

impl Display for BuildTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.number, &self.name)
    }
}

impl FromStr for BuildTag {
    type Err = ParseArtifactNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let first_alpha_idx = s
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(s.len());
        let (digits, name) = s.split_at(first_alpha_idx);
        Ok(Self {
            number: digits
                .parse()
                .map_err(|_| ParseArtifactNameError::BuildTagMustStartWithDigit(s.to_owned()))?,
            name: name.to_owned(),
        })
    }
}

/// Structure that contains the information that is contained in a source distribution name
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct SDistFilename {
    /// Distribution name, e.g. ‘django’, ‘pyramid’.
    pub distribution: PackageName,

    /// Distribution version, e.g. 1.0.
    pub version: Version,

    /// The format of the file
    pub format: SDistFormat,
}

impl Display for SDistFilename {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{dist}-{ver}{format}",
            dist = self.distribution.as_source_str(),
            ver = self.version,
            format = self.format,
        )
    }
}

impl FromStr for SDistFilename {
    type Err = ParseArtifactNameError;

    /// Parses `name-version.<ext>`. The stem is split on its last dash, names may contain dashes
    /// but versions may not.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format = SDistFormat::from_filename(s)?;
        let stem = &s[..s.len() - format.extension().len()];

        let Some((name, version)) = stem.rsplit_once('-') else {
            return Err(ParseArtifactNameError::InvalidName(s.to_string()));
        };

        Ok(SDistFilename {
            distribution: PackageName::from_str(name)?,
            version: Version::from_str(version).map_err(ParseArtifactNameError::InvalidVersion)?,
            format,
        })
    }
}

/// Describes the format in which the source distribution is shipped.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum SDistFormat {
    Zip,
    TarGz,
    TarBz2,
    TarXz,
    TarZ,
    Tar,
}

impl SDistFormat {
    /// Only these formats can be unpacked.
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::TarGz | Self::Tar | Self::Zip)
    }

    /// Determines the format from the suffix of a filename or path.
    pub fn from_filename(path: &str) -> Result<SDistFormat, ParseArtifactNameError> {
        [
            SDistFormat::Zip,
            SDistFormat::TarGz,
            SDistFormat::TarBz2,
            SDistFormat::TarXz,
            SDistFormat::TarZ,
            SDistFormat::Tar,
        ]
        .into_iter()
        .find(|format| path.ends_with(format.extension()))
        .ok_or_else(|| ParseArtifactNameError::InvalidExtension(path.to_string()))
    }

    /// The filename suffix including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            SDistFormat::Zip => ".zip",
            SDistFormat::TarGz => ".tar.gz",
            SDistFormat::TarBz2 => ".tar.bz2",
            SDistFormat::TarXz => ".tar.xz",
            SDistFormat::TarZ => ".tar.Z",
            SDistFormat::Tar => ".tar",
        }
    }
}

impl Display for SDistFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// An error that can occur when parsing an artifact name
#[derive(Debug, Clone, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum ParseArtifactNameError {
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("invalid artifact extension. Must be either .whl, .tar.gz, .tar or .zip (filename='{0}')")]
    InvalidExtension(String),

    #[error(transparent)]
    InvalidPackageName(#[from] ParsePackageNameError),

    #[error("invalid version: '{0}'")]
    InvalidVersion(String),

    #[error("build tag '{0}' must start with a digit")]
    BuildTagMustStartWithDigit(String),
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_sdist_name_from_str() {
        let sn: SDistFilename = "trio-0.19a0.tar.gz".parse().unwrap();
        assert_eq!(sn.distribution, "trio".parse().unwrap());
        assert_eq!(sn.version, "0.19a0".parse().unwrap());
        assert_eq!(sn.format, SDistFormat::TarGz);

        assert_eq!(sn.to_string(), "trio-0.19a0.tar.gz");

        let sn: SDistFilename = "create_ap-gui-1.3.1.tar.gz".parse().unwrap();
        assert_eq!(sn.distribution, "create_ap-gui".parse().unwrap());
        assert_eq!(sn.version, "1.3.1".parse().unwrap());
    }

    #[test]
    fn sdist_spellings_compare_equal() {
        let a: SDistFilename = "Foo_Bar-1.0.tar.gz".parse().unwrap();
        let b: SDistFilename = "foo-bar-1.0.tar.gz".parse().unwrap();
        assert_eq!(a.distribution, b.distribution);
        assert_eq!(a.version, b.version);
        assert_eq!(a.distribution.as_source_str(), "Foo_Bar");
    }

    #[test]
    fn test_many_linux() {
        let n: WheelFilename =
            "numpy-1.26.0-pp39-pypy39_pp73-manylinux_2_17_x86_64.manylinux2014_x86_64.whl"
                .parse()
                .unwrap();

        assert_eq!(
            n.arch_tags,
            vec!["manylinux_2_17_x86_64", "manylinux2014_x86_64"]
        );
        assert_eq!(n.all_tags().len(), 2);
    }

    #[test]
    fn test_wheel_name_from_str() {
        let n: WheelFilename = "trio-0.18.0-py3-none-any.whl".parse().unwrap();
        assert_eq!(n.distribution, "trio".parse().unwrap());
        assert_eq!(n.version, "0.18.0".parse().unwrap());
        assert_eq!(n.build_tag, None);
        assert_eq!(n.py_tags, vec!["py3"]);
        assert_eq!(n.abi_tags, vec!["none"]);
        assert_eq!(n.arch_tags, vec!["any"]);

        assert_eq!(n.to_string(), "trio-0.18.0-py3-none-any.whl");
    }

    #[test]
    fn test_wheel_name_with_build_tag() {
        let n: WheelFilename = "foo.bar-0.1b3-1local-py2.py3-none-any.whl".parse().unwrap();
        assert_eq!(n.distribution, "foo.bar".parse().unwrap());
        assert_eq!(n.version, "0.1b3".parse().unwrap());
        assert_eq!(
            n.build_tag,
            Some(BuildTag {
                number: 1,
                name: String::from("local"),
            })
        );
        assert_eq!(n.py_tags, vec!["py2", "py3"]);

        let tags = n.all_tags();
        assert_eq!(tags.len(), 2);
        assert!(tags.contains(&WheelTag {
            interpreter: "py2".into(),
            abi: "none".into(),
            platform: "any".into(),
        }));

        assert_eq!(n.to_string(), "foo.bar-0.1b3-1local-py2.py3-none-any.whl");
    }

    #[test]
    fn reparsing_is_stable() {
        let filename = "Example_Pkg-2.0-py2.py3-none-any.whl";
        let a: ArtifactName = filename.parse().unwrap();
        let b: ArtifactName = filename.parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), filename);
    }

    #[rstest]
    #[case("trio-0.18.0-py3-any.whl")]
    #[case("trio-0.18.0-x-py3-none-any.whl")]
    #[case("trio-0.18.0-1-2-py3-none-any.whl")]
    #[case("trio-py3-none-any-foo-bar-baz.whl")]
    #[case("trio.tar.gz")]
    #[case("trio-1.0.exe")]
    #[case("trio-not_a_version.tar.gz")]
    fn malformed_filenames(#[case] filename: &str) {
        assert!(filename.parse::<ArtifactName>().is_err(), "{filename}");
    }
}

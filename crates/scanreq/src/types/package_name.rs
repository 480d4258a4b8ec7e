use miette::Diagnostic;
use regex::Regex;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

/// The name of a distribution as it was spelled in a filename, a requirement or a metadata
/// record. Two names are the same package when their canonical forms match, so `Foo_Bar`,
/// `foo.bar` and `FOO-bar` all compare equal.
#[derive(Debug, Clone, Eq, SerializeDisplay, DeserializeFromStr)]
pub struct PackageName {
    spelling: Box<str>,
    canonical: Box<str>,
}

impl PackageName {
    /// The name exactly as it was parsed.
    pub fn as_source_str(&self) -> &str {
        &self.spelling
    }

    /// The canonical form: lowercase, with every run of `-`, `_` and `.` replaced by one `-`.
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

/// Raised for strings that are not valid distribution names.
#[derive(Debug, Clone, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum ParsePackageNameError {
    #[error("invalid package name '{0}'")]
    InvalidPackageName(String),
}

/// Lowercases `name` and folds separator runs, after checking it against the core metadata
/// name rule (ASCII letters and digits at both ends, `.`, `_` and `-` only in between).
fn canonicalize(name: &str) -> Result<String, ParsePackageNameError> {
    static VALID: OnceLock<Regex> = OnceLock::new();
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();

    let valid = VALID
        .get_or_init(|| Regex::new(r"(?i-u)^([A-Z0-9]|[A-Z0-9][A-Z0-9._-]*[A-Z0-9])$").unwrap());
    if !valid.is_match(name) {
        return Err(ParsePackageNameError::InvalidPackageName(name.to_owned()));
    }

    let separators = SEPARATORS.get_or_init(|| Regex::new(r"[-_.]+").unwrap());
    Ok(separators.replace_all(name, "-").to_ascii_lowercase())
}

impl FromStr for PackageName {
    type Err = ParsePackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let canonical = canonicalize(s)?;
        Ok(Self {
            spelling: s.into(),
            canonical: canonical.into_boxed_str(),
        })
    }
}

// Identity is the canonical form only.

impl PartialEq for PackageName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Hash for PackageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state)
    }
}

impl Ord for PackageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.canonical.cmp(&other.canonical)
    }
}

impl PartialOrd for PackageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for PackageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.spelling)
    }
}

/// Only the canonical form of a name, used to key maps of installed distributions.
#[repr(transparent)]
#[derive(
    Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, SerializeDisplay, DeserializeFromStr,
)]
pub struct NormalizedPackageName(Box<str>);

impl NormalizedPackageName {
    /// The canonical name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<PackageName> for NormalizedPackageName {
    fn from(name: PackageName) -> Self {
        Self(name.canonical)
    }
}

impl From<&PackageName> for NormalizedPackageName {
    fn from(name: &PackageName) -> Self {
        Self(name.canonical.clone())
    }
}

impl FromStr for NormalizedPackageName {
    type Err = ParsePackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        canonicalize(s).map(|canonical| Self(canonical.into_boxed_str()))
    }
}

impl Display for NormalizedPackageName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NormalizedPackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rstest::rstest;
    use std::collections::HashSet;

    #[rstest]
    #[case("requests", "requests")]
    #[case("Django", "django")]
    #[case("zope.interface", "zope-interface")]
    #[case("typing_extensions", "typing-extensions")]
    #[case("Foo__Bar.-baz", "foo-bar-baz")]
    #[case("a", "a")]
    fn canonical_form(#[case] spelling: &str, #[case] canonical: &str) {
        let name = PackageName::from_str(spelling).unwrap();
        assert_eq!(name.as_source_str(), spelling);
        assert_eq!(name.as_str(), canonical);
        assert_eq!(name.to_string(), spelling);
        assert_eq!(
            NormalizedPackageName::from(&name).as_str(),
            NormalizedPackageName::from_str(spelling).unwrap().as_str()
        );
    }

    #[rstest]
    #[case("")]
    #[case("-leading")]
    #[case("trailing.")]
    #[case("white space")]
    #[case("ünïcode")]
    fn invalid_names(#[case] spelling: &str) {
        assert!(matches!(
            PackageName::from_str(spelling),
            Err(ParsePackageNameError::InvalidPackageName(s)) if s == spelling
        ));
    }

    #[test]
    fn spellings_of_one_package_are_equal() {
        let spellings: HashSet<PackageName> = ["Typing_Extensions", "typing.extensions", "typing-extensions"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(spellings.len(), 1);

        let other: PackageName = "typingextensions".parse().unwrap();
        assert!(!spellings.contains(&other));
    }
}

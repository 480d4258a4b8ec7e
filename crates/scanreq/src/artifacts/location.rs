use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Where the bytes of an archive live: on the local filesystem or behind a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A local file or directory
    Path(PathBuf),
    /// A remote resource
    Url(Url),
}

impl Location {
    /// Returns the local path, if this is one.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => Some(path),
            Location::Url(_) => None,
        }
    }

    /// The last path segment, used to name the downloaded file.
    pub fn file_name(&self) -> Option<String> {
        match self {
            Location::Path(path) => path.file_name().map(|n| n.to_string_lossy().into_owned()),
            Location::Url(url) => url
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .filter(|segment| !segment.is_empty())
                .map(ToOwned::to_owned),
        }
    }
}

impl From<Url> for Location {
    fn from(url: Url) -> Self {
        if url.scheme() == "file" {
            if let Ok(path) = url.to_file_path() {
                return Location::Path(path);
            }
        }
        Location::Url(url)
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Path(path)
    }
}

impl FromStr for Location {
    type Err = Infallible;

    /// `http(s)://` and `file://` strings are parsed as URLs, anything else is a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://")
        {
            if let Ok(url) = Url::parse(s) {
                return Ok(url.into());
            }
        }
        Ok(Location::Path(PathBuf::from(s)))
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Path(path) => write!(f, "{}", path.display()),
            Location::Url(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_locations() {
        assert!(matches!(
            Location::from_str("https://files.example/foo-1.0.tar.gz").unwrap(),
            Location::Url(_)
        ));
        assert_eq!(
            Location::from_str("/tmp/foo-1.0.tar.gz").unwrap(),
            Location::Path(PathBuf::from("/tmp/foo-1.0.tar.gz"))
        );
        #[cfg(unix)]
        assert_eq!(
            Location::from_str("file:///tmp/foo-1.0.tar.gz").unwrap(),
            Location::Path(PathBuf::from("/tmp/foo-1.0.tar.gz"))
        );
    }

    #[test]
    fn trailing_segment() {
        let location = Location::from_str("https://files.example/a/b/foo-1.0.tar.gz#sha256=00")
            .unwrap();
        assert_eq!(location.file_name().as_deref(), Some("foo-1.0.tar.gz"));
        let location = Location::from_str("https://files.example/").unwrap();
        assert_eq!(location.file_name(), None);
    }
}

//! The candidate discovery collaborator: fetching and parsing project pages of a PEP 503
//! "simple" index and turning their links into [`Candidate`]s.
//!
//! [`Candidate`]: crate::types::Candidate

mod finder;
mod html;
mod http;

pub use finder::{CandidateProvider, FindError, IndexFinder};
pub use html::parse_archive_links;
pub use http::{Fetch, FetchError, HttpClient};

use crate::types::{ArchiveLink, PackageName};
use crate::utils::normalize_index_url;
use miette::Diagnostic;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// The file suffixes of archives that are considered at all.
pub const ACCEPTED_SUFFIXES: [&str; 2] = [".tar.gz", ".whl"];

#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum IndexError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid project url for '{0}'")]
    InvalidProjectUrl(String, #[source] url::ParseError),

    #[error("failed to parse project page {0}")]
    InvalidHtml(Url, #[source] tl::ParseError),
}

/// Returns the url of the project page of `name` on `index`.
pub fn project_url(index: &Url, name: &PackageName) -> Result<Url, IndexError> {
    normalize_index_url(index.clone())
        .join(&format!("{}/", name.as_str()))
        .map_err(|e| IndexError::InvalidProjectUrl(name.to_string(), e))
}

/// A single package index.
#[derive(Debug, Clone)]
pub struct PackageIndex {
    index_url: Url,
    fetch: Arc<dyn Fetch>,
}

impl PackageIndex {
    /// Constructs a new instance. The url is normalized to end with a slash.
    pub fn new(index_url: Url, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            index_url: normalize_index_url(index_url),
            fetch,
        }
    }

    /// The normalized index url
    pub fn index_url(&self) -> &Url {
        &self.index_url
    }

    /// Fetches the project page of `name` and returns its source and wheel archive links in page
    /// order. Links to any other kind of file are dropped.
    #[tracing::instrument(level = "debug", skip(self), fields(name = %name))]
    pub fn archive_links(&self, name: &PackageName) -> Result<Vec<ArchiveLink>, IndexError> {
        let url = project_url(&self.index_url, name)?;
        let body = self.fetch.fetch(&url)?;
        let body = String::from_utf8_lossy(&body);
        let links = parse_archive_links(&url, &body)
            .map_err(|e| IndexError::InvalidHtml(url.clone(), e))?;

        let total = links.len();
        let links = links
            .into_iter()
            .filter(|link| {
                ACCEPTED_SUFFIXES
                    .iter()
                    .any(|suffix| link.filename.ends_with(suffix))
            })
            .collect::<Vec<_>>();
        tracing::debug!("{} of {} links are archives", links.len(), total);
        Ok(links)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::str::FromStr;

    #[derive(Debug, Default)]
    struct StaticPages {
        pages: HashMap<String, String>,
        requested: Mutex<Vec<String>>,
    }

    impl Fetch for StaticPages {
        fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
            self.requested.lock().push(url.to_string());
            self.pages
                .get(url.as_str())
                .map(|p| p.as_bytes().to_vec())
                .ok_or_else(|| FetchError::Status {
                    url: url.clone(),
                    status: 404,
                })
        }
    }

    #[test]
    fn test_project_url() {
        let index = Url::parse("https://pypi.org/simple").unwrap();
        let name = PackageName::from_str("Foo_Bar").unwrap();
        assert_eq!(
            project_url(&index, &name).unwrap().as_str(),
            "https://pypi.org/simple/foo-bar/"
        );
    }

    #[test]
    fn only_archives_are_kept() {
        let mut pages = StaticPages::default();
        pages.pages.insert(
            "https://index.example/simple/foo/".to_owned(),
            r#"<a href="foo-1.0.tar.gz">a</a>
               <a href="foo-1.0.zip">b</a>
               <a href="foo-1.0-py3-none-any.whl">c</a>
               <a href="foo-1.0.exe">d</a>
               <a href="foo-1.0.tar.gz.asc">e</a>"#
                .to_owned(),
        );
        let pages = Arc::new(pages);
        let index = PackageIndex::new(
            Url::parse("https://index.example/simple").unwrap(),
            pages.clone(),
        );

        let links = index
            .archive_links(&PackageName::from_str("Foo").unwrap())
            .unwrap();
        let filenames = links.iter().map(|l| l.filename.as_str()).collect::<Vec<_>>();
        assert_eq!(filenames, vec!["foo-1.0.tar.gz", "foo-1.0-py3-none-any.whl"]);
        assert_eq!(
            pages.requested.lock().as_slice(),
            ["https://index.example/simple/foo/".to_owned()]
        );
    }

    #[test]
    fn missing_project_is_an_error() {
        let index = PackageIndex::new(
            Url::parse("https://index.example/simple/").unwrap(),
            Arc::new(StaticPages::default()),
        );
        let err = index
            .archive_links(&PackageName::from_str("nope").unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            IndexError::Fetch(FetchError::Status { status: 404, .. })
        ));
    }
}

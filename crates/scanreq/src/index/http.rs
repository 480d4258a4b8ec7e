use miette::Diagnostic;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reads the full body behind a URL. Every network access of this crate goes through this trait
/// so it can be substituted in tests.
pub trait Fetch: Debug + Send + Sync {
    /// Blocks until the whole resource has been read into memory.
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(missing_docs)]
pub enum FetchError {
    #[error("failed to fetch {url}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {url}: server responded with {status}")]
    Status { url: Url, status: u16 },

    #[error("failed to construct http client")]
    Client(#[source] reqwest::Error),

    #[error("failed to read {0}")]
    Io(String, #[source] std::io::Error),
}

/// A blocking HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    /// Constructs a new instance with the crate's user agent.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// Wraps an already configured client.
    pub fn from_client(client: reqwest::blocking::Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpClient {
    #[tracing::instrument(level = "debug", skip(self), fields(url = %url))]
    fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        if url.scheme() == "file" {
            let path = url
                .to_file_path()
                .map_err(|_| FetchError::Status {
                    url: url.clone(),
                    status: 404,
                })?;
            return fs_err::read(&path).map_err(|e| FetchError::Io(url.to_string(), e));
        }

        let http_error = |source| FetchError::Http {
            url: url.clone(),
            source,
        };
        let response = self.client.get(url.clone()).send().map_err(http_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.clone(),
                status: status.as_u16(),
            });
        }
        let bytes = response.bytes().map_err(http_error)?;
        tracing::debug!("fetched {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }
}

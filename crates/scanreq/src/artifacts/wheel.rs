use super::Location;
use crate::index::{Fetch, FetchError};
use crate::project::MetadataState;
use crate::types::CoreMetadata;
use crate::types::CoreMetadataError;
use parking_lot::Mutex;
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// Suffix of the metadata entry inside a wheel.
const METADATA_SUFFIX: &str = ".dist-info/METADATA";

#[derive(Debug, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum WheelMetadataError {
    #[error("wheel has no metadata: no *{METADATA_SUFFIX} entry in {0}")]
    NoMetadata(String),

    #[error("failed to read the wheel file {0}")]
    ZipError(String, #[source] ZipError),

    #[error("failed to read the wheel file {0}")]
    IoError(String, #[source] std::io::Error),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid METADATA in {0}")]
    InvalidMetadata(String, #[source] CoreMetadataError),
}

/// Reads and parses the `.dist-info/METADATA` entry of a wheel archive. `source` only names the
/// archive in errors and log messages.
pub fn read_wheel_metadata<R: Read + Seek>(
    reader: R,
    source: &str,
) -> Result<CoreMetadata, WheelMetadataError> {
    let mut archive =
        ZipArchive::new(reader).map_err(|e| WheelMetadataError::ZipError(source.into(), e))?;

    // Archive order, not the order of `file_names()` which is unspecified.
    let mut candidates = Vec::new();
    for idx in 0..archive.len() {
        let entry = archive
            .by_index_raw(idx)
            .map_err(|e| WheelMetadataError::ZipError(source.into(), e))?;
        if entry.name().ends_with(METADATA_SUFFIX) {
            candidates.push((idx, entry.name().to_owned()));
        }
    }

    let Some((idx, name)) = candidates.first() else {
        return Err(WheelMetadataError::NoMetadata(source.into()));
    };
    if candidates.len() > 1 {
        tracing::warn!(
            "{source} contains {} metadata entries, using {name}",
            candidates.len()
        );
    }

    let mut bytes = Vec::new();
    archive
        .by_index(*idx)
        .map_err(|e| WheelMetadataError::ZipError(source.into(), e))?
        .read_to_end(&mut bytes)
        .map_err(|e| WheelMetadataError::IoError(source.into(), e))?;

    CoreMetadata::try_from(bytes.as_slice())
        .map_err(|e| WheelMetadataError::InvalidMetadata(format!("{source}/{name}"), e))
}

/// Reads the metadata of a wheel on the local filesystem.
pub fn read_wheel_metadata_from_path(path: &Path) -> Result<CoreMetadata, WheelMetadataError> {
    let source = path.display().to_string();
    let file = fs_err::File::open(path).map_err(|e| WheelMetadataError::IoError(source.clone(), e))?;
    read_wheel_metadata(file, &source)
}

/// A wheel whose metadata is read from the archive on first access.
#[derive(Debug)]
pub struct WheelProject {
    location: Location,
    fetch: Arc<dyn Fetch>,
    state: Mutex<MetadataState>,
}

impl WheelProject {
    /// Constructs a new instance. Nothing is read until [`Self::metadata`] is called.
    pub fn new(location: Location, fetch: Arc<dyn Fetch>) -> Self {
        Self {
            location,
            fetch,
            state: Mutex::new(MetadataState::Unresolved),
        }
    }

    /// Where the wheel is read from
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The current resolution state
    pub fn state(&self) -> MetadataState {
        self.state.lock().clone()
    }

    /// Returns the metadata of this wheel, reading it from the archive only the first time.
    pub fn metadata(&self) -> Result<Arc<CoreMetadata>, WheelMetadataError> {
        let mut state = self.state.lock();
        if let MetadataState::Resolved(metadata) = &*state {
            return Ok(metadata.clone());
        }

        let metadata = Arc::new(self.extract()?);
        *state = MetadataState::Resolved(metadata.clone());
        Ok(metadata)
    }

    #[tracing::instrument(level = "debug", skip(self), fields(location = %self.location))]
    fn extract(&self) -> Result<CoreMetadata, WheelMetadataError> {
        match &self.location {
            Location::Path(path) => read_wheel_metadata_from_path(path),
            Location::Url(url) => {
                // Wheels are small enough to keep the whole archive in memory.
                let bytes = self.fetch.fetch(url)?;
                read_wheel_metadata(Cursor::new(bytes), url.as_str())
            }
        }
    }
}

use super::source_root::locate_source_root;
use super::wheel::{read_wheel_metadata_from_path, WheelMetadataError};
use super::Location;
use crate::index::{Fetch, FetchError};
use crate::project::MetadataState;
use crate::types::{CoreMetadata, Requirement, SDistFormat};
use crate::wheel_builder::{BuildFrontend, WheelBuildError};
use crate::workspace::Workspace;
use flate2::read::GzDecoder;
use parking_lot::Mutex;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use zip::ZipArchive;

#[derive(Debug, Error, miette::Diagnostic)]
#[allow(missing_docs)]
pub enum SourceMetadataError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Fetch(#[from] FetchError),

    #[error("cannot determine an archive name for {0}")]
    NoFileName(String),

    #[error("unsupported source archive format: {0}")]
    UnsupportedArchiveFormat(String),

    #[error("failed to unpack {0}")]
    Unpack(PathBuf, #[source] std::io::Error),

    #[error("failed to unpack {0}")]
    UnpackZip(PathBuf, #[source] zip::result::ZipError),

    #[error("not a buildable source archive: no setup.py or pyproject.toml found in {0}")]
    NotASourceArchive(PathBuf),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Build(#[from] WheelBuildError),

    #[error("could not read the metadata of the built wheel")]
    BuiltWheel(#[from] WheelMetadataError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Fully unpacks a source archive into `dest`. The format is taken from the archive's name.
/// Entries that would end up outside of `dest` are skipped.
pub fn unpack_source_archive(archive: &Path, dest: &Path) -> Result<(), SourceMetadataError> {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let format = SDistFormat::from_filename(&file_name)
        .map_err(|_| SourceMetadataError::UnsupportedArchiveFormat(file_name.clone()))?;
    if !format.is_supported() {
        return Err(SourceMetadataError::UnsupportedArchiveFormat(file_name));
    }

    let file = fs_err::File::open(archive)?;
    let unpack_error = |e| SourceMetadataError::Unpack(archive.to_path_buf(), e);
    match format {
        SDistFormat::TarGz => unpack_tar(GzDecoder::new(file), dest).map_err(unpack_error),
        SDistFormat::Tar => unpack_tar(file, dest).map_err(unpack_error),
        SDistFormat::Zip => ZipArchive::new(file)
            .and_then(|mut zip| zip.extract(dest))
            .map_err(|e| SourceMetadataError::UnpackZip(archive.to_path_buf(), e)),
        _ => Err(SourceMetadataError::UnsupportedArchiveFormat(file_name)),
    }
}

fn unpack_tar(reader: impl Read, dest: &Path) -> std::io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(false);
    archive.unpack(dest)
}

/// A source distribution whose metadata can only be read after building it into a wheel.
#[derive(Debug)]
pub struct SourceProject {
    location: Location,
    fetch: Arc<dyn Fetch>,
    frontend: Arc<BuildFrontend>,
    state: Mutex<MetadataState>,
}

impl SourceProject {
    /// Constructs a new instance. Nothing is fetched or built until [`Self::metadata`] is called.
    pub fn new(location: Location, fetch: Arc<dyn Fetch>, frontend: Arc<BuildFrontend>) -> Self {
        Self {
            location,
            fetch,
            frontend,
            state: Mutex::new(MetadataState::Unresolved),
        }
    }

    /// Where the source is read from
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The current resolution state
    pub fn state(&self) -> MetadataState {
        self.state.lock().clone()
    }

    /// The build requirements that were missing when resolution was attempted, if that is why
    /// no metadata is available.
    pub fn missing_build_dependencies(&self) -> Option<Vec<Requirement>> {
        match &*self.state.lock() {
            MetadataState::Unavailable(missing) => Some(missing.clone()),
            _ => None,
        }
    }

    /// Returns the metadata of this source distribution, building it the first time.
    ///
    /// Returns `Ok(None)` when the build requirements are not installed; that outcome is
    /// remembered like a successful one. Any other failure leaves the project unresolved.
    pub fn metadata(&self) -> Result<Option<Arc<CoreMetadata>>, SourceMetadataError> {
        let mut state = self.state.lock();
        match &*state {
            MetadataState::Resolved(metadata) => return Ok(Some(metadata.clone())),
            MetadataState::Unavailable(_) => return Ok(None),
            MetadataState::Unresolved => {}
        }

        let resolved = Workspace::scope(|workspace| self.resolve(workspace))?;
        *state = resolved;
        Ok(match &*state {
            MetadataState::Resolved(metadata) => Some(metadata.clone()),
            _ => None,
        })
    }

    #[tracing::instrument(level = "info", skip_all, fields(location = %self.location))]
    fn resolve(&self, workspace: &Workspace) -> Result<MetadataState, SourceMetadataError> {
        let root = match &self.location {
            Location::Url(url) => {
                let name = self
                    .location
                    .file_name()
                    .ok_or_else(|| SourceMetadataError::NoFileName(url.to_string()))?;
                let bytes = self.fetch.fetch(url)?;
                let archive = workspace.named_file(&name)?;
                fs_err::write(&archive, bytes)?;
                unpack_and_locate(workspace, &archive)?
            }
            // A directory is already the project root.
            Location::Path(path) if path.is_dir() => path.clone(),
            Location::Path(path) => unpack_and_locate(workspace, path)?,
        };

        let missing = self.frontend.check_dependencies(workspace, &root)?;
        if !missing.is_empty() {
            tracing::debug!(
                "missing build dependencies: {}",
                missing.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
            );
            return Ok(MetadataState::Unavailable(missing));
        }

        let wheel_dir = workspace.dir()?;
        let wheel = self.frontend.build_wheel(workspace, &root, &wheel_dir)?;
        let metadata = read_wheel_metadata_from_path(&wheel)?;
        Ok(MetadataState::Resolved(Arc::new(metadata)))
    }
}

fn unpack_and_locate(workspace: &Workspace, archive: &Path) -> Result<PathBuf, SourceMetadataError> {
    let dest = workspace.dir()?;
    unpack_source_archive(archive, &dest)?;
    locate_source_root(&dest)
}

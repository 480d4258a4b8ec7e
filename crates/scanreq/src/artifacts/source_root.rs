use super::SourceMetadataError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Files that mark the root of a buildable project. Either one is sufficient.
pub const BUILD_DESCRIPTORS: [&str; 2] = ["setup.py", "pyproject.toml"];

/// Maximum number of wrapper directories that are descended into.
pub const MAX_DESCENT_DEPTH: usize = 32;

/// Finds the project root inside a freshly unpacked source archive.
///
/// A directory that contains a build descriptor is the root. A directory without one is only
/// descended into if its sole entry is a directory. Descent stops after [`MAX_DESCENT_DEPTH`]
/// levels or when a directory is reached twice through symlinks.
pub fn locate_source_root(unpacked: &Path) -> Result<PathBuf, SourceMetadataError> {
    let mut current = unpacked.to_path_buf();
    let mut visited = HashSet::new();

    for _ in 0..=MAX_DESCENT_DEPTH {
        if !visited.insert(fs_err::canonicalize(&current)?) {
            tracing::debug!("{} was already visited", current.display());
            break;
        }

        if BUILD_DESCRIPTORS
            .iter()
            .any(|descriptor| current.join(descriptor).exists())
        {
            return Ok(current);
        }

        let entries = fs_err::read_dir(&current)?.collect::<Result<Vec<_>, _>>()?;
        match entries.as_slice() {
            [single] if single.path().is_dir() => current = single.path(),
            _ => break,
        }
    }

    Err(SourceMetadataError::NotASourceArchive(
        unpacked.to_path_buf(),
    ))
}

//! Disposable scratch space on disk.
use std::cell::Cell;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory that hands out uniquely named file and directory slots inside of it.
/// Everything is removed when the workspace is dropped or [`Workspace::close`]d.
#[derive(Debug)]
pub struct Workspace {
    root: TempDir,
    next_slot: Cell<usize>,
}

impl Workspace {
    /// Creates a fresh, empty directory exclusively owned by this instance.
    pub fn new() -> io::Result<Self> {
        let root = tempfile::Builder::new().prefix("scanreq-").tempdir()?;
        tracing::trace!("created workspace {}", root.path().display());
        Ok(Self {
            root,
            next_slot: Cell::new(0),
        })
    }

    /// The directory that contains every slot.
    pub fn path(&self) -> &Path {
        self.root.path()
    }

    fn next_index(&self) -> usize {
        let idx = self.next_slot.get();
        self.next_slot.set(idx + 1);
        idx
    }

    /// Returns a new, unique file path inside the workspace. The file is not created.
    pub fn file(&self) -> PathBuf {
        self.root.path().join(format!("file-{}", self.next_index()))
    }

    /// Returns a new, unique file path inside the workspace whose last component is `name`.
    /// Only the final component of `name` is used, so the path never leaves the workspace.
    pub fn named_file(&self, name: &str) -> io::Result<PathBuf> {
        let dir = self.dir()?;
        let name = Path::new(name)
            .file_name()
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| "download".into());
        Ok(dir.join(name))
    }

    /// Creates and returns a new, unique, empty directory inside the workspace.
    pub fn dir(&self) -> io::Result<PathBuf> {
        let path = self.root.path().join(format!("dir-{}", self.next_index()));
        fs_err::create_dir(&path)?;
        Ok(path)
    }

    /// Removes the workspace and everything in it.
    pub fn close(self) -> io::Result<()> {
        let path = self.root.path().to_path_buf();
        self.root.close().map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("failed to remove workspace {}: {e}", path.display()),
            )
        })
    }

    /// Runs `f` with a fresh workspace that is removed afterwards. A failure to remove the
    /// workspace is only reported if `f` itself succeeded.
    pub fn scope<T, E, F>(f: F) -> Result<T, E>
    where
        F: FnOnce(&Workspace) -> Result<T, E>,
        E: From<io::Error>,
    {
        let workspace = Workspace::new()?;
        let result = f(&workspace);
        let closed = workspace.close();
        match (result, closed) {
            (Err(e), Err(close_err)) => {
                tracing::warn!("{close_err}");
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(_), Err(close_err)) => Err(close_err.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

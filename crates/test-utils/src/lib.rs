//! Builders for the archives and source trees that tests feed into `scanreq`. Everything is
//! written to disk, nothing touches the network.
use flate2::{write::GzEncoder, Compression};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::{write::FileOptions, ZipWriter};

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to write {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("failed to write zip archive {0}")]
    Zip(PathBuf, #[source] zip::result::ZipError),
}

/// Renders a minimal core metadata file.
pub fn metadata(name: &str, version: &str, requires_dist: &[&str]) -> String {
    let mut metadata = format!("Metadata-Version: 2.1\nName: {name}\nVersion: {version}\n");
    for requirement in requires_dist {
        metadata.push_str(&format!("Requires-Dist: {requirement}\n"));
    }
    metadata
}

/// Writes a zip archive with the given entries.
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) -> Result<PathBuf, Error> {
    let file = std::fs::File::create(path).map_err(|e| Error::Io(path.to_path_buf(), e))?;
    let mut writer = ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, FileOptions::default())
            .map_err(|e| Error::Zip(path.to_path_buf(), e))?;
        writer
            .write_all(contents)
            .map_err(|e| Error::Io(path.to_path_buf(), e))?;
    }
    writer
        .finish()
        .map_err(|e| Error::Zip(path.to_path_buf(), e))?;
    Ok(path.to_path_buf())
}

/// Writes `<dir>/<name>-<version>-py3-none-any.whl` carrying a `METADATA` entry built from the
/// arguments.
pub fn write_wheel(
    dir: &Path,
    name: &str,
    version: &str,
    requires_dist: &[&str],
) -> Result<PathBuf, Error> {
    let escaped = name.replace('-', "_");
    let dist_info = format!("{escaped}-{version}.dist-info");
    let metadata = metadata(name, version, requires_dist);
    let wheel = "Wheel-Version: 1.0\nGenerator: test-utils\nRoot-Is-Purelib: true\nTag: py3-none-any\n";
    let init_py = format!("{escaped}/__init__.py");
    let metadata_path = format!("{dist_info}/METADATA");
    let wheel_path = format!("{dist_info}/WHEEL");
    let record_path = format!("{dist_info}/RECORD");
    write_zip(
        &dir.join(format!("{escaped}-{version}-py3-none-any.whl")),
        &[
            (init_py.as_str(), b"".as_slice()),
            (metadata_path.as_str(), metadata.as_bytes()),
            (wheel_path.as_str(), wheel.as_bytes()),
            (record_path.as_str(), b"".as_slice()),
        ],
    )
}

/// Writes the given files below `root`, creating parent directories as needed.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Result<PathBuf, Error> {
    for (relative, contents) in files {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_path_buf(), e))?;
        }
        std::fs::write(&path, contents).map_err(|e| Error::Io(path.clone(), e))?;
    }
    Ok(root.to_path_buf())
}

/// Writes a gzipped tarball at `path` with the given files.
pub fn write_tar_gz(path: &Path, files: &[(&str, &str)]) -> Result<PathBuf, Error> {
    let io_err = |e| Error::Io(path.to_path_buf(), e);
    let file = std::fs::File::create(path).map_err(io_err)?;
    let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
    for (name, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, name, contents.as_bytes())
            .map_err(io_err)?;
    }
    builder
        .into_inner()
        .and_then(|encoder| encoder.finish())
        .map_err(io_err)?;
    Ok(path.to_path_buf())
}

/// Writes `<dir>/<name>-<version>.tar.gz` laid out like a setuptools sdist: a single
/// `<name>-<version>/` directory with a `setup.py`, a `PKG-INFO` and `extra` files.
pub fn write_sdist(
    dir: &Path,
    name: &str,
    version: &str,
    extra: &[(&str, &str)],
) -> Result<PathBuf, Error> {
    let prefix = format!("{name}-{version}");
    let pkg_info = metadata(name, version, &[]);
    let setup_py = format!("from setuptools import setup\nsetup(name={name:?}, version={version:?})\n");

    let mut files = vec![
        (format!("{prefix}/setup.py"), setup_py),
        (format!("{prefix}/PKG-INFO"), pkg_info),
    ];
    files.extend(
        extra
            .iter()
            .map(|(path, contents)| (format!("{prefix}/{path}"), contents.to_string())),
    );
    let files = files
        .iter()
        .map(|(path, contents)| (path.as_str(), contents.as_str()))
        .collect::<Vec<_>>();

    write_tar_gz(&dir.join(format!("{prefix}.tar.gz")), &files)
}

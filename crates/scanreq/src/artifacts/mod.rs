//! Reading metadata out of distribution archives.
//!
//! Wheels carry their metadata directly. Source distributions are unpacked, their project root is
//! located and they are built into a wheel first.

mod location;
mod sdist;
mod source_root;
mod wheel;

pub use location::Location;
pub use sdist::{unpack_source_archive, SourceMetadataError, SourceProject};
pub use source_root::{locate_source_root, BUILD_DESCRIPTORS, MAX_DESCENT_DEPTH};
pub use wheel::{
    read_wheel_metadata, read_wheel_metadata_from_path, WheelMetadataError, WheelProject,
};

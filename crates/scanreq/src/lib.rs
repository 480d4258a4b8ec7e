#![deny(missing_docs)]

//! Reads the name, version and declared dependencies of every release of a Python project.
//!
//! Candidates are discovered on a package index ([`index`]) and collapsed into one [`Project`]
//! per version ([`versions`]). A project resolves its metadata lazily: wheels are read directly,
//! source distributions are unpacked and built into a wheel first ([`artifacts`],
//! [`wheel_builder`]).

pub mod artifacts;
pub mod index;
pub mod python_env;
pub mod types;
pub mod wheel_builder;

mod project;
mod utils;
mod versions;
mod workspace;

pub use project::{MetadataState, Project, ProjectContext, ProjectError};
pub use utils::normalize_index_url;
pub use versions::{versions, Versions};
pub use workspace::Workspace;

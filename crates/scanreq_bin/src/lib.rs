//! Support code of the `scanreq` executable.

mod writer;

pub use writer::{global_multi_progress, IndicatifWriter};

use indicatif::ProgressBar;
use itertools::Itertools;
use miette::{IntoDiagnostic, WrapErr};
use scanreq::Versions;
use std::io::Write;

/// Prefix of the line printed for a source distribution that cannot be built.
pub const MISSING_BUILD_DEPENDENCIES: &str = "The following build dependencies are missing:";

/// Resolves the metadata of every version in discovery order and writes one line per version to
/// `out`: the version taken from the filename followed by the `Version` field of the metadata as
/// written, so spelling differences between the two stay visible.
/// Source distributions that cannot be built for lack of build dependencies get a line naming
/// those dependencies instead. Any other failure aborts.
pub fn report(versions: &Versions, progress: &ProgressBar, out: &mut impl Write) -> miette::Result<()> {
    let name = &versions.requirement().name;
    for (version, project) in versions.iter() {
        progress.set_message(format!("{name} {version}"));
        let metadata = project
            .metadata()
            .wrap_err_with(|| format!("failed to read the metadata of {name} {version}"))?;

        let line = match metadata {
            Some(metadata) => format!("{version} {}", metadata.get("Version").unwrap_or_default()),
            None => format!(
                "{MISSING_BUILD_DEPENDENCIES} {}",
                project
                    .missing_build_dependencies()
                    .unwrap_or_default()
                    .iter()
                    .join(", ")
            ),
        };
        progress
            .suspend(|| writeln!(out, "{line}"))
            .into_diagnostic()?;
    }
    Ok(())
}

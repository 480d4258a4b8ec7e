use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use miette::WrapErr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

use scanreq::index::{Fetch, HttpClient, IndexFinder, PackageIndex};
use scanreq::python_env::PythonLocation;
use scanreq::types::Requirement;
use scanreq::wheel_builder::BuildFrontend;
use scanreq::{normalize_index_url, ProjectContext, Versions};
use scanreq_bin::{global_multi_progress, report, IndicatifWriter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The requirement to scan, e.g. `requests>=2.20`
    requirement: Requirement,

    /// Base URL of the Python Package Index (default <https://pypi.org/simple>). This should point
    /// to a repository compliant with PEP 503 (the simple repository API).
    #[clap(default_value = "https://pypi.org/simple/", long)]
    index_url: Url,

    /// The interpreter used to check build dependencies and to build source distributions
    /// (default: python3 or python from the PATH)
    #[clap(long)]
    python: Option<PathBuf>,

    /// Let build backends write to the terminal instead of hiding their output
    #[clap(long)]
    show_build_output: bool,

    #[clap(short, long)]
    verbose: bool,
}

fn actual_main() -> miette::Result<()> {
    let args = Args::parse();

    // Setup tracing subscriber
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(IndicatifWriter::new(global_multi_progress())))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| get_default_env_filter(args.verbose)),
        )
        .init();

    let fetch: Arc<dyn Fetch> =
        Arc::new(HttpClient::new().wrap_err("failed to construct an http client")?);
    let python = args
        .python
        .map(PythonLocation::Custom)
        .unwrap_or_default();
    let context = ProjectContext {
        fetch: fetch.clone(),
        frontend: Arc::new(BuildFrontend::new(python).show_build_output(args.show_build_output)),
    };

    let index_url = normalize_index_url(args.index_url);
    let finder = IndexFinder::new(PackageIndex::new(index_url.clone(), fetch));
    let versions = Versions::for_requirement(&finder, &args.requirement, &context)
        .wrap_err_with(|| {
            format!(
                "failed to find candidates for '{}' on {index_url}",
                args.requirement
            )
        })?;
    if versions.is_empty() {
        tracing::warn!("no candidates found for '{}'", args.requirement);
    }

    let spinner = global_multi_progress().add(ProgressBar::new_spinner());
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.green} resolving {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = report(&versions, &spinner, &mut std::io::stdout().lock());
    spinner.finish_and_clear();
    result
}

fn main() {
    if let Err(e) = actual_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

/// Constructs a default [`EnvFilter`] that is used when the user did not specify a custom RUST_LOG.
pub fn get_default_env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new("scanreq=debug,scanreq_bin=debug")
    } else {
        EnvFilter::new("scanreq=info,scanreq_bin=info")
    }
}

mod common;

use common::{candidate, context, CountingFetch, FixedCandidates};
use scanreq::types::{ArtifactKind, Requirement, Version};
use scanreq::{versions, MetadataState, Project, Versions};
use std::str::FromStr;
use std::sync::Arc;

fn v(version: &str) -> Version {
    Version::from_str(version).unwrap()
}

#[test]
fn first_seen_candidate_wins() {
    let fetch = Arc::new(CountingFetch::default());
    let projects = versions(
        [
            candidate(
                "a-1.0-py3-none-any.whl",
                "https://files.example/a-1.0-py3-none-any.whl",
            ),
            candidate("a-1.0.tar.gz", "https://files.example/a-1.0.tar.gz"),
            candidate(
                "a-2.0-py3-none-any.whl",
                "https://files.example/a-2.0-py3-none-any.whl",
            ),
        ],
        &context(fetch.clone()),
    );

    assert_eq!(projects.len(), 2);
    let keys = projects.keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys, vec![v("1.0"), v("2.0")]);
    assert_eq!(projects[&v("1.0")].kind(), ArtifactKind::Wheel);
    assert_eq!(
        projects[&v("1.0")].location().to_string(),
        "https://files.example/a-1.0-py3-none-any.whl"
    );
    assert_eq!(projects[&v("2.0")].kind(), ArtifactKind::Wheel);
}

#[test]
fn sdist_first_is_kept_over_later_wheel() {
    let projects = versions(
        [
            candidate("a-1.0.tar.gz", "https://files.example/a-1.0.tar.gz"),
            candidate(
                "a-1.0-py3-none-any.whl",
                "https://files.example/a-1.0-py3-none-any.whl",
            ),
        ],
        &context(Arc::new(CountingFetch::default())),
    );
    assert_eq!(projects.len(), 1);
    assert!(matches!(projects[&v("1.0")], Project::Source(_)));
}

#[test]
fn aggregation_is_lazy() {
    let fetch = Arc::new(CountingFetch::default());
    let projects = versions(
        [candidate(
            "a-1.0-py3-none-any.whl",
            "https://files.example/a-1.0-py3-none-any.whl",
        )],
        &context(fetch.clone()),
    );
    let state = projects[&v("1.0")].state();
    assert!(matches!(state, MetadataState::Unresolved));
    assert!(!state.is_settled());
    assert_eq!(
        fetch.requests("https://files.example/a-1.0-py3-none-any.whl"),
        0
    );
}

#[test]
fn wheel_and_sdist_resolution_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let wheel = test_utils::write_wheel(dir.path(), "examplepkg", "1.1", &["requests>=2"]).unwrap();
    let sdist = test_utils::write_sdist(dir.path(), "examplepkg", "1.0", &[]).unwrap();

    let wheel_url = "https://files.example/examplepkg-1.1-py3-none-any.whl";
    let sdist_url = "https://files.example/examplepkg-1.0.tar.gz";
    let fetch = Arc::new(
        CountingFetch::default()
            .with_file(wheel_url, &wheel)
            .with_file(sdist_url, &sdist),
    );

    let provider = FixedCandidates(vec![
        candidate("examplepkg-1.1-py3-none-any.whl", wheel_url),
        candidate("examplepkg-1.0.tar.gz", sdist_url),
    ]);
    let requirement = Requirement::from_str("examplepkg>=1.0").unwrap();
    let found = Versions::for_requirement(&provider, &requirement, &context(fetch.clone())).unwrap();
    assert_eq!(found.len(), 2);

    let newest = found.get(&v("1.1")).unwrap();
    assert_eq!(newest.version().unwrap(), Some(v("1.1")));
    assert_eq!(newest.name().unwrap().unwrap().as_str(), "examplepkg");
    let requirements = newest.requirements().unwrap().unwrap();
    assert_eq!(requirements.len(), 1);
    assert_eq!(requirements[0].name, "requests");

    let oldest = found.get(&v("1.0")).unwrap();
    assert_eq!(oldest.version().unwrap(), None);
    assert_eq!(oldest.missing_build_dependencies().map(|m| m.len()), Some(2));

    assert_eq!(fetch.requests(wheel_url), 1);
    assert_eq!(fetch.requests(sdist_url), 1);

    let projects = found.into_inner();
    assert!(projects.values().all(|project| project.state().is_settled()));
    assert!(matches!(
        projects[&v("1.0")].state(),
        MetadataState::Unavailable(missing) if missing.len() == 2
    ));
}

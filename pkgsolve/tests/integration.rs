//! End-to-end resolution scenarios against the numpy/python fixture index
//! from spec.md §8.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pkgsolve::{Error, Resolver};
use pkgsolve_types::{ArtifactMetadata, Index, MatchSpec};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};

fn meta(
    name: &str,
    version: &str,
    build: &str,
    build_number: i64,
    depends: &[&str],
    features: &str,
) -> ArtifactMetadata {
    ArtifactMetadata {
        name: name.to_string(),
        version: version.to_string(),
        build: build.to_string(),
        build_number,
        depends: depends.iter().map(|s| s.to_string()).collect(),
        features: features.to_string(),
        track_features: String::new(),
        with_features_depends: BTreeMap::new(),
        channel: None,
    }
}

#[fixture]
fn index() -> Index {
    Index::new([
        (
            "numpy-1.7.1-py27_0.tar.bz2".to_string(),
            meta("numpy", "1.7.1", "py27_0", 0, &["python 2.7*"], ""),
        ),
        (
            "numpy-1.7.1-py33_0.tar.bz2".to_string(),
            meta("numpy", "1.7.1", "py33_0", 0, &["python 3.3*"], ""),
        ),
        (
            "numpy-1.7.1-py27_mkl_0.tar.bz2".to_string(),
            meta("numpy", "1.7.1", "py27_mkl_0", 0, &["python 2.7*"], "mkl"),
        ),
        ("python-2.7.5-0.tar.bz2".to_string(), meta("python", "2.7.5", "0", 0, &[], "")),
        ("python-3.3.2-0.tar.bz2".to_string(), meta("python", "3.3.2", "0", 0, &[], "")),
    ])
    .unwrap()
}

fn specs(raw: &[&str]) -> Vec<MatchSpec> {
    raw.iter().map(|s| MatchSpec::new(s).unwrap()).collect()
}

#[rstest]
fn plain_numpy_picks_py27_build(index: Index) {
    let resolver = Resolver::new(&index);
    let result = resolver.solve(&specs(&["numpy"]), &HashMap::new(), &BTreeSet::new(), false, false).unwrap();
    assert_eq!(
        result,
        vec!["numpy-1.7.1-py27_0.tar.bz2".to_string(), "python-2.7.5-0.tar.bz2".to_string()]
    );
}

#[rstest]
fn narrowing_to_python_3_3_pulls_the_py33_build(index: Index) {
    let resolver = Resolver::new(&index);
    let result = resolver
        .solve(&specs(&["numpy", "python 3.3*"]), &HashMap::new(), &BTreeSet::new(), false, false)
        .unwrap();
    assert_eq!(
        result,
        vec!["numpy-1.7.1-py33_0.tar.bz2".to_string(), "python-3.3.2-0.tar.bz2".to_string()]
    );
}

#[rstest]
fn disjoint_python_pins_are_unsatisfiable(index: Index) {
    let resolver = Resolver::new(&index);
    let err = resolver
        .solve(&specs(&["python >=2.7,<2.8", "python 3.3*"]), &HashMap::new(), &BTreeSet::new(), false, false)
        .unwrap_err();
    assert!(matches!(err, Error::Unsatisfiable(_)));
}

#[rstest]
fn unknown_package_reports_no_packages_found(index: Index) {
    let resolver = Resolver::new(&index);
    let err = resolver.solve(&specs(&["ghostpkg"]), &HashMap::new(), &BTreeSet::new(), false, false).unwrap_err();
    match err {
        Error::Types(pkgsolve_types::Error::NoPackagesFound(names)) => {
            assert_eq!(names, vec!["ghostpkg".to_string()]);
        }
        other => panic!("expected NoPackagesFound, got {other:?}"),
    }
}

#[rstest]
fn requesting_mkl_selects_the_mkl_build(index: Index) {
    let resolver = Resolver::new(&index);
    let mut features = BTreeSet::new();
    features.insert("mkl".to_string());
    let result = resolver.solve(&specs(&["numpy"]), &HashMap::new(), &features, false, false).unwrap();
    assert_eq!(
        result,
        vec!["numpy-1.7.1-py27_mkl_0.tar.bz2".to_string(), "python-2.7.5-0.tar.bz2".to_string()]
    );
}

#[rstest]
fn exact_pin_keeps_only_its_transitive_dependency(index: Index) {
    let resolver = Resolver::new(&index);
    let result = resolver
        .solve(&specs(&["numpy 1.7.1 py27_0"]), &HashMap::new(), &BTreeSet::new(), false, false)
        .unwrap();
    assert_eq!(
        result,
        vec!["numpy-1.7.1-py27_0.tar.bz2".to_string(), "python-2.7.5-0.tar.bz2".to_string()]
    );
}

#[rstest]
fn solve_is_deterministic_across_repeated_calls(index: Index) {
    let resolver = Resolver::new(&index);
    let req = specs(&["numpy"]);
    let first = resolver.solve(&req, &HashMap::new(), &BTreeSet::new(), false, false).unwrap();
    let second = resolver.solve(&req, &HashMap::new(), &BTreeSet::new(), false, false).unwrap();
    assert_eq!(first, second);
}

#[rstest]
fn find_matches_is_sorted(index: Index) {
    let resolver = Resolver::new(&index);
    let numpy = MatchSpec::new("numpy").unwrap();
    assert_eq!(
        resolver.find_matches(&numpy),
        vec![
            "numpy-1.7.1-py27_0.tar.bz2".to_string(),
            "numpy-1.7.1-py27_mkl_0.tar.bz2".to_string(),
            "numpy-1.7.1-py33_0.tar.bz2".to_string(),
        ]
    );
}

#[rstest]
fn unsatisfiable_diagnostic_names_the_conflicting_requirements(index: Index) {
    let resolver = Resolver::new(&index);
    let err = resolver
        .solve(&specs(&["python >=2.7,<2.8", "python 3.3*"]), &HashMap::new(), &BTreeSet::new(), false, false)
        .unwrap_err();
    let Error::Unsatisfiable(message) = err else { panic!("expected Unsatisfiable") };
    assert!(message.contains("python"), "diagnostic should mention the conflicting package: {message}");
}

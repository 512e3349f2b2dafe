//! Dependency closure computation (spec §4.D): an over-approximating set of
//! artifacts that might participate in any solution.

use std::collections::{BTreeSet, HashMap, HashSet};

use pkgsolve_types::{Artifact, Error, Index, MatchSpec};

/// Computes the dependency closure for `requirements` against `index`.
///
/// Builds an over-approximating reachable set by expanding each
/// requirement's candidates and their dependencies breadth-first, then
/// repeatedly rolls back any artifact whose dependency specs aren't fully
/// satisfiable within the current closure, until a fixpoint is reached.
/// This realizes the provisional-add/rollback discipline as an iterative
/// fixpoint rather than literal recursive backtracking, which keeps
/// recursion depth independent of the index and handles dependency cycles
/// without special-casing.
///
/// Dependencies whose match spec has `strictness() == 3` (an exact pin) are
/// added to the closure but never expanded further — the pinned artifact's
/// own dependencies are not pulled in.
///
/// # Errors
///
/// Returns [`Error::NoPackagesFound`] listing every requirement that ends up
/// with zero surviving candidates after pruning.
pub fn compute<'a>(
    index: &'a Index,
    requirements: &[MatchSpec],
    requested_features: &BTreeSet<String>,
    max_only: bool,
) -> Result<HashMap<String, &'a Artifact>, Error> {
    let mut closure: HashMap<String, &'a Artifact> = HashMap::new();
    let mut worklist: Vec<&'a Artifact> = Vec::new();
    let mut pinned: HashSet<String> = HashSet::new();

    for requirement in requirements {
        let candidates = match index.get_pkgs(requirement, max_only) {
            Ok(candidates) => candidates,
            Err(Error::NoPackagesFound(_)) => Vec::new(),
            Err(other) => return Err(other),
        };
        for artifact in candidates {
            if closure.insert(artifact.filename().to_string(), artifact).is_none() {
                worklist.push(artifact);
            }
        }
    }

    while let Some(artifact) = worklist.pop() {
        let dep_specs = dependency_specs(artifact, requested_features);
        for dep_raw in &dep_specs {
            let Ok(dep_spec) = MatchSpec::new(dep_raw) else { continue };
            for candidate in index.find_matches(&dep_spec) {
                let already_present = closure.contains_key(candidate.filename());
                closure.insert(candidate.filename().to_string(), candidate);
                if dep_spec.strictness() < 3 {
                    if !already_present || pinned.remove(candidate.filename()) {
                        worklist.push(candidate);
                    }
                } else if !already_present {
                    pinned.insert(candidate.filename().to_string());
                }
            }
        }
    }

    prune_to_fixpoint(&mut closure, requested_features);

    let mut missing = Vec::new();
    for requirement in requirements {
        let survives = closure.values().any(|a| requirement.matches(a.filename()));
        if !survives {
            missing.push(requirement.to_string());
        }
    }
    if !missing.is_empty() {
        return Err(Error::NoPackagesFound(missing));
    }

    log::debug!("closure computed: {} artifacts across {} requirements", closure.len(), requirements.len());
    Ok(closure)
}

fn dependency_specs(artifact: &Artifact, requested_features: &BTreeSet<String>) -> Vec<String> {
    let mut specs = artifact.depends().to_vec();
    specs.extend(artifact.extra_depends_for(requested_features).iter().cloned());
    specs
}

fn prune_to_fixpoint(closure: &mut HashMap<String, &Artifact>, requested_features: &BTreeSet<String>) {
    loop {
        let mut to_remove = Vec::new();
        for (filename, artifact) in closure.iter() {
            for dep_raw in dependency_specs(artifact, requested_features) {
                let Ok(dep_spec) = MatchSpec::new(&dep_raw) else {
                    to_remove.push(filename.clone());
                    break;
                };
                if !closure.values().any(|a| dep_spec.matches(a.filename())) {
                    to_remove.push(filename.clone());
                    break;
                }
            }
        }
        if to_remove.is_empty() {
            break;
        }
        for filename in &to_remove {
            log::trace!("rolling back {filename}: a dependency has no surviving candidate");
            closure.remove(filename);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pkgsolve_types::ArtifactMetadata;

    use super::*;

    fn meta(name: &str, version: &str, build: &str, build_number: i64, depends: &[&str]) -> ArtifactMetadata {
        ArtifactMetadata {
            name: name.to_string(),
            version: version.to_string(),
            build: build.to_string(),
            build_number,
            depends: depends.iter().map(|s| s.to_string()).collect(),
            features: String::new(),
            track_features: String::new(),
            with_features_depends: BTreeMap::new(),
            channel: None,
        }
    }

    fn index() -> Index {
        Index::new([
            (
                "numpy-1.7.1-py27_0.tar.bz2".to_string(),
                meta("numpy", "1.7.1", "py27_0", 0, &["python 2.7*"]),
            ),
            (
                "numpy-1.7.1-py33_0.tar.bz2".to_string(),
                meta("numpy", "1.7.1", "py33_0", 0, &["python 3.3*"]),
            ),
            ("python-2.7.5-0.tar.bz2".to_string(), meta("python", "2.7.5", "0", 0, &[])),
            ("python-3.3.2-0.tar.bz2".to_string(), meta("python", "3.3.2", "0", 0, &[])),
            (
                "orphan-1.0-0.tar.bz2".to_string(),
                meta("orphan", "1.0", "0", 0, &["ghostpkg"]),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn pulls_in_transitive_dependencies() {
        let idx = index();
        let requirements = vec![MatchSpec::new("numpy").unwrap()];
        let closure = compute(&idx, &requirements, &BTreeSet::new(), false).unwrap();
        assert!(closure.contains_key("python-2.7.5-0.tar.bz2"));
        assert!(closure.contains_key("python-3.3.2-0.tar.bz2"));
    }

    #[test]
    fn rolls_back_unsatisfiable_dependency() {
        let idx = index();
        let requirements = vec![MatchSpec::new("orphan").unwrap()];
        let err = compute(&idx, &requirements, &BTreeSet::new(), false).unwrap_err();
        assert!(matches!(err, Error::NoPackagesFound(_)));
    }

    #[test]
    fn missing_top_level_spec_is_reported() {
        let idx = index();
        let requirements = vec![MatchSpec::new("ghostpkg").unwrap()];
        match compute(&idx, &requirements, &BTreeSet::new(), false) {
            Err(Error::NoPackagesFound(names)) => assert_eq!(names, vec!["ghostpkg".to_string()]),
            other => panic!("expected NoPackagesFound, got {other:?}"),
        }
    }
}

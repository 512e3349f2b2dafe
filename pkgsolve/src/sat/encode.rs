//! Translates a dependency closure, the user's requirements, and the
//! requested feature set into CNF clauses (spec §4.E).

use std::collections::{BTreeSet, HashMap};

use pkgsolve_types::{Artifact, MatchSpec};

use super::cnf::Cnf;

/// Builds the base CNF for `closure` against `requirements` and
/// `requested_features`, allocating variables in `cnf` as it goes.
///
/// Emits, in order: mutual exclusion between same-named artifacts,
/// dependency implication clauses, feature propagation clauses, feature
/// exclusion unit clauses, and one top-level clause per requirement.
pub fn encode(
    cnf: &mut Cnf,
    closure: &HashMap<String, &Artifact>,
    requirements: &[MatchSpec],
    requested_features: &BTreeSet<String>,
) -> Vec<Vec<i32>> {
    let mut clauses = Vec::new();

    let mut by_name: HashMap<&str, Vec<&Artifact>> = HashMap::new();
    let mut filenames: Vec<&str> = closure.keys().map(String::as_str).collect();
    filenames.sort_unstable();
    for &filename in &filenames {
        let artifact = closure[filename];
        by_name.entry(artifact.name()).or_default().push(artifact);
    }

    // 1. Mutual exclusion between every pair of same-named artifacts.
    for artifacts in by_name.values() {
        for i in 0..artifacts.len() {
            for j in (i + 1)..artifacts.len() {
                let a = cnf.var_for(artifacts[i].filename());
                let b = cnf.var_for(artifacts[j].filename());
                clauses.push(vec![-a, -b]);
            }
        }
    }

    // 2. Dependency implication, and 3. feature propagation.
    for &filename in &filenames {
        let artifact = closure[filename];
        let a = cnf.var_for(artifact.filename());

        let mut dep_specs: Vec<String> = artifact.depends().to_vec();
        dep_specs.extend(artifact.extra_depends_for(requested_features).iter().cloned());

        for dep_raw in &dep_specs {
            let Ok(dep_spec) = MatchSpec::new(dep_raw) else { continue };
            let candidates = matching_in_closure(&by_name, &dep_spec);
            if candidates.is_empty() {
                // The closure invariant guarantees every surviving
                // artifact's dependencies are satisfiable; an empty match
                // here means the closure builder has a bug.
                log::warn!("artifact {filename} depends on {dep_raw:?} with no closure candidates");
                continue;
            }
            let mut clause = vec![-a];
            clause.extend(candidates.iter().map(|c| cnf.var_for(c.filename())));
            clauses.push(clause);

            for feature in requested_features {
                let providers: Vec<&Artifact> =
                    candidates.iter().filter(|c| c.features().contains(feature)).copied().collect();
                if !providers.is_empty() {
                    let mut feature_clause = vec![-a];
                    feature_clause.extend(providers.iter().map(|p| cnf.var_for(p.filename())));
                    clauses.push(feature_clause);
                }
            }
        }
    }

    // 4. Feature exclusion: forbid any artifact carrying an unrequested feature.
    for &filename in &filenames {
        let artifact = closure[filename];
        if artifact.features().iter().any(|f| !requested_features.contains(f)) {
            let v = cnf.var_for(artifact.filename());
            clauses.push(vec![-v]);
        }
    }

    // 5. Top-level requirements.
    for requirement in requirements {
        let candidates = matching_in_closure(&by_name, requirement);
        if candidates.is_empty() {
            log::warn!("requirement {requirement} has no closure candidates; emitting an empty clause");
        }
        let clause: Vec<i32> = candidates.iter().map(|c| cnf.var_for(c.filename())).collect();
        clauses.push(clause);
    }

    clauses
}

fn matching_in_closure<'a>(by_name: &HashMap<&str, Vec<&'a Artifact>>, ms: &MatchSpec) -> Vec<&'a Artifact> {
    let mut matches: Vec<&Artifact> =
        by_name.get(ms.name()).into_iter().flatten().filter(|a| ms.matches(a.filename())).copied().collect();
    matches.sort_by_key(|a| a.filename().to_string());
    matches
}

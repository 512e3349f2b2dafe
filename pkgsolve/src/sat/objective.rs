//! The version-preference objective: a pseudo-Boolean sum that is `0` when
//! every selected package is at its newest admissible build (or, when an
//! installed build is being preserved, at that build), increasing the
//! further a choice strays from the preferred one.

use std::collections::{BTreeSet, HashMap};

use pkgsolve_types::Artifact;

use super::{cnf::Cnf, pbenc::Term};

/// Counts how many of `requested` a given artifact's [`Artifact::features`]
/// carries — the secondary ranking key of spec.md §2 ("secondary preference
/// for matching feature tags and build numbers").
fn feature_match_count(artifact: &Artifact, requested: &BTreeSet<String>) -> usize {
    artifact.features().iter().filter(|f| requested.contains(*f)).count()
}

/// Builds the objective terms for `closure`, plus the maximum attainable
/// value (the sum of each scored package name's worst-case coefficient).
///
/// Only packages named directly in `requested_names` (the top-level user
/// requirements) are scored: for each of those names, artifacts are sorted
/// by `(version, feature_match_count, build_number)` descending and assigned
/// a "distance from newest" level, the newest/best-matching getting level
/// `0` and the level incrementing each time that key changes walking down
/// the list. This mirrors `alpm-solve`'s candidate-ranking comparator,
/// reused here to rank preference within the pseudo-Boolean sum rather than
/// to pick a single candidate outright.
///
/// Packages pulled in only transitively (not named in `requested_names`) get
/// no terms at all: letting their own "prefer newest" coefficient compete in
/// the same sum as a directly requested package's tied builds would let a
/// dependency's version preference silently override which of the
/// requested package's builds wins a tie — e.g. a numpy request whose two
/// tied builds pull in different python versions must not be decided by
/// which python happens to be newer. Among transitively-pulled packages,
/// selection is left entirely to the solver, which already breaks ties
/// lexicographically by filename during optimum enumeration.
///
/// When `preferred` names an already-installed filename for a scored
/// package present in `closure`, that build's level becomes the zero point
/// instead of the newest — the objective then penalizes moving away from
/// what's installed in either direction, so the solver only upgrades or
/// downgrades an installed package when something else requires it to.
pub fn build(
    cnf: &mut Cnf,
    closure: &HashMap<String, &Artifact>,
    preferred: &HashMap<String, String>,
    requested_features: &BTreeSet<String>,
    requested_names: &BTreeSet<&str>,
) -> (Vec<Term>, i64) {
    let mut by_name: HashMap<&str, Vec<&Artifact>> = HashMap::new();
    for artifact in closure.values() {
        if requested_names.contains(artifact.name()) {
            by_name.entry(artifact.name()).or_default().push(artifact);
        }
    }

    let mut terms = Vec::new();
    let mut max_bound = 0i64;

    let mut names: Vec<&str> = by_name.keys().copied().collect();
    names.sort_unstable();

    for name in names {
        let mut artifacts = by_name.remove(name).unwrap_or_default();
        artifacts.sort_by(|a, b| {
            let key_a = (a.version(), feature_match_count(a, requested_features), a.build_number());
            let key_b = (b.version(), feature_match_count(b, requested_features), b.build_number());
            key_b.cmp(&key_a)
        });

        let mut levels = Vec::with_capacity(artifacts.len());
        let mut level = 0i64;
        let mut last_key: Option<(&pkgsolve_types::VersionOrder, usize, i64)> = None;
        for artifact in &artifacts {
            let key = (artifact.version(), feature_match_count(artifact, requested_features), artifact.build_number());
            if let Some(prev) = last_key {
                if prev != key {
                    level += 1;
                }
            }
            last_key = Some(key);
            levels.push(level);
        }

        let zero_point = preferred
            .get(name)
            .and_then(|fname| artifacts.iter().position(|a| a.filename() == fname))
            .map(|idx| levels[idx])
            .unwrap_or(0);

        let mut worst = 0i64;
        for (artifact, level) in artifacts.iter().zip(levels) {
            let coeff = (level - zero_point).abs();
            worst = worst.max(coeff);
            if coeff > 0 {
                let var = cnf.var_for(artifact.filename());
                terms.push(Term { var, coeff });
            }
        }
        max_bound += worst;
    }

    (terms, max_bound)
}

//! The [`Resolver`]: the public entry point that owns the immutable
//! [`Index`] and the monotonic memoization caches of spec.md §5, and
//! orchestrates closure construction, CNF encoding, SAT solving, objective
//! bisection, and MUS diagnostics into the single [`Resolver::solve`] call.

use std::{
    cell::RefCell,
    collections::{BTreeSet, HashMap},
    rc::Rc,
};

use pkgsolve_types::{Artifact, Index, MatchSpec};

use crate::{
    closure, diagnostics,
    error::Error,
    sat::{cnf::Cnf, encode, objective, pbenc, solver},
};

/// The iteration cap on optimum enumeration (spec.md §4.G, §5
/// "Cancellation"). Exceeding it is handled internally by keeping the best
/// model found so far rather than surfacing [`Error::MaxIterations`].
const MAX_ENUMERATION_ITERATIONS: usize = 256;

/// Owns an [`Index`] plus the per-instance caches of spec.md §5
/// (`features`, `track_features`, `sum_matches`, `ms_depends`): monotonic
/// maps that are inserted into but never evicted or mutated, so no locking
/// is required for this crate's single-threaded, cooperative execution
/// model.
#[derive(Debug)]
pub struct Resolver<'idx> {
    index: &'idx Index,
    features_cache: RefCell<HashMap<String, BTreeSet<String>>>,
    track_features_cache: RefCell<HashMap<String, BTreeSet<String>>>,
    ms_depends_cache: RefCell<HashMap<String, Rc<Vec<MatchSpec>>>>,
    sum_matches_cache: RefCell<HashMap<String, usize>>,
}

impl<'idx> Resolver<'idx> {
    /// Builds a resolver borrowing `index` for its whole lifetime.
    pub fn new(index: &'idx Index) -> Self {
        Self {
            index,
            features_cache: RefCell::new(HashMap::new()),
            track_features_cache: RefCell::new(HashMap::new()),
            ms_depends_cache: RefCell::new(HashMap::new()),
            sum_matches_cache: RefCell::new(HashMap::new()),
        }
    }

    /// Returns the filenames of every artifact in the index matching `ms`,
    /// in sorted order.
    pub fn find_matches(&self, ms: &MatchSpec) -> Vec<String> {
        self.index.find_matches(ms).iter().map(|a| a.filename().to_string()).collect()
    }

    /// Returns every artifact matching `ms` (or, with `max_only`, only
    /// those tying for the newest `(version, build_number)`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Types`] wrapping [`pkgsolve_types::Error::NoPackagesFound`]
    /// if nothing matches.
    pub fn get_pkgs(&self, ms: &MatchSpec, max_only: bool) -> Result<Vec<&'idx Artifact>, Error> {
        Ok(self.index.get_pkgs(ms, max_only)?)
    }

    /// Returns the cached feature set of the artifact named `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`pkgsolve_types::Error::BadMetadata`] (wrapped) if no
    /// artifact with that filename is in the index.
    pub fn features(&self, filename: &str) -> Result<BTreeSet<String>, Error> {
        self.cached_feature_set(filename, &self.features_cache, Artifact::features)
    }

    /// Returns the cached track-features set of the artifact named
    /// `filename`.
    ///
    /// # Errors
    ///
    /// Returns [`pkgsolve_types::Error::BadMetadata`] (wrapped) if no
    /// artifact with that filename is in the index.
    pub fn track_features(&self, filename: &str) -> Result<BTreeSet<String>, Error> {
        self.cached_feature_set(filename, &self.track_features_cache, Artifact::track_features)
    }

    fn cached_feature_set(
        &self,
        filename: &str,
        cache: &RefCell<HashMap<String, BTreeSet<String>>>,
        extract: impl FnOnce(&Artifact) -> &BTreeSet<String>,
    ) -> Result<BTreeSet<String>, Error> {
        if let Some(cached) = cache.borrow().get(filename) {
            return Ok(cached.clone());
        }
        let artifact = self.index.get(filename).ok_or_else(|| {
            pkgsolve_types::Error::BadMetadata(filename.to_string(), "no such artifact in the index".to_string())
        })?;
        let value = extract(artifact).clone();
        cache.borrow_mut().insert(filename.to_string(), value.clone());
        Ok(value)
    }

    /// Returns the cached, parsed dependency [`MatchSpec`] list for the
    /// artifact named `filename` (spec.md §4.C `ms_depends`).
    ///
    /// # Errors
    ///
    /// Returns [`pkgsolve_types::Error::BadMetadata`] (wrapped) if no
    /// artifact with that filename is in the index, or
    /// [`pkgsolve_types::Error::MalformedSpec`] if one of its raw
    /// dependency strings doesn't parse.
    pub fn ms_depends(&self, filename: &str) -> Result<Rc<Vec<MatchSpec>>, Error> {
        if let Some(cached) = self.ms_depends_cache.borrow().get(filename) {
            return Ok(Rc::clone(cached));
        }
        let artifact = self.index.get(filename).ok_or_else(|| {
            pkgsolve_types::Error::BadMetadata(filename.to_string(), "no such artifact in the index".to_string())
        })?;
        let parsed: Vec<MatchSpec> =
            artifact.depends().iter().map(|raw| MatchSpec::new(raw)).collect::<Result<_, _>>()?;
        let parsed = Rc::new(parsed);
        self.ms_depends_cache.borrow_mut().insert(filename.to_string(), Rc::clone(&parsed));
        Ok(parsed)
    }

    /// Clears the `ms_depends` cache wholesale, as spec.md §5 requires for
    /// tests that mutate the backing index between calls.
    pub fn reset_ms_depends_cache(&self) {
        self.ms_depends_cache.borrow_mut().clear();
    }

    /// Returns the (cached) number of artifacts in the index matching `ms`.
    pub fn sum_matches(&self, ms: &MatchSpec) -> usize {
        let key = ms.to_string();
        if let Some(&count) = self.sum_matches_cache.borrow().get(&key) {
            return count;
        }
        let count = self.index.find_matches(ms).len();
        self.sum_matches_cache.borrow_mut().insert(key, count);
        count
    }

    /// Resolves `specs` against the index into a consistent set of
    /// filenames to install.
    ///
    /// `installed` maps package name to an already-installed filename; when
    /// a name appears in the closure, the objective (§4.F) treats that
    /// build as its zero point instead of the newest, so the solver only
    /// moves it when something else forces an upgrade or downgrade.
    /// `features` is the requested feature set (§4.E items 3–4, §2's
    /// secondary version-objective preference). `max_only` restricts the
    /// general-path closure to each package's newest `(version,
    /// build_number)`. `minimal_hint`, when `true`, skips optimum
    /// enumeration and returns the first model found at the minimal bound
    /// rather than searching for the lexicographically smallest one — a
    /// caller-controlled shortcut for when any optimal solution will do.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Types`] wrapping
    /// [`pkgsolve_types::Error::NoPackagesFound`] if some requirement has no
    /// candidate at all, or [`Error::Unsatisfiable`] with a pretty-printed
    /// diagnostic if the requirements are jointly unsatisfiable.
    pub fn solve(
        &self,
        specs: &[MatchSpec],
        installed: &HashMap<String, String>,
        features: &BTreeSet<String>,
        max_only: bool,
        minimal_hint: bool,
    ) -> Result<Vec<String>, Error> {
        for spec in specs {
            log::debug!("requirement {spec} matches {} candidates in the full index", self.sum_matches(spec));
        }

        if let Some(solution) = self.try_fast_path(specs, features)? {
            log::debug!("fast path (max_only candidates) found a unique model, skipping optimization");
            return Ok(solution);
        }

        self.solve_general(specs, installed, features, max_only, minimal_hint)
    }

    /// Attempts the fast path of spec.md §4.G: restrict the closure to each
    /// package's newest `(version, build_number)` and check whether the
    /// resulting SAT instance has a unique model. Returns `Ok(None)` to
    /// fall through to the general path on any failure (no candidates,
    /// UNSAT under the restriction, or a non-unique model) — all of which
    /// are expected outcomes, not errors, per §7 "Local recovery".
    fn try_fast_path(&self, specs: &[MatchSpec], features: &BTreeSet<String>) -> Result<Option<Vec<String>>, Error> {
        let closure = match closure::compute(self.index, specs, features, true) {
            Ok(closure) => closure,
            Err(pkgsolve_types::Error::NoPackagesFound(_)) => return Ok(None),
            Err(other) => return Err(other.into()),
        };

        let mut cnf = Cnf::new();
        let clauses = encode::encode(&mut cnf, &closure, specs, features);
        let Some(assignment) = solver::solve(cnf.num_vars(), &clauses) else {
            return Ok(None);
        };

        let positives: Vec<i32> = assignment.iter().filter(|&(_, &on)| on).map(|(&var, _)| var).collect();
        let mut blocked = clauses.clone();
        blocked.push(positives.iter().map(|&v| -v).collect());
        if solver::is_satisfiable(cnf.num_vars(), &blocked) {
            return Ok(None);
        }

        Ok(Some(model_to_filenames(&assignment, &cnf)))
    }

    /// The general path: full closure, base CNF, bisected pseudo-Boolean
    /// objective, and bounded optimum enumeration, falling back to
    /// diagnostics when the base instance is already unsatisfiable.
    fn solve_general(
        &self,
        specs: &[MatchSpec],
        installed: &HashMap<String, String>,
        features: &BTreeSet<String>,
        max_only: bool,
        minimal_hint: bool,
    ) -> Result<Vec<String>, Error> {
        let closure = closure::compute(self.index, specs, features, max_only)?;

        let mut cnf = Cnf::new();
        let base_clauses = encode::encode(&mut cnf, &closure, specs, features);
        log::debug!("base CNF: {} clauses over {} variables", base_clauses.len(), cnf.num_vars());

        if !solver::is_satisfiable(cnf.num_vars(), &base_clauses) {
            return Err(self.diagnose(&cnf, &base_clauses, specs, features));
        }

        let requested_names: BTreeSet<&str> = specs.iter().map(MatchSpec::name).collect();
        let (terms, max_bound) = objective::build(&mut cnf, &closure, installed, features, &requested_names);
        let optimum = bisect_optimum(&mut cnf, &base_clauses, &terms, max_bound);
        log::debug!("optimum objective value: {optimum} (bound {max_bound})");

        let extra = pbenc::encode_at_most(&mut cnf, &terms, optimum);
        let mut optimal_clauses = base_clauses;
        if let Some(extra_clauses) = extra {
            optimal_clauses.extend(extra_clauses);
        }

        let model = if minimal_hint {
            solver::solve(cnf.num_vars(), &optimal_clauses).expect("bisection established this bound is satisfiable")
        } else {
            enumerate_best(&cnf, &optimal_clauses)
        };

        Ok(model_to_filenames(&model, &cnf))
    }

    /// Builds an UNSAT diagnostic combining a clause-level MUS (pretty
    /// printed) with a spec-level MUS (which top-level requirements are
    /// jointly responsible), per spec.md §4.H.
    fn diagnose(&self, cnf: &Cnf, base_clauses: &[Vec<i32>], specs: &[MatchSpec], features: &BTreeSet<String>) -> Error {
        let clause_mus = diagnostics::clause_level_mus(cnf.num_vars(), base_clauses);
        let clause_report = diagnostics::pretty_print_mus(&clause_mus, cnf);

        let spec_mus = diagnostics::spec_level_mus(specs, |subset| self.spec_subset_satisfiable(subset, features));
        let spec_report = spec_mus.iter().map(MatchSpec::to_string).collect::<Vec<_>>().join(", ");

        Error::Unsatisfiable(format!(
            "no combination of artifacts satisfies every requirement\n{clause_report}\n\nconflicting requirements: {spec_report}"
        ))
    }

    /// Re-runs closure + encoding + satisfiability (not the full solve, and
    /// in particular not the objective) for a candidate subset of specs,
    /// as the satisfiability oracle `spec_level_mus` bisects over.
    fn spec_subset_satisfiable(&self, subset: &[MatchSpec], features: &BTreeSet<String>) -> bool {
        let closure = match closure::compute(self.index, subset, features, false) {
            Ok(closure) => closure,
            Err(_) => return false,
        };
        let mut cnf = Cnf::new();
        let clauses = encode::encode(&mut cnf, &closure, subset, features);
        solver::is_satisfiable(cnf.num_vars(), &clauses)
    }
}

/// Binary-searches the smallest `k` in `[0, max_bound]` for which
/// `base_clauses` conjoined with `objective <= k` is satisfiable.
fn bisect_optimum(cnf: &mut Cnf, base_clauses: &[Vec<i32>], terms: &[pbenc::Term], max_bound: i64) -> i64 {
    let mut lo = 0i64;
    let mut hi = max_bound;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let extra = pbenc::encode_at_most(cnf, terms, mid);
        let mut trial = base_clauses.to_vec();
        if let Some(extra_clauses) = extra {
            trial.extend(extra_clauses);
        }
        if solver::is_satisfiable(cnf.num_vars(), &trial) {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Enumerates satisfying assignments of `clauses` (already bounded to the
/// optimum), blocking each found model in turn, up to
/// [`MAX_ENUMERATION_ITERATIONS`]. Returns the lexicographically smallest
/// (by sorted filename list) among the models found; exceeding the cap is
/// handled by simply stopping early with the best model seen so far, per
/// spec.md §4.G and §7 (`MaxIterations` never surfaces).
fn enumerate_best(cnf: &Cnf, clauses: &[Vec<i32>]) -> solver::Assignment {
    let mut working = clauses.to_vec();
    let mut best: Option<(Vec<String>, solver::Assignment)> = None;

    for _ in 0..MAX_ENUMERATION_ITERATIONS {
        let Some(assignment) = solver::solve(cnf.num_vars(), &working) else { break };
        let filenames = model_to_filenames(&assignment, cnf);

        // Block only on artifact-backed variables: two models that agree on
        // every selected artifact but differ in some auxiliary
        // pseudo-Boolean register represent the same solution, and blocking
        // on those too would burn iterations of the cap without surfacing a
        // genuinely different candidate.
        let artifact_positives: Vec<i32> = assignment
            .iter()
            .filter(|&(_, &on)| on)
            .map(|(&var, _)| var)
            .filter(|&var| cnf.filename_for(var).is_some())
            .collect();
        working.push(artifact_positives.iter().map(|&v| -v).collect());

        let is_better = match &best {
            None => true,
            Some((best_filenames, _)) => filenames < *best_filenames,
        };
        if is_better {
            log::debug!("enumeration found a new lexicographically-smallest optimum: {filenames:?}");
            best = Some((filenames, assignment));
        }
    }

    best.expect("caller already established the clause set is satisfiable").1
}

fn model_to_filenames(assignment: &solver::Assignment, cnf: &Cnf) -> Vec<String> {
    let mut filenames: Vec<String> = assignment
        .iter()
        .filter(|&(_, &on)| on)
        .filter_map(|(&var, _)| cnf.filename_for(var))
        .map(str::to_string)
        .collect();
    filenames.sort();
    filenames
}

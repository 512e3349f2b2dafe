//! Minimal unsatisfiable subset (MUS) diagnostics and presentation (spec
//! §4.H): when no solution exists, identify and pretty-print the smallest
//! self-contained reason why.

use std::collections::{HashMap, HashSet};

use pkgsolve_types::MatchSpec;

use crate::sat::{cnf::Cnf, solver};

/// Deletion-based minimal unsatisfiable subset over a CNF clause set.
///
/// Removes each clause in turn and re-checks satisfiability; a removal is
/// kept if the remainder is still unsatisfiable, otherwise it's restored.
/// The result is minimal: no proper subset of it is unsatisfiable.
pub fn clause_level_mus(num_vars: usize, clauses: &[Vec<i32>]) -> Vec<Vec<i32>> {
    let mut current = clauses.to_vec();
    let mut i = 0;
    while i < current.len() {
        let mut candidate = current.clone();
        candidate.remove(i);
        if !solver::is_satisfiable(num_vars, &candidate) {
            current = candidate;
        } else {
            i += 1;
        }
    }
    current
}

/// Deletion-based minimal unsatisfiable subset over user requirements.
///
/// `is_satisfiable` re-runs the full resolution pipeline on a candidate
/// subset of `specs`; this mirrors [`clause_level_mus`] one level up, over
/// specs instead of clauses.
pub fn spec_level_mus(specs: &[MatchSpec], is_satisfiable: impl Fn(&[MatchSpec]) -> bool) -> Vec<MatchSpec> {
    let mut current = specs.to_vec();
    let mut i = 0;
    while i < current.len() {
        let mut candidate = current.clone();
        candidate.remove(i);
        if !is_satisfiable(&candidate) {
            current = candidate;
        } else {
            i += 1;
        }
    }
    current
}

fn label(var: i32, cnf: &Cnf) -> String {
    match cnf.filename_for(var) {
        Some(filename) => filename.strip_suffix(".tar.bz2").unwrap_or(filename).to_string(),
        None => format!("<aux {var}>"),
    }
}

/// Pretty-prints a single clause as a human-readable reason.
///
/// - A lone negative literal prints as the bare package name.
/// - One negative literal plus one or more positives prints as an
///   implication: `a => b or c`.
/// - Anything else (all-positive requirement clauses, and pairwise
///   mutual-exclusion clauses alike) prints as a disjunction of the
///   clause's labels: `a or b or c`.
pub fn pretty_print_clause(clause: &[i32], cnf: &Cnf) -> String {
    let negatives: Vec<i32> = clause.iter().copied().filter(|&l| l < 0).collect();
    let positives: Vec<i32> = clause.iter().copied().filter(|&l| l > 0).collect();

    if clause.len() == 1 && negatives.len() == 1 {
        return label(negatives[0].unsigned_abs() as i32, cnf);
    }

    if negatives.len() == 1 && !positives.is_empty() {
        let premise = label(negatives[0].unsigned_abs() as i32, cnf);
        let conclusion = positives.iter().map(|&v| label(v, cnf)).collect::<Vec<_>>().join(" or ");
        return format!("{premise} => {conclusion}");
    }

    clause.iter().map(|&v| label(v.unsigned_abs() as i32, cnf)).collect::<Vec<_>>().join(" or ")
}

/// Pretty-prints a full MUS, one reason per line.
pub fn pretty_print_mus(clauses: &[Vec<i32>], cnf: &Cnf) -> String {
    clauses.iter().map(|c| pretty_print_clause(c, cnf)).collect::<Vec<_>>().join("\n")
}

/// Topologically sorts `filenames` so each artifact's dependencies (as
/// reported by `deps_of`, restricted to `filenames`) precede it.
///
/// Filenames caught in a dependency cycle, or that `deps_of` otherwise
/// can't place, form the unsortable residue and are appended at the end in
/// their original relative order.
pub fn topo_sort(filenames: &[String], deps_of: impl Fn(&str) -> Vec<String>) -> Vec<String> {
    let present: HashSet<String> = filenames.iter().cloned().collect();
    let mut indegree: HashMap<String, usize> = filenames.iter().map(|f| (f.clone(), 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();

    for filename in filenames {
        for dep in deps_of(filename) {
            if present.contains(&dep) {
                *indegree.get_mut(filename).expect("filename is in its own index") += 1;
                dependents.entry(dep).or_default().push(filename.clone());
            }
        }
    }

    let mut ready: Vec<String> = filenames.iter().filter(|f| indegree[*f] == 0).cloned().collect();
    ready.sort();

    let mut order = Vec::new();
    let mut pending = ready;
    let mut cursor = 0;
    while cursor < pending.len() {
        let current = pending[cursor].clone();
        cursor += 1;
        order.push(current.clone());

        if let Some(waiting) = dependents.get(&current) {
            let mut freed = Vec::new();
            for dependent in waiting {
                let entry = indegree.get_mut(dependent).expect("dependent tracked in indegree map");
                *entry -= 1;
                if *entry == 0 {
                    freed.push(dependent.clone());
                }
            }
            freed.sort();
            pending.extend(freed);
        }
    }

    let sorted: HashSet<&String> = order.iter().collect();
    let mut residue: Vec<String> = filenames.iter().filter(|f| !sorted.contains(f)).cloned().collect();
    order.append(&mut residue);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clause_mus_drops_redundant_clauses() {
        // x1, not x1, and an unrelated satisfiable clause: the MUS is just the first two.
        let clauses = vec![vec![1], vec![-1], vec![2, -2]];
        let mus = clause_level_mus(2, &clauses);
        assert_eq!(mus, vec![vec![1], vec![-1]]);
    }

    #[test]
    fn pretty_prints_bare_negative_unit() {
        let mut cnf = Cnf::new();
        let v = cnf.var_for("python-2.7.5-0.tar.bz2");
        assert_eq!(pretty_print_clause(&[-v], &cnf), "python-2.7.5-0");
    }

    #[test]
    fn pretty_prints_implication() {
        let mut cnf = Cnf::new();
        let a = cnf.var_for("numpy-1.7.1-py27_0.tar.bz2");
        let b = cnf.var_for("python-2.7.5-0.tar.bz2");
        let c = cnf.var_for("python-2.7.6-0.tar.bz2");
        assert_eq!(
            pretty_print_clause(&[-a, b, c], &cnf),
            "numpy-1.7.1-py27_0 => python-2.7.5-0 or python-2.7.6-0"
        );
    }

    #[test]
    fn pretty_prints_disjunction() {
        let mut cnf = Cnf::new();
        let a = cnf.var_for("python-2.7.5-0.tar.bz2");
        let b = cnf.var_for("python-3.3.2-0.tar.bz2");
        assert_eq!(pretty_print_clause(&[a, b], &cnf), "python-2.7.5-0 or python-3.3.2-0");
    }

    #[test]
    fn pretty_prints_mutual_exclusion_as_disjunction() {
        let mut cnf = Cnf::new();
        let a = cnf.var_for("python-2.7.5-0.tar.bz2");
        let b = cnf.var_for("python-3.3.2-0.tar.bz2");
        assert_eq!(pretty_print_clause(&[-a, -b], &cnf), "python-2.7.5-0 or python-3.3.2-0");
    }

    #[test]
    fn topo_sort_orders_dependencies_first() {
        let filenames = vec!["numpy-1.7.1-py27_0.tar.bz2".to_string(), "python-2.7.5-0.tar.bz2".to_string()];
        let sorted = topo_sort(&filenames, |f| {
            if f == "numpy-1.7.1-py27_0.tar.bz2" {
                vec!["python-2.7.5-0.tar.bz2".to_string()]
            } else {
                vec![]
            }
        });
        assert_eq!(sorted, vec!["python-2.7.5-0.tar.bz2".to_string(), "numpy-1.7.1-py27_0.tar.bz2".to_string()]);
    }

    #[test]
    fn topo_sort_appends_cycles_as_residue() {
        let filenames = vec!["a.tar.bz2".to_string(), "b.tar.bz2".to_string()];
        let sorted = topo_sort(&filenames, |f| {
            if f == "a.tar.bz2" {
                vec!["b.tar.bz2".to_string()]
            } else {
                vec!["a.tar.bz2".to_string()]
            }
        });
        assert_eq!(sorted.len(), 2);
        assert!(sorted.contains(&"a.tar.bz2".to_string()));
        assert!(sorted.contains(&"b.tar.bz2".to_string()));
    }
}

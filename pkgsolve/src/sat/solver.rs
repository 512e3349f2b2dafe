//! A minimal SAT solver: unit propagation plus chronological backtracking
//! over decision literals (DPLL). No clause learning or non-chronological
//! backjumping — soundness and completeness don't require them, and the
//! instances this crate generates are small.

use std::collections::HashMap;

use super::cnf::{Clause, Literal};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Value {
    True,
    False,
    Unassigned,
}

/// A satisfying assignment: variable id → truth value.
pub type Assignment = HashMap<i32, bool>;

fn literal_value(lit: Literal, assignment: &[Value]) -> Value {
    match assignment[lit.unsigned_abs() as usize] {
        Value::Unassigned => Value::Unassigned,
        Value::True => {
            if lit > 0 {
                Value::True
            } else {
                Value::False
            }
        }
        Value::False => {
            if lit > 0 {
                Value::False
            } else {
                Value::True
            }
        }
    }
}

/// Propagates unit clauses to a fixpoint. Returns `false` on conflict.
fn propagate(clauses: &[Clause], assignment: &mut [Value]) -> bool {
    loop {
        let mut propagated = false;
        for clause in clauses {
            let mut satisfied = false;
            let mut unassigned_count = 0;
            let mut unit_lit = 0;
            for &lit in clause {
                match literal_value(lit, assignment) {
                    Value::True => {
                        satisfied = true;
                        break;
                    }
                    Value::Unassigned => {
                        unassigned_count += 1;
                        unit_lit = lit;
                    }
                    Value::False => {}
                }
            }
            if satisfied {
                continue;
            }
            if unassigned_count == 0 {
                return false;
            }
            if unassigned_count == 1 {
                assignment[unit_lit.unsigned_abs() as usize] =
                    if unit_lit > 0 { Value::True } else { Value::False };
                propagated = true;
            }
        }
        if !propagated {
            return true;
        }
    }
}

fn first_unresolved_clause<'a>(clauses: &'a [Clause], assignment: &[Value]) -> Option<&'a Clause> {
    clauses.iter().find(|clause| !clause.iter().any(|&lit| literal_value(lit, assignment) == Value::True))
}

fn dpll(clauses: &[Clause], assignment: &mut Vec<Value>) -> bool {
    if !propagate(clauses, assignment) {
        return false;
    }

    let Some(target) = first_unresolved_clause(clauses, assignment) else {
        return true;
    };

    // `target` is neither satisfied nor a conflict nor a unit clause (those
    // would have been resolved by propagation), so it has at least two
    // unassigned literals; pick the first as the decision variable.
    let decision = *target
        .iter()
        .find(|&&lit| literal_value(lit, assignment) == Value::Unassigned)
        .expect("unresolved, non-conflicting clause has an unassigned literal");
    let var = decision.unsigned_abs() as usize;

    let mut with_true = assignment.clone();
    with_true[var] = Value::True;
    if dpll(clauses, &mut with_true) {
        *assignment = with_true;
        return true;
    }

    assignment[var] = Value::False;
    dpll(clauses, assignment)
}

/// Returns a satisfying assignment for `clauses` over `num_vars` variables,
/// or `None` if unsatisfiable.
///
/// An empty clause set is trivially satisfiable; a clause set containing an
/// empty clause is trivially unsatisfiable.
pub fn solve(num_vars: usize, clauses: &[Clause]) -> Option<Assignment> {
    let mut assignment = vec![Value::Unassigned; num_vars + 1];
    if dpll(clauses, &mut assignment) {
        Some(
            (1..=num_vars)
                .map(|v| (v as i32, matches!(assignment[v], Value::True)))
                .collect(),
        )
    } else {
        None
    }
}

/// Returns whether `clauses` is satisfiable, without constructing a model.
pub fn is_satisfiable(num_vars: usize, clauses: &[Clause]) -> bool {
    solve(num_vars, clauses).is_some()
}

//! Pseudo-Boolean encoding: `Σ cᵢ·xᵢ ≤ k` reduced to CNF via a sequential
//! weighted counter (a generalization of Sinz's sequential cardinality
//! encoding to integer weights).
//!
//! For terms `(x_1, w_1), …, (x_n, w_n)` and bound `k`, auxiliary registers
//! `r[i][j]` (for `i` in `1..=n`, `j` in `1..=k+1`) mean "the weighted
//! partial sum of `x_1..x_i` is at least `j`". Only the direction needed for
//! soundness is encoded — *reaching* a partial sum forces the corresponding
//! register true — which is exactly enough to make `¬r[n][k+1]` forbid any
//! assignment whose true sum exceeds `k`.

use super::cnf::{Clause, Cnf};

/// One term of a pseudo-Boolean sum: a literal (artifact variable) and its
/// non-negative integer coefficient.
#[derive(Clone, Copy, Debug)]
pub struct Term {
    pub var: i32,
    pub coeff: i64,
}

/// Encodes `Σ terms ≤ bound` into `cnf`, returning the clauses to add.
///
/// Returns `None` if the constraint is trivially true (the bound is at
/// least the maximum attainable sum) — callers should simply omit it.
/// Returns `Some(vec![vec![]])` (an unsatisfiable empty clause) if `bound`
/// is negative, which should not occur given this crate's callers always
/// bisect within `[0, max_bound]`.
pub fn encode_at_most(cnf: &mut Cnf, terms: &[Term], bound: i64) -> Option<Vec<Clause>> {
    if bound < 0 {
        return Some(vec![vec![]]);
    }
    let max_sum: i64 = terms.iter().map(|t| t.coeff).sum();
    if bound >= max_sum {
        return None;
    }

    let k = bound;
    let levels = k + 1; // registers for j = 1..=k+1
    let mut clauses = Vec::new();

    // registers[i] holds the variable ids for r[i][1..=levels], i in 1..=n.
    let mut prev_registers: Vec<i32> = Vec::new();

    for term in terms {
        let mut registers = Vec::with_capacity(levels as usize);
        for j in 1..=levels {
            let reg = cnf.fresh_var();
            registers.push(reg);

            // r[i-1][j] -> r[i][j], i.e. the sum never decreases.
            if let Some(&prev) = prev_registers.get((j - 1) as usize) {
                clauses.push(vec![-prev, reg]);
            }

            // (x_i and r[i-1][j - w_i]) -> r[i][j].
            let remainder = j - term.coeff;
            if remainder <= 0 {
                // r[i-1][remainder] is trivially true: x_i alone reaches j.
                clauses.push(vec![-term.var, reg]);
            } else if let Some(&prev) = prev_registers.get((remainder - 1) as usize) {
                clauses.push(vec![-term.var, -prev, reg]);
            }
            // else: r[i-1][remainder] is trivially false (i-1 == 0 and
            // remainder >= 1), so this disjunct contributes nothing.
        }
        prev_registers = registers;
    }

    // Forbid reaching k+1: the sum must stay at or below k.
    if let Some(&overflow) = prev_registers.last() {
        clauses.push(vec![-overflow]);
    }

    Some(clauses)
}

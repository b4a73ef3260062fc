//! Constraint encoder: clue constraints and vertex-degree (loop-local)
//! constraints, emitted in deterministic row-major order.
use itertools::Itertools;

use crate::cnf::{Cnf, Literal, neg, pos};
use crate::error::InternalError;
use crate::grid::{GridModel, Point};
use crate::registry::VarId;

/// The four possible clue values a cell can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clue {
    Zero,
    One,
    Two,
    Three,
}

impl Clue {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(Clue::Zero),
            1 => Some(Clue::One),
            2 => Some(Clue::Two),
            3 => Some(Clue::Three),
            _ => None,
        }
    }
}

/// "Either 0 or 2 of `lits` are true", without any at-least-one clause.
/// Callers add that separately when the count should be pinned to exactly
/// 2 rather than left at 0-or-2.
///
/// *Forcing*: selecting any one literal forces at least one other.
/// *Triple-block*: no three of `lits` may be simultaneously true.
pub fn zero_or_two(lits: &[Literal], cnf: &mut Cnf) {
    for (i, &e) in lits.iter().enumerate() {
        let mut clause = vec![-e];
        clause.extend(lits.iter().enumerate().filter(|&(j, _)| j != i).map(|(_, &f)| f));
        cnf.add_clause(clause);
    }
    for combo in lits.iter().combinations(3) {
        cnf.add_clause(combo.into_iter().map(|&lit| -lit));
    }
}

fn at_most_one(lits: &[Literal], cnf: &mut Cnf) {
    for i in 0..lits.len() {
        for j in (i + 1)..lits.len() {
            cnf.add_clause([-lits[i], -lits[j]]);
        }
    }
}

/// At most one of `lits` may be false (the clue-3 "pairwise at-most-one-false"
/// clauses): for each pair, at least one must be true.
fn at_most_one_false(lits: &[Literal], cnf: &mut Cnf) {
    for i in 0..lits.len() {
        for j in (i + 1)..lits.len() {
            cnf.add_clause([lits[i], lits[j]]);
        }
    }
}

/// Emits the clue constraint for one cell's four bounding edges.
pub fn encode_clue(clue: Clue, edges: [VarId; 4], cnf: &mut Cnf) {
    let lits: Vec<Literal> = edges.iter().map(|&e| pos(e)).collect();
    match clue {
        Clue::Zero => {
            for &e in &edges {
                cnf.add_clause([neg(e)]);
            }
        }
        Clue::One => {
            cnf.add_clause(lits.clone());
            at_most_one(&lits, cnf);
        }
        Clue::Two => {
            cnf.add_clause(lits.clone());
            zero_or_two(&lits, cnf);
        }
        Clue::Three => {
            cnf.add_clause(lits.iter().map(|&e| -e));
            at_most_one_false(&lits, cnf);
        }
    }
}

/// Emits the loop-degree constraint for one lattice point.
fn encode_vertex(row: usize, col: usize, point: &Point, cnf: &mut Cnf) -> Result<(), InternalError> {
    let edges = point.incident_edges();
    match edges.len() {
        2 => {
            let e1 = pos(edges[0]);
            let e2 = pos(edges[1]);
            cnf.add_clause([-e1, e2]);
            cnf.add_clause([e1, -e2]);
        }
        3 | 4 => {
            let lits: Vec<Literal> = edges.iter().map(|&e| pos(e)).collect();
            zero_or_two(&lits, cnf);
        }
        count => {
            return Err(InternalError::BadPointDegree { row, col, count });
        }
    }
    Ok(())
}

/// Builds the baseline CNF: clue constraints in row-major cell order, then
/// vertex-degree constraints in row-major point order. No subtour
/// elimination here; that is added lazily by the CEGAR driver.
pub fn encode_baseline(grid: &GridModel) -> Result<Cnf, InternalError> {
    let mut cnf = Cnf::new(grid.num_vars());

    for cell in grid.cells_row_major() {
        if let Some(value) = cell.clue {
            let clue = Clue::from_value(value).ok_or(InternalError::BadPointDegree {
                row: cell.row,
                col: cell.col,
                count: value as usize,
            })?;
            encode_clue(clue, cell.edges(), &mut cnf);
        }
    }

    for (row, point_row) in grid.points.iter().enumerate() {
        for (col, point) in point_row.iter().enumerate() {
            encode_vertex(row, col, point, &mut cnf)?;
        }
    }

    Ok(cnf)
}

//! Solution pretty-printer: renders a solved grid as a glyph picture of
//! corner dots, loop edges, and clue digits.
use std::fmt;

use crate::grid::GridModel;
use crate::oracle::Assignment;

/// Borrows a grid and a satisfying assignment just long enough to render
/// them; produced by [`RenderedGrid::new`] and consumed via `Display`.
pub struct RenderedGrid<'a> {
    grid: &'a GridModel,
    assignment: &'a Assignment,
}

impl<'a> RenderedGrid<'a> {
    pub fn new(grid: &'a GridModel, assignment: &'a Assignment) -> Self {
        Self { grid, assignment }
    }

    fn is_true(&self, var: u32) -> bool {
        *self.assignment.get(&var).unwrap_or(&false)
    }
}

impl fmt::Display for RenderedGrid<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.grid;
        for i in 0..=grid.height {
            let mut upper = String::from("*");
            for j in 0..grid.width {
                upper.push(if self.is_true(grid.h_edges[i][j].id) { '─' } else { ' ' });
                upper.push('*');
            }
            writeln!(f, "{upper}")?;

            if i < grid.height {
                let mut line = String::new();
                for j in 0..=grid.width {
                    line.push(if self.is_true(grid.v_edges[i][j].id) { '│' } else { ' ' });
                    if j < grid.width {
                        let clue = grid.cells[i][j].clue;
                        line.push(clue.map_or(' ', |c| char::from_digit(c as u32, 10).unwrap()));
                    }
                }
                writeln!(f, "{line}")?;
            }
        }
        Ok(())
    }
}

//! CEGAR driver: baseline-solve, check for stray sub-loops, add one
//! blocking clause per stray component, and resolve, until a single loop
//! is found or the oracle reports UNSAT.
use crate::analyzer::{self, LoopShape};
use crate::cnf::neg;
use crate::encoder;
use crate::error::SolveError;
use crate::grid::GridModel;
use crate::oracle::{self, Assignment, CancelToken, OracleConfig, OracleOutcome, Stats};

/// Final disposition of a solve attempt.
#[derive(Debug)]
pub enum Outcome {
    Solved {
        assignment: Assignment,
        iterations: u32,
        stats: Option<Stats>,
    },
    Unsatisfiable {
        iterations: u32,
    },
    Cancelled,
}

/// Runs the build -> solve -> analyze -> refine loop to completion.
///
/// Each iteration invokes the external oracle once; a model containing more
/// than one disjoint loop component adds one blocking clause per stray
/// component, never a single clause spanning all of them, and tries again
/// on the same, monotonically growing, CNF.
pub fn solve_puzzle(
    grid: &GridModel,
    config: &OracleConfig,
    collect_stats: bool,
    cancel: &CancelToken,
) -> Result<Outcome, SolveError> {
    let mut cnf = encoder::encode_baseline(grid)?;
    let mut iterations = 0u32;

    loop {
        iterations += 1;
        if cancel.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        let outcome = oracle::solve(&cnf, config, collect_stats, cancel);
        let outcome = match outcome {
            Ok(o) => o,
            Err(oracle::OracleError::Cancelled) => return Ok(Outcome::Cancelled),
            Err(e) => return Err(SolveError::Oracle(e)),
        };

        match outcome {
            OracleOutcome::Unsatisfiable => return Ok(Outcome::Unsatisfiable { iterations }),
            OracleOutcome::Satisfiable { assignment, stats } => {
                match analyzer::analyze(grid, &assignment) {
                    LoopShape::SingleLoop | LoopShape::NoLoop => {
                        return Ok(Outcome::Solved {
                            assignment,
                            iterations,
                            stats,
                        });
                    }
                    LoopShape::MultipleComponents(components) => {
                        log::debug!("iteration {iterations}: {} stray components", components.len());
                        for component in &components {
                            add_blocking_clause(&mut cnf, &component.edges);
                        }
                    }
                }
            }
        }
    }
}

/// Forbids this exact set of in-loop edges from recurring verbatim: at least
/// one of the edges in this component must end up false next time.
fn add_blocking_clause(cnf: &mut crate::cnf::Cnf, edges: &[crate::registry::VarId]) {
    cnf.add_clause(edges.iter().map(|&e| neg(e)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VarId;
    use std::io::Write as _;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    fn stub_solver(dir: &tempfile::TempDir, script: &str) -> PathBuf {
        let path = dir.path().join("stub_solver.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{script}").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[test]
    fn unsatisfiable_oracle_response_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's UNSATISFIABLE\\n'");
        let instance = vec![vec![None; 2]; 2];
        let grid = GridModel::build(&instance).unwrap();
        let config = OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(std::time::Duration::from_secs(5)),
        };
        let outcome = solve_puzzle(&grid, &config, false, &CancelToken::new()).unwrap();
        assert!(matches!(outcome, Outcome::Unsatisfiable { iterations: 1 }));
    }

    #[test]
    fn single_loop_model_is_solved_in_one_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let instance = vec![vec![None; 1]; 1];
        let grid = GridModel::build(&instance).unwrap();
        // The unique single-cell perimeter: up,right,down,left edges.
        let perimeter = grid.cells[0][0].edges();
        let v: Vec<String> = (1..=grid.num_vars())
            .map(|id| {
                if perimeter.contains(&id) {
                    id.to_string()
                } else {
                    format!("-{id}")
                }
            })
            .collect();
        let script = format!("printf 's SATISFIABLE\\nv {} 0\\n'", v.join(" "));
        let solver = stub_solver(&dir, &script);
        let config = OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(std::time::Duration::from_secs(5)),
        };
        let outcome = solve_puzzle(&grid, &config, false, &CancelToken::new()).unwrap();
        assert!(matches!(outcome, Outcome::Solved { iterations: 1, .. }));
    }

    #[test]
    fn all_zero_clues_solve_to_the_empty_assignment() {
        // Every clue-0 unit clause pins its edges false, so the only model
        // the oracle can return is the all-false assignment. Zero in-loop
        // edges is zero components, which the driver must accept as solved
        // rather than treat as a stray shape to block and re-search.
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\nv 0\\n'");
        let instance = vec![vec![Some(0); 2]; 2];
        let grid = GridModel::build(&instance).unwrap();
        let config = OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(std::time::Duration::from_secs(5)),
        };
        let outcome = solve_puzzle(&grid, &config, false, &CancelToken::new()).unwrap();
        match outcome {
            Outcome::Solved { assignment, iterations, .. } => {
                assert_eq!(iterations, 1);
                assert!(assignment.values().all(|&v| !v));
            }
            other => panic!("expected Solved with empty assignment, got {other:?}"),
        }
    }

    #[test]
    fn cancellation_is_observed_before_first_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\n'");
        let instance = vec![vec![None; 2]; 2];
        let grid = GridModel::build(&instance).unwrap();
        let config = OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(std::time::Duration::from_secs(5)),
        };
        let cancel = CancelToken::new();
        cancel.cancel();
        let outcome = solve_puzzle(&grid, &config, false, &cancel).unwrap();
        assert!(matches!(outcome, Outcome::Cancelled));
    }

    #[test]
    fn two_disjoint_loops_are_refined_into_a_single_loop_solution() {
        // A 1x4 strip. The first model lights up two disjoint single-cell
        // perimeters (cells 0 and 3); the driver must add one blocking
        // clause per stray component and resolve. A marker file flips the
        // stub solver's canned answer from the second invocation onward, so
        // this exercises the CEGAR loop crossing a real iteration boundary.
        let dir = tempfile::tempdir().unwrap();
        let instance = vec![vec![None; 4]; 1];
        let grid = GridModel::build(&instance).unwrap();

        let two_loops: Vec<VarId> = {
            let mut edges = grid.cells[0][0].edges().to_vec();
            edges.extend(grid.cells[0][3].edges());
            edges
        };
        let single_loop: Vec<VarId> = {
            // Full strip perimeter: top row, right end, bottom row, left end.
            let mut edges: Vec<VarId> = grid.h_edges[0].iter().map(|e| e.id).collect();
            edges.push(grid.v_edges[0][4].id);
            edges.extend(grid.h_edges[1].iter().map(|e| e.id));
            edges.push(grid.v_edges[0][0].id);
            edges
        };
        let dimacs_vars = |lit_set: &[VarId]| -> String {
            (1..=grid.num_vars())
                .map(|id| {
                    if lit_set.contains(&id) {
                        id.to_string()
                    } else {
                        format!("-{id}")
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        };

        let marker = dir.path().join("seen");
        let script = format!(
            "if [ -e {marker:?} ]; then printf 's SATISFIABLE\\nv {} 0\\n'; else touch {marker:?}; printf 's SATISFIABLE\\nv {} 0\\n'; fi",
            dimacs_vars(&single_loop),
            dimacs_vars(&two_loops),
        );
        let solver = stub_solver(&dir, &script);
        let config = OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(std::time::Duration::from_secs(5)),
        };
        let outcome = solve_puzzle(&grid, &config, false, &CancelToken::new()).unwrap();
        match outcome {
            Outcome::Solved { iterations, .. } => assert_eq!(iterations, 2),
            other => panic!("expected Solved after refinement, got {other:?}"),
        }
    }
}

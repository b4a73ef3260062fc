//! SAT oracle adapter: serializes CNF to DIMACS, shells out to an external
//! SAT solver, and parses its model back into an [`Assignment`].
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::cnf::Cnf;
use crate::error::OracleError;
use crate::registry::VarId;

/// A mapping from variable id to Boolean. Absent ids are implicitly false.
pub type Assignment = HashMap<VarId, bool>;

/// How to invoke the external solver: a command accepting a path to a
/// DIMACS file and writing to stdout an outcome line.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub solver_path: PathBuf,
    pub extra_args: Vec<String>,
    pub timeout: Option<Duration>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            solver_path: PathBuf::from("glucose"),
            extra_args: vec!["-model".to_string()],
            timeout: None,
        }
    }
}

/// Accumulated `c`-line statistics, collected only when requested.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub comments: Vec<String>,
    pub cpu_time_seconds: Option<f64>,
}

#[derive(Debug)]
pub enum OracleOutcome {
    Satisfiable {
        assignment: Assignment,
        stats: Option<Stats>,
    },
    Unsatisfiable,
}

/// A cooperative cancellation flag shared between a caller and the driver.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Invokes the external SAT solver on `cnf` and parses its result.
///
/// The CNF is written to a [`tempfile::NamedTempFile`], which is deleted on
/// every exit path (success, error, or cancellation) once it goes out of
/// scope: scoped acquisition with guaranteed release.
pub fn solve(
    cnf: &Cnf,
    config: &OracleConfig,
    collect_stats: bool,
    cancel: &CancelToken,
) -> Result<OracleOutcome, OracleError> {
    if cancel.is_cancelled() {
        return Err(OracleError::Cancelled);
    }

    let mut tmp = tempfile::NamedTempFile::new().map_err(OracleError::WriteCnf)?;
    cnf.write_dimacs(&mut tmp).map_err(OracleError::WriteCnf)?;
    let path = tmp.path().to_path_buf();

    log::debug!(
        "invoking {:?} on {} vars / {} clauses",
        config.solver_path,
        cnf.num_vars(),
        cnf.num_clauses()
    );

    let mut child = Command::new(&config.solver_path)
        .args(&config.extra_args)
        .arg(&path)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| OracleError::Spawn {
            solver: config.solver_path.clone(),
            source,
        })?;

    // Read stdout on a background thread so a solver that emits a model
    // larger than the OS pipe buffer can't deadlock against us waiting on
    // `try_wait` below.
    let mut stdout = child.stdout.take().expect("stdout was piped");
    let reader = std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = stdout.read_to_string(&mut buf);
        buf
    });

    let start = Instant::now();
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(OracleError::Cancelled);
        }
        if let Some(timeout) = config.timeout {
            if start.elapsed() > timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OracleError::Timeout {
                    elapsed: start.elapsed(),
                });
            }
        }
        let status = child.try_wait().map_err(|source| OracleError::Spawn {
            solver: config.solver_path.clone(),
            source,
        })?;
        if let Some(status) = status {
            let text = reader.join().unwrap_or_default();
            drop(tmp); // cleans up the CNF temp file on this exit path too
            return parse_model(&text, status.to_string(), collect_stats);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

fn parse_cpu_time(after_prefix: &str) -> Option<f64> {
    let idx = after_prefix.find("CPU time")?;
    after_prefix[idx + "CPU time".len()..]
        .split(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-'))
        .find_map(|tok| tok.parse::<f64>().ok())
}

fn parse_model(text: &str, exit_status: String, collect_stats: bool) -> Result<OracleOutcome, OracleError> {
    let mut outcome: Option<bool> = None;
    let mut assignment = Assignment::new();
    let mut comments = Vec::new();
    let mut cpu_time_total = 0.0;
    let mut cpu_time_seen = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(rest) = line.strip_prefix('c') {
            comments.push(line.to_string());
            if let Some(v) = parse_cpu_time(rest) {
                cpu_time_total += v;
                cpu_time_seen = true;
            }
        } else if let Some(rest) = line.strip_prefix('s') {
            match rest.trim() {
                "SATISFIABLE" => outcome = Some(true),
                "UNSATISFIABLE" => outcome = Some(false),
                other => {
                    return Err(OracleError::UnknownOutcome {
                        outcome: other.to_string(),
                    });
                }
            }
        } else if let Some(rest) = line.strip_prefix('v') {
            for tok in rest.split_whitespace() {
                let n: isize = tok
                    .parse()
                    .map_err(|_| OracleError::UnparseableLiteral { token: tok.to_string() })?;
                if n == 0 {
                    continue;
                }
                assignment.insert(n.unsigned_abs() as VarId, n > 0);
            }
        }
    }

    match outcome {
        Some(true) => {
            let stats = collect_stats.then(|| Stats {
                comments,
                cpu_time_seconds: cpu_time_seen.then_some(cpu_time_total),
            });
            Ok(OracleOutcome::Satisfiable { assignment, stats })
        }
        Some(false) => Ok(OracleOutcome::Unsatisfiable),
        None => Err(OracleError::NoOutcomeLine { status: exit_status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::os::unix::fs::PermissionsExt;

    /// Writes a throwaway shell script that stands in for a DIMACS SAT
    /// solver: given canned stdout, it ignores its arguments entirely.
    fn stub_solver(dir: &tempfile::TempDir, script: &str) -> PathBuf {
        let path = dir.path().join("stub_solver.sh");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "#!/bin/sh\n{script}").unwrap();
        let mut perms = file.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn config_for(solver: PathBuf) -> OracleConfig {
        OracleConfig {
            solver_path: solver,
            extra_args: vec![],
            timeout: Some(Duration::from_secs(5)),
        }
    }

    #[test]
    fn parses_satisfiable_model() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\nv 1 -2 3 0\\n'");
        let cnf = Cnf::new(3);
        let outcome = solve(&cnf, &config_for(solver), false, &CancelToken::new()).unwrap();
        match outcome {
            OracleOutcome::Satisfiable { assignment, .. } => {
                assert_eq!(assignment.get(&1), Some(&true));
                assert_eq!(assignment.get(&2), Some(&false));
                assert_eq!(assignment.get(&3), Some(&true));
            }
            OracleOutcome::Unsatisfiable => panic!("expected SAT"),
        }
    }

    #[test]
    fn parses_unsatisfiable() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's UNSATISFIABLE\\n'");
        let cnf = Cnf::new(1);
        let outcome = solve(&cnf, &config_for(solver), false, &CancelToken::new()).unwrap();
        assert!(matches!(outcome, OracleOutcome::Unsatisfiable));
    }

    #[test]
    fn missing_outcome_line_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 'nothing useful\\n'");
        let cnf = Cnf::new(1);
        let err = solve(&cnf, &config_for(solver), false, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, OracleError::NoOutcomeLine { .. }));
    }

    #[test]
    fn multiple_v_lines_are_concatenated() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\nv 1 2\\nv 0\\n'");
        let cnf = Cnf::new(2);
        let outcome = solve(&cnf, &config_for(solver), false, &CancelToken::new()).unwrap();
        match outcome {
            OracleOutcome::Satisfiable { assignment, .. } => {
                assert_eq!(assignment.get(&1), Some(&true));
                assert_eq!(assignment.get(&2), Some(&true));
            }
            OracleOutcome::Unsatisfiable => panic!("expected SAT"),
        }
    }

    #[test]
    fn cancellation_before_spawn_is_rejected_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\n'");
        let cnf = Cnf::new(1);
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = solve(&cnf, &config_for(solver), false, &cancel).unwrap_err();
        assert!(matches!(err, OracleError::Cancelled));
    }

    #[test]
    fn stats_collected_only_when_requested() {
        let dir = tempfile::tempdir().unwrap();
        let solver = stub_solver(&dir, "printf 's SATISFIABLE\\nc CPU time: 1.5\\nc CPU time: 0.5\\n'");
        let cnf = Cnf::new(1);
        let outcome = solve(&cnf, &config_for(solver), true, &CancelToken::new()).unwrap();
        match outcome {
            OracleOutcome::Satisfiable { stats, .. } => {
                let stats = stats.unwrap();
                assert_eq!(stats.cpu_time_seconds, Some(2.0));
            }
            OracleOutcome::Unsatisfiable => panic!("expected SAT"),
        }
    }
}

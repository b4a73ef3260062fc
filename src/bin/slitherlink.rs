use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use slitherlink_sat::driver::{self, Outcome};
use slitherlink_sat::encoder;
use slitherlink_sat::grid::GridModel;
use slitherlink_sat::instance;
use slitherlink_sat::oracle::{CancelToken, OracleConfig};
use slitherlink_sat::render::RenderedGrid;

#[derive(Parser)]
#[command(author, version, about = "Slitherlink solver over an external SAT oracle")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to the instance file. Reads from stdin if omitted.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// The SAT solver binary to invoke (default: glucose).
    #[arg(short, long, default_value = "glucose")]
    solver: String,

    /// Extra argument to pass to the solver. May be repeated.
    #[arg(long = "solver-arg")]
    solver_args: Vec<String>,

    /// Per-iteration solver timeout in seconds. No limit if omitted.
    #[arg(long)]
    timeout: Option<u64>,

    /// Print the baseline DIMACS CNF to stdout instead of solving.
    #[arg(long)]
    print_cnf: bool,

    /// Report iteration count and solver CPU time alongside the solution.
    #[arg(long)]
    collect_stats: bool,
}

fn main() -> Result<ExitCode> {
    env_logger::init();
    let cli = Cli::parse();

    let instance = match &cli.input {
        Some(path) => instance::from_file(path).context("failed to read instance")?,
        None => {
            use std::io::Read;
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read instance from stdin")?;
            instance::from_text(&text).context("failed to parse instance")?
        }
    };

    let grid = GridModel::build(&instance).context("failed to build grid")?;

    if cli.print_cnf {
        let cnf = encoder::encode_baseline(&grid).context("failed to encode baseline CNF")?;
        print!("{}", cnf.to_dimacs_string());
        return Ok(ExitCode::SUCCESS);
    }

    let config = OracleConfig {
        solver_path: PathBuf::from(&cli.solver),
        extra_args: cli.solver_args.clone(),
        timeout: cli.timeout.map(Duration::from_secs),
    };

    let cancel = CancelToken::new();
    match driver::solve_puzzle(&grid, &config, cli.collect_stats, &cancel)? {
        Outcome::Solved {
            assignment,
            iterations,
            stats,
        } => {
            println!("{}", RenderedGrid::new(&grid, &assignment));
            if cli.collect_stats {
                println!("iterations: {iterations}");
                if let Some(stats) = stats {
                    if let Some(cpu) = stats.cpu_time_seconds {
                        println!("solver cpu time: {cpu:.3}s");
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Unsatisfiable { iterations } => {
            eprintln!("no solution exists (after {iterations} iteration(s))");
            Ok(ExitCode::from(1))
        }
        Outcome::Cancelled => {
            eprintln!("solve was cancelled");
            Ok(ExitCode::from(2))
        }
    }
}

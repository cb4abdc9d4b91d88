//! Command-line surface.
//!
//! The argument structs derive `clap` parsers; the `cmd_*` functions do
//! the work and return values instead of printing or exiting, so tests
//! can drive them directly.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::error::Result;
use crate::input::Workbook;
use crate::policy::Policy;
use crate::report::{stamp_now, ReportWriter};
use crate::solver::{Problem, SolveStatus, Solver, SolverConfig};
use crate::validation::{validate_workbook, ValidationError};

/// Weekly course timetabling.
#[derive(Debug, Parser)]
#[command(name = "u-timetable", version)]
#[command(about = "Build a weekly course timetable from a scheduling workbook")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve a workbook and write the report files
    Solve(SolveArgs),
    /// Check a workbook and policy without solving
    Validate(InputArgs),
    /// Print the default policy as TOML
    Policy,
}

/// Workbook and policy locations.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Scheduling workbook (JSON)
    #[arg(short, long, env = "U_TIMETABLE_INPUT")]
    pub input: PathBuf,

    /// Policy file (TOML); built-in defaults when omitted
    #[arg(short, long, env = "U_TIMETABLE_POLICY")]
    pub policy: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SolveArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Directory for report files
    #[arg(short, long, env = "U_TIMETABLE_OUT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Search time limit in seconds
    #[arg(long, env = "U_TIMETABLE_TIME_LIMIT", default_value_t = 600)]
    pub time_limit: u64,

    /// Stop annealing after this many iterations
    #[arg(long, env = "U_TIMETABLE_MAX_ITERATIONS")]
    pub max_iterations: Option<u64>,

    /// Random seed
    #[arg(long, env = "U_TIMETABLE_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Also write the complete penalty analysis
    #[arg(long)]
    pub full_penalty_report: bool,
}

impl SolveArgs {
    /// Solve arguments with defaults for everything but the paths.
    pub fn new(input: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            input: InputArgs {
                input: input.into(),
                policy: None,
            },
            out_dir: out_dir.into(),
            time_limit: 600,
            max_iterations: None,
            seed: 42,
            full_penalty_report: false,
        }
    }

    pub fn with_policy(mut self, policy: impl Into<PathBuf>) -> Self {
        self.input.policy = Some(policy.into());
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_full_penalty_report(mut self) -> Self {
        self.full_penalty_report = true;
        self
    }

    fn solver_config(&self) -> SolverConfig {
        let config = SolverConfig::default()
            .with_time_limit(Duration::from_secs(self.time_limit))
            .with_seed(self.seed);
        match self.max_iterations {
            Some(n) => config.with_max_iterations(n),
            None => config,
        }
    }
}

/// What a solve run produced.
#[derive(Debug, Clone)]
pub struct SolveSummary {
    pub status: SolveStatus,
    pub hard_excess: u32,
    pub objective: i64,
    pub sections: usize,
    pub files: Vec<PathBuf>,
}

fn load_policy(path: Option<&Path>) -> Result<Policy> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading policy");
            Policy::load(path)
        }
        None => Ok(Policy::default()),
    }
}

/// Loads, validates, solves, and writes every report.
pub fn cmd_solve(args: &SolveArgs) -> Result<SolveSummary> {
    let policy = load_policy(args.input.policy.as_deref())?;
    info!(path = %args.input.input.display(), "loading workbook");
    let workbook = Workbook::load(&args.input.input)?;
    let instance = workbook.into_instance(&policy)?;
    info!(
        sections = instance.sections.len(),
        instructors = instance.instructors.len(),
        meetings = instance.total_meetings(),
        "instance ready"
    );

    let problem = Problem::build(&instance, &policy)?;
    let outcome = Solver::new().solve(&problem, &args.solver_config());
    info!(
        status = %outcome.status,
        objective = outcome.schedule.objective,
        hard_excess = outcome.evaluation.hard_excess,
        iterations = outcome.iterations,
        "search finished"
    );

    let files = ReportWriter::new(&args.out_dir, stamp_now())
        .with_full_penalty_report(args.full_penalty_report)
        .write_all(&problem, &outcome)?;

    Ok(SolveSummary {
        status: outcome.status,
        hard_excess: outcome.evaluation.hard_excess,
        objective: outcome.schedule.objective,
        sections: problem.section_count(),
        files,
    })
}

/// Returns every validation issue; empty when the input is usable.
pub fn cmd_validate(args: &InputArgs) -> Result<Vec<ValidationError>> {
    let policy = load_policy(args.policy.as_deref())?;
    let workbook = Workbook::load(&args.input)?;
    Ok(validate_workbook(&workbook, &policy).err().unwrap_or_default())
}

/// The default policy rendered as TOML.
pub fn cmd_policy() -> Result<String> {
    Policy::default().to_toml_string()
}

/// Runs a parsed command line. Exit code 0 for success, 2 when the
/// timetable is infeasible or the input is invalid.
pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Solve(args) => {
            let summary = cmd_solve(&args)?;
            println!(
                "{}: {} sections, objective {}, hard excess {}",
                summary.status, summary.sections, summary.objective, summary.hard_excess
            );
            for file in &summary.files {
                println!("  {}", file.display());
            }
            if summary.status.is_feasible() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
        Command::Validate(args) => {
            let errors = cmd_validate(&args)?;
            if errors.is_empty() {
                println!("OK: {}", args.input.display());
                return Ok(ExitCode::SUCCESS);
            }
            warn!(count = errors.len(), "validation failed");
            for error in &errors {
                println!("{error}");
            }
            Ok(ExitCode::from(2))
        }
        Command::Policy => {
            print!("{}", cmd_policy()?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_solve() {
        let cli = Cli::try_parse_from([
            "u-timetable",
            "solve",
            "--input",
            "w.json",
            "--out-dir",
            "out",
            "--max-iterations",
            "500",
            "--full-penalty-report",
        ])
        .unwrap();
        let Command::Solve(args) = cli.command else {
            panic!("expected solve");
        };
        assert_eq!(args.input.input, PathBuf::from("w.json"));
        assert_eq!(args.out_dir, PathBuf::from("out"));
        assert_eq!(args.max_iterations, Some(500));
        assert!(args.full_penalty_report);
        assert_eq!(args.time_limit, 600);

        let config = args.solver_config();
        assert_eq!(config.max_iterations, Some(500));
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn test_parse_validate_and_policy() {
        let cli = Cli::try_parse_from(["u-timetable", "validate", "-i", "w.json", "-p", "p.toml"])
            .unwrap();
        assert!(matches!(cli.command, Command::Validate(ref a) if a.policy.is_some()));

        let cli = Cli::try_parse_from(["u-timetable", "policy"]).unwrap();
        assert!(matches!(cli.command, Command::Policy));
    }

    #[test]
    fn test_policy_round_trips() {
        let text = cmd_policy().unwrap();
        let policy = Policy::from_toml_str(&text).unwrap();
        assert_eq!(policy, Policy::default());
    }

    #[test]
    fn test_missing_input() {
        let args = InputArgs {
            input: PathBuf::from("/nonexistent/workbook.json"),
            policy: None,
        };
        assert!(cmd_validate(&args).is_err());
    }
}

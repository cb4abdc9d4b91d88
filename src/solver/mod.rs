//! Construct-then-anneal timetabling search.
//!
//! # Algorithm
//!
//! 1. [`Problem::build`] compiles sections into admissible placements.
//! 2. [`GreedyScheduler`] places sections in dispatching-rule order.
//! 3. [`Annealer`] reassigns sections until the clock or iteration cap
//!    runs out, keeping the best state seen.
//! 4. The best state is recounted from scratch into a [`Schedule`].
//!
//! Hard rules are soft-penalised during search. The weight per unit of
//! hard excess is at least one more than [`Problem::point_swing`], so a
//! drop in hard excess outweighs any change in preference points.

mod anneal;
mod config;
mod evaluate;
mod greedy;
mod problem;
mod state;

pub use anneal::{AnnealResult, Annealer};
pub use config::SolverConfig;
pub use evaluate::{evaluate, Evaluation};
pub use greedy::GreedyScheduler;
pub use problem::{BlockPair, Candidate, Offering, Problem, SectionVars};
pub use state::State;

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::Schedule;

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// No hard excess and the search ran to its iteration cap.
    Feasible,
    /// No hard excess; the clock stopped the search.
    TimeLimit,
    /// Hard excess remains in the best state found.
    Infeasible,
}

impl SolveStatus {
    pub fn is_feasible(&self) -> bool {
        !matches!(self, Self::Infeasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Feasible => "FEASIBLE",
            Self::TimeLimit => "TIME_LIMIT",
            Self::Infeasible => "INFEASIBLE",
        };
        f.write_str(label)
    }
}

/// Result of [`Solver::solve`].
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Candidate index per section.
    pub choice: Vec<usize>,
    pub schedule: Schedule,
    pub status: SolveStatus,
    pub evaluation: Evaluation,
    pub iterations: u64,
    pub elapsed: Duration,
}

/// Search facade.
#[derive(Debug, Clone, Default)]
pub struct Solver {
    greedy: GreedyScheduler,
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the constructor (e.g. with a different rule engine).
    pub fn with_greedy(mut self, greedy: GreedyScheduler) -> Self {
        self.greedy = greedy;
        self
    }

    /// Runs the full search.
    pub fn solve(&self, problem: &Problem, config: &SolverConfig) -> SolveOutcome {
        let started = Instant::now();
        let initial = self.greedy.construct(problem);
        info!(
            sections = problem.section_count(),
            hard = initial.hard(),
            points = initial.points(),
            "initial timetable built"
        );

        let result = Annealer::new(config.clone()).run(initial, started);
        let choice = result.state.choice();
        let evaluation = evaluate(problem, &choice);
        let schedule = problem.schedule(&choice);

        let status = if !evaluation.is_feasible() {
            warn!(
                hard_excess = evaluation.hard_excess,
                violations = evaluation.violations.len(),
                "no feasible timetable found"
            );
            SolveStatus::Infeasible
        } else if result.timed_out {
            SolveStatus::TimeLimit
        } else {
            SolveStatus::Feasible
        };

        SolveOutcome {
            choice,
            schedule,
            status,
            evaluation,
            iterations: result.iterations,
            elapsed: started.elapsed(),
        }
    }
}

//! Simulated annealing over candidate choices.
//!
//! # Algorithm
//!
//! A move reassigns one random section to a different random candidate.
//! Moves are accepted by the Metropolis criterion on
//! `energy = hard × hard_weight − points`. The hard weight is raised above
//! [`Problem::point_swing`] when the configured one is smaller, so one unit
//! of hard excess costs more than any preference gain. The temperature decays
//! geometrically; once it falls below the floor the search restarts from
//! the best state at the initial temperature.
//!
//! # Reference
//! Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{Problem, SolverConfig, State};

const CLOCK_CHECK_MASK: u64 = 0xFF;

/// Outcome of an annealing run.
#[derive(Debug)]
pub struct AnnealResult<'a> {
    /// Best state found.
    pub state: State<'a>,
    pub iterations: u64,
    pub accepted: u64,
    pub reheats: u32,
    /// Whether the clock stopped the search.
    pub timed_out: bool,
}

/// Simulated annealing improver.
#[derive(Debug, Clone)]
pub struct Annealer {
    config: SolverConfig,
}

impl Annealer {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// Energy per unit of hard excess on `problem`: the configured weight,
    /// or one more than the problem's point swing if that is larger.
    pub fn hard_weight_for(&self, problem: &Problem) -> i64 {
        self.config
            .hard_weight
            .max(problem.point_swing().saturating_add(1))
    }

    /// Improves a complete state until the time limit or iteration cap.
    ///
    /// `started` is when the overall search began; the time limit counts
    /// from there.
    pub fn run<'a>(&self, mut state: State<'a>, started: Instant) -> AnnealResult<'a> {
        let config = &self.config;
        let problem = state.problem();
        let movable: Vec<usize> = (0..problem.section_count())
            .filter(|&s| problem.candidates(s).len() > 1)
            .collect();

        let mut best_choice = state.choice();
        let mut best_key = (state.hard(), -state.points());
        let mut result = AnnealResult {
            state: State::new(problem),
            iterations: 0,
            accepted: 0,
            reheats: 0,
            timed_out: false,
        };

        if movable.is_empty() || config.max_iterations == Some(0) {
            result.state = state;
            return result;
        }

        let hard_weight = self.hard_weight_for(problem);
        if hard_weight != config.hard_weight {
            debug!(
                configured = config.hard_weight,
                hard_weight, "hard weight raised above point swing"
            );
        }
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let mut temperature = config.initial_temperature;
        let deadline = config.time_limit;

        loop {
            if config.max_iterations.is_some_and(|cap| result.iterations >= cap) {
                break;
            }
            if result.iterations & CLOCK_CHECK_MASK == 0 && started.elapsed() >= deadline {
                result.timed_out = true;
                break;
            }
            result.iterations += 1;

            let section = movable[rng.random_range(0..movable.len())];
            let count = problem.candidates(section).len();
            let current = state.current(section).unwrap_or(0);
            let mut candidate = rng.random_range(0..count - 1);
            if candidate >= current {
                candidate += 1;
            }

            let (hard_delta, points_delta) = state.delta(section, candidate);
            let energy_delta = hard_delta.saturating_mul(hard_weight) - points_delta;
            let accept = energy_delta <= 0
                || rng.random::<f64>() < (-(energy_delta as f64) / temperature).exp();
            if accept {
                state.place(section, candidate);
                result.accepted += 1;
                let key = (state.hard(), -state.points());
                if key < best_key {
                    best_key = key;
                    best_choice = state.choice();
                }
            }

            temperature *= config.cooling_rate;
            if temperature < config.min_temperature {
                temperature = config.initial_temperature;
                result.reheats += 1;
                restore(&mut state, &best_choice);
                debug!(reheats = result.reheats, "reheating from best state");
            }

            if result.iterations.checked_rem(config.log_every) == Some(0) {
                debug!(
                    iteration = result.iterations,
                    temperature,
                    hard = state.hard(),
                    points = state.points(),
                    best_hard = best_key.0,
                    best_points = -best_key.1,
                    "annealing progress"
                );
            }
        }

        restore(&mut state, &best_choice);
        info!(
            iterations = result.iterations,
            accepted = result.accepted,
            hard = state.hard(),
            points = state.points(),
            elapsed = ?round_millis(started.elapsed()),
            "annealing finished"
        );
        result.state = state;
        result
    }
}

fn restore(state: &mut State<'_>, choice: &[usize]) {
    for (section, &candidate) in choice.iter().enumerate() {
        if state.current(section) != Some(candidate) {
            state.place(section, candidate);
        }
    }
}

fn round_millis(elapsed: Duration) -> Duration {
    Duration::from_millis(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}

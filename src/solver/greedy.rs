//! Priority-driven greedy construction.
//!
//! # Algorithm
//!
//! 1. Order sections with a dispatching rule engine.
//! 2. For each section, try every admissible candidate against the
//!    partial state.
//! 3. Keep the candidate adding the least hard excess, then the most
//!    points, then the lowest index.
//!
//! # Complexity
//! O(n * c * k) where n=sections, c=candidates/section, k=cells touched
//! per placement.
//!
//! # Reference
//! Carter & Laporte (1996), "Recent Developments in Practical Course
//! Timetabling": sequential construction heuristics

use tracing::debug;

use crate::dispatching::{RuleEngine, SchedulingContext};

use super::{Problem, State};

/// Greedy constructor producing a complete state.
///
/// # Example
///
/// ```
/// use u_timetable::input::Instance;
/// use u_timetable::models::{Instructor, Section};
/// use u_timetable::policy::Policy;
/// use u_timetable::solver::{GreedyScheduler, Problem};
///
/// let instance = Instance {
///     sections: vec![Section::new("CS100", "Ada", "ada@uni.edu", 1)],
///     instructors: vec![Instructor::new("Ada", "ada@uni.edu")],
/// };
/// let problem = Problem::build(&instance, &Policy::default()).unwrap();
/// let state = GreedyScheduler::new().construct(&problem);
/// assert!(state.is_complete());
/// assert_eq!(state.hard(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct GreedyScheduler {
    rule_engine: RuleEngine,
}

impl GreedyScheduler {
    /// Creates a constructor using [`RuleEngine::timetabling`] ordering.
    pub fn new() -> Self {
        Self {
            rule_engine: RuleEngine::timetabling(),
        }
    }

    /// Sets the rule engine used for section ordering.
    pub fn with_rule_engine(mut self, engine: RuleEngine) -> Self {
        self.rule_engine = engine;
        self
    }

    /// Section indices in placement order.
    pub fn order(&self, problem: &Problem) -> Vec<usize> {
        let context = SchedulingContext::from_problem(problem);
        self.rule_engine.sort_indices(&problem.sections, &context)
    }

    /// Places every section.
    pub fn construct<'a>(&self, problem: &'a Problem) -> State<'a> {
        let mut state = State::new(problem);
        for section in self.order(problem) {
            let best = best_candidate(&mut state, section);
            state.place(section, best);
        }
        debug!(
            hard = state.hard(),
            points = state.points(),
            "greedy construction finished"
        );
        state
    }
}

impl Default for GreedyScheduler {
    fn default() -> Self {
        Self::new()
    }
}

fn best_candidate(state: &mut State<'_>, section: usize) -> usize {
    let count = state.problem().candidates(section).len();
    let mut best = 0;
    let mut best_delta = (i64::MAX, i64::MIN);
    for candidate in 0..count {
        let (hard, points) = state.delta(section, candidate);
        if hard < best_delta.0 || (hard == best_delta.0 && points > best_delta.1) {
            best = candidate;
            best_delta = (hard, points);
        }
    }
    best
}

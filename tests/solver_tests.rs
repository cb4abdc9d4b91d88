//! Solver invariants over the sample workbook.

use std::collections::HashSet;
use std::path::PathBuf;

use proptest::prelude::*;

use u_timetable::input::Workbook;
use u_timetable::policy::Policy;
use u_timetable::solver::{evaluate, Problem, Solver, SolverConfig, State};

fn sample_problem() -> Problem {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/sample_workbook.json");
    let policy = Policy::default();
    let instance = Workbook::load(path)
        .unwrap()
        .into_instance(&policy)
        .unwrap();
    Problem::build(&instance, &policy).unwrap()
}

/// Maps raw picks onto valid candidate indices.
fn to_choice(problem: &Problem, picks: &[usize]) -> Vec<usize> {
    (0..problem.section_count())
        .map(|s| picks[s % picks.len()] % problem.candidates(s).len())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_incremental_totals_match_recount(picks in prop::collection::vec(0usize..10_000, 1..40)) {
        let problem = sample_problem();
        let choice = to_choice(&problem, &picks);
        let state = State::from_choice(&problem, &choice);
        let eval = evaluate(&problem, &choice);

        prop_assert_eq!(state.hard(), eval.hard_excess);
        prop_assert_eq!(state.points(), eval.points);
        let total: u32 = state.violations().iter().map(|v| v.excess).sum();
        prop_assert_eq!(total, state.hard());
    }

    #[test]
    fn prop_unplace_and_replace_restores_totals(
        picks in prop::collection::vec(0usize..10_000, 1..40),
        section in 0usize..1_000,
        other in 0usize..10_000,
    ) {
        let problem = sample_problem();
        let choice = to_choice(&problem, &picks);
        let mut state = State::from_choice(&problem, &choice);
        let (hard, points) = (state.hard(), state.points());

        let s = section % problem.section_count();
        let c = other % problem.candidates(s).len();
        let (dh, dp) = state.delta(s, c);
        prop_assert_eq!((state.hard(), state.points()), (hard, points));

        state.place(s, c);
        prop_assert_eq!(i64::from(state.hard()), i64::from(hard) + dh);
        prop_assert_eq!(state.points(), points + dp);

        state.unplace(s);
        prop_assert!(!state.is_complete());
        state.place(s, choice[s]);
        prop_assert_eq!((state.hard(), state.points()), (hard, points));
    }
}

#[test]
fn test_sample_solves_without_conflicts() {
    let problem = sample_problem();
    let config = SolverConfig::default().with_max_iterations(20_000);
    let outcome = Solver::new().solve(&problem, &config);

    assert!(outcome.status.is_feasible());
    assert!(outcome.schedule.is_valid());
    assert_eq!(outcome.schedule.assignment_count(), problem.total_meetings);

    for section in &problem.sections {
        let meetings = outcome.schedule.assignments_for_section(&section.id);
        assert_eq!(meetings.len(), usize::from(section.meetings));
        let periods: HashSet<_> = meetings.iter().map(|a| a.period).collect();
        assert_eq!(periods.len(), meetings.len(), "{} repeats a period", section.id);
    }

    let mut seen = HashSet::new();
    for a in &outcome.schedule.assignments {
        assert!(
            seen.insert((a.instructor.clone(), a.period)),
            "{} double-booked at {}",
            a.instructor,
            a.period
        );
    }
}

#[test]
fn test_blocked_periods_are_never_used() {
    let problem = sample_problem();
    let outcome = Solver::new().solve(&problem, &SolverConfig::default().with_max_iterations(2_000));
    let bo = problem
        .instructors
        .iter()
        .find(|i| i.name == "Bo Chen")
        .unwrap();
    assert!(!bo.blocked.is_empty());
    for a in outcome.schedule.assignments_for_instructor("Bo Chen") {
        assert!(!bo.blocked.contains(&a.period));
    }
}

#[test]
fn test_same_seed_same_timetable() {
    let problem = sample_problem();
    let config = SolverConfig::default()
        .with_max_iterations(3_000)
        .with_seed(7);
    let a = Solver::new().solve(&problem, &config);
    let b = Solver::new().solve(&problem, &config);
    assert_eq!(a.choice, b.choice);
    assert_eq!(a.schedule.objective, b.schedule.objective);
}

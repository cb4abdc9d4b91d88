//! From-scratch evaluation of a complete assignment.
//!
//! Recounts every hard rule and the soft objective directly from the
//! placements, independent of the incremental [`State`](super::State).
//! Used to explain a final schedule and to check the incremental
//! bookkeeping.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Day, HardConstraint, Period, Slot, Violation, SLOTS_PER_DAY};

use super::Problem;

/// Hard excess, soft points, and the itemised violations of an assignment.
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub hard_excess: u32,
    pub points: i64,
    pub violations: Vec<Violation>,
}

impl Evaluation {
    pub fn is_feasible(&self) -> bool {
        self.hard_excess == 0
    }

    /// Total excess for one rule.
    pub fn excess_of(&self, constraint: HardConstraint) -> u32 {
        self.violations
            .iter()
            .filter(|v| v.violation_type == crate::models::ViolationType::Hard(constraint))
            .map(|v| v.excess)
            .sum()
    }

    fn push(&mut self, violation: Violation) {
        self.hard_excess += violation.excess;
        self.violations.push(violation);
    }
}

/// Evaluates `choice` (one candidate index per section).
pub fn evaluate(problem: &Problem, choice: &[usize]) -> Evaluation {
    let mut eval = Evaluation::default();

    // instructor -> period -> meetings (all / on campus)
    let mut taught: BTreeMap<(usize, Period), u32> = BTreeMap::new();
    let mut campus: BTreeMap<(usize, Period), u32> = BTreeMap::new();
    let mut balance: BTreeMap<Period, u32> = BTreeMap::new();
    // offering, part, period
    let mut offered: BTreeMap<(usize, u8, Period), u32> = BTreeMap::new();
    // rule, day -> off-site sections; rule, instructor, day -> own off-site sections
    let mut offsite_day: BTreeMap<(usize, Day), u32> = BTreeMap::new();
    let mut offsite_own: BTreeMap<(usize, usize, Day), u32> = BTreeMap::new();

    for (s, &c) in choice.iter().enumerate() {
        let vars = &problem.vars[s];
        let candidate = &vars.candidates[c];
        eval.points += candidate.points;
        for (part, period) in candidate.placement.meetings() {
            *taught.entry((vars.instructor, period)).or_default() += 1;
            if vars.offsite.is_none() {
                *campus.entry((vars.instructor, period)).or_default() += 1;
            }
            if vars.counted {
                *balance.entry(period).or_default() += 1;
            }
            if part <= 2 {
                *offered.entry((vars.offering, part, period)).or_default() += 1;
            }
        }
        if let Some(rule) = vars.offsite {
            let day = candidate.placement.pattern.periods()[0].day;
            *offsite_day.entry((rule, day)).or_default() += 1;
            *offsite_own.entry((rule, vars.instructor, day)).or_default() += 1;
        }
    }

    // Day points
    let days_taught: BTreeSet<(usize, Day)> =
        taught.keys().map(|&(i, period)| (i, period.day)).collect();
    for &(instructor, _) in &days_taught {
        eval.points += problem.day_points[instructor];
    }

    let name = |i: usize| problem.instructors[i].name.as_str();

    // 1. Instructor conflicts
    for (&(i, period), &n) in &taught {
        if n > 1 {
            eval.push(Violation::hard(
                HardConstraint::InstructorConflict,
                name(i),
                format!("{} has {n} meetings at {period}", name(i)),
                n - 1,
            ));
        }
    }

    // 2. Balance caps
    for (&period, &n) in &balance {
        let cap = problem.balance_caps[period.index()];
        if n > cap {
            eval.push(Violation::hard(
                HardConstraint::BalanceCap,
                period.code(),
                format!("{n} meetings at {period}, cap {cap}"),
                n - cap,
            ));
        }
    }

    // 3. Evening caps
    for &(slot, cap) in &problem.evening_caps {
        let n: u32 = balance
            .iter()
            .filter(|(p, _)| p.slot == slot)
            .map(|(_, n)| n)
            .sum();
        if n > cap {
            eval.push(Violation::hard(
                HardConstraint::EveningCap,
                slot.label(),
                format!("{n} meetings at {} across the week, cap {cap}", slot.label()),
                n - cap,
            ));
        }
    }

    // 4-5. Daily load per instructor
    let window = problem.max_consecutive_slots as usize + 1;
    for i in 0..problem.instructors.len() {
        for day in Day::ALL {
            let mut occupied = [false; SLOTS_PER_DAY];
            let mut restricted = 0;
            for slot in Slot::all() {
                let n = taught.get(&(i, Period::new(day, slot))).copied().unwrap_or(0);
                occupied[slot.index()] = n > 0;
                if problem.restricted_slots[slot.index()] {
                    restricted += n;
                }
            }
            if restricted > problem.max_restricted_per_day {
                eval.push(Violation::hard(
                    HardConstraint::RestrictedSlots,
                    name(i),
                    format!("{} has {restricted} early/late meetings on {day}", name(i)),
                    restricted - problem.max_restricted_per_day,
                ));
            }
            if window <= SLOTS_PER_DAY {
                for start in 0..=SLOTS_PER_DAY - window {
                    let run = occupied[start..start + window].iter().filter(|&&o| o).count();
                    if run == window {
                        eval.push(Violation::hard(
                            HardConstraint::ConsecutiveSlots,
                            name(i),
                            format!(
                                "{} teaches {window} consecutive slots from slot {} on {day}",
                                name(i),
                                start + 1
                            ),
                            1,
                        ));
                    }
                }
            }
        }
    }

    // 6. Course blocks
    for pair in &problem.block_pairs {
        for part in 1..=2u8 {
            for period in Period::all() {
                let a = offered.get(&(pair.first, part, period)).copied().unwrap_or(0);
                let b = offered.get(&(pair.second, part, period)).copied().unwrap_or(0);
                if a + b > pair.limit {
                    let first = &problem.offerings[pair.first];
                    let second = &problem.offerings[pair.second];
                    eval.push(Violation::hard(
                        HardConstraint::BlockOverlap,
                        format!("{}/{}", first.course, second.course),
                        format!(
                            "{} ({}) and {} ({}) share part {part} at {period}",
                            first.course, first.instructor, second.course, second.instructor
                        ),
                        a + b - pair.limit,
                    ));
                }
            }
        }
    }

    // 7. Off-site daily cap
    for (&(r, day), &n) in &offsite_day {
        let rule = &problem.offsite_rules[r];
        if n > rule.max_sections_per_day {
            eval.push(Violation::hard(
                HardConstraint::OffsiteDailyCap,
                day.name(),
                format!("{n} {} sections on {day}", rule.section_type),
                n - rule.max_sections_per_day,
            ));
        }
    }

    // 8. Travel buffer
    for (&(r, i, day), &own) in &offsite_own {
        let Some(buffer) = problem.offsite_rules[r].buffer_slot else {
            continue;
        };
        let on_campus = campus
            .get(&(i, Period::new(day, buffer)))
            .copied()
            .unwrap_or(0);
        if on_campus > 0 {
            eval.push(Violation::hard(
                HardConstraint::TravelBuffer,
                name(i),
                format!(
                    "{} teaches on campus at {} before a {} section on {day}",
                    name(i),
                    buffer.label(),
                    problem.offsite_rules[r].section_type
                ),
                own * on_campus,
            ));
        }
    }

    eval
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Instance;
    use crate::models::{CourseBlock, Instructor, MeetingPattern, Placement, Section};
    use crate::policy::Policy;
    use crate::solver::problem::Candidate;
    use crate::solver::State;

    fn p(code: &str) -> Period {
        code.parse().unwrap()
    }

    fn index_of(problem: &Problem, section: usize, first: &str, second: &str) -> usize {
        problem
            .candidates(section)
            .iter()
            .position(|c: &Candidate| {
                c.placement.pattern.periods() == [p(first), p(second)] && c.placement.extra.is_none()
            })
            .unwrap()
    }

    fn problem(sections: Vec<Section>, policy: &Policy) -> Problem {
        let mut instructors: Vec<Instructor> = Vec::new();
        for s in &sections {
            if !instructors.iter().any(|i| i.name == s.instructor) {
                instructors.push(Instructor::new(&s.instructor, &s.email));
            }
        }
        Problem::build(
            &Instance {
                sections,
                instructors,
            },
            policy,
        )
        .unwrap()
    }

    #[test]
    fn test_clean_assignment() {
        let pr = problem(
            vec![
                Section::new("CS100", "Ada", "a", 1),
                Section::new("CS200", "Bob", "b", 1),
            ],
            &Policy::default(),
        );
        let choice = vec![index_of(&pr, 0, "M2", "W2"), index_of(&pr, 1, "T3", "R3")];
        let eval = evaluate(&pr, &choice);
        assert!(eval.is_feasible(), "{:?}", eval.violations);
        // Two days each at -3.
        assert_eq!(eval.points, -12);
    }

    #[test]
    fn test_instructor_conflict_and_balance() {
        let pr = problem(
            vec![
                Section::new("CS100", "Ada", "a", 1),
                Section::new("CS100", "Ada", "a", 2),
            ],
            &Policy::default(),
        );
        let c = index_of(&pr, 0, "M2", "W2");
        let eval = evaluate(&pr, &[c, c]);
        assert_eq!(eval.excess_of(HardConstraint::InstructorConflict), 2);
        // 4 meetings: cap per period is 1
        assert_eq!(eval.excess_of(HardConstraint::BalanceCap), 2);
    }

    #[test]
    fn test_block_overlap() {
        let mut policy = Policy::default();
        policy.blocks = vec![CourseBlock::new("b", ["CS1", "CS2"])];
        let pr = problem(
            vec![Section::new("CS1", "Ada", "a", 1), Section::new("CS2", "Bob", "b", 1)],
            &policy,
        );
        let c0 = index_of(&pr, 0, "T2", "R2");
        let c1 = index_of(&pr, 1, "T2", "F2");
        let eval = evaluate(&pr, &[c0, c1]);
        // Part 1 collides at T2; part 2 differs.
        assert_eq!(eval.excess_of(HardConstraint::BlockOverlap), 1);
    }

    #[test]
    fn test_consecutive_and_restricted() {
        let mut policy = Policy::default();
        policy.balance.default_share = 6.0;
        let pr = problem(
            vec![
                Section::new("CS100", "Ada", "a", 1),
                Section::new("CS200", "Ada", "a", 1),
            ],
            &policy,
        );
        let block = pr
            .candidates(0)
            .iter()
            .position(|c| c.placement.pattern == MeetingPattern::long_block(Day::Monday, Slot::FIRST).unwrap())
            .unwrap();
        let third = index_of(&pr, 1, "M3", "W3");
        let eval = evaluate(&pr, &[block, third]);
        assert_eq!(eval.excess_of(HardConstraint::ConsecutiveSlots), 1);
        assert_eq!(eval.excess_of(HardConstraint::RestrictedSlots), 0);
    }

    #[test]
    fn test_travel_buffer() {
        let mut policy = Policy::default();
        policy.balance.default_share = 6.0;
        let pr = problem(
            vec![
                Section::new("CS100", "Ada", "a", 1).with_section_type("Jersey City"),
                Section::new("CS341", "Ada", "a", 2).with_capacity(20),
            ],
            &policy,
        );
        let jc = index_of(&pr, 0, "M7", "M8");
        let afternoon = index_of(&pr, 1, "M6", "R6");
        let eval = evaluate(&pr, &[jc, afternoon]);
        assert_eq!(eval.excess_of(HardConstraint::TravelBuffer), 1);
        // Off-site meetings are not balance-counted.
        assert_eq!(eval.excess_of(HardConstraint::EveningCap), 0);
    }

    #[test]
    fn test_extra_meeting_counts_for_conflicts() {
        let pr = problem(
            vec![
                Section::new("CS435", "Ada", "a", 1).with_meetings(3),
                Section::new("CS100", "Ada", "a", 1),
            ],
            &Policy::default(),
        );
        let c0 = pr
            .candidates(0)
            .iter()
            .position(|c| {
                c.placement
                    == Placement::new(MeetingPattern::paired(Day::Monday, Day::Wednesday, Slot::new(2).unwrap()))
                        .with_extra(p("F4"))
            })
            .unwrap();
        let c1 = index_of(&pr, 1, "T4", "F4");
        let eval = evaluate(&pr, &[c0, c1]);
        assert_eq!(eval.excess_of(HardConstraint::InstructorConflict), 1);
    }

    #[test]
    fn test_offsite_daily_cap() {
        let pr = problem(
            ["Ada", "Bob", "Cy", "Dee"]
                .iter()
                .enumerate()
                .map(|(n, name)| {
                    Section::new(format!("CS10{n}"), *name, *name, 1).with_section_type("Jersey City")
                })
                .collect(),
            &Policy::default(),
        );
        let choice: Vec<usize> = (0..4).map(|s| index_of(&pr, s, "M7", "M8")).collect();
        let eval = evaluate(&pr, &choice);
        assert_eq!(eval.excess_of(HardConstraint::OffsiteDailyCap), 1);
        assert_eq!(eval.hard_excess, 1, "{:?}", eval.violations);
        assert_eq!(State::from_choice(&pr, &choice).hard(), eval.hard_excess);

        // Moving one section to Tuesday clears it.
        let mut spread = choice;
        spread[3] = index_of(&pr, 3, "T7", "T8");
        assert!(evaluate(&pr, &spread).is_feasible());
        assert_eq!(State::from_choice(&pr, &spread).hard(), 0);
    }

    #[test]
    fn test_evening_cap() {
        let pr = problem(
            vec![
                Section::new("CS100", "Ada", "a", 1),
                Section::new("CS200", "Bob", "b", 1),
            ],
            &Policy::default(),
        );
        // 4 meetings: floor(0.2 / 6 * 4) = 0 per evening slot.
        let choice = vec![index_of(&pr, 0, "M7", "M8"), index_of(&pr, 1, "T7", "T8")];
        let eval = evaluate(&pr, &choice);
        assert_eq!(eval.excess_of(HardConstraint::EveningCap), 4);
        assert_eq!(eval.hard_excess, 4, "{:?}", eval.violations);
        assert_eq!(State::from_choice(&pr, &choice).hard(), eval.hard_excess);
    }
}

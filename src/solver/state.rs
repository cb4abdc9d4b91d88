//! Incremental assignment state.
//!
//! Keeps occupancy counters for every hard rule and running totals of
//! hard excess and soft points. Placing or removing one section touches
//! only the counters its meetings hit, so a move is evaluated in time
//! proportional to the section's meetings and its block partners rather
//! than the whole timetable.
//!
//! Every rule is a sum over cells of `max(0, count - limit)`; an update
//! records a cell's excess before and after changing its count.

use crate::models::{Period, Violation, DAYS_PER_WEEK, PERIOD_COUNT, SLOTS_PER_DAY};

use super::Problem;

#[inline]
fn excess(count: u32, limit: u32) -> i64 {
    i64::from(count.saturating_sub(limit))
}

#[inline]
fn bump(count: &mut u32, sign: i32) {
    if sign > 0 {
        *count += 1;
    } else {
        *count -= 1;
    }
}

/// Partial or complete assignment with incremental scoring.
#[derive(Debug, Clone)]
pub struct State<'a> {
    problem: &'a Problem,
    choice: Vec<Option<usize>>,
    /// instructor × period: all meetings.
    taught: Vec<u32>,
    /// instructor × period: on-campus meetings.
    campus: Vec<u32>,
    /// instructor × day: meetings in restricted slots.
    restricted: Vec<u32>,
    /// instructor × day: all meetings.
    daily: Vec<u32>,
    /// period: balance-counted meetings.
    balance: Vec<u32>,
    /// evening cap index: balance-counted meetings in that slot.
    evening: Vec<u32>,
    /// offering × part(1..=2) × period.
    offered: Vec<u32>,
    /// rule × day: off-site sections.
    offsite_day: Vec<u32>,
    /// rule × instructor × day: the instructor's own off-site sections.
    offsite_own: Vec<u32>,
    hard: i64,
    points: i64,
}

impl<'a> State<'a> {
    /// Empty state: nothing placed.
    pub fn new(problem: &'a Problem) -> Self {
        let n_instr = problem.instructors.len();
        let n_rules = problem.offsite_rules.len();
        Self {
            problem,
            choice: vec![None; problem.section_count()],
            taught: vec![0; n_instr * PERIOD_COUNT],
            campus: vec![0; n_instr * PERIOD_COUNT],
            restricted: vec![0; n_instr * DAYS_PER_WEEK],
            daily: vec![0; n_instr * DAYS_PER_WEEK],
            balance: vec![0; PERIOD_COUNT],
            evening: vec![0; problem.evening_caps.len()],
            offered: vec![0; problem.offerings.len() * 2 * PERIOD_COUNT],
            offsite_day: vec![0; n_rules * DAYS_PER_WEEK],
            offsite_own: vec![0; n_rules * n_instr * DAYS_PER_WEEK],
            hard: 0,
            points: 0,
        }
    }

    /// State with every section placed at the given candidates.
    pub fn from_choice(problem: &'a Problem, choice: &[usize]) -> Self {
        let mut state = Self::new(problem);
        for (section, &candidate) in choice.iter().enumerate() {
            state.place(section, candidate);
        }
        state
    }

    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    /// Total hard excess.
    pub fn hard(&self) -> u32 {
        u32::try_from(self.hard).unwrap_or(u32::MAX)
    }

    /// Total soft points.
    pub fn points(&self) -> i64 {
        self.points
    }

    /// Search energy: hard excess dominates, then negated points.
    pub fn energy(&self, hard_weight: i64) -> i64 {
        self.hard * hard_weight - self.points
    }

    /// Candidate placed for a section, if any.
    pub fn current(&self, section: usize) -> Option<usize> {
        self.choice[section]
    }

    pub fn is_complete(&self) -> bool {
        self.choice.iter().all(Option::is_some)
    }

    /// Candidate index per section. Unplaced sections map to 0.
    pub fn choice(&self) -> Vec<usize> {
        self.choice.iter().map(|c| c.unwrap_or(0)).collect()
    }

    /// Every cell with hard excess, recounted for a complete state.
    pub fn violations(&self) -> Vec<Violation> {
        super::evaluate(self.problem, &self.choice()).violations
    }

    /// Places a section, removing its current placement first.
    pub fn place(&mut self, section: usize, candidate: usize) {
        if let Some(old) = self.choice[section] {
            self.apply(section, old, -1);
        }
        self.apply(section, candidate, 1);
        self.choice[section] = Some(candidate);
    }

    /// Removes a section's placement, if any.
    pub fn unplace(&mut self, section: usize) {
        if let Some(old) = self.choice[section].take() {
            self.apply(section, old, -1);
        }
    }

    /// `(hard delta, points delta)` of moving a section to `candidate`,
    /// leaving the state unchanged.
    pub fn delta(&mut self, section: usize, candidate: usize) -> (i64, i64) {
        let (hard, points) = (self.hard, self.points);
        let previous = self.choice[section];
        self.place(section, candidate);
        let result = (self.hard - hard, self.points - points);
        match previous {
            Some(old) => self.place(section, old),
            None => self.unplace(section),
        }
        result
    }

    fn apply(&mut self, section: usize, candidate: usize, sign: i32) {
        let problem = self.problem;
        let vars = &problem.vars[section];
        let cand = &vars.candidates[candidate];
        self.points += i64::from(sign) * cand.points;

        for (part, period) in cand.placement.meetings() {
            self.meeting(section, part, period, sign);
        }

        if let Some(rule) = vars.offsite {
            let day = cand.placement.pattern.periods()[0].day.index();
            let limit = problem.offsite_rules[rule].max_sections_per_day;
            let cell = &mut self.offsite_day[rule * DAYS_PER_WEEK + day];
            let before = excess(*cell, limit);
            bump(cell, sign);
            self.hard += excess(*cell, limit) - before;

            let i = vars.instructor;
            let own = &mut self.offsite_own[(rule * problem.instructors.len() + i) * DAYS_PER_WEEK + day];
            bump(own, sign);
            if let Some(buffer) = problem.offsite_rules[rule].buffer_slot {
                let campus = self.campus[i * PERIOD_COUNT + day * SLOTS_PER_DAY + buffer.index()];
                self.hard += i64::from(sign) * i64::from(campus);
            }
        }
    }

    fn meeting(&mut self, section: usize, part: u8, period: Period, sign: i32) {
        let problem = self.problem;
        let vars = &problem.vars[section];
        let i = vars.instructor;
        let pi = period.index();
        let day = period.day.index();
        let slot = period.slot.index();

        // Instructor conflict and consecutive runs
        let cell = i * PERIOD_COUNT + pi;
        let before = excess(self.taught[cell], 1) + self.window_excess(i, day, slot);
        bump(&mut self.taught[cell], sign);
        self.hard += excess(self.taught[cell], 1) + self.window_excess(i, day, slot) - before;

        // Early/late load
        if problem.restricted_slots[slot] {
            let cell = &mut self.restricted[i * DAYS_PER_WEEK + day];
            let before = excess(*cell, problem.max_restricted_per_day);
            bump(cell, sign);
            self.hard += excess(*cell, problem.max_restricted_per_day) - before;
        }

        // Teaching days
        let daily = &mut self.daily[i * DAYS_PER_WEEK + day];
        let was_teaching = *daily > 0;
        bump(daily, sign);
        if was_teaching != (*daily > 0) {
            self.points += i64::from(sign) * problem.day_points[i];
        }

        // Balance and evening caps
        if vars.counted {
            let cap = problem.balance_caps[pi];
            let before = excess(self.balance[pi], cap);
            bump(&mut self.balance[pi], sign);
            self.hard += excess(self.balance[pi], cap) - before;

            for (e, &(evening_slot, cap)) in problem.evening_caps.iter().enumerate() {
                if evening_slot == period.slot {
                    let before = excess(self.evening[e], cap);
                    bump(&mut self.evening[e], sign);
                    self.hard += excess(self.evening[e], cap) - before;
                }
            }
        }

        // Travel buffer: own off-site sections that day times campus meetings
        if vars.offsite.is_none() {
            bump(&mut self.campus[cell], sign);
            for (r, rule) in problem.offsite_rules.iter().enumerate() {
                if rule.buffer_slot == Some(period.slot) {
                    let own = self.offsite_own
                        [(r * problem.instructors.len() + i) * DAYS_PER_WEEK + day];
                    self.hard += i64::from(sign) * i64::from(own);
                }
            }
        }

        // Course blocks
        if part == 1 || part == 2 {
            let off = vars.offering;
            let part_base = usize::from(part - 1) * PERIOD_COUNT + pi;
            let own_cell = off * 2 * PERIOD_COUNT + part_base;
            let own_before = self.offered[own_cell];
            let own_after = if sign > 0 { own_before + 1 } else { own_before - 1 };
            for &p in &problem.offering_pairs[off] {
                let pair = problem.block_pairs[p];
                let other = self.offered[pair.other(off) * 2 * PERIOD_COUNT + part_base];
                self.hard += excess(own_after + other, pair.limit)
                    - excess(own_before + other, pair.limit);
            }
            self.offered[own_cell] = own_after;
        }
    }

    /// Excess over the consecutive-run limit for windows covering `slot`.
    fn window_excess(&self, instructor: usize, day: usize, slot: usize) -> i64 {
        let max = self.problem.max_consecutive_slots as usize;
        let window = max + 1;
        if window > SLOTS_PER_DAY {
            return 0;
        }
        let base = instructor * PERIOD_COUNT + day * SLOTS_PER_DAY;
        let first = slot.saturating_sub(window - 1);
        let last = slot.min(SLOTS_PER_DAY - window);
        (first..=last)
            .map(|start| {
                let occupied = (start..start + window)
                    .filter(|&s| self.taught[base + s] > 0)
                    .count();
                i64::from(occupied == window)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Instance;
    use crate::models::{Instructor, Section};
    use crate::policy::Policy;
    use crate::solver::evaluate::evaluate;

    fn problem() -> Problem {
        let sections = vec![
            Section::new("CS288", "Ada", "a", 1),
            Section::new("CS332", "Bob", "b", 1),
            Section::new("CS301", "Cy", "c", 1),
            Section::new("CS100", "Ada", "a", 1).with_section_type("Jersey City"),
            Section::new("CS341", "Ada", "a", 1).with_capacity(20),
            Section::new("CS435", "Bob", "b", 1).with_meetings(3),
        ];
        let instructors = vec![
            Instructor::new("Ada", "a"),
            Instructor::new("Bob", "b"),
            Instructor::new("Cy", "c"),
        ];
        Problem::build(
            &Instance {
                sections,
                instructors,
            },
            &Policy::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_state() {
        let pr = problem();
        let state = State::new(&pr);
        assert_eq!(state.hard(), 0);
        assert_eq!(state.points(), 0);
        assert!(!state.is_complete());
    }

    #[test]
    fn test_place_then_unplace_restores_totals() {
        let pr = problem();
        let mut state = State::from_choice(&pr, &vec![0; pr.section_count()]);
        let (hard, points) = (state.hard(), state.points());
        state.place(2, 3);
        state.unplace(2);
        state.place(2, 0);
        assert_eq!((state.hard(), state.points()), (hard, points));
    }

    #[test]
    fn test_delta_leaves_state_unchanged() {
        let pr = problem();
        let mut state = State::from_choice(&pr, &vec![1; pr.section_count()]);
        let before = (state.hard(), state.points(), state.choice());
        let (dh, dp) = state.delta(0, 5);
        assert_eq!((state.hard(), state.points(), state.choice()), before);

        state.place(0, 5);
        assert_eq!(i64::from(state.hard()) - i64::from(before.0), dh);
        assert_eq!(state.points() - before.1, dp);
    }

    #[test]
    fn test_incremental_matches_evaluation() {
        let pr = problem();
        // Same candidate index everywhere creates plenty of collisions.
        for k in 0..5 {
            let choice: Vec<usize> = (0..pr.section_count())
                .map(|s| k % pr.candidates(s).len())
                .collect();
            let state = State::from_choice(&pr, &choice);
            let eval = evaluate(&pr, &choice);
            assert_eq!(state.hard(), eval.hard_excess, "choice {choice:?}");
            assert_eq!(state.points(), eval.points, "choice {choice:?}");
        }
    }

    #[test]
    fn test_moves_track_evaluation() {
        let pr = problem();
        let mut choice = vec![0; pr.section_count()];
        let mut state = State::from_choice(&pr, &choice);
        for step in 0..40 {
            let s = step % pr.section_count();
            let c = (step * 7 + 3) % pr.candidates(s).len();
            state.place(s, c);
            choice[s] = c;
            let eval = evaluate(&pr, &choice);
            assert_eq!(state.hard(), eval.hard_excess, "step {step}");
            assert_eq!(state.points(), eval.points, "step {step}");
        }
    }

    #[test]
    fn test_energy_prefers_feasibility() {
        let pr = problem();
        let state = State::from_choice(&pr, &vec![0; pr.section_count()]);
        let energy = state.energy(10_000);
        assert_eq!(energy, i64::from(state.hard()) * 10_000 - state.points());
    }

    #[test]
    fn test_violations_sum_to_hard() {
        let pr = problem();
        let state = State::from_choice(&pr, &vec![0; pr.section_count()]);
        let total: u32 = state.violations().iter().map(|v| v.excess).sum();
        assert_eq!(total, state.hard());
    }
}

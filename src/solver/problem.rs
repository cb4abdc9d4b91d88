//! Compiled search space.
//!
//! [`Problem::build`] turns an [`Instance`] and a [`Policy`] into the
//! structures the search works on: for every section the list of
//! admissible placements with their unary soft points, and for every
//! global rule the caps and index tables it needs.
//!
//! Unary rules (banned and blocked periods, restricted periods, the
//! evening link, early-start levels, off-site slots) never appear as
//! violations: placements breaking them are simply not generated.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::error::{Result, TimetableError};
use crate::input::Instance;
use crate::models::{
    Assignment, Day, FormatPreference, Instructor, MeetingPattern, OffsiteRule, PenaltyWeights,
    Period, Placement, Schedule, Section, Slot, DAYS_PER_WEEK, PERIOD_COUNT, SLOTS_PER_DAY,
};
use crate::policy::Policy;

use super::evaluate;

/// One admissible placement of a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub placement: Placement,
    /// Soft points that depend on this placement alone.
    pub points: i64,
}

/// Per-section search data.
#[derive(Debug, Clone)]
pub struct SectionVars {
    /// Index into [`Problem::instructors`].
    pub instructor: usize,
    /// Index into [`Problem::offerings`].
    pub offering: usize,
    /// Index into [`Problem::offsite_rules`] for off-site sections.
    pub offsite: Option<usize>,
    /// Whether the section's meetings count toward balance caps.
    pub counted: bool,
    pub candidates: Vec<Candidate>,
}

/// A course taught by one instructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offering {
    pub course: String,
    pub instructor: String,
}

/// Two offerings of different courses in a shared block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPair {
    pub first: usize,
    pub second: usize,
    pub limit: u32,
}

impl BlockPair {
    /// The offering paired with `offering`.
    pub fn other(&self, offering: usize) -> usize {
        if self.first == offering {
            self.second
        } else {
            self.first
        }
    }
}

/// Compiled timetabling problem.
#[derive(Debug, Clone)]
pub struct Problem {
    pub sections: Vec<Section>,
    pub instructors: Vec<Instructor>,
    pub vars: Vec<SectionVars>,
    pub offerings: Vec<Offering>,
    pub block_pairs: Vec<BlockPair>,
    /// Pair indices touching each offering.
    pub offering_pairs: Vec<Vec<usize>>,
    pub offsite_rules: Vec<OffsiteRule>,
    /// Balance cap per period index.
    pub balance_caps: Vec<u32>,
    /// Week-wide cap per evening slot.
    pub evening_caps: Vec<(Slot, u32)>,
    /// Restricted-slot mask by slot index.
    pub restricted_slots: [bool; SLOTS_PER_DAY],
    pub max_restricted_per_day: u32,
    pub max_consecutive_slots: u32,
    /// Points per teaching day, per instructor.
    pub day_points: Vec<i64>,
    /// Slot-preference points per instructor and period index.
    pub period_points: Vec<[i64; PERIOD_COUNT]>,
    pub weights: PenaltyWeights,
    pub total_meetings: usize,
}

impl Problem {
    /// Compiles an instance under a policy.
    ///
    /// # Errors
    /// [`TimetableError::NoAdmissiblePlacement`] when some section has no
    /// placement that satisfies every unary rule.
    pub fn build(instance: &Instance, policy: &Policy) -> Result<Self> {
        let instructors = instance.instructors.clone();
        let instructor_index: HashMap<&str, usize> = instructors
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.name.as_str(), i))
            .collect();

        let mut offerings: Vec<Offering> = Vec::new();
        let mut offering_index: HashMap<(&str, &str), usize> = HashMap::new();
        for section in &instance.sections {
            offering_index
                .entry((section.course.as_str(), section.instructor.as_str()))
                .or_insert_with(|| {
                    offerings.push(Offering {
                        course: section.course.clone(),
                        instructor: section.instructor.clone(),
                    });
                    offerings.len() - 1
                });
        }

        let weights = &policy.weights;
        let period_points: Vec<[i64; PERIOD_COUNT]> = instructors
            .iter()
            .map(|inst| {
                let mut table = [0i64; PERIOD_COUNT];
                for pref in &inst.slot_preferences {
                    let points = pref.kind.points(weights);
                    for period in &pref.periods {
                        table[period.index()] += points;
                    }
                }
                table
            })
            .collect();
        let day_points = instructors
            .iter()
            .map(|inst| weights.day_points(inst.days))
            .collect();

        let catalogue = policy.patterns.catalogue();
        let mut vars = Vec::with_capacity(instance.sections.len());
        for section in &instance.sections {
            let instructor = *instructor_index.get(section.instructor.as_str()).ok_or_else(
                || TimetableError::NoAdmissiblePlacement {
                    section: section.id.clone(),
                },
            )?;
            let offering = offering_index[&(section.course.as_str(), section.instructor.as_str())];
            let offsite = policy.offsite_rule_for(section);
            let counted = offsite.map_or(true, |r| !policy.offsite[r].exclude_from_balance);

            let candidates = candidates_for(
                section,
                &instructors[instructor],
                offsite.map(|r| &policy.offsite[r]),
                &catalogue,
                policy,
                &period_points[instructor],
            );
            if candidates.is_empty() {
                return Err(TimetableError::NoAdmissiblePlacement {
                    section: section.id.clone(),
                });
            }
            vars.push(SectionVars {
                instructor,
                offering,
                offsite,
                counted,
                candidates,
            });
        }

        let (block_pairs, offering_pairs) = block_pairs(policy, &offerings);
        let total_meetings = instance.total_meetings();
        let balance_caps = Period::all()
            .map(|p| policy.balance.cap(p, total_meetings))
            .collect();
        let evening_cap = policy.evening.cap(policy.balance.divisor, total_meetings);
        let evening_caps = policy
            .evening
            .slots
            .iter()
            .map(|&slot| (slot, evening_cap))
            .collect();
        let mut restricted_slots = [false; SLOTS_PER_DAY];
        for slot in &policy.load.restricted_slots {
            restricted_slots[slot.index()] = true;
        }

        let problem = Self {
            sections: instance.sections.clone(),
            instructors,
            vars,
            offerings,
            block_pairs,
            offering_pairs,
            offsite_rules: policy.offsite.clone(),
            balance_caps,
            evening_caps,
            restricted_slots,
            max_restricted_per_day: policy.load.max_restricted_per_day,
            max_consecutive_slots: policy.load.max_consecutive_slots,
            day_points,
            period_points,
            weights: weights.clone(),
            total_meetings,
        };
        debug!(
            sections = problem.section_count(),
            candidates = problem.vars.iter().map(|v| v.candidates.len()).sum::<usize>(),
            block_pairs = problem.block_pairs.len(),
            "problem compiled"
        );
        Ok(problem)
    }

    /// Upper bound on how far the soft objective can move between any two
    /// complete assignments.
    pub fn point_swing(&self) -> i64 {
        let placements: i64 = self
            .vars
            .iter()
            .map(|vars| {
                let points = vars.candidates.iter().map(|c| c.points);
                match (points.clone().max(), points.min()) {
                    (Some(max), Some(min)) => max - min,
                    _ => 0,
                }
            })
            .sum();
        let days: i64 = self
            .day_points
            .iter()
            .map(|p| p.abs() * DAYS_PER_WEEK as i64)
            .sum();
        placements + days
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    pub fn candidates(&self, section: usize) -> &[Candidate] {
        &self.vars[section].candidates
    }

    /// Placement chosen by `choice` for a section.
    pub fn placement(&self, section: usize, candidate: usize) -> &Placement {
        &self.vars[section].candidates[candidate].placement
    }

    /// Builds the schedule for a complete choice vector, with violations
    /// recounted from scratch.
    pub fn schedule(&self, choice: &[usize]) -> Schedule {
        let mut schedule = Schedule::new();
        for (s, &c) in choice.iter().enumerate() {
            let section = &self.sections[s];
            for (part, period) in self.placement(s, c).meetings() {
                schedule.add_assignment(
                    Assignment::new(
                        &section.id,
                        &section.course,
                        &section.instructor,
                        part,
                        period,
                    )
                    .with_email(&section.email)
                    .with_section_number(section.number)
                    .with_capacity(section.capacity)
                    .with_section_type(&section.section_type),
                );
            }
        }
        let evaluation = evaluate::evaluate(self, choice);
        schedule.objective = evaluation.points;
        schedule.violations = evaluation.violations;
        schedule
    }
}

fn candidates_for(
    section: &Section,
    instructor: &Instructor,
    offsite: Option<&OffsiteRule>,
    catalogue: &[MeetingPattern],
    policy: &Policy,
    period_points: &[i64; PERIOD_COUNT],
) -> Vec<Candidate> {
    let admissible = |period: Period| {
        !policy.balance.is_banned(period)
            && instructor.is_available(period)
            && policy
                .restricted_periods
                .iter()
                .filter(|r| r.period == period)
                .all(|r| r.admits(section))
    };
    let level = section.course_level();
    let weights = &policy.weights;

    let mut candidates = Vec::new();
    for pattern in catalogue {
        let [first, second] = pattern.periods();
        if !admissible(first) || !admissible(second) {
            continue;
        }
        if !policy.patterns.allows_start(level, first.slot) {
            continue;
        }
        if let Some((start, end)) = policy.evening.linked {
            let broken = Day::ALL.into_iter().any(|day| {
                (first == Period::new(day, start)) != (second == Period::new(day, end))
            });
            if broken {
                continue;
            }
        }
        if let Some(rule) = offsite {
            if first.slot != rule.start_slot || Some(second.slot) != rule.end_slot() {
                continue;
            }
        }

        let mut points = period_points[first.index()] + period_points[second.index()];
        points += match instructor.format {
            Some(FormatPreference::LongBlock) => {
                weights.format_mismatch * i64::from(pattern.split_adjacencies())
            }
            Some(FormatPreference::Split) if pattern.is_long_block() => weights.format_mismatch,
            _ => 0,
        };
        if instructor.avoid_long_blocks && pattern.is_long_block() {
            points += weights.long_block_aversion;
        }

        let placement = Placement::new(*pattern);
        if section.meetings > 2 {
            for extra in Period::all() {
                if extra != first && extra != second && admissible(extra) {
                    candidates.push(Candidate {
                        placement: placement.with_extra(extra),
                        points: points + period_points[extra.index()],
                    });
                }
            }
        } else {
            candidates.push(Candidate { placement, points });
        }
    }
    candidates
}

fn block_pairs(policy: &Policy, offerings: &[Offering]) -> (Vec<BlockPair>, Vec<Vec<usize>>) {
    let mut by_course: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, offering) in offerings.iter().enumerate() {
        by_course.entry(offering.course.as_str()).or_default().push(i);
    }

    let mut limits: BTreeMap<(usize, usize), u32> = BTreeMap::new();
    for block in &policy.blocks {
        for (course_a, course_b) in block.course_pairs() {
            let (Some(list_a), Some(list_b)) = (by_course.get(course_a), by_course.get(course_b))
            else {
                continue;
            };
            for &a in list_a {
                for &b in list_b {
                    let key = (a.min(b), a.max(b));
                    limits
                        .entry(key)
                        .and_modify(|l| *l = (*l).min(block.max_concurrent))
                        .or_insert(block.max_concurrent);
                }
            }
        }
    }

    let pairs: Vec<BlockPair> = limits
        .into_iter()
        .map(|((first, second), limit)| BlockPair {
            first,
            second,
            limit,
        })
        .collect();
    let mut offering_pairs = vec![Vec::new(); offerings.len()];
    for (i, pair) in pairs.iter().enumerate() {
        offering_pairs[pair.first].push(i);
        offering_pairs[pair.second].push(i);
    }
    (pairs, offering_pairs)
}

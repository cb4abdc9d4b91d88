//! Itemised soft outcomes.
//!
//! Breaks the soft objective of an assignment down into the individual
//! hits that produced it: slot preferences honoured or ignored, format
//! mismatches, long blocks given to instructors who declined them, and
//! teaching days. The items always sum to the objective.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::models::{Day, DayPreference, FormatPreference, Period};
use crate::solver::{Problem, State};

/// Kind of soft outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PenaltyCategory {
    /// Meeting on a health or religion period.
    Protected,
    /// Meeting on a childcare or other declared conflict.
    Conflict,
    /// Meeting on a ranked preference.
    Preference,
    /// Pattern against the instructor's format preference.
    Format,
    /// Long block for an instructor who declined back-to-back slots.
    LongBlock,
    /// One teaching day.
    TeachingDay,
}

impl PenaltyCategory {
    pub const ALL: [PenaltyCategory; 6] = [
        Self::Protected,
        Self::Conflict,
        Self::Preference,
        Self::Format,
        Self::LongBlock,
        Self::TeachingDay,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::Protected => "HEALTH/RELIGION VIOLATIONS",
            Self::Conflict => "CHILDCARE AND OTHER CONFLICTS",
            Self::Preference => "PREFERRED SLOTS GRANTED",
            Self::Format => "FORMAT PREFERENCE VIOLATIONS",
            Self::LongBlock => "BACK-TO-BACK SLOT AVERSION VIOLATIONS",
            Self::TeachingDay => "DAY CONDENSATION IMPACT",
        }
    }
}

/// One soft outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PenaltyItem {
    pub category: PenaltyCategory,
    pub instructor: String,
    pub section_id: Option<String>,
    pub period: Option<Period>,
    pub detail: String,
    pub points: i64,
}

impl fmt::Display for PenaltyItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} points", self.detail, self.points)
    }
}

/// All soft outcomes of an assignment.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PenaltyLedger {
    pub items: Vec<PenaltyItem>,
}

impl PenaltyLedger {
    /// Itemises the current placements of a complete state.
    pub fn from_state(state: &State<'_>) -> Self {
        Self::from_choice(state.problem(), &state.choice())
    }

    /// Itemises a complete choice vector.
    pub fn from_choice(problem: &Problem, choice: &[usize]) -> Self {
        let weights = &problem.weights;
        let mut items = Vec::new();
        let mut days_taught: BTreeSet<(usize, Day)> = BTreeSet::new();

        for (s, &c) in choice.iter().enumerate() {
            let section = &problem.sections[s];
            let vars = &problem.vars[s];
            let instructor = &problem.instructors[vars.instructor];
            let placement = problem.placement(s, c);

            for (_, period) in placement.meetings() {
                days_taught.insert((vars.instructor, period.day));
                for pref in &instructor.slot_preferences {
                    if !pref.periods.contains(&period) {
                        continue;
                    }
                    let category = if pref.kind.is_protected() {
                        PenaltyCategory::Protected
                    } else if pref.kind.is_preference() {
                        PenaltyCategory::Preference
                    } else {
                        PenaltyCategory::Conflict
                    };
                    items.push(PenaltyItem {
                        category,
                        instructor: instructor.name.clone(),
                        section_id: Some(section.id.clone()),
                        period: Some(period),
                        detail: format!(
                            "{} scheduled in {} slot {} {}",
                            instructor.name,
                            pref.kind,
                            period.day.name(),
                            period.slot.label()
                        ),
                        points: pref.kind.points(weights),
                    });
                }
            }

            let pattern = placement.pattern;
            let format_points = match instructor.format {
                Some(FormatPreference::LongBlock) => {
                    weights.format_mismatch * i64::from(pattern.split_adjacencies())
                }
                Some(FormatPreference::Split) if pattern.is_long_block() => weights.format_mismatch,
                _ => 0,
            };
            if format_points != 0 {
                items.push(PenaltyItem {
                    category: PenaltyCategory::Format,
                    instructor: instructor.name.clone(),
                    section_id: Some(section.id.clone()),
                    period: None,
                    detail: format!(
                        "{} prefers {} but {} meets {}",
                        instructor.name,
                        format_label(instructor.format),
                        section.id,
                        pattern
                    ),
                    points: format_points,
                });
            }

            if instructor.avoid_long_blocks && pattern.is_long_block() {
                items.push(PenaltyItem {
                    category: PenaltyCategory::LongBlock,
                    instructor: instructor.name.clone(),
                    section_id: Some(section.id.clone()),
                    period: None,
                    detail: format!(
                        "{} teaches {} back to back ({})",
                        instructor.name, section.id, pattern
                    ),
                    points: weights.long_block_aversion,
                });
            }
        }

        for (i, day) in days_taught {
            let instructor = &problem.instructors[i];
            let condensed = instructor.days == DayPreference::Condensed;
            items.push(PenaltyItem {
                category: PenaltyCategory::TeachingDay,
                instructor: instructor.name.clone(),
                section_id: None,
                period: None,
                detail: format!(
                    "{} teaching on {} ({})",
                    instructor.name,
                    day.name(),
                    if condensed {
                        "prefers condensed"
                    } else {
                        "doesn't prefer condensed"
                    }
                ),
                points: problem.day_points[i],
            });
        }

        Self { items }
    }

    /// Sum of every item.
    pub fn total(&self) -> i64 {
        self.items.iter().map(|i| i.points).sum()
    }

    /// Items of one category.
    pub fn items_in(&self, category: PenaltyCategory) -> impl Iterator<Item = &PenaltyItem> {
        self.items.iter().filter(move |i| i.category == category)
    }

    pub fn count(&self, category: PenaltyCategory) -> usize {
        self.items_in(category).count()
    }

    pub fn subtotal(&self, category: PenaltyCategory) -> i64 {
        self.items_in(category).map(|i| i.points).sum()
    }

    /// Net points per instructor over slot, format, and long-block items,
    /// most negative first.
    pub fn instructor_impact(&self) -> Vec<(String, i64)> {
        let mut impact: BTreeMap<&str, i64> = BTreeMap::new();
        for item in &self.items {
            if item.category != PenaltyCategory::TeachingDay {
                *impact.entry(item.instructor.as_str()).or_default() += item.points;
            }
        }
        let mut sorted: Vec<(String, i64)> = impact
            .into_iter()
            .map(|(name, points)| (name.to_string(), points))
            .collect();
        sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

fn format_label(format: Option<FormatPreference>) -> &'static str {
    match format {
        Some(FormatPreference::LongBlock) => "long blocks",
        Some(FormatPreference::Split) => "split meetings",
        None => "no format",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Instance;
    use crate::models::{Instructor, PreferenceKind, Section, SlotPreference};
    use crate::policy::Policy;
    use crate::solver::{evaluate, GreedyScheduler};

    fn problem() -> Problem {
        let p = |c: &str| c.parse::<Period>().unwrap();
        let ada = Instructor::new("Ada", "a")
            .with_format(FormatPreference::LongBlock)
            .with_days(DayPreference::Condensed)
            .with_slot_preference(SlotPreference::new(PreferenceKind::Pref1, vec![p("M1"), p("T2")]))
            .with_slot_preference(SlotPreference::new(PreferenceKind::Health, vec![p("W2")]));
        let bob = Instructor::new("Bob", "b")
            .with_format(FormatPreference::Split)
            .with_long_block_aversion()
            .with_slot_preference(SlotPreference::new(PreferenceKind::Childcare, vec![p("M4")]));
        let instance = Instance {
            sections: vec![
                Section::new("CS100", "Ada", "a", 1),
                Section::new("CS100", "Ada", "a", 2),
                Section::new("CS280", "Bob", "b", 1),
                Section::new("CS280", "Bob", "b", 2),
            ],
            instructors: vec![ada, bob],
        };
        Problem::build(&instance, &Policy::default()).unwrap()
    }

    #[test]
    fn test_ledger_sums_to_objective() {
        let problem = problem();
        for k in 0..6 {
            let choice: Vec<usize> = (0..problem.section_count())
                .map(|s| (k * 5 + s) % problem.candidates(s).len())
                .collect();
            let ledger = PenaltyLedger::from_choice(&problem, &choice);
            assert_eq!(ledger.total(), evaluate(&problem, &choice).points, "choice {choice:?}");
        }
    }

    #[test]
    fn test_from_state() {
        let problem = problem();
        let state = GreedyScheduler::new().construct(&problem);
        let ledger = PenaltyLedger::from_state(&state);
        assert_eq!(ledger.total(), state.points());
        let day_items = ledger.count(PenaltyCategory::TeachingDay);
        assert!(day_items >= 2);
        let subtotal: i64 = PenaltyCategory::ALL.iter().map(|&c| ledger.subtotal(c)).sum();
        assert_eq!(subtotal, ledger.total());
    }

    #[test]
    fn test_instructor_impact_sorted() {
        let ledger = PenaltyLedger {
            items: vec![
                PenaltyItem {
                    category: PenaltyCategory::Preference,
                    instructor: "Ada".into(),
                    section_id: None,
                    period: None,
                    detail: String::new(),
                    points: 8,
                },
                PenaltyItem {
                    category: PenaltyCategory::Protected,
                    instructor: "Bob".into(),
                    section_id: None,
                    period: None,
                    detail: String::new(),
                    points: -2048,
                },
                PenaltyItem {
                    category: PenaltyCategory::TeachingDay,
                    instructor: "Cy".into(),
                    section_id: None,
                    period: None,
                    detail: String::new(),
                    points: -3,
                },
            ],
        };
        assert_eq!(
            ledger.instructor_impact(),
            vec![("Bob".to_string(), -2048), ("Ada".to_string(), 8)]
        );
    }
}

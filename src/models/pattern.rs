//! Meeting patterns and placements.
//!
//! A section's two regular meetings follow one of two shapes:
//!
//! - **Long block**: both meetings back to back on one day, forming the
//!   3-hour graduate format.
//! - **Paired**: the same slot on two different days, forming the
//!   1.5+1.5 hour undergraduate format.
//!
//! [`PatternRules`] decides which starts and day pairs are admissible;
//! [`PatternRules::catalogue`] enumerates them.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::{Day, Period, Slot};

/// Shape of a section's two regular meetings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeetingPattern {
    /// Part 1 at `(day, start)`, part 2 at the next slot of the same day.
    LongBlock { day: Day, start: Slot },
    /// Part 1 at `(first, slot)`, part 2 at `(second, slot)`.
    Paired { first: Day, second: Day, slot: Slot },
}

impl MeetingPattern {
    /// Builds a long block. `None` when `start` is the last slot of the day.
    pub fn long_block(day: Day, start: Slot) -> Option<Self> {
        start.next().map(|_| Self::LongBlock { day, start })
    }

    pub fn paired(first: Day, second: Day, slot: Slot) -> Self {
        Self::Paired { first, second, slot }
    }

    /// Periods of part 1 and part 2.
    pub fn periods(&self) -> [Period; 2] {
        match *self {
            Self::LongBlock { day, start } => {
                let second = start.next().unwrap_or(start);
                [Period::new(day, start), Period::new(day, second)]
            }
            Self::Paired { first, second, slot } => {
                [Period::new(first, slot), Period::new(second, slot)]
            }
        }
    }

    #[inline]
    pub fn is_long_block(&self) -> bool {
        matches!(self, Self::LongBlock { .. })
    }

    /// Adjacencies broken against a 3-hour format preference.
    ///
    /// A paired meeting in slot `s` leaves part 1 without a follower in
    /// `s + 1` (unless `s` is the last slot) and part 2 without a
    /// predecessor in `s - 1` (unless `s` is the first slot).
    pub fn split_adjacencies(&self) -> u32 {
        match *self {
            Self::LongBlock { .. } => 0,
            Self::Paired { slot, .. } => {
                u32::from(slot != Slot::LAST) + u32::from(slot != Slot::FIRST)
            }
        }
    }
}

impl fmt::Display for MeetingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b] = self.periods();
        match self {
            Self::LongBlock { .. } => write!(f, "{a}+{b}"),
            Self::Paired { .. } => write!(f, "{a}/{b}"),
        }
    }
}

/// A concrete choice for one section: its pattern and, for sections
/// with a third weekly meeting, that meeting's period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    pub pattern: MeetingPattern,
    pub extra: Option<Period>,
}

impl Placement {
    pub fn new(pattern: MeetingPattern) -> Self {
        Self {
            pattern,
            extra: None,
        }
    }

    pub fn with_extra(mut self, period: Period) -> Self {
        self.extra = Some(period);
        self
    }

    /// `(part, period)` for every meeting, parts numbered from 1.
    pub fn meetings(&self) -> impl Iterator<Item = (u8, Period)> + '_ {
        let [first, second] = self.pattern.periods();
        [(1, first), (2, second)]
            .into_iter()
            .chain(self.extra.map(|p| (3, p)))
    }

    /// Period of a given part.
    pub fn period_of(&self, part: u8) -> Option<Period> {
        self.meetings().find(|(p, _)| *p == part).map(|(_, period)| period)
    }
}

/// Long-block starts for one day, overriding the default list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStarts {
    pub day: Day,
    pub starts: Vec<Slot>,
}

/// Which meeting patterns a timetable admits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternRules {
    /// Long-block start slots on days without an override.
    pub long_block_starts: Vec<Slot>,
    /// Per-day long-block start slots.
    pub day_overrides: Vec<DayStarts>,
    /// Admissible `(first, second)` day pairs for paired meetings.
    pub paired_days: Vec<(Day, Day)>,
    /// Course levels (hundreds digit) that may not start at `early_slot`.
    pub no_early_start_levels: Vec<u32>,
    pub early_slot: Slot,
}

impl Default for PatternRules {
    fn default() -> Self {
        let slots = |numbers: &[u8]| -> Vec<Slot> {
            numbers.iter().filter_map(|&n| Slot::new(n)).collect()
        };
        Self {
            long_block_starts: slots(&[1, 7]),
            day_overrides: vec![DayStarts {
                day: Day::Friday,
                starts: slots(&[1, 4, 5, 6, 7, 8]),
            }],
            paired_days: vec![
                (Day::Monday, Day::Wednesday),
                (Day::Monday, Day::Thursday),
                (Day::Tuesday, Day::Thursday),
                (Day::Tuesday, Day::Friday),
                (Day::Wednesday, Day::Friday),
            ],
            no_early_start_levels: vec![7],
            early_slot: Slot::FIRST,
        }
    }
}

impl PatternRules {
    /// Long-block start slots admitted on `day`.
    pub fn starts_for(&self, day: Day) -> &[Slot] {
        self.day_overrides
            .iter()
            .find(|o| o.day == day)
            .map(|o| o.starts.as_slice())
            .unwrap_or(&self.long_block_starts)
    }

    /// Every admissible pattern, long blocks first in week order.
    ///
    /// Starts without a following slot are dropped.
    pub fn catalogue(&self) -> Vec<MeetingPattern> {
        let mut patterns: Vec<MeetingPattern> = Day::ALL
            .into_iter()
            .flat_map(|day| {
                self.starts_for(day)
                    .iter()
                    .filter_map(move |&start| MeetingPattern::long_block(day, start))
            })
            .collect();
        for &(first, second) in &self.paired_days {
            patterns.extend(Slot::all().map(|slot| MeetingPattern::paired(first, second, slot)));
        }
        let mut seen = HashSet::new();
        patterns.retain(|p| seen.insert(*p));
        patterns
    }

    /// Whether a course level may put part 1 at `slot`.
    pub fn allows_start(&self, level: u32, slot: Slot) -> bool {
        slot != self.early_slot || !self.no_early_start_levels.contains(&level)
    }
}

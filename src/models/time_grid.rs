//! Weekly teaching grid.
//!
//! The week has five teaching days and eight 90-minute slots per day,
//! giving 40 periods. Periods are written as a day letter followed by a
//! slot number (`M1` is Monday 8:30, `R7` is Thursday 6:00 PM).
//!
//! | Slot | Label |
//! |------|-------|
//! | 1 | 8:30-10:00 AM |
//! | 2 | 10:00-11:30 AM |
//! | 3 | 11:30-1:00 PM |
//! | 4 | 1:00-2:30 PM |
//! | 5 | 2:30-4:00 PM |
//! | 6 | 4:00-5:30 PM |
//! | 7 | 6:00-7:30 PM |
//! | 8 | 7:30-9:00 PM |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TimetableError;

/// Number of slots in a teaching day.
pub const SLOTS_PER_DAY: usize = 8;

/// Number of teaching days in a week.
pub const DAYS_PER_WEEK: usize = 5;

/// Number of periods in the weekly grid.
pub const PERIOD_COUNT: usize = SLOTS_PER_DAY * DAYS_PER_WEEK;

const SLOT_LABELS: [&str; SLOTS_PER_DAY] = [
    "8:30-10:00 AM",
    "10:00-11:30 AM",
    "11:30-1:00 PM",
    "1:00-2:30 PM",
    "2:30-4:00 PM",
    "4:00-5:30 PM",
    "6:00-7:30 PM",
    "7:30-9:00 PM",
];

/// A teaching day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    /// All teaching days in week order.
    pub const ALL: [Day; DAYS_PER_WEEK] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based position in the week.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Day at a zero-based week position.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Single-letter code (`M`, `T`, `W`, `R`, `F`).
    pub fn letter(self) -> char {
        match self {
            Day::Monday => 'M',
            Day::Tuesday => 'T',
            Day::Wednesday => 'W',
            Day::Thursday => 'R',
            Day::Friday => 'F',
        }
    }

    /// Parses a single-letter code. Case-sensitive: `R` is Thursday.
    pub fn from_letter(letter: char) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.letter() == letter)
    }

    /// Full English name.
    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }

    /// Parses a full day name, ignoring case and surrounding whitespace.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A slot within a teaching day, numbered 1 through 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

impl Slot {
    pub const FIRST: Slot = Slot(1);
    pub const LAST: Slot = Slot(SLOTS_PER_DAY as u8);

    /// Creates a slot from its 1-based number.
    pub fn new(number: u8) -> Option<Self> {
        (1..=SLOTS_PER_DAY as u8).contains(&number).then_some(Slot(number))
    }

    /// All slots in day order.
    pub fn all() -> impl Iterator<Item = Slot> {
        (1..=SLOTS_PER_DAY as u8).map(Slot)
    }

    /// 1-based slot number.
    #[inline]
    pub fn number(self) -> u8 {
        self.0
    }

    /// Zero-based position in the day.
    #[inline]
    pub fn index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// The slot that follows this one, if any.
    pub fn next(self) -> Option<Self> {
        Self::new(self.0 + 1)
    }

    /// Clock label, e.g. `8:30-10:00 AM`.
    pub fn label(self) -> &'static str {
        SLOT_LABELS[self.index()]
    }

    /// Looks a slot up by its clock label.
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        SLOT_LABELS
            .iter()
            .position(|l| *l == label)
            .map(|i| Slot(i as u8 + 1))
    }
}

impl TryFrom<u8> for Slot {
    type Error = TimetableError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        Slot::new(number).ok_or_else(|| TimetableError::InvalidSlot(number.to_string()))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

/// One teaching period: a slot on a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub day: Day,
    pub slot: Slot,
}

impl Period {
    /// Creates a period.
    pub fn new(day: Day, slot: Slot) -> Self {
        Self { day, slot }
    }

    /// Dense index in `0..PERIOD_COUNT`, day-major.
    #[inline]
    pub fn index(self) -> usize {
        self.day.index() * SLOTS_PER_DAY + self.slot.index()
    }

    /// Inverse of [`Period::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        let day = Day::from_index(index / SLOTS_PER_DAY)?;
        let slot = Slot::new((index % SLOTS_PER_DAY) as u8 + 1)?;
        Some(Self { day, slot })
    }

    /// Every period of the week in day-major order.
    pub fn all() -> impl Iterator<Item = Period> {
        Day::ALL
            .into_iter()
            .flat_map(|day| Slot::all().map(move |slot| Period { day, slot }))
    }

    /// The period right after this one on the same day.
    pub fn next(self) -> Option<Self> {
        self.slot.next().map(|slot| Period { day: self.day, slot })
    }

    /// Two-character code such as `M1`.
    pub fn code(self) -> String {
        format!("{}{}", self.day.letter(), self.slot.number())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.day.letter(), self.slot.number())
    }
}

impl FromStr for Period {
    type Err = TimetableError;

    /// Parses a period code. Characters after the slot digit are ignored.
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        let mut chars = code.trim().chars();
        let day = chars.next().and_then(Day::from_letter);
        let slot = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .and_then(|n| Slot::new(n as u8));
        match (day, slot) {
            (Some(day), Some(slot)) => Ok(Period { day, slot }),
            _ => Err(TimetableError::InvalidPeriod(code.to_string())),
        }
    }
}

impl TryFrom<String> for Period {
    type Error = TimetableError;

    fn try_from(code: String) -> Result<Self, Self::Error> {
        code.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.code()
    }
}

/// Result of parsing a pipe-delimited period list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodList {
    /// Periods recognized in the list, in input order.
    pub periods: Vec<Period>,
    /// Codes that were skipped (too short, unknown day letter, or bad slot).
    pub skipped: Vec<String>,
}

/// Parses a list such as `|M1|T3|R7|`.
///
/// Empty pieces are ignored. Pieces shorter than two characters and
/// pieces naming a day outside the teaching week (e.g. `S1`) are
/// collected in [`PeriodList::skipped`] rather than failing the parse.
pub fn parse_period_list(text: &str) -> PeriodList {
    let mut list = PeriodList::default();
    for piece in text.split('|').map(str::trim).filter(|p| !p.is_empty()) {
        if piece.chars().count() < 2 {
            list.skipped.push(piece.to_string());
            continue;
        }
        match piece.parse::<Period>() {
            Ok(period) => list.periods.push(period),
            Err(_) => list.skipped.push(piece.to_string()),
        }
    }
    list
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(code: &str) -> Period {
        code.parse().unwrap()
    }

    #[test]
    fn test_day_letters_round_trip() {
        for day in Day::ALL {
            assert_eq!(Day::from_letter(day.letter()), Some(day));
        }
        assert_eq!(Day::from_letter('R'), Some(Day::Thursday));
        assert_eq!(Day::from_letter('S'), None);
    }

    #[test]
    fn test_day_from_name() {
        assert_eq!(Day::from_name(" wednesday "), Some(Day::Wednesday));
        assert_eq!(Day::from_name("Saturday"), None);
    }

    #[test]
    fn test_slot_bounds_and_labels() {
        assert!(Slot::new(0).is_none());
        assert!(Slot::new(9).is_none());
        assert_eq!(Slot::FIRST.label(), "8:30-10:00 AM");
        assert_eq!(Slot::LAST.label(), "7:30-9:00 PM");
        assert_eq!(Slot::LAST.next(), None);
        assert_eq!(Slot::from_label("4:00-5:30 PM"), Slot::new(6));
        assert_eq!(Slot::from_label("5:00 PM"), None);
    }

    #[test]
    fn test_period_index_is_dense() {
        let all: Vec<Period> = Period::all().collect();
        assert_eq!(all.len(), PERIOD_COUNT);
        for (i, period) in all.iter().enumerate() {
            assert_eq!(period.index(), i);
            assert_eq!(Period::from_index(i), Some(*period));
        }
        assert_eq!(Period::from_index(PERIOD_COUNT), None);
    }

    #[test]
    fn test_period_parse() {
        let period = p("R7");
        assert_eq!(period.day, Day::Thursday);
        assert_eq!(period.slot.number(), 7);
        assert_eq!(period.to_string(), "R7");
        assert!("X1".parse::<Period>().is_err());
        assert!("M9".parse::<Period>().is_err());
        assert!("M".parse::<Period>().is_err());
    }

    #[test]
    fn test_period_next_stays_on_day() {
        assert_eq!(p("M1").next(), Some(p("M2")));
        assert_eq!(p("M8").next(), None);
    }

    #[test]
    fn test_parse_period_list_skips_unknown() {
        let list = parse_period_list("|M1|T3|S2|R|F8|");
        assert_eq!(list.periods, vec![p("M1"), p("T3"), p("F8")]);
        assert_eq!(list.skipped, vec!["S2".to_string(), "R".to_string()]);
    }

    #[test]
    fn test_parse_period_list_without_outer_pipes() {
        let list = parse_period_list("W2|W3");
        assert_eq!(list.periods, vec![p("W2"), p("W3")]);
        assert!(list.skipped.is_empty());
    }

    #[test]
    fn test_period_serde_as_code() {
        let json = serde_json::to_string(&p("F4")).unwrap();
        assert_eq!(json, "\"F4\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p("F4"));
        assert!(serde_json::from_str::<Period>("\"Q4\"").is_err());
    }
}

//! Instructor preferences.
//!
//! Each instructor may list periods with a preference type. Ranked
//! preferences earn points when a meeting lands on them, while
//! protected periods (health, religion) and childcare periods cost
//! heavily when used. The weights live in [`PenaltyWeights`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Period;

/// Classification of an instructor's slot entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferenceKind {
    /// Medical unavailability.
    Health,
    /// Religious observance.
    Religion,
    /// First-choice period.
    Pref1,
    /// Second-choice period.
    Pref2,
    /// Third-choice period.
    Pref3,
    /// Childcare conflict.
    Childcare,
    /// Any other declared conflict.
    Other(String),
}

impl PreferenceKind {
    /// Parses the type half of a `"<email>: <Type>"` entry.
    pub fn parse(text: &str) -> Self {
        match text.trim() {
            "Health" => Self::Health,
            "Religion" => Self::Religion,
            "Pref-1" => Self::Pref1,
            "Pref-2" => Self::Pref2,
            "Pref-3" => Self::Pref3,
            "Childcare" => Self::Childcare,
            other => Self::Other(other.to_string()),
        }
    }

    /// Points earned (positive) or lost (negative) per meeting placed on
    /// one of the listed periods.
    pub fn points(&self, weights: &PenaltyWeights) -> i64 {
        match self {
            Self::Health | Self::Religion => weights.protected,
            Self::Pref1 => weights.pref1,
            Self::Pref2 => weights.pref2,
            Self::Pref3 => weights.pref3,
            Self::Childcare => weights.childcare,
            Self::Other(_) => weights.other_conflict,
        }
    }

    /// Health and religion entries are reported apart from other penalties.
    pub fn is_protected(&self) -> bool {
        matches!(self, Self::Health | Self::Religion)
    }

    /// Ranked preferences earn points; everything else is a conflict.
    pub fn is_preference(&self) -> bool {
        matches!(self, Self::Pref1 | Self::Pref2 | Self::Pref3)
    }
}

impl fmt::Display for PreferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Health => f.write_str("Health"),
            Self::Religion => f.write_str("Religion"),
            Self::Pref1 => f.write_str("Pref-1"),
            Self::Pref2 => f.write_str("Pref-2"),
            Self::Pref3 => f.write_str("Pref-3"),
            Self::Childcare => f.write_str("Childcare"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// A set of periods sharing one preference type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPreference {
    pub kind: PreferenceKind,
    pub periods: Vec<Period>,
}

impl SlotPreference {
    pub fn new(kind: PreferenceKind, periods: Vec<Period>) -> Self {
        Self { kind, periods }
    }
}

/// Preferred meeting format for an instructor's sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatPreference {
    /// One 3-hour meeting (two consecutive slots on one day).
    LongBlock,
    /// Two 90-minute meetings on different days.
    Split,
}

impl FormatPreference {
    /// Parses the general-preferences answer. Unrecognized answers mean
    /// no format preference.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "3-hour format" => Some(Self::LongBlock),
            "1.5+1.5 hour format" => Some(Self::Split),
            _ => None,
        }
    }
}

/// How an instructor wants teaching days arranged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayPreference {
    /// Fewer teaching days are strongly preferred.
    Condensed,
    #[default]
    Indifferent,
}

impl DayPreference {
    const CONDENSED_ANSWER: &'static str = "I prefer to condense my sections into fewer days";

    pub fn parse(text: &str) -> Self {
        if text.trim() == Self::CONDENSED_ANSWER {
            Self::Condensed
        } else {
            Self::Indifferent
        }
    }
}

/// Point values for every soft objective term.
///
/// Positive values reward, negative values penalize. The solver
/// maximizes the sum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyWeights {
    pub pref1: i64,
    pub pref2: i64,
    pub pref3: i64,
    pub childcare: i64,
    /// Health and religion periods.
    pub protected: i64,
    pub other_conflict: i64,
    /// Per violated adjacency against the instructor's format preference.
    pub format_mismatch: i64,
    /// Per teaching day for instructors who prefer condensed days.
    pub condensed_day: i64,
    /// Per teaching day for everybody else.
    pub regular_day: i64,
    /// Per long-block section for instructors who declined back-to-back slots.
    pub long_block_aversion: i64,
}

impl Default for PenaltyWeights {
    fn default() -> Self {
        Self {
            pref1: 8,
            pref2: 4,
            pref3: 2,
            childcare: -1024,
            protected: -2048,
            other_conflict: -8,
            format_mismatch: -8,
            condensed_day: -8,
            regular_day: -3,
            long_block_aversion: -2048,
        }
    }
}

impl PenaltyWeights {
    /// Points per teaching day for the given day preference.
    pub fn day_points(&self, preference: DayPreference) -> i64 {
        match preference {
            DayPreference::Condensed => self.condensed_day,
            DayPreference::Indifferent => self.regular_day,
        }
    }
}

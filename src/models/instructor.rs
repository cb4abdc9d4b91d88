//! Instructor model.

use serde::{Deserialize, Serialize};

use super::{DayPreference, FormatPreference, Period, SlotPreference};

/// A teaching instructor together with everything the solver must
/// respect or try to honor for them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instructor {
    /// Display name, as used on the assignment sheet.
    pub name: String,
    /// Contact email; preference sheets refer to instructors by email.
    pub email: String,
    /// Preferred meeting format, if stated.
    pub format: Option<FormatPreference>,
    /// Day arrangement preference.
    pub days: DayPreference,
    /// Declined back-to-back (3-hour) meetings.
    pub avoid_long_blocks: bool,
    /// Ranked preferences and declared conflicts.
    pub slot_preferences: Vec<SlotPreference>,
    /// Periods already taken by commitments outside this timetable.
    pub blocked: Vec<Period>,
}

impl Instructor {
    /// Creates an instructor with no preferences.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            format: None,
            days: DayPreference::Indifferent,
            avoid_long_blocks: false,
            slot_preferences: Vec::new(),
            blocked: Vec::new(),
        }
    }

    pub fn with_format(mut self, format: FormatPreference) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_days(mut self, days: DayPreference) -> Self {
        self.days = days;
        self
    }

    pub fn with_long_block_aversion(mut self) -> Self {
        self.avoid_long_blocks = true;
        self
    }

    pub fn with_slot_preference(mut self, preference: SlotPreference) -> Self {
        self.slot_preferences.push(preference);
        self
    }

    pub fn with_blocked(mut self, period: Period) -> Self {
        self.block(period);
        self
    }

    /// Marks a period as unavailable. Duplicates are ignored.
    pub fn block(&mut self, period: Period) {
        if !self.blocked.contains(&period) {
            self.blocked.push(period);
        }
    }

    /// Whether the instructor is free to teach at `period`.
    pub fn is_available(&self, period: Period) -> bool {
        !self.blocked.contains(&period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PreferenceKind;

    #[test]
    fn test_instructor_builder() {
        let m1: Period = "M1".parse().unwrap();
        let inst = Instructor::new("Ada", "ada@uni.edu")
            .with_format(FormatPreference::Split)
            .with_days(DayPreference::Condensed)
            .with_long_block_aversion()
            .with_slot_preference(SlotPreference::new(PreferenceKind::Pref1, vec![m1]))
            .with_blocked("T2".parse().unwrap());

        assert_eq!(inst.format, Some(FormatPreference::Split));
        assert!(inst.avoid_long_blocks);
        assert_eq!(inst.slot_preferences.len(), 1);
        assert!(inst.is_available(m1));
        assert!(!inst.is_available("T2".parse().unwrap()));
    }

    #[test]
    fn test_block_ignores_duplicates() {
        let mut inst = Instructor::new("Ada", "ada@uni.edu");
        let w3: Period = "W3".parse().unwrap();
        inst.block(w3);
        inst.block(w3);
        assert_eq!(inst.blocked, vec![w3]);
    }
}

//! Timetabling constraints.
//!
//! Defines the rule objects that shape a valid timetable beyond the
//! meeting patterns themselves: course blocks that students take
//! together, off-site sections that need an evening slot and travel
//! time, and periods reserved for a class of sections.
//!
//! [`HardConstraint`] names every global hard rule the solver counts.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", Section 3

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Period, Section, Slot};

/// Courses that are commonly taken in the same semester.
///
/// For any two different courses of the block, at most
/// `max_concurrent` of their meetings with the same part number may
/// share a period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseBlock {
    pub name: String,
    pub courses: Vec<String>,
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: u32,
}

fn default_max_concurrent() -> u32 {
    1
}

impl CourseBlock {
    /// Creates a block that allows no overlap.
    pub fn new<I, S>(name: impl Into<String>, courses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            courses: courses.into_iter().map(Into::into).collect(),
            max_concurrent: 1,
        }
    }

    pub fn with_max_concurrent(mut self, max: u32) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn contains(&self, course: &str) -> bool {
        self.courses.iter().any(|c| c == course)
    }

    /// Unordered pairs of distinct courses in the block.
    pub fn course_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs = Vec::new();
        for (i, a) in self.courses.iter().enumerate() {
            for b in &self.courses[i + 1..] {
                if a != b {
                    pairs.push((a.as_str(), b.as_str()));
                }
            }
        }
        pairs
    }
}

/// Rule for sections taught at a remote campus.
///
/// Such sections meet only as an evening long block starting at
/// `start_slot`. Instructors teaching one need the `buffer_slot` free
/// that day for travel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsiteRule {
    /// Section type that marks an off-site section (case-insensitive).
    pub section_type: String,
    pub start_slot: Slot,
    pub max_sections_per_day: u32,
    /// Slot an off-site instructor may not teach on campus that day.
    pub buffer_slot: Option<Slot>,
    /// Whether off-site meetings are left out of balance counts.
    pub exclude_from_balance: bool,
}

impl OffsiteRule {
    pub fn applies_to(&self, section: &Section) -> bool {
        section.has_type(&self.section_type)
    }

    /// Slot of the second meeting (the slot after `start_slot`).
    pub fn end_slot(&self) -> Option<Slot> {
        self.start_slot.next()
    }
}

impl Default for OffsiteRule {
    fn default() -> Self {
        Self {
            section_type: "Jersey City".to_string(),
            start_slot: Slot::new(7).unwrap_or(Slot::LAST),
            max_sections_per_day: 3,
            buffer_slot: Slot::new(6),
            exclude_from_balance: true,
        }
    }
}

/// A period open only to sections meeting a size and level bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestrictedPeriod {
    pub period: Period,
    /// Smallest course number allowed.
    pub min_course_number: u32,
    /// Largest capacity allowed. Sections without a capacity are excluded.
    pub max_capacity: u32,
}

impl RestrictedPeriod {
    pub fn admits(&self, section: &Section) -> bool {
        section.course_number() >= self.min_course_number
            && section.capacity.is_some_and(|c| c <= self.max_capacity)
    }
}

/// Global hard constraints counted by the solver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardConstraint {
    /// An instructor teaches two meetings in one period.
    InstructorConflict,
    /// A period holds more meetings than its balance cap.
    BalanceCap,
    /// An evening slot exceeds its week-wide share.
    EveningCap,
    /// Too many early/late meetings for one instructor on one day.
    RestrictedSlots,
    /// An instructor teaches a full run of consecutive slots.
    ConsecutiveSlots,
    /// Two courses of a block overlap beyond the block's limit.
    BlockOverlap,
    /// Too many off-site sections on one day.
    OffsiteDailyCap,
    /// An off-site instructor teaches on campus in the travel slot.
    TravelBuffer,
}

impl HardConstraint {
    pub const ALL: [HardConstraint; 8] = [
        HardConstraint::InstructorConflict,
        HardConstraint::BalanceCap,
        HardConstraint::EveningCap,
        HardConstraint::RestrictedSlots,
        HardConstraint::ConsecutiveSlots,
        HardConstraint::BlockOverlap,
        HardConstraint::OffsiteDailyCap,
        HardConstraint::TravelBuffer,
    ];

    pub fn description(self) -> &'static str {
        match self {
            Self::InstructorConflict => "instructor double-booked",
            Self::BalanceCap => "period over balance cap",
            Self::EveningCap => "evening slot over weekly share",
            Self::RestrictedSlots => "too many early/late meetings in a day",
            Self::ConsecutiveSlots => "too many consecutive slots",
            Self::BlockOverlap => "course block overlap",
            Self::OffsiteDailyCap => "too many off-site sections in a day",
            Self::TravelBuffer => "no travel buffer before off-site section",
        }
    }
}

impl fmt::Display for HardConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_pairs() {
        let block = CourseBlock::new("core", ["CS101", "CS102", "CS103"]);
        assert_eq!(
            block.course_pairs(),
            vec![("CS101", "CS102"), ("CS101", "CS103"), ("CS102", "CS103")]
        );
        assert!(block.contains("CS102"));
        assert!(!block.contains("CS999"));
        assert_eq!(block.max_concurrent, 1);
    }

    #[test]
    fn test_block_pairs_skip_repeated_course() {
        let block = CourseBlock::new("dup", ["CS1", "CS1"]).with_max_concurrent(2);
        assert!(block.course_pairs().is_empty());
        assert_eq!(block.max_concurrent, 2);
    }

    #[test]
    fn test_block_toml_default_limit() {
        let block: CourseBlock = toml::from_str(
            r#"
            name = "it"
            courses = ["IT120", "IT240"]
            "#,
        )
        .unwrap();
        assert_eq!(block.max_concurrent, 1);
    }

    #[test]
    fn test_offsite_rule() {
        let rule = OffsiteRule::default();
        let jc = Section::new("CS100", "Ada", "a@x", 1).with_section_type("JERSEY CITY");
        let campus = Section::new("CS100", "Ada", "a@x", 2);
        assert!(rule.applies_to(&jc));
        assert!(!rule.applies_to(&campus));
        assert_eq!(rule.start_slot.number(), 7);
        assert_eq!(rule.end_slot().map(|s| s.number()), Some(8));
    }

    #[test]
    fn test_restricted_period_admits() {
        let rule = RestrictedPeriod {
            period: "M6".parse().unwrap(),
            min_course_number: 200,
            max_capacity: 34,
        };
        let upper_small = Section::new("CS341", "Ada", "a@x", 1).with_capacity(30);
        let upper_large = Section::new("CS341", "Ada", "a@x", 2).with_capacity(35);
        let lower = Section::new("CS100", "Ada", "a@x", 1).with_capacity(20);
        let unknown = Section::new("CS341", "Ada", "a@x", 3);
        assert!(rule.admits(&upper_small));
        assert!(!rule.admits(&upper_large));
        assert!(!rule.admits(&lower));
        assert!(!rule.admits(&unknown));
    }
}

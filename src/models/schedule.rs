//! Schedule (solution) model.
//!
//! A schedule is a complete assignment of section meetings to weekly
//! periods. It may include constraint violations when the solver could
//! not satisfy every hard rule.
//!
//! # Reference
//! Schaerf (1999), "A Survey of Automated Timetabling", Section 2

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{Day, HardConstraint, Period};

/// A complete weekly timetable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    /// Placed meetings.
    pub assignments: Vec<Assignment>,
    /// Constraint violations detected in this schedule.
    pub violations: Vec<Violation>,
    /// Soft objective value (points).
    pub objective: i64,
}

/// One placed meeting of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub section_id: String,
    /// Course code (denormalized for query convenience).
    pub course: String,
    pub instructor: String,
    pub email: String,
    /// Section number within course and instructor.
    pub section_number: u32,
    /// Meeting number within the section, from 1.
    pub part: u8,
    pub period: Period,
    pub capacity: Option<u32>,
    pub section_type: String,
}

/// A constraint violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Related entity (instructor, period, course pair, or day).
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
    /// Amount by which the limit is exceeded.
    pub excess: u32,
    /// Severity (0-100, higher = worse).
    pub severity: i32,
}

/// Classification of constraint violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// One of the global hard rules.
    Hard(HardConstraint),
    /// Domain-specific violation.
    Custom(String),
}

impl Assignment {
    /// Creates an assignment with no capacity or section type.
    pub fn new(
        section_id: impl Into<String>,
        course: impl Into<String>,
        instructor: impl Into<String>,
        part: u8,
        period: Period,
    ) -> Self {
        Self {
            section_id: section_id.into(),
            course: course.into(),
            instructor: instructor.into(),
            email: String::new(),
            section_number: 1,
            part,
            period,
            capacity: None,
            section_type: String::new(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_section_number(mut self, number: u32) -> Self {
        self.section_number = number;
        self
    }

    pub fn with_capacity(mut self, capacity: Option<u32>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_section_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = section_type.into();
        self
    }

    #[inline]
    pub fn day(&self) -> Day {
        self.period.day
    }
}

impl Violation {
    /// Creates a hard-rule violation. Severity follows the rule.
    pub fn hard(
        constraint: HardConstraint,
        entity_id: impl Into<String>,
        message: impl Into<String>,
        excess: u32,
    ) -> Self {
        let severity = match constraint {
            HardConstraint::InstructorConflict => 100,
            HardConstraint::BlockOverlap | HardConstraint::TravelBuffer => 90,
            HardConstraint::RestrictedSlots | HardConstraint::ConsecutiveSlots => 80,
            HardConstraint::OffsiteDailyCap => 75,
            HardConstraint::BalanceCap | HardConstraint::EveningCap => 70,
        };
        Self {
            violation_type: ViolationType::Hard(constraint),
            entity_id: entity_id.into(),
            message: message.into(),
            excess,
            severity,
        }
    }

    /// Creates a custom violation.
    pub fn custom(
        kind: impl Into<String>,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type: ViolationType::Custom(kind.into()),
            entity_id: entity_id.into(),
            message: message.into(),
            excess: 1,
            severity: 50,
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Adds a violation.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Whether the schedule has no violations.
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Sum of violation excesses.
    pub fn total_excess(&self) -> u32 {
        self.violations.iter().map(|v| v.excess).sum()
    }

    /// Returns all meetings of a section, in part order.
    pub fn assignments_for_section(&self, section_id: &str) -> Vec<&Assignment> {
        let mut found: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.section_id == section_id)
            .collect();
        found.sort_by_key(|a| a.part);
        found
    }

    /// Returns all meetings taught by an instructor.
    pub fn assignments_for_instructor(&self, instructor: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.instructor == instructor)
            .collect()
    }

    /// Returns all meetings of a course.
    pub fn assignments_for_course(&self, course: &str) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.course == course)
            .collect()
    }

    /// Returns the meetings placed at a period.
    pub fn assignments_at(&self, period: Period) -> Vec<&Assignment> {
        self.assignments
            .iter()
            .filter(|a| a.period == period)
            .collect()
    }

    /// Days on which an instructor teaches, in week order.
    pub fn teaching_days(&self, instructor: &str) -> BTreeSet<Day> {
        self.assignments_for_instructor(instructor)
            .iter()
            .map(|a| a.day())
            .collect()
    }

    /// Teaching days for every instructor with assignments.
    pub fn all_teaching_days(&self) -> BTreeMap<String, BTreeSet<Day>> {
        let mut days: BTreeMap<String, BTreeSet<Day>> = BTreeMap::new();
        for a in &self.assignments {
            days.entry(a.instructor.clone()).or_default().insert(a.day());
        }
        days
    }

    /// Number of distinct sections.
    pub fn section_count(&self) -> usize {
        self.assignments
            .iter()
            .map(|a| a.section_id.as_str())
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(code: &str) -> Period {
        code.parse().unwrap()
    }

    fn sample_schedule() -> Schedule {
        let mut s = Schedule::new();
        s.add_assignment(Assignment::new("CS100/Ada/1", "CS100", "Ada", 1, p("M2")));
        s.add_assignment(Assignment::new("CS100/Ada/1", "CS100", "Ada", 2, p("W2")));
        s.add_assignment(Assignment::new("CS631/Ada/1", "CS631", "Ada", 2, p("R8")));
        s.add_assignment(Assignment::new("CS631/Ada/1", "CS631", "Ada", 1, p("R7")));
        s.add_assignment(Assignment::new("CS200/Bob/1", "CS200", "Bob", 1, p("M2")));
        s.add_assignment(Assignment::new("CS200/Bob/1", "CS200", "Bob", 2, p("R2")));
        s
    }

    #[test]
    fn test_schedule_is_valid() {
        let s = sample_schedule();
        assert!(s.is_valid());

        let mut s2 = sample_schedule();
        s2.add_violation(Violation::hard(
            HardConstraint::InstructorConflict,
            "Ada",
            "two meetings at M2",
            1,
        ));
        assert!(!s2.is_valid());
        assert_eq!(s2.total_excess(), 1);
    }

    #[test]
    fn test_assignments_for_section_sorted_by_part() {
        let s = sample_schedule();
        let parts: Vec<u8> = s
            .assignments_for_section("CS631/Ada/1")
            .iter()
            .map(|a| a.part)
            .collect();
        assert_eq!(parts, vec![1, 2]);
        assert!(s.assignments_for_section("CS999/X/1").is_empty());
    }

    #[test]
    fn test_queries() {
        let s = sample_schedule();
        assert_eq!(s.assignments_for_instructor("Ada").len(), 4);
        assert_eq!(s.assignments_for_course("CS200").len(), 2);
        assert_eq!(s.assignments_at(p("M2")).len(), 2);
        assert_eq!(s.section_count(), 3);
        assert_eq!(s.assignment_count(), 6);
    }

    #[test]
    fn test_teaching_days() {
        let s = sample_schedule();
        let ada: Vec<Day> = s.teaching_days("Ada").into_iter().collect();
        assert_eq!(ada, vec![Day::Monday, Day::Wednesday, Day::Thursday]);
        let all = s.all_teaching_days();
        assert_eq!(all["Bob"].len(), 2);
    }

    #[test]
    fn test_violation_factories() {
        let v1 = Violation::hard(HardConstraint::InstructorConflict, "Ada", "clash", 1);
        assert_eq!(
            v1.violation_type,
            ViolationType::Hard(HardConstraint::InstructorConflict)
        );
        assert_eq!(v1.severity, 100);

        let v2 = Violation::hard(HardConstraint::BalanceCap, "M2", "over", 2);
        assert_eq!(v2.excess, 2);
        assert!(v2.severity < v1.severity);

        let v3 = Violation::custom("room", "CS100", "no room");
        assert_eq!(v3.violation_type, ViolationType::Custom("room".into()));
    }
}

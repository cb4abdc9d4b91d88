//! Course section model.
//!
//! A section is the unit the solver places: one instructor teaching one
//! group of students for a course, meeting two (occasionally three)
//! times a week.

use serde::{Deserialize, Serialize};

/// A schedulable course section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Unique ID: `COURSE/INSTRUCTOR/n`.
    pub id: String,
    /// Course code, e.g. `CS631`.
    pub course: String,
    /// Instructor name.
    pub instructor: String,
    /// Instructor email.
    pub email: String,
    /// 1-based number within the course and instructor.
    pub number: u32,
    /// Enrollment capacity, if known.
    pub capacity: Option<u32>,
    /// Free-text delivery type (e.g. `Face-to-Face`, `Jersey City`).
    pub section_type: String,
    /// Weekly meetings.
    pub meetings: u8,
}

impl Section {
    /// Standard two-meeting section.
    pub fn new(
        course: impl Into<String>,
        instructor: impl Into<String>,
        email: impl Into<String>,
        number: u32,
    ) -> Self {
        let course = course.into();
        let instructor = instructor.into();
        Self {
            id: format!("{course}/{instructor}/{number}"),
            course,
            instructor,
            email: email.into(),
            number,
            capacity: None,
            section_type: String::new(),
            meetings: 2,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_section_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = section_type.into();
        self
    }

    pub fn with_meetings(mut self, meetings: u8) -> Self {
        self.meetings = meetings;
        self
    }

    /// Numeric part of the course code.
    pub fn course_number(&self) -> u32 {
        course_number(&self.course)
    }

    /// Hundreds digit of the course number (7 for graduate `CS7xx`).
    pub fn course_level(&self) -> u32 {
        course_level(&self.course)
    }

    /// Case-insensitive section-type match.
    pub fn has_type(&self, section_type: &str) -> bool {
        self.section_type.trim().eq_ignore_ascii_case(section_type.trim())
    }
}

/// First run of digits in a course code; 0 when there is none.
pub fn course_number(course: &str) -> u32 {
    course
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .fold(0u32, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(c.to_digit(10).unwrap_or(0))
        })
}

/// Hundreds digit of the course number.
pub fn course_level(course: &str) -> u32 {
    (course_number(course) / 100) % 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_number() {
        assert_eq!(course_number("CS732"), 732);
        assert_eq!(course_number("IT120"), 120);
        assert_eq!(course_number("DS675-H"), 675);
        assert_eq!(course_number("SEMINAR"), 0);
    }

    #[test]
    fn test_course_level() {
        assert_eq!(course_level("CS732"), 7);
        assert_eq!(course_level("CS100"), 1);
        assert_eq!(course_level("CS99"), 0);
    }

    #[test]
    fn test_section_id_and_builder() {
        let s = Section::new("CS100", "Ada", "ada@uni.edu", 2)
            .with_capacity(30)
            .with_section_type("Jersey City");
        assert_eq!(s.id, "CS100/Ada/2");
        assert_eq!(s.capacity, Some(30));
        assert_eq!(s.meetings, 2);
        assert!(s.has_type("jersey city"));
        assert!(!s.has_type("online"));
    }
}

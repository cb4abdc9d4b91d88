//! Input validation for timetabling problems.
//!
//! Checks structural integrity of a workbook and policy before any
//! section is built. Detects:
//! - Duplicate faculty records
//! - Assignment rows naming an instructor absent from the faculty sheet
//! - Pre-scheduled rows with an unknown day or time label
//! - Malformed preference entries
//! - Policy values that make the problem meaningless
//!
//! All issues are collected so a single run reports everything that
//! needs fixing.

use std::collections::{HashMap, HashSet};

use crate::input::Workbook;
use crate::models::{Day, Slot};
use crate::policy::Policy;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two faculty rows share the same instructor name.
    DuplicateFaculty,
    /// A faculty row has no email.
    MissingEmail,
    /// An assignment row names an instructor not on the faculty sheet.
    UnknownInstructor,
    /// A pre-scheduled row has an unknown day or time label.
    InvalidPreScheduled,
    /// A preference entry is not of the form `email: Type`.
    MalformedPreference,
    /// A policy value is out of range.
    InvalidPolicy,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates a workbook against a policy.
///
/// Checks:
/// 1. Faculty names are unique and every faculty row has an email
/// 2. Every instructor teaching a course has a faculty record
/// 3. Pre-scheduled rows name a known day and time label
/// 4. Preference entries split into `email: Type`
/// 5. Policy shares, blocks, and off-site rules are usable
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_workbook(workbook: &Workbook, policy: &Policy) -> ValidationResult {
    let mut errors = Vec::new();

    // Faculty directory
    let mut faculty: HashMap<&str, &str> = HashMap::new();
    for row in &workbook.faculty {
        let name = row.instructor.trim();
        if faculty.insert(name, row.email.trim()).is_some() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateFaculty,
                format!("Duplicate faculty record: {name}"),
            ));
        }
        if row.email.trim().is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingEmail,
                format!("Faculty record '{name}' has no email"),
            ));
        }
    }

    // Assignment rows
    let mut reported = HashSet::new();
    for row in workbook.assignment_rows() {
        let name = row.instructor.trim();
        if !faculty.contains_key(name) && reported.insert(name) {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownInstructor,
                format!(
                    "Instructor '{name}' teaches {} but has no faculty record",
                    row.course_code()
                ),
            ));
        }
    }

    // Pre-scheduled commitments
    for row in &workbook.pre_scheduled {
        if Day::from_name(&row.day).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPreScheduled,
                format!("Pre-scheduled row for '{}' has unknown day '{}'", row.instructor, row.day),
            ));
        }
        if Slot::from_label(&row.time).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPreScheduled,
                format!(
                    "Pre-scheduled row for '{}' has unknown time '{}'",
                    row.instructor, row.time
                ),
            ));
        }
    }

    // Preference entries
    for row in &workbook.constraints {
        if let Some(entry) = row.entry() {
            if !entry.contains(": ") {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MalformedPreference,
                    format!("Preference entry '{entry}' is not 'email: Type'"),
                ));
            }
        }
    }

    validate_policy(policy, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_policy(policy: &Policy, errors: &mut Vec<ValidationError>) {
    let invalid = |message: String| ValidationError::new(ValidationErrorKind::InvalidPolicy, message);

    if policy.balance.divisor <= 0.0 {
        errors.push(invalid(format!(
            "Balance divisor must be positive, got {}",
            policy.balance.divisor
        )));
    }
    let shares = std::iter::once(policy.balance.default_share)
        .chain(policy.balance.overrides.iter().map(|o| o.share))
        .chain(std::iter::once(policy.evening.share));
    for share in shares {
        if !(0.0..=policy.balance.divisor.max(1.0)).contains(&share) {
            errors.push(invalid(format!("Share {share} is out of range")));
        }
    }
    if policy.load.max_consecutive_slots == 0 {
        errors.push(invalid("max_consecutive_slots must be at least 1".into()));
    }
    if policy.patterns.catalogue().is_empty() {
        errors.push(invalid("Pattern rules admit no meeting pattern".into()));
    }
    for block in &policy.blocks {
        if block.course_pairs().is_empty() {
            errors.push(invalid(format!(
                "Course block '{}' needs at least two distinct courses",
                block.name
            )));
        }
        if block.max_concurrent == 0 {
            errors.push(invalid(format!(
                "Course block '{}' has max_concurrent 0",
                block.name
            )));
        }
    }
    for rule in &policy.offsite {
        if rule.end_slot().is_none() {
            errors.push(invalid(format!(
                "Off-site rule '{}' starts in the last slot of the day",
                rule.section_type
            )));
        }
    }
}

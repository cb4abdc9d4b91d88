//! Workbook input.
//!
//! The department keeps its planning data in a spreadsheet with five
//! sheets. The solver reads the same data as a JSON document holding one
//! array per sheet; field names accept both snake_case and the spreadsheet
//! column headers, so an exported sheet can be used as is.
//!
//! | Sheet | JSON key | Row |
//! |-------|----------|-----|
//! | Assignments | `assignments` | [`AssignmentRow`] |
//! | Faculty | `faculty` | [`FacultyRow`] |
//! | pre-scheduled | `pre_scheduled` | [`PreScheduledRow`] |
//! | Constraints & Preferences | `constraints` | [`ConstraintRow`] |
//! | General Preferences | `general_preferences` | [`GeneralPreferenceRow`] |

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::{Result, TimetableError};
use crate::models::{
    parse_period_list, Day, DayPreference, FormatPreference, Instructor, Period, PreferenceKind,
    Section, Slot, SlotPreference,
};
use crate::policy::Policy;
use crate::validation::validate_workbook;

/// Raw planning data, one vector per sheet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Workbook {
    #[serde(alias = "Assignments")]
    pub assignments: Vec<AssignmentRow>,
    #[serde(alias = "Faculty")]
    pub faculty: Vec<FacultyRow>,
    #[serde(alias = "pre-scheduled", alias = "Pre-Scheduled")]
    pub pre_scheduled: Vec<PreScheduledRow>,
    #[serde(alias = "Constraints & Preferences")]
    pub constraints: Vec<ConstraintRow>,
    #[serde(alias = "General Preferences")]
    pub general_preferences: Vec<GeneralPreferenceRow>,
}

/// One row of the assignment sheet: an instructor teaching some
/// sections of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRow {
    #[serde(alias = "Course", default)]
    pub course: Option<String>,
    #[serde(alias = "Instructor", default)]
    pub instructor: String,
    #[serde(alias = "Capacity", default, deserialize_with = "count_cell")]
    pub capacity: Option<u32>,
    /// Blank cells mean no sections.
    #[serde(alias = "# Sections", default, deserialize_with = "section_count_cell")]
    pub sections: u32,
    #[serde(alias = "Section_Type", alias = "Section Type", default)]
    pub section_type: Option<String>,
}

/// A numeric spreadsheet cell as exported to JSON.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberCell {
    Integer(u64),
    Float(f64),
    Text(String),
}

/// Reads a non-negative whole number from an integer, an integral float
/// (`40.0`), or numeric text. Null and blank text read as `None`.
fn count_cell<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let invalid = |shown: &dyn fmt::Display| {
        D::Error::custom(format!("expected a whole number, got {shown}"))
    };
    let value = match Option::<NumberCell>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(NumberCell::Integer(n)) => n,
        Some(NumberCell::Float(x)) => {
            if x.fract() != 0.0 || x < 0.0 || x > f64::from(u32::MAX) {
                return Err(invalid(&x));
            }
            x as u64
        }
        Some(NumberCell::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse::<u64>().map_err(|_| invalid(&text))?
        }
    };
    u32::try_from(value).map(Some).map_err(|_| invalid(&value))
}

fn section_count_cell<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(count_cell(deserializer)?.unwrap_or(0))
}

impl AssignmentRow {
    pub fn new(course: impl Into<String>, instructor: impl Into<String>, sections: u32) -> Self {
        Self {
            course: Some(course.into()),
            instructor: instructor.into(),
            capacity: None,
            sections,
            section_type: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_section_type(mut self, section_type: impl Into<String>) -> Self {
        self.section_type = Some(section_type.into());
        self
    }

    /// Trimmed course code; empty for blank rows.
    pub fn course_code(&self) -> &str {
        self.course.as_deref().map(str::trim).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacultyRow {
    #[serde(alias = "Instructor", alias = "Name")]
    pub instructor: String,
    #[serde(alias = "Email", default)]
    pub email: String,
}

impl FacultyRow {
    pub fn new(instructor: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            instructor: instructor.into(),
            email: email.into(),
        }
    }
}

/// A commitment outside the timetable, by full day name and slot label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreScheduledRow {
    #[serde(alias = "Instructor")]
    pub instructor: String,
    #[serde(alias = "Day")]
    pub day: String,
    #[serde(alias = "Time")]
    pub time: String,
}

impl PreScheduledRow {
    pub fn new(
        instructor: impl Into<String>,
        day: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            instructor: instructor.into(),
            day: day.into(),
            time: time.into(),
        }
    }

    /// Parsed period, if both labels are known.
    pub fn period(&self) -> Option<Period> {
        Some(Period::new(
            Day::from_name(&self.day)?,
            Slot::from_label(&self.time)?,
        ))
    }
}

/// `"<email>: <Type>"` with a pipe-delimited period list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRow {
    #[serde(alias = "Instructor UCID: Type", default)]
    pub instructor_type: Option<String>,
    #[serde(alias = "Slots", default)]
    pub slots: Option<String>,
}

impl ConstraintRow {
    pub fn new(entry: impl Into<String>, slots: impl Into<String>) -> Self {
        Self {
            instructor_type: Some(entry.into()),
            slots: Some(slots.into()),
        }
    }

    /// Trimmed entry, `None` for blank rows.
    pub fn entry(&self) -> Option<&str> {
        self.instructor_type
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }

    /// Splits the entry into email and preference type.
    pub fn parse(&self) -> Option<(&str, PreferenceKind)> {
        let (email, kind) = self.entry()?.split_once(": ")?;
        Some((email.trim(), PreferenceKind::parse(kind)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralPreferenceRow {
    #[serde(alias = "Email")]
    pub email: String,
    #[serde(alias = "Preference", default)]
    pub format: Option<String>,
    #[serde(alias = "Day Preference", default)]
    pub days: Option<String>,
    #[serde(alias = "Consecutive Preference", default)]
    pub consecutive: Option<String>,
}

/// Sections and instructors ready for the solver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub sections: Vec<Section>,
    pub instructors: Vec<Instructor>,
}

impl Instance {
    /// Meetings across every section.
    pub fn total_meetings(&self) -> usize {
        self.sections.iter().map(|s| usize::from(s.meetings)).sum()
    }

    pub fn instructor(&self, name: &str) -> Option<&Instructor> {
        self.instructors.iter().find(|i| i.name == name)
    }

    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

impl Workbook {
    /// Parses a JSON workbook.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a JSON workbook file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TimetableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    /// Assignment rows with a course code.
    pub fn assignment_rows(&self) -> impl Iterator<Item = &AssignmentRow> {
        self.assignments
            .iter()
            .filter(|r| !r.course_code().is_empty())
    }

    /// Validates the workbook and builds the solver instance.
    ///
    /// Rows sharing a course and instructor are merged; their sections
    /// are numbered from 1 in ascending capacity order (rows without a
    /// capacity last), each section keeping its row's capacity and type.
    pub fn into_instance(&self, policy: &Policy) -> Result<Instance> {
        validate_workbook(self, policy).map_err(TimetableError::Validation)?;

        let emails: HashMap<&str, &str> = self
            .faculty
            .iter()
            .map(|f| (f.instructor.trim(), f.email.trim()))
            .collect();

        let mut offerings: BTreeMap<(&str, &str), Vec<&AssignmentRow>> = BTreeMap::new();
        for row in self.assignment_rows() {
            offerings
                .entry((row.course_code(), row.instructor.trim()))
                .or_default()
                .push(row);
        }

        let mut sections = Vec::new();
        for ((course, instructor), mut rows) in offerings {
            rows.sort_by_key(|r| (r.capacity.is_none(), r.capacity));
            let email = emails.get(instructor).copied().unwrap_or_default();
            let meetings = policy.meetings_for(course);
            let mut number = 1;
            for row in rows {
                for _ in 0..row.sections {
                    let mut section =
                        Section::new(course, instructor, email, number).with_meetings(meetings);
                    section.capacity = row.capacity;
                    if let Some(kind) = row.section_type.as_deref() {
                        section = section.with_section_type(kind.trim());
                    }
                    sections.push(section);
                    number += 1;
                }
            }
        }

        let mut instructors: BTreeMap<String, Instructor> = BTreeMap::new();
        for section in &sections {
            instructors
                .entry(section.instructor.clone())
                .or_insert_with(|| Instructor::new(&section.instructor, &section.email));
        }

        for row in &self.pre_scheduled {
            let (Some(instructor), Some(period)) =
                (instructors.get_mut(row.instructor.trim()), row.period())
            else {
                debug!(instructor = %row.instructor, "pre-scheduled row ignored");
                continue;
            };
            instructor.block(period);
        }

        for row in &self.constraints {
            let Some((email, kind)) = row.parse() else {
                warn!(slots = ?row.slots, "blank preference entry skipped");
                continue;
            };
            let Some(instructor) = instructors.values_mut().find(|i| i.email == email) else {
                warn!(%email, "preference entry for unknown email skipped");
                continue;
            };
            let list = parse_period_list(row.slots.as_deref().unwrap_or_default());
            if !list.skipped.is_empty() {
                warn!(%email, skipped = ?list.skipped, "unrecognized period codes skipped");
            }
            if !list.periods.is_empty() {
                instructor
                    .slot_preferences
                    .push(SlotPreference::new(kind, list.periods));
            }
        }

        for row in &self.general_preferences {
            let email = row.email.trim();
            for instructor in instructors.values_mut().filter(|i| i.email == email) {
                if let Some(format) = row.format.as_deref().and_then(FormatPreference::parse) {
                    instructor.format = Some(format);
                }
                if let Some(days) = row.days.as_deref() {
                    instructor.days = DayPreference::parse(days);
                }
                if row.consecutive.as_deref().map(str::trim) == Some("No") {
                    instructor.avoid_long_blocks = true;
                }
            }
        }

        let instance = Instance {
            sections,
            instructors: instructors.into_values().collect(),
        };
        debug!(
            sections = instance.sections.len(),
            instructors = instance.instructors.len(),
            meetings = instance.total_meetings(),
            "instance built"
        );
        Ok(instance)
    }
}

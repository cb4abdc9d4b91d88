//! Timetable reporting.
//!
//! - [`PenaltyLedger`]: itemised soft outcomes behind the objective.
//! - [`ScheduleKpi`]: period loads and days on campus.
//! - [`ReportWriter`]: the stamped text, CSV, and JSON files of a run.

mod kpi;
mod penalties;
mod writer;

pub use kpi::{InstructorDays, PeriodLoad, ScheduleKpi};
pub use penalties::{PenaltyCategory, PenaltyItem, PenaltyLedger};
pub use writer::{stamp_now, ReportWriter};

//! Timetabling domain models.
//!
//! Provides the core data types for representing a weekly course
//! timetable and its solution.
//!
//! # Domain Mappings
//!
//! | u-timetable | Generic scheduling | Meaning |
//! |-------------|-------------------|---------|
//! | Section | Task | One instructor teaching one group |
//! | Placement | Activity start | Periods of every weekly meeting |
//! | Instructor | Resource | Teacher with availability and preferences |
//! | Period | Time bucket | One 90-minute slot on a teaching day |
//! | Schedule | Plan | The weekly timetable |

mod constraint;
mod instructor;
mod pattern;
mod preference;
mod schedule;
mod section;
mod time_grid;

pub use constraint::{CourseBlock, HardConstraint, OffsiteRule, RestrictedPeriod};
pub use instructor::Instructor;
pub use pattern::{DayStarts, MeetingPattern, PatternRules, Placement};
pub use preference::{
    DayPreference, FormatPreference, PenaltyWeights, PreferenceKind, SlotPreference,
};
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
pub use section::{course_level, course_number, Section};
pub use time_grid::{
    parse_period_list, Day, Period, PeriodList, Slot, DAYS_PER_WEEK, PERIOD_COUNT, SLOTS_PER_DAY,
};

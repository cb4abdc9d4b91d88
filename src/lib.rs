//! Weekly course timetabling for an academic department.
//!
//! Places every section of every course into a five-day, eight-slot week
//! so that instructors never double-book, meetings spread evenly over the
//! week, related courses stay apart, and instructor preferences are
//! honoured as far as the hard rules allow.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Period`, `Section`, `Instructor`,
//!   `MeetingPattern`, `CourseBlock`, `Schedule`
//! - **`policy`**: Department rules (caps, patterns, blocks, weights) loaded from TOML
//! - **`input`**: Scheduling workbook (JSON) and its conversion into sections
//! - **`validation`**: Input integrity checks (duplicate faculty, unknown instructors,
//!   malformed preferences, unusable policy values)
//! - **`dispatching`**: Priority rules ordering sections for construction
//! - **`solver`**: Compiled problem, incremental state, greedy construction,
//!   simulated annealing
//! - **`report`**: Penalty ledger, KPIs, and the report files of a run
//! - **`cli`**: `solve`, `validate`, and `policy` commands
//!
//! # References
//!
//! - Schaerf (1999), "A Survey of Automated Timetabling"
//! - Burke & Petrovic (2002), "Recent Research Directions in Automated Timetabling"
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"

pub mod cli;
pub mod dispatching;
pub mod error;
pub mod input;
pub mod models;
pub mod policy;
pub mod report;
pub mod solver;
pub mod validation;

pub use error::{Result, TimetableError};

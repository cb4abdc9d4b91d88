//! Priority rules and rule engine for section ordering.
//!
//! The constructive solver places sections one at a time; the order
//! matters because early sections get the pick of the week. Rules score
//! sections (most constrained, off-site, heavily blocked, busy
//! instructors) and the engine applies them in order, later rules only
//! breaking ties left by earlier ones.
//!
//! # Usage
//!
//! ```
//! use u_timetable::dispatching::{RuleEngine, SchedulingContext, TieBreaker};
//! use u_timetable::dispatching::rules;
//! use u_timetable::models::Section;
//!
//! let engine = RuleEngine::new()
//!     .with_rule(rules::OffsiteFirst)
//!     .with_rule(rules::FewestCandidates)
//!     .with_final_tie_breaker(TieBreaker::ById);
//!
//! let sections = vec![
//!     Section::new("CS100", "Ada", "ada@uni.edu", 1),
//!     Section::new("CS100", "Bob", "bob@uni.edu", 1).with_section_type("Jersey City"),
//! ];
//! let context = SchedulingContext::new().with_offsite("CS100/Bob/1");
//! assert_eq!(engine.sort_indices(&sections, &context), vec![1, 0]);
//! ```
//!
//! # References
//!
//! - Carter & Laporte (1996), "Recent Developments in Practical Course Timetabling"
//! - Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

mod context;
mod engine;
pub mod rules;

pub use context::SchedulingContext;
pub use engine::{RuleEngine, TieBreaker};

use crate::models::Section;
use std::fmt::Debug;

/// Score returned by a dispatching rule.
///
/// Lower scores = higher priority (placed first).
pub type RuleScore = f64;

/// A rule that evaluates how urgently a section should be placed.
///
/// # Score Convention
/// **Lower score = higher priority.** Rules should return smaller values
/// for sections that should be placed first.
pub trait DispatchingRule: Send + Sync + Debug {
    /// Rule name (e.g., "FEWEST", "OFFSITE").
    fn name(&self) -> &'static str;

    /// Evaluates the priority of a section given the scheduling context.
    ///
    /// Returns a score where lower = higher priority.
    fn evaluate(&self, section: &Section, context: &SchedulingContext) -> RuleScore;

    /// Rule description.
    fn description(&self) -> &'static str {
        self.name()
    }
}

//! Built-in dispatching rules.
//!
//! # Categories
//!
//! - **Domain size**: FEWEST, OFFSITE
//! - **Coupling**: BLOCKED, LOAD
//! - **Size**: CAPACITY
//!
//! # Score Convention
//! All rules return lower scores for sections that should be placed first.
//!
//! # References
//! - Brélaz (1979), "New Methods to Color the Vertices of a Graph" (saturation ordering)
//! - Carter & Laporte (1996), "Recent Developments in Practical Course Timetabling"

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::Section;

// ======================== Domain size ========================

/// Fewest admissible placements first.
///
/// Sections with small domains are the hardest to fit late, so they go
/// early. A section absent from the context scores `f64::MAX`.
#[derive(Debug, Clone, Copy)]
pub struct FewestCandidates;

impl DispatchingRule for FewestCandidates {
    fn name(&self) -> &'static str {
        "FEWEST"
    }

    fn evaluate(&self, section: &Section, context: &SchedulingContext) -> RuleScore {
        context
            .candidate_counts
            .get(&section.id)
            .map(|&n| n as f64)
            .unwrap_or(f64::MAX)
    }

    fn description(&self) -> &'static str {
        "Fewest Admissible Placements"
    }
}

/// Off-site sections first.
#[derive(Debug, Clone, Copy)]
pub struct OffsiteFirst;

impl DispatchingRule for OffsiteFirst {
    fn name(&self) -> &'static str {
        "OFFSITE"
    }

    fn evaluate(&self, section: &Section, context: &SchedulingContext) -> RuleScore {
        if context.offsite_sections.contains(&section.id) {
            0.0
        } else {
            1.0
        }
    }

    fn description(&self) -> &'static str {
        "Off-site Sections First"
    }
}

// ======================== Coupling ========================

/// Courses sharing many blocks first.
#[derive(Debug, Clone, Copy)]
pub struct BlockDegree;

impl DispatchingRule for BlockDegree {
    fn name(&self) -> &'static str {
        "BLOCKED"
    }

    fn evaluate(&self, section: &Section, context: &SchedulingContext) -> RuleScore {
        -(context
            .block_degree
            .get(&section.course)
            .copied()
            .unwrap_or(0) as f64)
    }

    fn description(&self) -> &'static str {
        "Most Block Partners"
    }
}

/// Instructors with the heaviest weekly load first.
#[derive(Debug, Clone, Copy)]
pub struct InstructorLoad;

impl DispatchingRule for InstructorLoad {
    fn name(&self) -> &'static str {
        "LOAD"
    }

    fn evaluate(&self, section: &Section, context: &SchedulingContext) -> RuleScore {
        -(context
            .instructor_load
            .get(&section.instructor)
            .copied()
            .unwrap_or(0) as f64)
    }

    fn description(&self) -> &'static str {
        "Heaviest Instructor Load"
    }
}

// ======================== Size ========================

/// Largest enrollment cap first. Sections without a cap go last.
#[derive(Debug, Clone, Copy)]
pub struct LargestCapacity;

impl DispatchingRule for LargestCapacity {
    fn name(&self) -> &'static str {
        "CAPACITY"
    }

    fn evaluate(&self, section: &Section, _context: &SchedulingContext) -> RuleScore {
        section.capacity.map_or(0.0, |c| -f64::from(c))
    }

    fn description(&self) -> &'static str {
        "Largest Capacity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> Section {
        Section::new("CS284", "Ada", "ada@uni.edu", 1)
    }

    #[test]
    fn test_fewest_candidates() {
        let s = section();
        let ctx = SchedulingContext::new().with_candidates(&s.id, 7);
        assert_eq!(FewestCandidates.evaluate(&s, &ctx), 7.0);
    }

    #[test]
    fn test_fewest_candidates_unknown() {
        let ctx = SchedulingContext::new();
        assert_eq!(FewestCandidates.evaluate(&section(), &ctx), f64::MAX);
    }

    #[test]
    fn test_offsite_first() {
        let s = section();
        let ctx = SchedulingContext::new();
        assert_eq!(OffsiteFirst.evaluate(&s, &ctx), 1.0);
        let ctx = ctx.with_offsite(&s.id);
        assert_eq!(OffsiteFirst.evaluate(&s, &ctx), 0.0);
    }

    #[test]
    fn test_block_degree() {
        let ctx = SchedulingContext::new().with_block_degree("CS284", 4);
        assert_eq!(BlockDegree.evaluate(&section(), &ctx), -4.0);
        assert_eq!(
            BlockDegree.evaluate(&Section::new("CS999", "Ada", "a", 1), &ctx),
            0.0
        );
    }

    #[test]
    fn test_instructor_load() {
        let ctx = SchedulingContext::new().with_load("Ada", 9);
        assert_eq!(InstructorLoad.evaluate(&section(), &ctx), -9.0);
    }

    #[test]
    fn test_largest_capacity() {
        let ctx = SchedulingContext::new();
        assert_eq!(LargestCapacity.evaluate(&section(), &ctx), 0.0);
        assert_eq!(
            LargestCapacity.evaluate(&section().with_capacity(60), &ctx),
            -60.0
        );
    }

    #[test]
    fn test_descriptions() {
        assert_eq!(FewestCandidates.description(), "Fewest Admissible Placements");
        assert_eq!(LargestCapacity.name(), "CAPACITY");
    }
}

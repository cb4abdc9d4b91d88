//! Scheduling context for dispatching rule evaluation.

use std::collections::{HashMap, HashSet};

use crate::solver::Problem;

/// Search facts passed to dispatching rules.
///
/// Keyed by section ID (candidate counts, off-site membership) or by
/// instructor name (teaching load) or course code (block degree).
#[derive(Debug, Clone, Default)]
pub struct SchedulingContext {
    /// Admissible placements per section.
    pub candidate_counts: HashMap<String, usize>,
    /// Weekly meetings per instructor.
    pub instructor_load: HashMap<String, usize>,
    /// Number of block partners per course.
    pub block_degree: HashMap<String, usize>,
    /// Sections taught off site.
    pub offsite_sections: HashSet<String>,
}

impl SchedulingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gathers every fact from a compiled problem.
    pub fn from_problem(problem: &Problem) -> Self {
        let mut context = Self::new();
        for (section, vars) in problem.sections.iter().zip(&problem.vars) {
            context
                .candidate_counts
                .insert(section.id.clone(), vars.candidates.len());
            *context
                .instructor_load
                .entry(section.instructor.clone())
                .or_insert(0) += usize::from(section.meetings);
            if vars.offsite.is_some() {
                context.offsite_sections.insert(section.id.clone());
            }
        }
        for (offering, pairs) in problem.offerings.iter().zip(&problem.offering_pairs) {
            *context
                .block_degree
                .entry(offering.course.clone())
                .or_insert(0) += pairs.len();
        }
        context
    }

    /// Sets the candidate count for a section.
    pub fn with_candidates(mut self, section_id: impl Into<String>, count: usize) -> Self {
        self.candidate_counts.insert(section_id.into(), count);
        self
    }

    /// Sets the weekly load of an instructor.
    pub fn with_load(mut self, instructor: impl Into<String>, meetings: usize) -> Self {
        self.instructor_load.insert(instructor.into(), meetings);
        self
    }

    /// Sets the block degree of a course.
    pub fn with_block_degree(mut self, course: impl Into<String>, degree: usize) -> Self {
        self.block_degree.insert(course.into(), degree);
        self
    }

    /// Marks a section as off-site.
    pub fn with_offsite(mut self, section_id: impl Into<String>) -> Self {
        self.offsite_sections.insert(section_id.into());
        self
    }
}

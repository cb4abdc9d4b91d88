//! Rule engine for section ordering.
//!
//! Rules are consulted in the order they were added: the first rule
//! decides, later rules only separate sections the earlier ones scored
//! equal. Each section is scored once per rule before sorting, so the
//! cost is one rule evaluation per section and rule.
//!
//! # Reference
//! Haupt (1989), "A Survey of Priority Rule-Based Scheduling"

use std::cmp::Ordering;
use std::sync::Arc;

use super::{DispatchingRule, RuleScore, SchedulingContext};
use crate::models::Section;

const SCORE_EPSILON: f64 = 1e-9;

/// How sections still tied after every rule are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TieBreaker {
    /// Keep input order (stable sort).
    #[default]
    InputOrder,
    /// Deterministic by section ID (lexicographic).
    ById,
}

/// Lexicographic section prioritisation over a list of rules.
///
/// # Example
/// ```
/// use u_timetable::dispatching::{RuleEngine, TieBreaker};
/// use u_timetable::dispatching::rules;
///
/// let engine = RuleEngine::new()
///     .with_rule(rules::FewestCandidates)
///     .with_rule(rules::LargestCapacity)
///     .with_final_tie_breaker(TieBreaker::ById);
/// assert_eq!(engine.rule_names(), vec!["FEWEST", "CAPACITY"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RuleEngine {
    rules: Vec<Arc<dyn DispatchingRule>>,
    tie_breaker: TieBreaker,
}

impl RuleEngine {
    /// Creates an engine with no rules; every section ties.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordering used by the constructive solver: off-site sections, then
    /// the most constrained, then heavily blocked courses, then busy
    /// instructors, then large sections, then by ID.
    pub fn timetabling() -> Self {
        Self::new()
            .with_rule(super::rules::OffsiteFirst)
            .with_rule(super::rules::FewestCandidates)
            .with_rule(super::rules::BlockDegree)
            .with_rule(super::rules::InstructorLoad)
            .with_rule(super::rules::LargestCapacity)
            .with_final_tie_breaker(TieBreaker::ById)
    }

    /// Appends a rule, consulted after every rule added before it.
    pub fn with_rule<R: DispatchingRule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn with_final_tie_breaker(mut self, tie_breaker: TieBreaker) -> Self {
        self.tie_breaker = tie_breaker;
        self
    }

    /// Rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Scores of one section, one per rule.
    pub fn scores(&self, section: &Section, context: &SchedulingContext) -> Vec<RuleScore> {
        self.rules
            .iter()
            .map(|rule| rule.evaluate(section, context))
            .collect()
    }

    /// Section indices, highest priority first.
    pub fn sort_indices(&self, sections: &[Section], context: &SchedulingContext) -> Vec<usize> {
        let keys: Vec<Vec<RuleScore>> = sections
            .iter()
            .map(|section| self.scores(section, context))
            .collect();
        let mut indices: Vec<usize> = (0..sections.len()).collect();
        indices.sort_by(|&a, &b| {
            compare_keys(&keys[a], &keys[b])
                .then_with(|| self.final_tie(&sections[a], &sections[b]))
        });
        indices
    }

    /// Index of the highest-priority section.
    pub fn select_best(&self, sections: &[Section], context: &SchedulingContext) -> Option<usize> {
        self.sort_indices(sections, context).first().copied()
    }

    fn final_tie(&self, a: &Section, b: &Section) -> Ordering {
        match self.tie_breaker {
            TieBreaker::InputOrder => Ordering::Equal,
            TieBreaker::ById => a.id.cmp(&b.id),
        }
    }
}

/// First score pair differing by more than the epsilon decides.
fn compare_keys(a: &[RuleScore], b: &[RuleScore]) -> Ordering {
    a.iter()
        .zip(b)
        .find(|(x, y)| (*x - *y).abs() > SCORE_EPSILON)
        .map_or(Ordering::Equal, |(x, y)| x.total_cmp(y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatching::rules;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    fn section(course: &str, number: u32) -> Section {
        Section::new(course, "Ada", "ada@uni.edu", number)
    }

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl DispatchingRule for Counting {
        fn name(&self) -> &'static str {
            "COUNTING"
        }

        fn evaluate(&self, section: &Section, _context: &SchedulingContext) -> RuleScore {
            self.0.fetch_add(1, AtomicOrdering::Relaxed);
            f64::from(section.number)
        }
    }

    #[test]
    fn test_fewest_candidates_ordering() {
        let sections = vec![section("CS100", 1), section("CS200", 1), section("CS300", 1)];
        let ctx = SchedulingContext::new()
            .with_candidates(&sections[0].id, 40)
            .with_candidates(&sections[1].id, 5)
            .with_candidates(&sections[2].id, 12);
        let engine = RuleEngine::new().with_rule(rules::FewestCandidates);

        assert_eq!(engine.sort_indices(&sections, &ctx), vec![1, 2, 0]);
    }

    #[test]
    fn test_offsite_first() {
        let sections = vec![section("CS100", 1), section("CS100", 2)];
        let ctx = SchedulingContext::new().with_offsite(&sections[1].id);
        let engine = RuleEngine::new().with_rule(rules::OffsiteFirst);

        assert_eq!(engine.select_best(&sections, &ctx), Some(1));
    }

    #[test]
    fn test_later_rule_breaks_ties() {
        let sections = vec![
            section("CS100", 1).with_capacity(20),
            section("CS200", 1).with_capacity(80),
            section("CS300", 1).with_capacity(90),
        ];
        let ctx = SchedulingContext::new()
            .with_candidates(&sections[0].id, 10)
            .with_candidates(&sections[1].id, 10)
            .with_candidates(&sections[2].id, 30);
        let engine = RuleEngine::new()
            .with_rule(rules::FewestCandidates)
            .with_rule(rules::LargestCapacity);

        // CS300 is largest but has the most candidates.
        assert_eq!(engine.sort_indices(&sections, &ctx), vec![1, 0, 2]);
    }

    #[test]
    fn test_input_order_and_by_id() {
        let sections = vec![section("CS200", 1), section("CS100", 1)];
        let ctx = SchedulingContext::new();

        let stable = RuleEngine::new().with_rule(rules::FewestCandidates);
        assert_eq!(stable.sort_indices(&sections, &ctx), vec![0, 1]);

        let by_id = stable.with_final_tie_breaker(TieBreaker::ById);
        assert_eq!(by_id.sort_indices(&sections, &ctx), vec![1, 0]);
    }

    #[test]
    fn test_each_section_scored_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sections: Vec<Section> = (1..=6).rev().map(|n| section("CS100", n)).collect();
        let engine = RuleEngine::new().with_rule(Counting(Arc::clone(&calls)));

        let order = engine.sort_indices(&sections, &SchedulingContext::new());
        assert_eq!(order, vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(calls.load(AtomicOrdering::Relaxed), sections.len());
    }

    #[test]
    fn test_empty_sections() {
        let ctx = SchedulingContext::new();
        let engine = RuleEngine::timetabling();
        assert!(engine.sort_indices(&[], &ctx).is_empty());
        assert!(engine.select_best(&[], &ctx).is_none());
    }

    #[test]
    fn test_scores() {
        let s = section("CS100", 1).with_capacity(45);
        let ctx = SchedulingContext::new()
            .with_candidates(&s.id, 12)
            .with_load("Ada", 6);
        let engine = RuleEngine::new()
            .with_rule(rules::FewestCandidates)
            .with_rule(rules::InstructorLoad)
            .with_rule(rules::LargestCapacity);

        assert_eq!(engine.scores(&s, &ctx), vec![12.0, -6.0, -45.0]);
    }

    #[test]
    fn test_timetabling_rule_order() {
        assert_eq!(
            RuleEngine::timetabling().rule_names(),
            vec!["OFFSITE", "FEWEST", "BLOCKED", "LOAD", "CAPACITY"]
        );
    }
}

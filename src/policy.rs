//! Timetabling policy.
//!
//! Every tunable rule of the department lives here: balance shares,
//! banned periods, admissible meeting patterns, per-instructor load
//! limits, restricted periods, off-site sections, course blocks, and
//! the soft-objective weights. A policy is read from TOML; any field
//! left out falls back to the department defaults, so a file only needs
//! to list what it changes.
//!
//! ```toml
//! extra_meeting_courses = ["CS435"]
//!
//! [balance]
//! banned = ["F3", "W5", "W6"]
//!
//! [[blocks]]
//! name = "networking"
//! courses = ["CS356", "CS656"]
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, TimetableError};
use crate::models::{
    CourseBlock, Day, OffsiteRule, PatternRules, PenaltyWeights, Period, RestrictedPeriod,
    Section, Slot,
};

/// Complete rule set for one timetabling run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Courses whose sections meet three times a week.
    pub extra_meeting_courses: Vec<String>,
    pub balance: BalancePolicy,
    pub evening: EveningPolicy,
    pub patterns: PatternRules,
    pub load: LoadPolicy,
    pub restricted_periods: Vec<RestrictedPeriod>,
    pub offsite: Vec<OffsiteRule>,
    pub blocks: Vec<CourseBlock>,
    pub weights: PenaltyWeights,
}

/// Share of a period in the balance computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodShare {
    pub period: Period,
    pub share: f64,
}

/// Spreads meetings across the week.
///
/// A period may hold at most `ceil(share / divisor * total_meetings)`
/// balance-counted meetings. Banned periods hold none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalancePolicy {
    pub default_share: f64,
    pub divisor: f64,
    pub overrides: Vec<PeriodShare>,
    pub banned: Vec<Period>,
}

/// Caps the evening slots over the whole week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EveningPolicy {
    pub slots: Vec<Slot>,
    pub share: f64,
    /// `(first, second)`: a part 1 in `first` on a day occurs exactly when
    /// a part 2 in `second` occurs that day. Written `linked = [7, 8]` in
    /// TOML; `linked = []` removes the link.
    #[serde(with = "linked_slots")]
    pub linked: Option<(Slot, Slot)>,
}

mod linked_slots {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::models::Slot;

    pub fn serialize<S>(linked: &Option<(Slot, Slot)>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let slots: Vec<Slot> = linked.map(|(a, b)| vec![a, b]).unwrap_or_default();
        slots.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<(Slot, Slot)>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Vec::<Slot>::deserialize(deserializer)?.as_slice() {
            [] => Ok(None),
            &[first, second] => Ok(Some((first, second))),
            other => Err(D::Error::invalid_length(other.len(), &"no slots or two slots")),
        }
    }
}

/// Per-instructor daily load limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadPolicy {
    /// Early and late slots.
    pub restricted_slots: Vec<Slot>,
    pub max_restricted_per_day: u32,
    /// Longest run of occupied consecutive slots.
    pub max_consecutive_slots: u32,
}

fn slots(numbers: &[u8]) -> Vec<Slot> {
    numbers.iter().filter_map(|&n| Slot::new(n)).collect()
}

fn period(day: Day, slot: u8) -> Option<Period> {
    Slot::new(slot).map(|s| Period::new(day, s))
}

impl Default for BalancePolicy {
    fn default() -> Self {
        Self {
            default_share: 0.20,
            divisor: 6.0,
            overrides: (1..=4)
                .filter_map(|n| period(Day::Wednesday, n))
                .map(|period| PeriodShare {
                    period,
                    share: 0.25,
                })
                .collect(),
            banned: [
                period(Day::Friday, 3),
                period(Day::Wednesday, 5),
                period(Day::Wednesday, 6),
            ]
            .into_iter()
            .flatten()
            .collect(),
        }
    }
}

impl BalancePolicy {
    pub fn is_banned(&self, period: Period) -> bool {
        self.banned.contains(&period)
    }

    pub fn share(&self, period: Period) -> f64 {
        self.overrides
            .iter()
            .find(|o| o.period == period)
            .map_or(self.default_share, |o| o.share)
    }

    /// Most balance-counted meetings `period` may hold.
    pub fn cap(&self, period: Period, total_meetings: usize) -> u32 {
        if self.is_banned(period) {
            return 0;
        }
        ((self.share(period) / self.divisor) * total_meetings as f64).ceil() as u32
    }
}

impl Default for EveningPolicy {
    fn default() -> Self {
        Self {
            slots: slots(&[7, 8]),
            share: 0.20,
            linked: Slot::new(7).zip(Slot::new(8)),
        }
    }
}

impl EveningPolicy {
    /// Week-wide cap per evening slot. The bound is not rounded up, so a
    /// fractional cap admits its floor.
    pub fn cap(&self, divisor: f64, total_meetings: usize) -> u32 {
        ((self.share / divisor) * total_meetings as f64).floor() as u32
    }
}

impl Default for LoadPolicy {
    fn default() -> Self {
        Self {
            restricted_slots: slots(&[1, 2, 7, 8]),
            max_restricted_per_day: 3,
            max_consecutive_slots: 2,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        let block = |name: &str, courses: &[&str]| CourseBlock::new(name, courses.iter().copied());
        Self {
            extra_meeting_courses: Vec::new(),
            balance: BalancePolicy::default(),
            evening: EveningPolicy::default(),
            patterns: PatternRules::default(),
            load: LoadPolicy::default(),
            restricted_periods: period(Day::Monday, 6)
                .map(|period| RestrictedPeriod {
                    period,
                    min_course_number: 200,
                    max_capacity: 34,
                })
                .into_iter()
                .collect(),
            offsite: vec![OffsiteRule::default()],
            blocks: vec![
                block("intro", &["CS114", "IS210", "CS450", "CS337"]),
                block("foundations", &["CS241", "CS280", "IS350"]),
                block("systems", &["CS288", "CS332", "CS301", "CS356"]).with_max_concurrent(2),
                block("theory", &["CS341", "CS350", "CS351", "CS331", "CS375"])
                    .with_max_concurrent(2),
                block("senior-electives", &["CS435", "CS490", "CS485", "CS370", "CS375"]),
                block("capstone", &["CS485", "CS491", "CS450", "CS482"]),
                block(
                    "grad-core",
                    &["CS610", "CS630", "CS631", "CS656", "DS675", "CS675", "CS670"],
                ),
                block(
                    "data-science",
                    &[
                        "DS677", "DS669", "DS650", "CS670", "CS610", "CS665", "CS667", "CS732",
                        "DS680",
                    ],
                ),
                block(
                    "security",
                    &["CS608", "CS645", "CS646", "CS647", "CS648", "CS678", "CS696"],
                ),
                block("information-systems", &["IS455", "IS645"]),
                block("it-core", &["IT220", "IT230", "IT240", "IT302"]),
                block(
                    "it-advanced",
                    &["IT256", "IT266", "IT286", "IT360", "IT380", "IT383", "IT386"],
                ),
                block("it-intro", &["IT120", "IT240"]),
            ],
            weights: PenaltyWeights::default(),
        }
    }
}

impl Policy {
    /// Parses a TOML policy. Missing fields take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Reads a TOML policy file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TimetableError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Renders the policy as TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Weekly meetings for a course.
    pub fn meetings_for(&self, course: &str) -> u8 {
        if self.extra_meeting_courses.iter().any(|c| c == course) {
            3
        } else {
            2
        }
    }

    /// Index of the off-site rule that applies to a section.
    pub fn offsite_rule_for(&self, section: &Section) -> Option<usize> {
        self.offsite.iter().position(|rule| rule.applies_to(section))
    }
}

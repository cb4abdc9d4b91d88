//! Timetable quality metrics.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Period load | Meetings placed in each period, and their share of all meetings |
//! | Peak share | Largest single-period share |
//! | Days on campus | Distinct teaching days per instructor |
//! | Average days | Mean days on campus across instructors |
//!
//! # Reference
//! Burke & Petrovic (2002), "Recent Research Directions in Automated
//! Timetabling": spread and compactness measures

use serde::Serialize;

use crate::models::{Day, Period, Schedule};

/// Meetings placed in one period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodLoad {
    pub period: Period,
    pub count: usize,
    /// Percentage of all meetings (0.0..100.0).
    pub percentage: f64,
}

/// Teaching days of one instructor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstructorDays {
    pub instructor: String,
    /// Days in week order.
    pub days: Vec<Day>,
}

impl InstructorDays {
    pub fn count(&self) -> usize {
        self.days.len()
    }
}

/// Timetable performance indicators.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleKpi {
    /// One entry per period, in week order.
    pub periods: Vec<PeriodLoad>,
    pub total_meetings: usize,
    pub section_count: usize,
    /// Instructors by days on campus (descending), then name.
    pub instructors: Vec<InstructorDays>,
    /// Mean days on campus.
    pub avg_days: f64,
    /// Largest period percentage.
    pub peak_percentage: f64,
}

impl ScheduleKpi {
    /// Computes KPIs from a schedule.
    pub fn calculate(schedule: &Schedule) -> Self {
        let total = schedule.assignment_count();
        let periods: Vec<PeriodLoad> = Period::all()
            .map(|period| {
                let count = schedule.assignments_at(period).len();
                let percentage = if total == 0 {
                    0.0
                } else {
                    count as f64 / total as f64 * 100.0
                };
                PeriodLoad {
                    period,
                    count,
                    percentage,
                }
            })
            .collect();
        let peak_percentage = periods.iter().map(|p| p.percentage).fold(0.0, f64::max);

        let mut instructors: Vec<InstructorDays> = schedule
            .all_teaching_days()
            .into_iter()
            .map(|(instructor, days)| InstructorDays {
                instructor,
                days: days.into_iter().collect(),
            })
            .collect();
        instructors.sort_by(|a, b| {
            b.count()
                .cmp(&a.count())
                .then_with(|| a.instructor.cmp(&b.instructor))
        });

        let avg_days = if instructors.is_empty() {
            0.0
        } else {
            instructors.iter().map(InstructorDays::count).sum::<usize>() as f64
                / instructors.len() as f64
        };

        Self {
            periods,
            total_meetings: total,
            section_count: schedule.section_count(),
            instructors,
            avg_days,
            peak_percentage,
        }
    }

    /// Load of one period.
    pub fn load_at(&self, period: Period) -> &PeriodLoad {
        &self.periods[period.index()]
    }

    /// Whether no period exceeds `max_percentage` and instructors average
    /// at most `max_avg_days` on campus.
    pub fn meets_thresholds(&self, max_percentage: f64, max_avg_days: f64) -> bool {
        self.peak_percentage <= max_percentage && self.avg_days <= max_avg_days
    }
}

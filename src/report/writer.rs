//! Report files.
//!
//! Every file name carries the run stamp (`%Y-%m-%d_%H-%M-%S`) so that
//! successive runs never overwrite each other. Section numbers restart at
//! 1 per course and follow course order; both schedule listings use the
//! same numbering.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::error::{Result, TimetableError};
use crate::models::{Assignment, Schedule, ViolationType};
use crate::solver::{Problem, SolveOutcome, SolveStatus};

use super::{PenaltyCategory, PenaltyLedger, ScheduleKpi};

const RULE: &str = "----------------------------------------";
const DOUBLE_40: &str = "========================================";
const DOUBLE_50: &str = "==================================================";

/// Current local time formatted for report file names.
pub fn stamp_now() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// Writes the report set of one run into a directory.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
    stamp: String,
    full_penalty_report: bool,
}

#[derive(Serialize)]
struct ScheduleExport<'a> {
    status: SolveStatus,
    objective: i64,
    hard_excess: u32,
    iterations: u64,
    elapsed_ms: u64,
    kpi: &'a ScheduleKpi,
    schedule: &'a Schedule,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>, stamp: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            stamp: stamp.into(),
            full_penalty_report: false,
        }
    }

    /// Also writes the complete penalty analysis.
    pub fn with_full_penalty_report(mut self, enabled: bool) -> Self {
        self.full_penalty_report = enabled;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Path of a report file with the given prefix and extension.
    pub fn path_for(&self, prefix: &str, extension: &str) -> PathBuf {
        self.dir.join(format!("{prefix}_{}.{extension}", self.stamp))
    }

    /// Writes every report. Returns the paths written, in order.
    pub fn write_all(&self, problem: &Problem, outcome: &SolveOutcome) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir).map_err(|source| TimetableError::Write {
            path: self.dir.clone(),
            source,
        })?;

        let schedule = &outcome.schedule;
        let ledger = PenaltyLedger::from_choice(problem, &outcome.choice);
        let kpi = ScheduleKpi::calculate(schedule);
        let numbers = display_numbers(schedule);

        let mut written = vec![
            self.emit("final_schedule_sorted_by_course", "txt", |out| {
                render_by_course(out, schedule, &numbers)
            })?,
            self.emit("final_schedule_sorted_by_instructor", "txt", |out| {
                render_by_instructor(out, schedule, &numbers)
            })?,
            self.emit("instructors_days_analysis", "txt", |out| {
                render_instructor_days(out, &kpi)
            })?,
            self.emit("impact_analysis", "txt", |out| render_impact(out, &ledger))?,
            self.emit("constraint_violations", "txt", |out| {
                render_violations(out, &ledger, schedule)
            })?,
            self.emit("scheduling_percentages", "csv", |out| {
                render_percentages(out, &kpi)
            })?,
            self.emit("short_audit", "txt", |out| render_short_audit(out, &ledger))?,
        ];

        let export = ScheduleExport {
            status: outcome.status,
            objective: schedule.objective,
            hard_excess: outcome.evaluation.hard_excess,
            iterations: outcome.iterations,
            elapsed_ms: u64::try_from(outcome.elapsed.as_millis()).unwrap_or(u64::MAX),
            kpi: &kpi,
            schedule,
        };
        let json = serde_json::to_string_pretty(&export).map_err(TimetableError::Export)?;
        written.push(self.emit("schedule", "json", |out| out.write_all(json.as_bytes()))?);

        if self.full_penalty_report {
            written.push(self.emit("complete_penalty_analysis", "txt", |out| {
                render_penalty_analysis(out, &ledger, schedule.objective)
            })?);
        }
        if outcome.status == SolveStatus::Infeasible {
            written.push(self.emit("infeasible_model_analysis", "txt", |out| {
                render_infeasible(out, schedule)
            })?);
        }

        info!(dir = %self.dir.display(), files = written.len(), "reports written");
        Ok(written)
    }

    fn emit<F>(&self, prefix: &str, extension: &str, body: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let path = self.path_for(prefix, extension);
        let write_err = |source| TimetableError::Write {
            path: path.clone(),
            source,
        };
        let mut out = BufWriter::new(File::create(&path).map_err(write_err)?);
        body(&mut out).and_then(|()| out.flush()).map_err(write_err)?;
        Ok(path)
    }
}

/// Section number per section ID: 1.. within each course, in
/// (instructor, original number) order.
fn display_numbers(schedule: &Schedule) -> HashMap<String, u32> {
    let mut sections: BTreeMap<(&str, &str, u32), &str> = BTreeMap::new();
    for a in &schedule.assignments {
        sections.insert(
            (a.course.as_str(), a.instructor.as_str(), a.section_number),
            a.section_id.as_str(),
        );
    }
    let mut numbers = HashMap::new();
    let mut last_course = "";
    let mut next = 0;
    for ((course, _, _), id) in sections {
        if course != last_course {
            last_course = course;
            next = 0;
        }
        next += 1;
        numbers.insert(id.to_string(), next);
    }
    numbers
}

fn capacity_label(a: &Assignment) -> String {
    a.capacity.map_or_else(|| "Unknown".to_string(), |c| c.to_string())
}

fn type_label(a: &Assignment) -> &str {
    if a.section_type.is_empty() {
        "Unknown"
    } else {
        &a.section_type
    }
}

fn sorted_meetings<'a>(
    schedule: &'a Schedule,
    numbers: &HashMap<String, u32>,
) -> Vec<(u32, &'a Assignment)> {
    let mut meetings: Vec<(u32, &Assignment)> = schedule
        .assignments
        .iter()
        .map(|a| (numbers.get(&a.section_id).copied().unwrap_or(0), a))
        .collect();
    meetings.sort_by(|(na, a), (nb, b)| {
        a.course
            .cmp(&b.course)
            .then(na.cmp(nb))
            .then(a.part.cmp(&b.part))
    });
    meetings
}

fn render_by_course<W: Write>(
    out: &mut W,
    schedule: &Schedule,
    numbers: &HashMap<String, u32>,
) -> io::Result<()> {
    writeln!(out, "Course Schedule (Lexicographically Sorted):\n")?;
    let meetings = sorted_meetings(schedule, numbers);
    for (i, (number, a)) in meetings.iter().enumerate() {
        writeln!(
            out,
            "Course: {}, Instructor: {}, Email: {}, Section: {}, Part: {}, Day: {}, Slot: {}, Capacity: {}, Section Type: {}",
            a.course,
            a.instructor,
            a.email,
            number,
            a.part,
            a.period.day.name(),
            a.period.slot.label(),
            capacity_label(a),
            type_label(a),
        )?;
        let section_ends = meetings
            .get(i + 1)
            .map_or(true, |(_, next)| next.section_id != a.section_id);
        if section_ends {
            writeln!(out)?;
        }
    }
    Ok(())
}

fn render_by_instructor<W: Write>(
    out: &mut W,
    schedule: &Schedule,
    numbers: &HashMap<String, u32>,
) -> io::Result<()> {
    writeln!(out, "Course Schedule (Sorted by Instructor):\n")?;
    let mut meetings = sorted_meetings(schedule, numbers);
    meetings.sort_by(|(_, a), (_, b)| a.instructor.cmp(&b.instructor));

    let mut current: Option<&str> = None;
    for (number, a) in meetings {
        if current != Some(a.instructor.as_str()) {
            if current.is_some() {
                writeln!(out)?;
            }
            writeln!(out, "Instructor: {}, Email: {}", a.instructor, a.email)?;
            current = Some(a.instructor.as_str());
        }
        writeln!(
            out,
            "\tCourse: {}, Section: {}, Part: {}, Day: {}, Slot: {}, Capacity: {}, Section Type: {}",
            a.course,
            number,
            a.part,
            a.period.day.name(),
            a.period.slot.label(),
            capacity_label(a),
            type_label(a),
        )?;
    }
    Ok(())
}

fn render_instructor_days<W: Write>(out: &mut W, kpi: &ScheduleKpi) -> io::Result<()> {
    writeln!(out, "INSTRUCTORS SORTED BY DAYS ON CAMPUS")?;
    writeln!(out, "{DOUBLE_50}\n")?;
    for entry in &kpi.instructors {
        let days: Vec<&str> = entry.days.iter().map(|d| d.name()).collect();
        writeln!(out, "Instructor: {}", entry.instructor)?;
        writeln!(out, "  Days on campus: {}", entry.count())?;
        writeln!(out, "  Specific days: {}\n", days.join(", "))?;
    }
    Ok(())
}

fn render_impact<W: Write>(out: &mut W, ledger: &PenaltyLedger) -> io::Result<()> {
    writeln!(out, "INSTRUCTOR IMPACT ANALYSIS")?;
    writeln!(out, "{DOUBLE_50}\n")?;

    writeln!(out, "HEALTH/RELIGION CONSTRAINT VIOLATIONS")?;
    writeln!(out, "{RULE}")?;
    for item in ledger.items_in(PenaltyCategory::Protected) {
        writeln!(out, "{item}")?;
    }
    writeln!(
        out,
        "\nTotal violated constraints: {}\n",
        ledger.count(PenaltyCategory::Protected)
    )?;

    writeln!(out, "INSTRUCTOR IMPACT SUMMARY")?;
    writeln!(out, "{RULE}")?;
    let impact = ledger.instructor_impact();
    if impact.is_empty() {
        writeln!(out, "No instructor penalties found.")?;
    }
    for (instructor, points) in impact {
        writeln!(out, "Instructor: {instructor}, Net Impact: {points}")?;
    }

    writeln!(out, "\n\nDETAILED CONSTRAINT VIOLATIONS")?;
    writeln!(out, "{RULE}")?;
    let soft: Vec<_> = ledger
        .items
        .iter()
        .filter(|i| {
            matches!(
                i.category,
                PenaltyCategory::Conflict | PenaltyCategory::Format | PenaltyCategory::LongBlock
            )
        })
        .collect();
    if soft.is_empty() {
        writeln!(out, "No format/soft penalty violations found.")?;
    } else {
        writeln!(out, "Format/Soft Penalty Violations:")?;
        for item in soft {
            writeln!(out, "  {item}")?;
        }
    }
    Ok(())
}

fn render_violations<W: Write>(
    out: &mut W,
    ledger: &PenaltyLedger,
    schedule: &Schedule,
) -> io::Result<()> {
    writeln!(out, "CONSTRAINT VIOLATIONS SUMMARY")?;
    writeln!(out, "{DOUBLE_40}\n")?;

    writeln!(out, "HARD CONSTRAINT VIOLATIONS:")?;
    writeln!(out, "{RULE}")?;
    if schedule.violations.is_empty() {
        writeln!(out, "No hard constraint violations.")?;
    }
    for v in &schedule.violations {
        writeln!(out, "{}: {} (excess {})", label_of(&v.violation_type), v.message, v.excess)?;
    }
    writeln!(out)?;

    writeln!(out, "HEALTH/RELIGION VIOLATIONS:")?;
    writeln!(out, "{RULE}")?;
    let protected = ledger.count(PenaltyCategory::Protected);
    if protected == 0 {
        writeln!(out, "No health/religion constraint violations.")?;
    }
    for item in ledger.items_in(PenaltyCategory::Protected) {
        writeln!(out, "{item}")?;
    }
    writeln!(out, "\nTotal violations: {protected}")?;
    writeln!(
        out,
        "Total penalty: {} points\n",
        ledger.subtotal(PenaltyCategory::Protected)
    )?;

    writeln!(out, "OTHER SOFT PENALTY VIOLATIONS:")?;
    writeln!(out, "{RULE}")?;
    let mut any = false;
    for category in [
        PenaltyCategory::Conflict,
        PenaltyCategory::Format,
        PenaltyCategory::LongBlock,
    ] {
        for item in ledger.items_in(category) {
            writeln!(out, "{item}")?;
            any = true;
        }
    }
    if !any {
        writeln!(out, "No other soft penalty violations.")?;
    }
    Ok(())
}

fn render_percentages<W: Write>(out: &mut W, kpi: &ScheduleKpi) -> io::Result<()> {
    writeln!(out, "Day,Time Slot,Count,Percentage")?;
    for load in &kpi.periods {
        writeln!(
            out,
            "{},{},{},{:.2}",
            load.period.day.name(),
            load.period.slot.label(),
            load.count,
            load.percentage
        )?;
    }
    Ok(())
}

fn render_short_audit<W: Write>(out: &mut W, ledger: &PenaltyLedger) -> io::Result<()> {
    writeln!(out, "SHORT AUDIT REPORT")?;
    writeln!(out, "{DOUBLE_40}\n")?;

    writeln!(out, "HEALTH/RELIGION-RELATED SOFT CONSTRAINTS:")?;
    writeln!(out, "{RULE}")?;
    let protected = ledger.count(PenaltyCategory::Protected);
    if protected == 0 {
        writeln!(out, "No active health/religion-related penalties.")?;
    }
    for item in ledger.items_in(PenaltyCategory::Protected) {
        writeln!(out, "{item}")?;
    }
    writeln!(out, "\nTotal: {protected}\n")?;

    writeln!(out, "OTHER SOFT PENALTIES:")?;
    writeln!(out, "{RULE}")?;
    let others: Vec<_> = ledger
        .items
        .iter()
        .filter(|i| {
            i.points < 0
                && !matches!(
                    i.category,
                    PenaltyCategory::Protected | PenaltyCategory::Preference
                )
        })
        .collect();
    if others.is_empty() {
        writeln!(out, "No active soft penalties.")?;
    }
    for item in &others {
        writeln!(out, "{item}")?;
    }
    writeln!(out, "\nTotal: {}", others.len())?;
    Ok(())
}

fn render_penalty_analysis<W: Write>(
    out: &mut W,
    ledger: &PenaltyLedger,
    objective: i64,
) -> io::Result<()> {
    writeln!(out, "{DOUBLE_50}==========")?;
    writeln!(out, "COMPLETE PENALTY ANALYSIS")?;
    writeln!(out, "{DOUBLE_50}==========")?;
    for (n, category) in PenaltyCategory::ALL.into_iter().enumerate() {
        writeln!(out, "\n{}. {}:", n + 1, category.title())?;
        writeln!(out, "{RULE}----------")?;
        let count = ledger.count(category);
        if count == 0 {
            writeln!(out, "   None")?;
        }
        for item in ledger.items_in(category) {
            writeln!(out, "   {item}")?;
        }
        writeln!(
            out,
            "   Subtotal: {count} item(s) = {} points",
            ledger.subtotal(category)
        )?;
    }

    let impact = ledger.instructor_impact();
    if !impact.is_empty() {
        writeln!(out, "\n   INSTRUCTOR PREFERENCE SUMMARY:")?;
        for (instructor, points) in impact {
            writeln!(out, "   {instructor}: {points} points")?;
        }
    }

    writeln!(out, "\n{DOUBLE_50}==========")?;
    writeln!(out, "TOTAL PENALTY IMPACT: {} points", ledger.total())?;
    writeln!(out, "MODEL OBJECTIVE VALUE: {objective}")?;
    writeln!(out, "{DOUBLE_50}==========")?;
    Ok(())
}

fn render_infeasible<W: Write>(out: &mut W, schedule: &Schedule) -> io::Result<()> {
    writeln!(out, "INFEASIBLE MODEL ANALYSIS")?;
    writeln!(out, "{DOUBLE_40}\n")?;
    writeln!(out, "The best timetable found still breaks these constraints:\n")?;
    let mut violations: Vec<_> = schedule.violations.iter().collect();
    violations.sort_by(|a, b| b.severity.cmp(&a.severity));
    for (i, v) in violations.iter().enumerate() {
        writeln!(out, "Constraint {}: {} [{}]", i + 1, label_of(&v.violation_type), v.entity_id)?;
        writeln!(out, "{} (excess {})\n", v.message, v.excess)?;
    }
    writeln!(out, "Total excess: {}", schedule.total_excess())?;
    Ok(())
}

fn label_of(kind: &ViolationType) -> String {
    match kind {
        ViolationType::Hard(constraint) => constraint.to_string(),
        ViolationType::Custom(name) => name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HardConstraint, Period, Violation};

    fn p(code: &str) -> Period {
        code.parse().unwrap()
    }

    fn schedule() -> Schedule {
        let mut s = Schedule::new();
        let mut add = |id: &str, course: &str, instr: &str, n: u32, part: u8, code: &str| {
            s.add_assignment(
                Assignment::new(id, course, instr, part, p(code))
                    .with_email(format!("{}@uni.edu", instr.to_lowercase()))
                    .with_section_number(n)
                    .with_capacity(Some(30)),
            );
        };
        add("CS100/Bob/1", "CS100", "Bob", 1, 1, "T2");
        add("CS100/Bob/1", "CS100", "Bob", 1, 2, "R2");
        add("CS100/Ada/1", "CS100", "Ada", 1, 1, "M1");
        add("CS100/Ada/1", "CS100", "Ada", 1, 2, "M2");
        add("CS100/Ada/2", "CS100", "Ada", 2, 1, "W3");
        add("CS100/Ada/2", "CS100", "Ada", 2, 2, "F3");
        s
    }

    #[test]
    fn test_display_numbers_restart_per_course() {
        let numbers = display_numbers(&schedule());
        assert_eq!(numbers["CS100/Ada/1"], 1);
        assert_eq!(numbers["CS100/Ada/2"], 2);
        assert_eq!(numbers["CS100/Bob/1"], 3);
    }

    #[test]
    fn test_by_course_listing() {
        let s = schedule();
        let mut buf = Vec::new();
        render_by_course(&mut buf, &s, &display_numbers(&s)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Course Schedule (Lexicographically Sorted):");
        assert!(lines[2].starts_with("Course: CS100, Instructor: Ada, Email: ada@uni.edu, Section: 1, Part: 1, Day: Monday, Slot: 8:30-10:00 AM"));
        assert!(lines[2].ends_with("Capacity: 30, Section Type: Unknown"));
        // Blank line after each section.
        assert_eq!(lines[4], "");
        assert!(text.contains("Instructor: Bob, Email: bob@uni.edu, Section: 3"));
    }

    #[test]
    fn test_by_instructor_listing() {
        let s = schedule();
        let mut buf = Vec::new();
        render_by_instructor(&mut buf, &s, &display_numbers(&s)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Instructor: Ada, Email: ada@uni.edu\n\tCourse: CS100, Section: 1, Part: 1"));
        assert!(text.contains("\n\nInstructor: Bob, Email: bob@uni.edu\n\tCourse: CS100, Section: 3"));
    }

    #[test]
    fn test_percentages_csv() {
        let kpi = ScheduleKpi::calculate(&schedule());
        let mut buf = Vec::new();
        render_percentages(&mut buf, &kpi).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Day,Time Slot,Count,Percentage"));
        let rows: Vec<&str> = lines.collect();
        assert_eq!(rows.len(), 40);
        assert_eq!(rows[0], "Monday,8:30-10:00 AM,1,16.67");
        let total: usize = rows
            .iter()
            .map(|r| r.split(',').nth(2).unwrap().parse::<usize>().unwrap())
            .sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn test_infeasible_report_lists_violations() {
        let mut s = schedule();
        s.add_violation(Violation::hard(
            HardConstraint::InstructorConflict,
            "Ada",
            "Ada teaches 2 meetings at M1",
            1,
        ));
        let mut buf = Vec::new();
        render_infeasible(&mut buf, &s).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Constraint 1:"));
        assert!(text.contains("Ada teaches 2 meetings at M1 (excess 1)"));
        assert!(text.ends_with("Total excess: 1\n"));
    }

    #[test]
    fn test_path_for() {
        let writer = ReportWriter::new("/tmp/out", "2026-01-02_03-04-05");
        assert_eq!(
            writer.path_for("short_audit", "txt"),
            PathBuf::from("/tmp/out/short_audit_2026-01-02_03-04-05.txt")
        );
    }

    #[test]
    fn test_stamp_format() {
        let stamp = stamp_now();
        assert_eq!(stamp.len(), "2026-01-02_03-04-05".len());
        assert_eq!(&stamp[10..11], "_");
    }
}

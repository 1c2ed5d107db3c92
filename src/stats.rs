use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::models::{CycleSubjectStatus, StudyCycle, StudyPlan, Subject};
use crate::storage::StudyData;

/// Dashboard aggregates over completed sessions and tasks.
#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct StudyStats {
    pub total_hours: f64,
    pub weekly_hours: f64,
    pub monthly_hours: f64,
    pub completed_tasks: usize,
    pub pending_tasks: usize,
    /// Subject id -> percent of planned hours studied.
    pub subject_progress: BTreeMap<String, f64>,
}

/// `studied / total * 100`, or 0 when nothing is planned. Not clamped.
pub fn subject_progress(subject: &Subject) -> f64 {
    if subject.total_hours > 0.0 {
        subject.studied_hours / subject.total_hours * 100.0
    } else {
        0.0
    }
}

/// Midnight of the most recent Sunday (today if today is Sunday), in `now`'s zone.
pub fn week_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    local_midnight(&now.timezone(), sunday)
}

/// Midnight of the first day of `now`'s month, in `now`'s zone.
pub fn month_start<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    local_midnight(&now.timezone(), first)
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(chrono::NaiveTime::MIN);
    match tz.from_local_datetime(&midnight).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        // midnight skipped by a DST jump
        None => midnight.and_utc(),
    }
}

/// Aggregates the snapshot relative to `now`. Incomplete sessions are ignored.
pub fn compute_stats<Tz: TimeZone>(data: &StudyData, now: DateTime<Tz>) -> StudyStats {
    let week = week_start(&now);
    let month = month_start(&now);

    let mut stats = StudyStats::default();
    for session in data.study_sessions.iter().filter(|s| s.completed) {
        let hours = session.hours();
        stats.total_hours += hours;
        if session.date >= week {
            stats.weekly_hours += hours;
        }
        if session.date >= month {
            stats.monthly_hours += hours;
        }
    }

    stats.completed_tasks = data.tasks.iter().filter(|t| t.completed).count();
    stats.pending_tasks = data.tasks.len() - stats.completed_tasks;
    stats.subject_progress = data
        .subjects
        .iter()
        .map(|s| (s.id.clone(), subject_progress(s)))
        .collect();
    stats
}

/// Percent of the plan's planned hours studied across its subjects, clamped to 0..=100.
///
/// Subject ids that no longer exist are skipped.
pub fn plan_progress(plan: &StudyPlan, subjects: &[Subject]) -> f64 {
    let (studied, total) = subjects
        .iter()
        .filter(|s| plan.subject_ids.contains(&s.id))
        .fold((0.0, 0.0), |(studied, total), s| {
            (studied + s.studied_hours, total + s.total_hours)
        });
    if total > 0.0 {
        (studied / total * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CycleProgress {
    /// Sums are widened so many large slots cannot overflow.
    pub planned_minutes: u64,
    pub actual_minutes: u64,
    /// Actual over planned minutes, clamped to 0..=100.
    pub percent: f64,
    pub pending: usize,
    pub studying: usize,
    pub paused: usize,
    pub completed: usize,
}

impl CycleProgress {
    pub fn total_subjects(&self) -> usize {
        self.pending + self.studying + self.paused + self.completed
    }
}

pub fn cycle_progress(cycle: &StudyCycle) -> CycleProgress {
    let mut progress = CycleProgress::default();
    for cs in &cycle.subjects {
        progress.planned_minutes += u64::from(cs.planned_minutes);
        progress.actual_minutes += u64::from(cs.actual_minutes);
        match cs.status {
            CycleSubjectStatus::Pending => progress.pending += 1,
            CycleSubjectStatus::Studying => progress.studying += 1,
            CycleSubjectStatus::Paused => progress.paused += 1,
            CycleSubjectStatus::Completed => progress.completed += 1,
        }
    }
    if progress.planned_minutes > 0 {
        progress.percent = (progress.actual_minutes as f64 / progress.planned_minutes as f64
            * 100.0)
            .clamp(0.0, 100.0);
    }
    progress
}

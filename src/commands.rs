use std::io::{self, Write};

use chrono::{Duration, Local, NaiveDate, NaiveTime, Utc};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::auth::{AuthProvider, AuthSession};
use crate::error::StoreError;
use crate::models::{CycleSubjectStatus, PlanStatus, Priority};
use crate::stats::subject_progress;
use crate::store::{
    CyclePatch, NewCycle, NewPlan, NewSession, NewSubject, NewTask, PlanPatch, StudyStore,
    SubjectPatch, TaskPatch,
};
use crate::timer::{format_clock, TimerPhase, TimerTarget};

/// Parses a `YYYY-MM-DD` date, printing a hint on failure.
fn parse_date(s: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(e) => {
            eprintln!("Invalid date '{}': {}. Use YYYY-MM-DD.", s, e);
            None
        }
    }
}

fn parse_optional_date(s: Option<String>) -> Result<Option<NaiveDate>, ()> {
    match s {
        None => Ok(None),
        Some(s) => parse_date(&s).map(Some).ok_or(()),
    }
}

fn report<T>(result: Result<T, StoreError>, on_ok: impl FnOnce(T) -> String) {
    match result {
        Ok(v) => println!("{}", on_ok(v)),
        Err(e) => eprintln!("{}", e),
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::new(n).add_attribute(Attribute::Bold)).collect()
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn progress_color(percent: f64) -> Color {
    if percent >= 100.0 {
        Color::Green
    } else if percent >= 50.0 {
        Color::Yellow
    } else {
        Color::Reset
    }
}

// Subjects

pub fn cmd_subject_add(store: &mut StudyStore, name: String, description: Option<String>, color: Option<String>, hours: f64) {
    let new = NewSubject {
        name,
        description: description.unwrap_or_default(),
        color: color.unwrap_or_else(|| "primary".into()),
        total_hours: hours.max(0.0),
    };
    report(store.add_subject(new), |id| format!("Subject added (id = {})", id));
}

pub fn cmd_subject_list(store: &StudyStore) {
    if store.subjects().is_empty() {
        println!("No subjects found.");
        return;
    }
    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "Color", "Studied", "Planned", "Progress", "Topics", "Pending Tasks"]));
    for s in store.subjects() {
        let progress = subject_progress(s);
        let pending = store.tasks_by_subject(&s.id).iter().filter(|t| !t.completed).count();
        let done_topics = s.topics.iter().filter(|t| t.completed).count();
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(&s.name),
            Cell::new(&s.color),
            Cell::new(format!("{:.1}h", s.studied_hours)),
            Cell::new(format!("{:.1}h", s.total_hours)),
            Cell::new(format!("{:.0}%", progress)).fg(progress_color(progress)),
            Cell::new(format!("{}/{}", done_topics, s.topics.len())),
            Cell::new(pending),
        ]);
    }
    println!("{table}");
}

pub fn cmd_subject_show(store: &StudyStore, id: &str) {
    let Some(s) = store.subject(id) else {
        eprintln!("Subject {} not found.", id);
        return;
    };
    println!("{} ({})", s.name, s.id);
    if !s.description.is_empty() {
        println!("{}", s.description);
    }
    println!(
        "Studied {:.1}h of {:.1}h ({:.0}%)",
        s.studied_hours,
        s.total_hours,
        subject_progress(s)
    );
    if s.topics.is_empty() {
        println!("No topics.");
    } else {
        let mut table = new_table();
        table.set_header(header(&["ID", "Topic", "Studied", "Est", "Done"]));
        for t in &s.topics {
            table.add_row(vec![
                Cell::new(&t.id),
                Cell::new(&t.name),
                Cell::new(format!("{:.1}h", t.studied_hours)),
                Cell::new(format!("{:.1}h", t.estimated_hours)),
                Cell::new(if t.completed { "yes" } else { "" }),
            ]);
            for st in &t.subtopics {
                table.add_row(vec![
                    Cell::new(&st.id),
                    Cell::new(format!("  - {}", st.name)),
                    Cell::new(""),
                    Cell::new(""),
                    Cell::new(if st.completed { "yes" } else { "" }),
                ]);
            }
        }
        println!("{table}");
    }
    let sessions = store.sessions_by_subject(id);
    println!("{} study session(s) recorded.", sessions.len());
}

pub fn cmd_subject_edit(store: &mut StudyStore, id: &str, name: Option<String>, description: Option<String>, color: Option<String>, hours: Option<f64>) {
    let patch = SubjectPatch { name, description, color, total_hours: hours };
    report(store.update_subject(id, patch), |_| format!("Subject {} updated.", id));
}

pub fn cmd_subject_remove(store: &mut StudyStore, id: &str) {
    let tasks = store.tasks_by_subject(id).len();
    let sessions = store.sessions_by_subject(id).len();
    report(store.delete_subject(id), |_| {
        format!("Subject {} removed along with {} task(s) and {} session(s).", id, tasks, sessions)
    });
}

// Topics

pub fn cmd_topic_add(store: &mut StudyStore, subject_id: &str, name: String, hours: f64) {
    report(store.add_topic(subject_id, name, hours.max(0.0)), |id| format!("Topic added (id = {})", id));
}

pub fn cmd_topic_toggle(store: &mut StudyStore, subject_id: &str, topic_id: &str) {
    report(store.toggle_topic_complete(subject_id, topic_id), |done| {
        format!("Topic {} marked as {}.", topic_id, if done { "complete" } else { "pending" })
    });
}

pub fn cmd_topic_remove(store: &mut StudyStore, subject_id: &str, topic_id: &str) {
    report(store.delete_topic(subject_id, topic_id), |_| format!("Topic {} removed.", topic_id));
}

pub fn cmd_subtopic_add(store: &mut StudyStore, subject_id: &str, topic_id: &str, name: String) {
    report(store.add_subtopic(subject_id, topic_id, name), |id| format!("Subtopic added (id = {})", id));
}

pub fn cmd_subtopic_toggle(store: &mut StudyStore, subject_id: &str, topic_id: &str, subtopic_id: &str) {
    report(store.toggle_subtopic_complete(subject_id, topic_id, subtopic_id), |done| {
        format!("Subtopic {} marked as {}.", subtopic_id, if done { "complete" } else { "pending" })
    });
}

// Tasks

pub fn cmd_task_add(store: &mut StudyStore, subject_id: String, title: String, due: String, priority: Priority, description: Option<String>) {
    let Some(due_date) = parse_date(&due) else { return };
    if store.subject(&subject_id).is_none() {
        eprintln!("Warning: subject {} does not exist.", subject_id);
    }
    let new = NewTask { subject_id, title, description, due_date, priority };
    report(store.add_task(new), |id| format!("Task added (id = {})", id));
}

/// Lists tasks ordered by due date, then priority.
pub fn cmd_task_list(store: &StudyStore, all: bool, subject: Option<String>) {
    let mut tasks: Vec<_> = match &subject {
        Some(id) => store.tasks_by_subject(id),
        None => store.tasks().iter().collect(),
    };
    if !all {
        tasks.retain(|t| !t.completed);
    }
    if tasks.is_empty() {
        println!("No tasks found.");
        return;
    }
    tasks.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(b.priority.cmp(&a.priority)));

    let today = Local::now().date_naive();
    let mut table = new_table();
    table.set_header(header(&["ID", "Title", "Subject", "Due", "Time Left", "Priority", "Status"]));
    for t in tasks {
        let days_left = (t.due_date - today).num_days();
        let time_left_str = if days_left < 0 {
            format!("{}d overdue", days_left.abs())
        } else if days_left == 0 {
            "Today".to_string()
        } else {
            format!("{}d", days_left)
        };
        let priority_color = match t.priority {
            Priority::High => Color::Red,
            Priority::Medium => Color::Yellow,
            Priority::Low => Color::Green,
        };
        let subject_name = store.subject(&t.subject_id).map(|s| s.name.as_str()).unwrap_or("-");
        let status = if t.completed { "Done" } else { "Pending" };
        let status_color = if t.completed { Color::Green } else { Color::Yellow };
        table.add_row(vec![
            Cell::new(&t.id),
            Cell::new(&t.title),
            Cell::new(subject_name),
            Cell::new(t.due_date),
            Cell::new(time_left_str).fg(if days_left < 0 && !t.completed { Color::Red } else { Color::Reset }),
            Cell::new(t.priority).fg(priority_color),
            Cell::new(status).fg(status_color),
        ]);
    }
    println!("{table}");
}

pub fn cmd_task_toggle(store: &mut StudyStore, id: &str) {
    report(store.toggle_task_complete(id), |done| {
        format!("Task {} marked as {}.", id, if done { "complete" } else { "pending" })
    });
}

pub fn cmd_task_edit(store: &mut StudyStore, id: &str, title: Option<String>, subject: Option<String>, due: Option<String>, priority: Option<Priority>, description: Option<String>) {
    let Ok(due_date) = parse_optional_date(due) else { return };
    let patch = TaskPatch { subject_id: subject, title, description, due_date, priority, completed: None };
    report(store.update_task(id, patch), |_| format!("Task {} updated.", id));
}

pub fn cmd_task_remove(store: &mut StudyStore, id: &str) {
    report(store.delete_task(id), |_| format!("Task {} removed.", id));
}

// Sessions and the timer

pub fn cmd_session_start(store: &mut StudyStore, subject_id: &str, topic: Option<String>, title: String, description: Option<String>) {
    report(store.start_topic_session(subject_id, topic.as_deref(), title, description), |_| {
        format!("Study session started on subject {}.", subject_id)
    });
}

pub fn cmd_timer_pause(store: &mut StudyStore) {
    let elapsed = store.elapsed();
    report(store.pause_timer(), |_| format!("Timer paused at {}.", format_clock(elapsed)));
}

pub fn cmd_timer_resume(store: &mut StudyStore) {
    report(store.resume_timer(), |_| "Timer resumed.".to_string());
}

pub fn cmd_timer_stop(store: &mut StudyStore, notes: Option<String>) {
    report(store.stop_timer(notes), |session| {
        format!("Session recorded: {} minute(s) (id = {}).", session.duration_minutes, session.id)
    });
}

pub fn cmd_timer_status(store: &StudyStore) {
    let timer = store.timer();
    let Some(target) = timer.target() else {
        println!("No study timer is active.");
        return;
    };
    let what = match target {
        TimerTarget::Session { subject_id, title, .. } => {
            let name = store.subject(subject_id).map(|s| s.name.as_str()).unwrap_or(subject_id);
            format!("{} ({})", title, name)
        }
        TimerTarget::CycleSubject { cycle_id, cycle_subject_id } => {
            let cycle = store.cycle(cycle_id);
            let subject = cycle
                .and_then(|c| c.subjects.iter().find(|cs| &cs.id == cycle_subject_id))
                .and_then(|cs| store.subject(&cs.subject_id))
                .map(|s| s.name.clone())
                .unwrap_or_else(|| cycle_subject_id.clone());
            format!("{} in cycle {}", subject, cycle.map(|c| c.name.as_str()).unwrap_or(cycle_id))
        }
    };
    let phase = match timer.phase() {
        TimerPhase::Running => "running",
        TimerPhase::Paused => "paused",
        TimerPhase::Idle => "idle",
    };
    println!("{}: {} [{}]", what, format_clock(store.elapsed()), phase);
}

pub fn cmd_session_log(store: &mut StudyStore, subject_id: String, topic: Option<String>, minutes: u32, title: Option<String>, date: Option<String>, notes: Option<String>) {
    let Ok(day) = parse_optional_date(date) else { return };
    let date = match day {
        Some(d) => d
            .and_time(NaiveTime::MIN)
            .and_local_timezone(Local)
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| store.now()),
        None => store.now(),
    };
    let new = NewSession {
        subject_id,
        topic_id: topic,
        title: title.unwrap_or_else(|| "Study session".into()),
        description: None,
        duration_minutes: minutes,
        date,
        completed: true,
        notes,
    };
    report(store.add_session(new), |id| format!("Session logged (id = {})", id));
}

pub fn cmd_session_list(store: &StudyStore, subject: Option<String>) {
    let sessions: Vec<_> = match &subject {
        Some(id) => store.sessions_by_subject(id),
        None => store.sessions().iter().collect(),
    };
    if sessions.is_empty() {
        println!("No study sessions found.");
        return;
    }
    let mut table = new_table();
    table.set_header(header(&["ID", "Date", "Subject", "Title", "Minutes", "Notes"]));
    for s in sessions {
        let subject_name = store.subject(&s.subject_id).map(|x| x.name.as_str()).unwrap_or("-");
        table.add_row(vec![
            Cell::new(&s.id),
            Cell::new(s.date.with_timezone(&Local).format("%Y-%m-%d %H:%M")),
            Cell::new(subject_name),
            Cell::new(&s.title),
            Cell::new(s.duration_minutes),
            Cell::new(s.notes.clone().unwrap_or_default()),
        ]);
    }
    println!("{table}");
}

pub fn cmd_session_remove(store: &mut StudyStore, id: &str) {
    report(store.delete_session(id), |_| format!("Session {} removed.", id));
}

// Plans

#[allow(clippy::too_many_arguments)]
pub fn cmd_plan_add(store: &mut StudyStore, name: String, start: String, end: String, subjects: Vec<String>, daily: f64, weekly: f64, status: PlanStatus, priority: Priority, description: Option<String>) {
    let (Some(start_date), Some(end_date)) = (parse_date(&start), parse_date(&end)) else { return };
    if end_date <= start_date {
        eprintln!("End date must be after start date.");
        return;
    }
    let new = NewPlan {
        name,
        description: description.unwrap_or_default(),
        start_date,
        end_date,
        subject_ids: subjects,
        daily_hours_goal: daily,
        weekly_hours_goal: weekly,
        status,
        priority,
        color: "primary".into(),
    };
    report(store.add_plan(new), |id| format!("Plan added (id = {})", id));
}

pub fn cmd_plan_list(store: &StudyStore) {
    if store.plans().is_empty() {
        println!("No plans found.");
        return;
    }
    let active = store.active_plan().map(|p| p.id.clone());
    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "From", "Until", "Subjects", "Goal/day", "Goal/week", "Status", "Progress", ""]));
    for p in store.plans() {
        let progress = store.plan_progress(&p.id).unwrap_or(0.0);
        table.add_row(vec![
            Cell::new(&p.id),
            Cell::new(&p.name),
            Cell::new(p.start_date),
            Cell::new(p.end_date),
            Cell::new(p.subject_ids.len()),
            Cell::new(format!("{:.1}h", p.daily_hours_goal)),
            Cell::new(format!("{:.1}h", p.weekly_hours_goal)),
            Cell::new(p.status),
            Cell::new(format!("{:.0}%", progress)).fg(progress_color(progress)),
            Cell::new(if active.as_deref() == Some(p.id.as_str()) { "active" } else { "" }),
        ]);
    }
    println!("{table}");
}

#[allow(clippy::too_many_arguments)]
pub fn cmd_plan_edit(store: &mut StudyStore, id: &str, name: Option<String>, start: Option<String>, end: Option<String>, subjects: Option<Vec<String>>, daily: Option<f64>, weekly: Option<f64>, status: Option<PlanStatus>, priority: Option<Priority>) {
    let (Ok(start_date), Ok(end_date)) = (parse_optional_date(start), parse_optional_date(end)) else { return };
    let patch = PlanPatch {
        name,
        start_date,
        end_date,
        subject_ids: subjects,
        daily_hours_goal: daily,
        weekly_hours_goal: weekly,
        status,
        priority,
        ..PlanPatch::default()
    };
    report(store.update_plan(id, patch), |_| format!("Plan {} updated.", id));
}

pub fn cmd_plan_activate(store: &mut StudyStore, id: &str) {
    report(store.set_active_plan(id), |_| format!("Plan {} is now active.", id));
}

pub fn cmd_plan_remove(store: &mut StudyStore, id: &str) {
    report(store.delete_plan(id), |_| format!("Plan {} removed.", id));
}

// Cycles

pub fn cmd_cycle_add(store: &mut StudyStore, name: String, start: Option<String>, end: Option<String>, plan: Option<String>, objectives: Vec<String>, description: Option<String>) {
    let (Ok(start), Ok(end)) = (parse_optional_date(start), parse_optional_date(end)) else { return };
    let start_date = start.unwrap_or_else(|| Local::now().date_naive());
    // cycles default to two weeks
    let end_date = end.unwrap_or(start_date + Duration::days(14));
    if end_date <= start_date {
        eprintln!("End date must be after start date.");
        return;
    }
    let new = NewCycle {
        name,
        description: description.unwrap_or_default(),
        plan_id: plan,
        start_date,
        end_date,
        status: PlanStatus::Draft,
        objectives,
    };
    report(store.add_cycle(new), |id| format!("Cycle added (id = {})", id));
}

pub fn cmd_cycle_list(store: &StudyStore) {
    if store.cycles().is_empty() {
        println!("No study cycles found.");
        return;
    }
    let active = store.active_cycle().map(|c| c.id.clone());
    let mut table = new_table();
    table.set_header(header(&["ID", "Name", "Plan", "From", "Until", "Status", "Subjects", "Progress", ""]));
    for c in store.cycles() {
        let progress = store.cycle_progress(&c.id).unwrap_or_default();
        let plan = c
            .plan_id
            .as_deref()
            .map(|id| store.plan(id).map(|p| p.name.as_str()).unwrap_or("Plan not found"))
            .unwrap_or("-");
        table.add_row(vec![
            Cell::new(&c.id),
            Cell::new(&c.name),
            Cell::new(plan),
            Cell::new(c.start_date),
            Cell::new(c.end_date),
            Cell::new(c.status),
            Cell::new(format!("{}/{}", progress.completed, progress.total_subjects())),
            Cell::new(format!(
                "{:.1}h / {:.1}h",
                progress.actual_minutes as f64 / 60.0,
                progress.planned_minutes as f64 / 60.0
            ))
            .fg(progress_color(progress.percent)),
            Cell::new(if active.as_deref() == Some(c.id.as_str()) { "active" } else { "" }),
        ]);
    }
    println!("{table}");
}

pub fn cmd_cycle_show(store: &StudyStore, id: &str) {
    let Some(c) = store.cycle(id) else {
        eprintln!("Cycle {} not found.", id);
        return;
    };
    println!("{} ({}) {} - {} [{}]", c.name, c.id, c.start_date, c.end_date, c.status);
    for o in &c.objectives {
        println!("  * {}", o);
    }
    if c.subjects.is_empty() {
        println!("No subjects in this cycle.");
        return;
    }
    let mut table = new_table();
    table.set_header(header(&["ID", "Subject", "Planned", "Actual", "Status", "Review"]));
    for cs in &c.subjects {
        let name = store.subject(&cs.subject_id).map(|s| s.name.as_str()).unwrap_or("-");
        let status_color = match cs.status {
            CycleSubjectStatus::Completed => Color::Green,
            CycleSubjectStatus::Studying => Color::Cyan,
            CycleSubjectStatus::Paused => Color::Yellow,
            CycleSubjectStatus::Pending => Color::Reset,
        };
        table.add_row(vec![
            Cell::new(&cs.id),
            Cell::new(name),
            Cell::new(format!("{}m", cs.planned_minutes)),
            Cell::new(format!("{}m", cs.actual_minutes)),
            Cell::new(cs.status).fg(status_color),
            Cell::new(
                cs.review_at
                    .map(|r| r.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    println!("{table}");
}

pub fn cmd_cycle_edit(store: &mut StudyStore, id: &str, name: Option<String>, status: Option<PlanStatus>, end: Option<String>) {
    let Ok(end_date) = parse_optional_date(end) else { return };
    let patch = CyclePatch { name, status, end_date, ..CyclePatch::default() };
    report(store.update_cycle(id, patch), |_| format!("Cycle {} updated.", id));
}

pub fn cmd_cycle_activate(store: &mut StudyStore, id: &str) {
    report(store.set_active_cycle(id), |_| format!("Cycle {} is now active.", id));
}

pub fn cmd_cycle_remove(store: &mut StudyStore, id: &str) {
    report(store.delete_cycle(id), |_| format!("Cycle {} removed.", id));
}

pub fn cmd_cycle_add_subject(store: &mut StudyStore, cycle_id: &str, subject_id: &str, minutes: u32) {
    report(store.add_cycle_subject(cycle_id, subject_id, minutes), |id| {
        format!("Subject added to cycle (id = {})", id)
    });
}

pub fn cmd_cycle_remove_subject(store: &mut StudyStore, cycle_id: &str, cycle_subject_id: &str) {
    report(store.remove_cycle_subject(cycle_id, cycle_subject_id), |_| {
        format!("Removed {} from cycle {}.", cycle_subject_id, cycle_id)
    });
}

pub fn cmd_cycle_start(store: &mut StudyStore, cycle_id: &str, cycle_subject_id: &str) {
    report(store.start_cycle_subject(cycle_id, cycle_subject_id), |_| {
        format!("Timing {} in cycle {}.", cycle_subject_id, cycle_id)
    });
}

// Statistics

pub fn cmd_stats(store: &StudyStore) {
    let stats = store.study_stats();
    let mut table = new_table();
    table.set_header(header(&["Total", "This Week", "This Month", "Tasks Done", "Tasks Pending"]));
    table.add_row(vec![
        Cell::new(format!("{:.1}h", stats.total_hours)),
        Cell::new(format!("{:.1}h", stats.weekly_hours)),
        Cell::new(format!("{:.1}h", stats.monthly_hours)),
        Cell::new(stats.completed_tasks).fg(Color::Green),
        Cell::new(stats.pending_tasks).fg(Color::Yellow),
    ]);
    println!("{table}");

    if let Some(plan) = store.active_plan() {
        println!(
            "Active plan: {} ({:.0}%)",
            plan.name,
            store.plan_progress(&plan.id).unwrap_or(0.0)
        );
    }
    if let Some(cycle) = store.active_cycle() {
        let progress = store.cycle_progress(&cycle.id).unwrap_or_default();
        println!("Active cycle: {} ({:.0}%)", cycle.name, progress.percent);
    }
}

// Authentication

pub fn cmd_login(session: &mut AuthSession, provider: &dyn AuthProvider, email: String, password: Option<String>) {
    let password = match password {
        Some(p) => p,
        None => {
            print!("Password: ");
            let _ = io::stdout().flush();
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_err() {
                eprintln!("Failed to read password.");
                return;
            }
            input.trim_end().to_string()
        }
    };
    match session.login(provider, &email, &password) {
        Ok(next) => {
            let name = session.user().map(|u| u.display_name()).unwrap_or_default();
            println!("Logged in as {}. Next page: {}", name, next);
        }
        Err(e) => eprintln!("Login failed: {}", e),
    }
}

pub fn cmd_logout(session: &mut AuthSession) {
    match session.logout() {
        Ok(_) => println!("Logged out."),
        Err(e) => eprintln!("Failed to log out: {}", e),
    }
}

pub fn cmd_whoami(session: &AuthSession) {
    match session.user() {
        Some(u) => println!("{} <{}>", u.display_name(), u.email),
        None => println!("Not logged in."),
    }
}

pub fn cmd_users(session: &AuthSession, provider: &dyn AuthProvider) {
    let token = session.user().map(|u| u.token.as_str()).unwrap_or_default();
    match provider.users(token) {
        Ok(users) => {
            let mut table = new_table();
            table.set_header(header(&["ID", "Email", "First Name", "Last Name"]));
            for u in users {
                table.add_row(vec![Cell::new(u.id), Cell::new(u.email), Cell::new(u.first_name), Cell::new(u.last_name)]);
            }
            println!("{table}");
        }
        Err(e) => eprintln!("{}", e),
    }
}

/// Deletes all study data after confirmation.
pub fn cmd_reset(store: &mut StudyStore, force: bool) {
    if !force {
        print!("Are you sure you want to delete all study data? This cannot be undone. [y/N] ");
        let _ = io::stdout().flush();
        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() || input.trim().to_lowercase() != "y" {
            println!("Aborted.");
            return;
        }
    }
    report(store.reset(), |_| "Study data reset successfully.".to_string());
}

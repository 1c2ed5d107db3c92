//! The entity store: the single in-memory holder of subjects, tasks, sessions,
//! plans, cycles and the study timer.
//!
//! All writes go through `StudyStore` methods, and every successful write is
//! followed by a full snapshot save. Lookups are linear scans; collections are
//! small.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::{StoreError, TimerError};
use crate::models::{
    CycleSubject, CycleSubjectStatus, PlanStatus, Priority, StudyCycle, StudyPlan, StudySession,
    Subject, Subtopic, Task, Topic,
};
use crate::stats::{self, CycleProgress, StudyStats};
use crate::storage::{self, SnapshotStore, StudyData, STUDY_DATA_KEY};
use crate::timer::{Clock, StudyTimer, TimerOutcome, TimerTarget};

/// Delay between finishing a cycle subject and its review.
pub const REVIEW_DELAY_HOURS: i64 = 24;

/// Anything stored in a collection and addressed by id.
pub trait Entity {
    const KIND: &'static str;
    fn id(&self) -> &str;
}

macro_rules! entity {
    ($ty:ty, $kind:literal) => {
        impl Entity for $ty {
            const KIND: &'static str = $kind;
            fn id(&self) -> &str {
                &self.id
            }
        }
    };
}

entity!(Subject, "subject");
entity!(Topic, "topic");
entity!(Subtopic, "subtopic");
entity!(Task, "task");
entity!(StudySession, "study session");
entity!(StudyPlan, "study plan");
entity!(StudyCycle, "study cycle");
entity!(CycleSubject, "cycle subject");

fn find<'a, T: Entity>(items: &'a [T], id: &str) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

fn find_mut<'a, T: Entity>(items: &'a mut [T], id: &str) -> Result<&'a mut T, StoreError> {
    items
        .iter_mut()
        .find(|item| item.id() == id)
        .ok_or_else(|| StoreError::not_found(T::KIND, id))
}

fn remove<T: Entity>(items: &mut Vec<T>, id: &str) -> Result<T, StoreError> {
    let idx = items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| StoreError::not_found(T::KIND, id))?;
    Ok(items.remove(idx))
}

/// Hands out ids from the clock's millisecond timestamp, bumped so every id
/// is strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: i64,
}

impl IdGenerator {
    /// Starts above every numeric id already present in `data`. Ids past the
    /// last representable timestamp are not generator output and are skipped.
    pub fn seeded(data: &StudyData) -> Self {
        let ids = data
            .subjects
            .iter()
            .flat_map(|s| {
                std::iter::once(s.id.as_str()).chain(s.topics.iter().flat_map(|t| {
                    std::iter::once(t.id.as_str()).chain(t.subtopics.iter().map(|st| st.id.as_str()))
                }))
            })
            .chain(data.tasks.iter().map(|t| t.id.as_str()))
            .chain(data.study_sessions.iter().map(|s| s.id.as_str()))
            .chain(data.study_plans.iter().map(|p| p.id.as_str()))
            .chain(data.study_cycles.iter().flat_map(|c| {
                std::iter::once(c.id.as_str()).chain(c.subjects.iter().map(|cs| cs.id.as_str()))
            }));
        let ceiling = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        let last = ids
            .filter_map(|id| id.parse::<i64>().ok())
            .filter(|id| *id <= ceiling)
            .max()
            .unwrap_or(0);
        IdGenerator { last }
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> String {
        let id = now.timestamp_millis().max(self.last.saturating_add(1));
        self.last = id;
        id.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewSubject {
    pub name: String,
    pub description: String,
    pub color: String,
    pub total_hours: f64,
}

/// Fields to overwrite on a subject. `studied_hours` is not patchable: only
/// completed sessions move it.
#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub total_hours: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub subject_id: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: NaiveDate,
    pub priority: Priority,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub subject_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

/// A session logged after the fact rather than timed.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub subject_id: String,
    pub topic_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub duration_minutes: u32,
    pub date: DateTime<Utc>,
    pub completed: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewPlan {
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub subject_ids: Vec<String>,
    pub daily_hours_goal: f64,
    pub weekly_hours_goal: f64,
    pub status: PlanStatus,
    pub priority: Priority,
    pub color: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlanPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub subject_ids: Option<Vec<String>>,
    pub daily_hours_goal: Option<f64>,
    pub weekly_hours_goal: Option<f64>,
    pub status: Option<PlanStatus>,
    pub priority: Option<Priority>,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCycle {
    pub name: String,
    pub description: String,
    pub plan_id: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: PlanStatus,
    pub objectives: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CyclePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub plan_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<PlanStatus>,
    pub objectives: Option<Vec<String>>,
}

pub struct StudyStore {
    data: StudyData,
    storage: Box<dyn SnapshotStore>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
}

impl StudyStore {
    /// Loads the snapshot from `storage` (or starts empty) and takes ownership of it.
    pub fn open(storage: Box<dyn SnapshotStore>, clock: Arc<dyn Clock>) -> Self {
        let data = storage::load(storage.as_ref());
        let ids = IdGenerator::seeded(&data);
        StudyStore { data, storage, clock, ids }
    }

    pub fn data(&self) -> &StudyData {
        &self.data
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn next_id(&mut self) -> String {
        let now = self.clock.now();
        self.ids.next(now)
    }

    /// Writes the current snapshot.
    pub fn save(&self) -> Result<(), StoreError> {
        storage::save(self.storage.as_ref(), &self.data)?;
        Ok(())
    }

    /// Replaces in-memory state with the persisted snapshot.
    pub fn reload(&mut self) {
        self.data = storage::load(self.storage.as_ref());
        self.ids = IdGenerator::seeded(&self.data);
    }

    /// Drops every entity and deletes the snapshot.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.data = StudyData::default();
        self.storage.remove(STUDY_DATA_KEY)?;
        info!("study data reset");
        Ok(())
    }

    // Subjects

    pub fn subjects(&self) -> &[Subject] {
        &self.data.subjects
    }

    pub fn subject(&self, id: &str) -> Option<&Subject> {
        find(&self.data.subjects, id)
    }

    pub fn add_subject(&mut self, new: NewSubject) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        self.data.subjects.push(Subject {
            id: id.clone(),
            name: new.name,
            description: new.description,
            color: new.color,
            total_hours: new.total_hours,
            studied_hours: 0.0,
            topics: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        info!(subject = %id, "subject added");
        self.save()?;
        Ok(id)
    }

    pub fn update_subject(&mut self, id: &str, patch: SubjectPatch) -> Result<(), StoreError> {
        let now = self.now();
        let subject = find_mut(&mut self.data.subjects, id)?;
        if let Some(name) = patch.name {
            subject.name = name;
        }
        if let Some(description) = patch.description {
            subject.description = description;
        }
        if let Some(color) = patch.color {
            subject.color = color;
        }
        if let Some(total) = patch.total_hours {
            subject.total_hours = total;
        }
        subject.updated_at = now;
        info!(subject = %id, "subject updated");
        self.save()
    }

    /// Removes the subject together with its tasks and sessions.
    pub fn delete_subject(&mut self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.data.subjects, id)?;
        let tasks_before = self.data.tasks.len();
        let sessions_before = self.data.study_sessions.len();
        self.data.tasks.retain(|t| t.subject_id != id);
        self.data.study_sessions.retain(|s| s.subject_id != id);
        info!(
            subject = %id,
            tasks = tasks_before - self.data.tasks.len(),
            sessions = sessions_before - self.data.study_sessions.len(),
            "subject deleted"
        );
        self.save()
    }

    pub fn add_topic(
        &mut self,
        subject_id: &str,
        name: String,
        estimated_hours: f64,
    ) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        let subject = find_mut(&mut self.data.subjects, subject_id)?;
        subject.topics.push(Topic {
            id: id.clone(),
            name,
            estimated_hours,
            studied_hours: 0.0,
            completed: false,
            subtopics: Vec::new(),
        });
        subject.updated_at = now;
        self.save()?;
        Ok(id)
    }

    pub fn delete_topic(&mut self, subject_id: &str, topic_id: &str) -> Result<(), StoreError> {
        let now = self.now();
        let subject = find_mut(&mut self.data.subjects, subject_id)?;
        remove(&mut subject.topics, topic_id)?;
        subject.updated_at = now;
        self.save()
    }

    /// Flips a topic's completion flag and returns the new value.
    pub fn toggle_topic_complete(
        &mut self,
        subject_id: &str,
        topic_id: &str,
    ) -> Result<bool, StoreError> {
        let now = self.now();
        let subject = find_mut(&mut self.data.subjects, subject_id)?;
        let topic = find_mut(&mut subject.topics, topic_id)?;
        topic.completed = !topic.completed;
        let completed = topic.completed;
        subject.updated_at = now;
        self.save()?;
        Ok(completed)
    }

    pub fn add_subtopic(
        &mut self,
        subject_id: &str,
        topic_id: &str,
        name: String,
    ) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        let subject = find_mut(&mut self.data.subjects, subject_id)?;
        let topic = find_mut(&mut subject.topics, topic_id)?;
        topic.subtopics.push(Subtopic { id: id.clone(), name, completed: false });
        subject.updated_at = now;
        self.save()?;
        Ok(id)
    }

    pub fn toggle_subtopic_complete(
        &mut self,
        subject_id: &str,
        topic_id: &str,
        subtopic_id: &str,
    ) -> Result<bool, StoreError> {
        let now = self.now();
        let subject = find_mut(&mut self.data.subjects, subject_id)?;
        let topic = find_mut(&mut subject.topics, topic_id)?;
        let subtopic = find_mut(&mut topic.subtopics, subtopic_id)?;
        subtopic.completed = !subtopic.completed;
        let completed = subtopic.completed;
        subject.updated_at = now;
        self.save()?;
        Ok(completed)
    }

    // Tasks

    pub fn tasks(&self) -> &[Task] {
        &self.data.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        find(&self.data.tasks, id)
    }

    pub fn tasks_by_subject(&self, subject_id: &str) -> Vec<&Task> {
        self.data.tasks.iter().filter(|t| t.subject_id == subject_id).collect()
    }

    pub fn pending_tasks(&self) -> Vec<&Task> {
        self.data.tasks.iter().filter(|t| !t.completed).collect()
    }

    pub fn completed_tasks(&self) -> Vec<&Task> {
        self.data.tasks.iter().filter(|t| t.completed).collect()
    }

    pub fn add_task(&mut self, new: NewTask) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        self.data.tasks.push(Task {
            id: id.clone(),
            subject_id: new.subject_id,
            title: new.title,
            description: new.description,
            due_date: new.due_date,
            priority: new.priority,
            completed: false,
            created_at: now,
        });
        info!(task = %id, "task added");
        self.save()?;
        Ok(id)
    }

    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<(), StoreError> {
        let task = find_mut(&mut self.data.tasks, id)?;
        if let Some(subject_id) = patch.subject_id {
            task.subject_id = subject_id;
        }
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(due) = patch.due_date {
            task.due_date = due;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        info!(task = %id, "task updated");
        self.save()
    }

    pub fn delete_task(&mut self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.data.tasks, id)?;
        info!(task = %id, "task deleted");
        self.save()
    }

    /// Flips the completion flag and returns the new value.
    pub fn toggle_task_complete(&mut self, id: &str) -> Result<bool, StoreError> {
        let task = find_mut(&mut self.data.tasks, id)?;
        task.completed = !task.completed;
        let completed = task.completed;
        info!(task = %id, completed, "task toggled");
        self.save()?;
        Ok(completed)
    }

    // Sessions

    pub fn sessions(&self) -> &[StudySession] {
        &self.data.study_sessions
    }

    pub fn sessions_by_subject(&self, subject_id: &str) -> Vec<&StudySession> {
        self.data
            .study_sessions
            .iter()
            .filter(|s| s.subject_id == subject_id)
            .collect()
    }

    /// Logs a session that was not timed here. Completed sessions count toward
    /// the subject's studied hours, and the topic's when one is given.
    pub fn add_session(&mut self, new: NewSession) -> Result<String, StoreError> {
        self.check_topic(&new.subject_id, new.topic_id.as_deref())?;
        let id = self.next_id();
        let session = StudySession {
            id: id.clone(),
            subject_id: new.subject_id,
            topic_id: new.topic_id,
            title: new.title,
            description: new.description,
            duration_minutes: new.duration_minutes,
            date: new.date,
            completed: new.completed,
            notes: new.notes,
        };
        self.record_session(session);
        self.save()?;
        Ok(id)
    }

    /// Sessions are history: deleting one leaves the subject's studied hours as they are.
    pub fn delete_session(&mut self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.data.study_sessions, id)?;
        info!(session = %id, "session deleted");
        self.save()
    }

    fn record_session(&mut self, session: StudySession) {
        if session.completed {
            let now = self.now();
            match self.data.subjects.iter_mut().find(|s| s.id == session.subject_id) {
                Some(subject) => {
                    subject.studied_hours += session.hours();
                    subject.updated_at = now;
                    if let Some(topic_id) = &session.topic_id {
                        match subject.topics.iter_mut().find(|t| &t.id == topic_id) {
                            Some(topic) => topic.studied_hours += session.hours(),
                            None => warn!(topic = %topic_id, "session recorded for unknown topic"),
                        }
                    }
                }
                None => warn!(subject = %session.subject_id, "session recorded for unknown subject"),
            }
        }
        info!(
            session = %session.id,
            subject = %session.subject_id,
            minutes = session.duration_minutes,
            "session recorded"
        );
        self.data.study_sessions.push(session);
    }

    // Plans

    pub fn plans(&self) -> &[StudyPlan] {
        &self.data.study_plans
    }

    pub fn plan(&self, id: &str) -> Option<&StudyPlan> {
        find(&self.data.study_plans, id)
    }

    pub fn active_plan(&self) -> Option<&StudyPlan> {
        self.data.active_study_plan.as_deref().and_then(|id| self.plan(id))
    }

    pub fn add_plan(&mut self, new: NewPlan) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        self.data.study_plans.push(StudyPlan {
            id: id.clone(),
            name: new.name,
            description: new.description,
            start_date: new.start_date,
            end_date: new.end_date,
            subject_ids: new.subject_ids,
            daily_hours_goal: new.daily_hours_goal,
            weekly_hours_goal: new.weekly_hours_goal,
            status: new.status,
            priority: new.priority,
            color: new.color,
            created_at: now,
            updated_at: now,
        });
        info!(plan = %id, "plan added");
        self.save()?;
        Ok(id)
    }

    pub fn update_plan(&mut self, id: &str, patch: PlanPatch) -> Result<(), StoreError> {
        let now = self.now();
        let plan = find_mut(&mut self.data.study_plans, id)?;
        if let Some(name) = patch.name {
            plan.name = name;
        }
        if let Some(description) = patch.description {
            plan.description = description;
        }
        if let Some(start) = patch.start_date {
            plan.start_date = start;
        }
        if let Some(end) = patch.end_date {
            plan.end_date = end;
        }
        if let Some(subject_ids) = patch.subject_ids {
            plan.subject_ids = subject_ids;
        }
        if let Some(daily) = patch.daily_hours_goal {
            plan.daily_hours_goal = daily;
        }
        if let Some(weekly) = patch.weekly_hours_goal {
            plan.weekly_hours_goal = weekly;
        }
        if let Some(status) = patch.status {
            plan.status = status;
        }
        if let Some(priority) = patch.priority {
            plan.priority = priority;
        }
        if let Some(color) = patch.color {
            plan.color = color;
        }
        plan.updated_at = now;
        info!(plan = %id, "plan updated");
        self.save()
    }

    pub fn delete_plan(&mut self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.data.study_plans, id)?;
        if self.data.active_study_plan.as_deref() == Some(id) {
            self.data.active_study_plan = None;
        }
        info!(plan = %id, "plan deleted");
        self.save()
    }

    pub fn set_active_plan(&mut self, id: &str) -> Result<(), StoreError> {
        if self.plan(id).is_none() {
            return Err(StoreError::not_found(StudyPlan::KIND, id));
        }
        self.data.active_study_plan = Some(id.to_string());
        info!(plan = %id, "active plan set");
        self.save()
    }

    pub fn plan_progress(&self, id: &str) -> Option<f64> {
        self.plan(id).map(|plan| stats::plan_progress(plan, &self.data.subjects))
    }

    // Cycles

    pub fn cycles(&self) -> &[StudyCycle] {
        &self.data.study_cycles
    }

    pub fn cycle(&self, id: &str) -> Option<&StudyCycle> {
        find(&self.data.study_cycles, id)
    }

    pub fn active_cycle(&self) -> Option<&StudyCycle> {
        self.data.active_cycle.as_deref().and_then(|id| self.cycle(id))
    }

    pub fn add_cycle(&mut self, new: NewCycle) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        self.data.study_cycles.push(StudyCycle {
            id: id.clone(),
            name: new.name,
            description: new.description,
            plan_id: new.plan_id,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            objectives: new.objectives.into_iter().filter(|o| !o.trim().is_empty()).collect(),
            subjects: Vec::new(),
            created_at: now,
            updated_at: now,
        });
        info!(cycle = %id, "cycle added");
        self.save()?;
        Ok(id)
    }

    pub fn update_cycle(&mut self, id: &str, patch: CyclePatch) -> Result<(), StoreError> {
        let now = self.now();
        let cycle = find_mut(&mut self.data.study_cycles, id)?;
        if let Some(name) = patch.name {
            cycle.name = name;
        }
        if let Some(description) = patch.description {
            cycle.description = description;
        }
        if let Some(plan_id) = patch.plan_id {
            cycle.plan_id = Some(plan_id);
        }
        if let Some(start) = patch.start_date {
            cycle.start_date = start;
        }
        if let Some(end) = patch.end_date {
            cycle.end_date = end;
        }
        if let Some(status) = patch.status {
            cycle.status = status;
        }
        if let Some(objectives) = patch.objectives {
            cycle.objectives = objectives;
        }
        cycle.updated_at = now;
        info!(cycle = %id, "cycle updated");
        self.save()
    }

    pub fn delete_cycle(&mut self, id: &str) -> Result<(), StoreError> {
        remove(&mut self.data.study_cycles, id)?;
        if self.data.active_cycle.as_deref() == Some(id) {
            self.data.active_cycle = None;
        }
        if matches!(self.data.study_timer.target(), Some(TimerTarget::CycleSubject { cycle_id, .. }) if cycle_id == id)
        {
            warn!(cycle = %id, "discarding timer of deleted cycle");
            self.data.study_timer = StudyTimer::default();
        }
        info!(cycle = %id, "cycle deleted");
        self.save()
    }

    pub fn set_active_cycle(&mut self, id: &str) -> Result<(), StoreError> {
        if self.cycle(id).is_none() {
            return Err(StoreError::not_found(StudyCycle::KIND, id));
        }
        self.data.active_cycle = Some(id.to_string());
        info!(cycle = %id, "active cycle set");
        self.save()
    }

    pub fn add_cycle_subject(
        &mut self,
        cycle_id: &str,
        subject_id: &str,
        planned_minutes: u32,
    ) -> Result<String, StoreError> {
        let now = self.now();
        let id = self.next_id();
        let cycle = find_mut(&mut self.data.study_cycles, cycle_id)?;
        cycle.subjects.push(CycleSubject {
            id: id.clone(),
            subject_id: subject_id.to_string(),
            planned_minutes,
            actual_minutes: 0,
            status: CycleSubjectStatus::Pending,
            last_studied_at: None,
            review_at: None,
        });
        cycle.updated_at = now;
        self.save()?;
        Ok(id)
    }

    pub fn remove_cycle_subject(
        &mut self,
        cycle_id: &str,
        cycle_subject_id: &str,
    ) -> Result<(), StoreError> {
        let now = self.now();
        let cycle = find_mut(&mut self.data.study_cycles, cycle_id)?;
        remove(&mut cycle.subjects, cycle_subject_id)?;
        cycle.updated_at = now;
        if self.timing_cycle_subject(cycle_id, cycle_subject_id) {
            warn!(cycle_subject = %cycle_subject_id, "discarding timer of removed cycle subject");
            self.data.study_timer = StudyTimer::default();
        }
        self.save()
    }

    pub fn cycle_progress(&self, id: &str) -> Option<CycleProgress> {
        self.cycle(id).map(stats::cycle_progress)
    }

    fn timing_cycle_subject(&self, cycle_id: &str, cycle_subject_id: &str) -> bool {
        matches!(
            self.data.study_timer.target(),
            Some(TimerTarget::CycleSubject { cycle_id: c, cycle_subject_id: cs })
                if c == cycle_id && cs == cycle_subject_id
        )
    }

    fn cycle_subject_mut(
        &mut self,
        cycle_id: &str,
        cycle_subject_id: &str,
    ) -> Result<(&mut CycleSubject, String), StoreError> {
        let cycle = find_mut(&mut self.data.study_cycles, cycle_id)?;
        let name = cycle.name.clone();
        let cs = find_mut(&mut cycle.subjects, cycle_subject_id)?;
        Ok((cs, name))
    }

    // Timer

    pub fn timer(&self) -> &StudyTimer {
        &self.data.study_timer
    }

    pub fn elapsed(&self) -> Duration {
        self.data.study_timer.elapsed(self.now())
    }

    /// Starts timing an ad-hoc session. Rejected while any timer is active.
    pub fn start_session(
        &mut self,
        subject_id: &str,
        title: String,
        description: Option<String>,
    ) -> Result<(), StoreError> {
        self.start_topic_session(subject_id, None, title, description)
    }

    /// Like `start_session`, with the time also counted toward `topic_id`.
    pub fn start_topic_session(
        &mut self,
        subject_id: &str,
        topic_id: Option<&str>,
        title: String,
        description: Option<String>,
    ) -> Result<(), StoreError> {
        if self.subject(subject_id).is_none() {
            return Err(StoreError::not_found(Subject::KIND, subject_id));
        }
        self.check_topic(subject_id, topic_id)?;
        let now = self.now();
        let target = TimerTarget::Session {
            subject_id: subject_id.to_string(),
            topic_id: topic_id.map(str::to_string),
            title,
            description,
        };
        self.data.study_timer.start(target, now)?;
        info!(subject = %subject_id, topic = ?topic_id, "study session started");
        self.save()
    }

    fn check_topic(&self, subject_id: &str, topic_id: Option<&str>) -> Result<(), StoreError> {
        let Some(topic_id) = topic_id else { return Ok(()) };
        let known = self
            .subject(subject_id)
            .is_some_and(|s| s.topics.iter().any(|t| t.id == topic_id));
        if known {
            Ok(())
        } else {
            Err(StoreError::not_found(Topic::KIND, topic_id))
        }
    }

    /// Starts timing a cycle subject and marks it `studying`.
    ///
    /// If another cycle subject is being timed, its time is booked and it is
    /// left `paused` first. An active ad-hoc session is never displaced.
    pub fn start_cycle_subject(
        &mut self,
        cycle_id: &str,
        cycle_subject_id: &str,
    ) -> Result<(), StoreError> {
        self.cycle_subject_mut(cycle_id, cycle_subject_id)?;
        match self.data.study_timer.target() {
            None => {}
            Some(TimerTarget::CycleSubject { .. }) => {
                if self.timing_cycle_subject(cycle_id, cycle_subject_id) {
                    return Err(TimerError::AlreadyActive.into());
                }
                let now = self.now();
                let outcome = self.data.study_timer.stop(now)?;
                self.book(outcome, None, CycleSubjectStatus::Paused)?;
            }
            Some(TimerTarget::Session { .. }) => return Err(TimerError::AlreadyActive.into()),
        }

        let now = self.now();
        let target = TimerTarget::CycleSubject {
            cycle_id: cycle_id.to_string(),
            cycle_subject_id: cycle_subject_id.to_string(),
        };
        self.data.study_timer.start(target, now)?;
        let (cs, _) = self.cycle_subject_mut(cycle_id, cycle_subject_id)?;
        cs.status = CycleSubjectStatus::Studying;
        info!(cycle = %cycle_id, cycle_subject = %cycle_subject_id, "cycle subject started");
        self.save()
    }

    pub fn pause_timer(&mut self) -> Result<(), StoreError> {
        let now = self.now();
        self.data.study_timer.pause(now)?;
        self.set_timed_status(CycleSubjectStatus::Paused);
        info!("timer paused");
        self.save()
    }

    pub fn resume_timer(&mut self) -> Result<(), StoreError> {
        let now = self.now();
        self.data.study_timer.resume(now)?;
        self.set_timed_status(CycleSubjectStatus::Studying);
        info!("timer resumed");
        self.save()
    }

    /// Stops the timer, books the elapsed minutes and returns the recorded session.
    ///
    /// A cycle subject is marked completed and gets a review 24 hours later.
    /// If the timed entity was deleted meanwhile, the time is discarded and
    /// `NotFound` is returned.
    pub fn stop_timer(&mut self, notes: Option<String>) -> Result<StudySession, StoreError> {
        let now = self.now();
        let outcome = self.data.study_timer.stop(now)?;
        let booked = self.book(outcome, notes, CycleSubjectStatus::Completed);
        self.save()?;
        booked
    }

    fn set_timed_status(&mut self, status: CycleSubjectStatus) {
        if let Some(TimerTarget::CycleSubject { cycle_id, cycle_subject_id }) =
            self.data.study_timer.target().cloned()
        {
            if let Ok((cs, _)) = self.cycle_subject_mut(&cycle_id, &cycle_subject_id) {
                cs.status = status;
            }
        }
    }

    /// Records a finished timing run against its target.
    fn book(
        &mut self,
        outcome: TimerOutcome,
        notes: Option<String>,
        cycle_status: CycleSubjectStatus,
    ) -> Result<StudySession, StoreError> {
        let now = self.now();
        let minutes = outcome.minutes();
        let (subject_id, topic_id, title, description) = match &outcome.target {
            TimerTarget::Session { subject_id, topic_id, title, description } => {
                if self.subject(subject_id).is_none() {
                    warn!(subject = %subject_id, "timed subject no longer exists");
                    return Err(StoreError::not_found(Subject::KIND, subject_id.as_str()));
                }
                (subject_id.clone(), topic_id.clone(), title.clone(), description.clone())
            }
            TimerTarget::CycleSubject { cycle_id, cycle_subject_id } => {
                let (cs, cycle_name) = self.cycle_subject_mut(cycle_id, cycle_subject_id)?;
                cs.actual_minutes = cs.actual_minutes.saturating_add(minutes);
                cs.status = cycle_status;
                cs.last_studied_at = Some(now);
                if cycle_status == CycleSubjectStatus::Completed {
                    cs.review_at = Some(now + Duration::hours(REVIEW_DELAY_HOURS));
                }
                (cs.subject_id.clone(), None, cycle_name, None)
            }
        };

        let session = StudySession {
            id: self.next_id(),
            subject_id,
            topic_id,
            title,
            description,
            duration_minutes: minutes,
            date: outcome.started_at,
            completed: true,
            notes,
        };
        self.record_session(session.clone());
        Ok(session)
    }

    // Statistics

    /// Aggregates relative to the local calendar at call time.
    pub fn study_stats(&self) -> StudyStats {
        stats::compute_stats(&self.data, self.now().with_timezone(&Local))
    }

    /// Same as `study_stats` with an explicit reference time.
    pub fn study_stats_at<Tz: chrono::TimeZone>(&self, now: DateTime<Tz>) -> StudyStats {
        stats::compute_stats(&self.data, now)
    }

    pub fn subject_progress(&self, id: &str) -> Option<f64> {
        self.subject(id).map(stats::subject_progress)
    }
}

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use studyust::auth::{AuthSession, FixedCredentialAuth, DEMO_EMAIL, DEMO_PASSWORD};
use studyust::commands::*;
use studyust::models::{CycleSubjectStatus, PlanStatus, Priority};
use studyust::storage::{FileStore, MemoryStore};
use studyust::store::StudyStore;
use studyust::timer::ManualClock;
use tempfile::tempdir;

fn with_test_store<F>(f: F)
where
    F: FnOnce(&mut StudyStore, &ManualClock),
{
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()));
    let mut store = StudyStore::open(Box::new(MemoryStore::new()), clock.clone());
    f(&mut store, &clock);
}

fn first_subject(store: &StudyStore) -> String {
    store.subjects()[0].id.clone()
}

#[test]
fn test_subject_add_and_edit() {
    with_test_store(|store, _| {
        cmd_subject_add(store, "History".into(), None, None, 12.0);
        let id = first_subject(store);
        assert_eq!(store.subjects()[0].color, "primary");

        cmd_subject_edit(store, &id, None, Some("Modern era".into()), None, Some(20.0));
        let s = store.subject(&id).unwrap();
        assert_eq!(s.name, "History");
        assert_eq!(s.description, "Modern era");
        assert_eq!(s.total_hours, 20.0);

        cmd_subject_list(store);
        cmd_subject_show(store, &id);
    });
}

#[test]
fn test_topic_commands() {
    with_test_store(|store, _| {
        cmd_subject_add(store, "History".into(), None, None, 12.0);
        let id = first_subject(store);
        cmd_topic_add(store, &id, "Revolutions".into(), 3.0);
        let topic = store.subject(&id).unwrap().topics[0].id.clone();
        cmd_subtopic_add(store, &id, &topic, "1848".into());
        let sub = store.subject(&id).unwrap().topics[0].subtopics[0].id.clone();

        cmd_topic_toggle(store, &id, &topic);
        cmd_subtopic_toggle(store, &id, &topic, &sub);
        let t = &store.subject(&id).unwrap().topics[0];
        assert!(t.completed);
        assert!(t.subtopics[0].completed);

        cmd_topic_remove(store, &id, &topic);
        assert!(store.subject(&id).unwrap().topics.is_empty());
    });
}

#[test]
fn test_task_commands() {
    with_test_store(|store, _| {
        cmd_subject_add(store, "History".into(), None, None, 12.0);
        let subject = first_subject(store);
        cmd_task_add(store, subject.clone(), "Essay".into(), "2025-04-10".into(), Priority::High, None);
        cmd_task_add(store, subject.clone(), "Bad date".into(), "10/04/2025".into(), Priority::Low, None);
        assert_eq!(store.tasks().len(), 1);

        let id = store.tasks()[0].id.clone();
        cmd_task_toggle(store, &id);
        assert!(store.task(&id).unwrap().completed);

        cmd_task_edit(store, &id, Some("Long essay".into()), None, Some("2025-04-12".into()), None, None);
        let task = store.task(&id).unwrap();
        assert_eq!(task.title, "Long essay");
        assert_eq!(task.due_date.to_string(), "2025-04-12");
        assert_eq!(task.priority, Priority::High);

        cmd_task_list(store, true, None);
        cmd_task_remove(store, &id);
        assert!(store.tasks().is_empty());
    });
}

#[test]
fn test_session_timer_commands() {
    with_test_store(|store, clock| {
        cmd_subject_add(store, "History".into(), None, None, 10.0);
        let subject = first_subject(store);

        cmd_session_start(store, &subject, None, "Reading".into(), None);
        clock.advance(Duration::minutes(30));
        cmd_timer_pause(store);
        clock.advance(Duration::minutes(30));
        cmd_timer_resume(store);
        clock.advance(Duration::minutes(30));
        cmd_timer_status(store);
        cmd_timer_stop(store, Some("notes".into()));

        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.sessions()[0].duration_minutes, 60);
        assert_eq!(store.subject(&subject).unwrap().studied_hours, 1.0);

        cmd_session_log(store, subject.clone(), None, 30, None, None, None);
        assert_eq!(store.subject(&subject).unwrap().studied_hours, 1.5);

        let logged = store.sessions()[1].id.clone();
        cmd_session_list(store, None);
        cmd_session_remove(store, &logged);
        assert_eq!(store.sessions().len(), 1);
        assert_eq!(store.subject(&subject).unwrap().studied_hours, 1.5);
    });
}

#[test]
fn test_plan_commands() {
    with_test_store(|store, _| {
        cmd_subject_add(store, "History".into(), None, None, 10.0);
        let subject = first_subject(store);
        cmd_plan_add(store, "Backwards".into(), "2025-05-01".into(), "2025-04-01".into(), vec![], 1.0, 5.0, PlanStatus::Draft, Priority::Low, None);
        assert!(store.plans().is_empty());

        cmd_plan_add(store, "Spring".into(), "2025-03-01".into(), "2025-05-31".into(), vec![subject], 2.0, 10.0, PlanStatus::Active, Priority::High, None);
        let id = store.plans()[0].id.clone();
        cmd_plan_activate(store, &id);
        assert_eq!(store.active_plan().map(|p| p.name.as_str()), Some("Spring"));

        cmd_plan_edit(store, &id, None, None, None, None, Some(3.0), None, Some(PlanStatus::Paused), None);
        let plan = store.plan(&id).unwrap();
        assert_eq!(plan.daily_hours_goal, 3.0);
        assert_eq!(plan.status, PlanStatus::Paused);

        cmd_plan_list(store);
        cmd_stats(store);
        cmd_plan_remove(store, &id);
        assert!(store.active_plan().is_none());
    });
}

#[test]
fn test_cycle_commands() {
    with_test_store(|store, clock| {
        cmd_subject_add(store, "History".into(), None, None, 10.0);
        let subject = first_subject(store);
        cmd_cycle_add(store, "Sprint".into(), Some("2025-03-17".into()), None, None, vec!["Read".into()], None);
        let cycle = store.cycles()[0].clone();
        assert_eq!(cycle.end_date.to_string(), "2025-03-31");

        cmd_cycle_activate(store, &cycle.id);
        cmd_cycle_add_subject(store, &cycle.id, &subject, 45);
        let cs = store.cycle(&cycle.id).unwrap().subjects[0].id.clone();

        cmd_cycle_start(store, &cycle.id, &cs);
        clock.advance(Duration::minutes(45));
        cmd_timer_stop(store, None);

        let done = &store.cycle(&cycle.id).unwrap().subjects[0];
        assert_eq!(done.status, CycleSubjectStatus::Completed);
        assert_eq!(done.actual_minutes, 45);

        cmd_cycle_edit(store, &cycle.id, Some("Sprint 1".into()), Some(PlanStatus::Completed), None);
        assert_eq!(store.cycle(&cycle.id).unwrap().status, PlanStatus::Completed);

        cmd_cycle_list(store);
        cmd_cycle_show(store, &cycle.id);
        cmd_cycle_remove_subject(store, &cycle.id, &cs);
        cmd_cycle_remove(store, &cycle.id);
        assert!(store.cycles().is_empty());
        assert!(store.active_cycle().is_none());
    });
}

#[test]
fn test_subject_remove_cascades() {
    with_test_store(|store, _| {
        cmd_subject_add(store, "History".into(), None, None, 10.0);
        let subject = first_subject(store);
        cmd_task_add(store, subject.clone(), "Essay".into(), "2025-04-10".into(), Priority::Medium, None);
        cmd_session_log(store, subject.clone(), None, 20, None, None, None);

        cmd_subject_remove(store, &subject);
        assert!(store.subjects().is_empty());
        assert!(store.tasks().is_empty());
        assert!(store.sessions().is_empty());
    });
}

#[test]
fn test_reset_with_file_store() {
    let dir = tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()));
    let mut store = StudyStore::open(Box::new(FileStore::new(dir.path())), clock.clone());
    cmd_subject_add(&mut store, "History".into(), None, None, 10.0);
    assert!(dir.path().join("study-data.json").exists());

    cmd_reset(&mut store, true);
    assert!(store.subjects().is_empty());
    assert!(!dir.path().join("study-data.json").exists());
}

#[test]
fn test_login_logout_commands() {
    let storage = MemoryStore::new();
    let mut session = AuthSession::restore(Box::new(storage));
    let auth = FixedCredentialAuth::default();

    cmd_login(&mut session, &auth, DEMO_EMAIL.into(), Some("wrong".into()));
    assert!(session.user().is_none());

    cmd_login(&mut session, &auth, DEMO_EMAIL.into(), Some(DEMO_PASSWORD.into()));
    assert!(session.user().is_some());
    cmd_whoami(&session);
    cmd_users(&session, &auth);

    cmd_logout(&mut session);
    assert!(session.user().is_none());
}

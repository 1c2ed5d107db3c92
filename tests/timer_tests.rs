use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use studyust::error::{StoreError, TimerError};
use studyust::models::{CycleSubjectStatus, PlanStatus};
use studyust::storage::MemoryStore;
use studyust::store::{NewCycle, NewSubject, StudyStore};
use studyust::timer::{ManualClock, TimerPhase, TimerTarget};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()
}

struct Fixture {
    store: StudyStore,
    clock: Arc<ManualClock>,
    storage: MemoryStore,
    math: String,
    cycle: String,
    first: String,
    second: String,
}

fn fixture() -> Fixture {
    let clock = Arc::new(ManualClock::new(now()));
    let storage = MemoryStore::new();
    let mut store = StudyStore::open(Box::new(storage.clone()), clock.clone());
    let math = store
        .add_subject(NewSubject { name: "Math".into(), total_hours: 10.0, ..NewSubject::default() })
        .unwrap();
    let physics = store
        .add_subject(NewSubject { name: "Physics".into(), total_hours: 10.0, ..NewSubject::default() })
        .unwrap();
    let cycle = store
        .add_cycle(NewCycle {
            name: "Week 12".into(),
            description: String::new(),
            plan_id: None,
            start_date: NaiveDate::from_ymd_opt(2025, 3, 17).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            status: PlanStatus::Active,
            objectives: Vec::new(),
        })
        .unwrap();
    let first = store.add_cycle_subject(&cycle, &math, 60).unwrap();
    let second = store.add_cycle_subject(&cycle, &physics, 30).unwrap();
    Fixture { store, clock, storage, math, cycle, first, second }
}

fn cycle_subject_status(f: &Fixture, id: &str) -> CycleSubjectStatus {
    f.store.cycle(&f.cycle).unwrap().subjects.iter().find(|cs| cs.id == id).unwrap().status
}

#[test]
fn test_session_stop_records_completed_session() {
    let mut f = fixture();
    f.store.start_session(&f.math, "Limits".into(), None).unwrap();
    assert_eq!(f.store.timer().phase(), TimerPhase::Running);

    f.clock.advance(Duration::minutes(45));
    let session = f.store.stop_timer(Some("good".into())).unwrap();

    assert_eq!(session.duration_minutes, 45);
    assert!(session.completed);
    assert_eq!(session.date, now());
    assert_eq!(session.title, "Limits");
    assert_eq!(session.notes.as_deref(), Some("good"));
    assert_eq!(f.store.subject(&f.math).unwrap().studied_hours, 0.75);
    assert!(f.store.timer().is_idle());
}

#[test]
fn test_timed_topic_session_credits_the_topic() {
    let mut f = fixture();
    let topic = f.store.add_topic(&f.math, "Limits".into(), 3.0).unwrap();
    assert!(matches!(
        f.store.start_topic_session(&f.math, Some("missing"), "Limits".into(), None),
        Err(StoreError::NotFound { .. })
    ));
    assert!(f.store.timer().is_idle());

    f.store.start_topic_session(&f.math, Some(topic.as_str()), "Limits".into(), None).unwrap();
    f.clock.advance(Duration::minutes(30));
    let session = f.store.stop_timer(None).unwrap();

    assert_eq!(session.topic_id.as_deref(), Some(topic.as_str()));
    let subject = f.store.subject(&f.math).unwrap();
    assert_eq!(subject.studied_hours, 0.5);
    assert_eq!(subject.topics[0].studied_hours, 0.5);
}

#[test]
fn test_pause_excludes_paused_time() {
    let mut f = fixture();
    f.store.start_session(&f.math, "Limits".into(), None).unwrap();
    f.clock.advance(Duration::minutes(10));
    f.store.pause_timer().unwrap();
    f.clock.advance(Duration::minutes(30));
    assert_eq!(f.store.elapsed(), Duration::minutes(10));
    f.store.resume_timer().unwrap();
    f.clock.advance(Duration::minutes(5));

    let session = f.store.stop_timer(None).unwrap();
    assert_eq!(session.duration_minutes, 15);
}

#[test]
fn test_invalid_transitions_are_rejected() {
    let mut f = fixture();
    assert!(matches!(f.store.pause_timer(), Err(StoreError::Timer(TimerError::NotRunning))));
    assert!(matches!(f.store.resume_timer(), Err(StoreError::Timer(TimerError::NotPaused))));
    assert!(matches!(f.store.stop_timer(None), Err(StoreError::Timer(TimerError::Idle))));

    f.store.start_session(&f.math, "Limits".into(), None).unwrap();
    assert!(matches!(
        f.store.start_session(&f.math, "Again".into(), None),
        Err(StoreError::Timer(TimerError::AlreadyActive))
    ));
    assert!(matches!(
        f.store.start_cycle_subject(&f.cycle, &f.first),
        Err(StoreError::Timer(TimerError::AlreadyActive))
    ));
}

#[test]
fn test_start_requires_existing_subject() {
    let mut f = fixture();
    let err = f.store.start_session("missing", "x".into(), None).unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));
    assert!(f.store.timer().is_idle());
}

#[test]
fn test_immediate_stop_completes_with_review() {
    let mut f = fixture();
    f.store.start_cycle_subject(&f.cycle, &f.first).unwrap();
    assert_eq!(cycle_subject_status(&f, &f.first), CycleSubjectStatus::Studying);

    let session = f.store.stop_timer(None).unwrap();
    assert_eq!(session.duration_minutes, 0);
    assert_eq!(session.title, "Week 12");

    let cycle = f.store.cycle(&f.cycle).unwrap();
    let cs = &cycle.subjects[0];
    assert_eq!(cs.status, CycleSubjectStatus::Completed);
    assert_eq!(cs.actual_minutes, 0);
    assert_eq!(cs.last_studied_at, Some(now()));
    assert_eq!(cs.review_at, Some(now() + Duration::hours(24)));
}

#[test]
fn test_cycle_subject_time_is_booked() {
    let mut f = fixture();
    f.store.start_cycle_subject(&f.cycle, &f.first).unwrap();
    f.clock.advance(Duration::minutes(20));
    f.store.pause_timer().unwrap();
    assert_eq!(cycle_subject_status(&f, &f.first), CycleSubjectStatus::Paused);
    f.store.resume_timer().unwrap();
    assert_eq!(cycle_subject_status(&f, &f.first), CycleSubjectStatus::Studying);
    f.clock.advance(Duration::minutes(10));
    f.store.stop_timer(None).unwrap();

    let progress = f.store.cycle_progress(&f.cycle).unwrap();
    assert_eq!(progress.actual_minutes, 30);
    assert_eq!(progress.planned_minutes, 90);
    assert_eq!(progress.completed, 1);
    assert_eq!(progress.pending, 1);
    assert_eq!(f.store.subject(&f.math).unwrap().studied_hours, 0.5);
}

#[test]
fn test_starting_another_cycle_subject_displaces_the_first() {
    let mut f = fixture();
    f.store.start_cycle_subject(&f.cycle, &f.first).unwrap();
    f.clock.advance(Duration::minutes(25));
    f.store.start_cycle_subject(&f.cycle, &f.second).unwrap();

    assert_eq!(cycle_subject_status(&f, &f.first), CycleSubjectStatus::Paused);
    assert_eq!(cycle_subject_status(&f, &f.second), CycleSubjectStatus::Studying);
    let first = &f.store.cycle(&f.cycle).unwrap().subjects[0];
    assert_eq!(first.actual_minutes, 25);
    assert!(first.review_at.is_none());
    assert_eq!(f.store.sessions().len(), 1);
    assert!(matches!(
        f.store.timer().target(),
        Some(TimerTarget::CycleSubject { cycle_subject_id, .. }) if *cycle_subject_id == f.second
    ));

    assert!(matches!(
        f.store.start_cycle_subject(&f.cycle, &f.second),
        Err(StoreError::Timer(TimerError::AlreadyActive))
    ));
}

#[test]
fn test_timer_survives_reopen() {
    let mut f = fixture();
    f.store.start_session(&f.math, "Limits".into(), None).unwrap();
    f.clock.advance(Duration::minutes(7));

    let reopened = StudyStore::open(Box::new(f.storage.clone()), f.clock.clone());
    assert!(reopened.timer().is_running());
    assert_eq!(reopened.elapsed(), Duration::minutes(7));
}

#[test]
fn test_removing_timed_cycle_subject_discards_timer() {
    let mut f = fixture();
    f.store.start_cycle_subject(&f.cycle, &f.first).unwrap();
    f.store.remove_cycle_subject(&f.cycle, &f.first).unwrap();
    assert!(f.store.timer().is_idle());
    assert!(f.store.sessions().is_empty());
}

#[test]
fn test_huge_cycle_slots_do_not_overflow() {
    let mut f = fixture();
    let big = f.store.add_cycle_subject(&f.cycle, &f.math, 3_000_000_000).unwrap();
    f.store.add_cycle_subject(&f.cycle, &f.math, 3_000_000_000).unwrap();

    let progress = f.store.cycle_progress(&f.cycle).unwrap();
    assert_eq!(progress.planned_minutes, 6_000_000_090);
    assert_eq!(progress.actual_minutes, 0);
    assert_eq!(progress.percent, 0.0);

    // two runs of u32::MAX minutes each saturate the slot instead of wrapping
    for _ in 0..2 {
        f.store.start_cycle_subject(&f.cycle, &big).unwrap();
        f.clock.advance(Duration::minutes(i64::from(u32::MAX)));
        f.store.stop_timer(None).unwrap();
    }
    let slot = f.store.cycle(&f.cycle).unwrap().subjects.iter().find(|cs| cs.id == big).unwrap().clone();
    assert_eq!(slot.actual_minutes, u32::MAX);

    let progress = f.store.cycle_progress(&f.cycle).unwrap();
    assert_eq!(progress.actual_minutes, u64::from(u32::MAX));
    assert!(progress.percent > 0.0 && progress.percent <= 100.0);
}

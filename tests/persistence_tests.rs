use std::fs;
use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use studyust::models::{CycleSubjectStatus, PlanStatus, Priority};
use studyust::storage::{
    self, decode, encode, FileStore, MemoryStore, SnapshotStore, StudyData, STUDY_DATA_KEY,
};
use studyust::store::{NewCycle, NewPlan, NewSession, NewSubject, NewTask, StudyStore};
use studyust::timer::ManualClock;
use tempfile::tempdir;

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()))
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Fills a store with one of everything, nested topics included, and a running timer.
fn populate(store: &mut StudyStore) {
    let math = store
        .add_subject(NewSubject {
            name: "Math".into(),
            description: "Calculus I".into(),
            color: "#3f51b5".into(),
            total_hours: 40.0,
        })
        .unwrap();
    let topic = store.add_topic(&math, "Limits".into(), 6.0).unwrap();
    store.add_subtopic(&math, &topic, "Squeeze theorem".into()).unwrap();
    store
        .add_task(NewTask {
            subject_id: math.clone(),
            title: "Problem set".into(),
            description: Some("1-20".into()),
            due_date: date(2025, 4, 1),
            priority: Priority::High,
        })
        .unwrap();
    store
        .add_session(NewSession {
            subject_id: math.clone(),
            topic_id: Some(topic.clone()),
            title: "Reading".into(),
            description: None,
            duration_minutes: 50,
            date: Utc.with_ymd_and_hms(2025, 3, 19, 18, 0, 0).unwrap(),
            completed: true,
            notes: Some("ch. 2".into()),
        })
        .unwrap();
    let plan = store
        .add_plan(NewPlan {
            name: "Semester".into(),
            description: String::new(),
            start_date: date(2025, 2, 1),
            end_date: date(2025, 6, 30),
            subject_ids: vec![math.clone()],
            daily_hours_goal: 2.0,
            weekly_hours_goal: 12.0,
            status: PlanStatus::Active,
            priority: Priority::Medium,
            color: String::new(),
        })
        .unwrap();
    store.set_active_plan(&plan).unwrap();
    let cycle = store
        .add_cycle(NewCycle {
            name: "Week 12".into(),
            description: String::new(),
            plan_id: Some(plan),
            start_date: date(2025, 3, 17),
            end_date: date(2025, 3, 31),
            status: PlanStatus::Active,
            objectives: vec!["Finish limits".into()],
        })
        .unwrap();
    store.set_active_cycle(&cycle).unwrap();
    let cs = store.add_cycle_subject(&cycle, &math, 90).unwrap();
    store.start_cycle_subject(&cycle, &cs).unwrap();
}

#[test]
fn test_full_snapshot_survives_reload() {
    let storage = MemoryStore::new();
    let mut store = StudyStore::open(Box::new(storage.clone()), clock());
    populate(&mut store);

    let reopened = StudyStore::open(Box::new(storage), clock());
    assert_eq!(reopened.data(), store.data());
    assert_eq!(reopened.subjects()[0].topics[0].subtopics[0].name, "Squeeze theorem");
    assert!(reopened.timer().is_running());
    assert!(reopened.active_plan().is_some());
    assert!(reopened.active_cycle().is_some());
}

#[test]
fn test_file_store_writes_json_under_data_dir() {
    let dir = tempdir().unwrap();
    let mut store = StudyStore::open(Box::new(FileStore::new(dir.path())), clock());
    populate(&mut store);

    let path = dir.path().join("study-data.json");
    let raw = fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], 2);
    assert_eq!(value["subjects"][0]["name"], "Math");
    assert_eq!(value["tasks"][0]["dueDate"], "2025-04-01");
    assert_eq!(value["activeStudyPlan"], value["studyPlans"][0]["id"]);

    let reopened = StudyStore::open(Box::new(FileStore::new(dir.path())), clock());
    assert_eq!(reopened.data(), store.data());
}

#[test]
fn test_file_store_missing_and_remove() {
    let dir = tempdir().unwrap();
    let files = FileStore::new(dir.path().join("nested"));
    assert_eq!(files.read("user").unwrap(), None);
    files.write("user", "{}").unwrap();
    assert_eq!(files.read("user").unwrap().as_deref(), Some("{}"));
    files.remove("user").unwrap();
    files.remove("user").unwrap();
    assert_eq!(files.read("user").unwrap(), None);
}

#[test]
fn test_corrupt_snapshot_loads_empty() {
    let storage = MemoryStore::new();
    storage.insert(STUDY_DATA_KEY, "{ this is not json");
    let store = StudyStore::open(Box::new(storage), clock());
    assert!(store.subjects().is_empty());
    assert!(store.timer().is_idle());
}

#[test]
fn test_missing_fields_default() {
    let data = decode(r#"{"version": 2, "subjects": [{"id": "1", "name": "Art"}]}"#).unwrap();
    assert_eq!(data.subjects.len(), 1);
    assert_eq!(data.subjects[0].total_hours, 0.0);
    assert!(data.tasks.is_empty());
    assert!(data.active_cycle.is_none());
    assert!(data.study_timer.is_idle());
}

#[test]
fn test_v1_snapshot_is_migrated() {
    let v1 = r#"{
        "subjects": [{"id": "10", "name": "Math", "totalHours": 20, "studiedHours": 2}],
        "tasks": [{"id": "11", "subjectId": "10", "title": "Read", "dueDate": "2025-04-01T00:00:00.000Z", "priority": "low", "completed": false}],
        "studySessions": [{"id": "12", "subjectId": "10", "duration": 30, "date": "2025-03-18T10:00:00Z", "completed": true}],
        "studyPlans": [{"id": "13", "name": "Plan", "startDate": "2025-02-01T00:00:00.000Z", "endDate": "2025-06-01T00:00:00.000Z", "subjectIds": ["10"], "status": "active"}],
        "activeStudyPlan": {"id": "13", "name": "Plan"},
        "studyCycles": [{
            "id": "14", "name": "Cycle", "startDate": "2025-03-17T00:00:00.000Z", "endDate": "2025-03-31T00:00:00.000Z",
            "status": "active", "totalHours": 3, "completedHours": 1,
            "tasks": [
                {"id": "15", "subjectId": "10", "estimatedHours": 1, "completed": true},
                {"id": "16", "subjectId": "10", "estimatedHours": 2, "completed": false}
            ]
        }]
    }"#;

    let data = decode(v1).unwrap();
    assert_eq!(data.active_study_plan.as_deref(), Some("13"));
    assert_eq!(data.tasks[0].due_date, date(2025, 4, 1));
    assert_eq!(data.study_plans[0].end_date, date(2025, 6, 1));
    assert_eq!(data.study_sessions[0].duration_minutes, 30);

    let cycle = &data.study_cycles[0];
    assert_eq!(cycle.start_date, date(2025, 3, 17));
    assert_eq!(cycle.subjects.len(), 2);
    assert_eq!(cycle.subjects[0].planned_minutes, 60);
    assert_eq!(cycle.subjects[0].actual_minutes, 60);
    assert_eq!(cycle.subjects[0].status, CycleSubjectStatus::Completed);
    assert_eq!(cycle.subjects[1].planned_minutes, 120);
    assert_eq!(cycle.subjects[1].status, CycleSubjectStatus::Pending);

    // migrated data is written back in the current format
    let again = decode(&encode(&data).unwrap()).unwrap();
    assert_eq!(again, data);
}

#[test]
fn test_save_and_load_helpers() {
    let memory = MemoryStore::new();
    assert_eq!(storage::load(&memory), StudyData::default());

    let mut store = StudyStore::open(Box::new(memory.clone()), clock());
    populate(&mut store);
    storage::save(&memory, store.data()).unwrap();
    assert_eq!(&storage::load(&memory), store.data());
}

use std::collections::BTreeSet;
use std::fs;

use chrono::NaiveDate;
use funday::clock::FixedClock;
use funday::error::{Error, StorageError};
use funday::Engine;
use funday::models::{ScheduleEntry, TaskLevel, TaskTemplate, TaskUpdate, UserEconomyState};
use funday::storage::{EconomyStore, JsonStore, ScheduleStore, TaskStore};
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn entry(key: &str, next: &str) -> ScheduleEntry {
    let mut task = TaskTemplate::new("Gym", "health", TaskLevel::Hard);
    task.repeat_days = vec!["daily".to_string()];
    ScheduleEntry { key: key.to_string(), task, is_recurring: true, next_date: date(next), created: false }
}

#[test]
fn test_empty_directory_reads_defaults() {
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path().join("nested")).unwrap();
    assert!(store.dir().is_dir());
    assert!(store.list_tasks().unwrap().is_empty());
    assert!(store.list_schedule_entries().unwrap().is_empty());
    assert_eq!(store.read_economy_state().unwrap(), UserEconomyState::default());
    assert!(store.read_penalized().unwrap().is_empty());
}

#[test]
fn test_task_ids_and_updates() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let template = TaskTemplate::new("Read", "mind", TaskLevel::Easy);

    let a = store.create_task(template.instantiate(date("2025-03-05"))).unwrap();
    let b = store.create_task(template.instantiate(date("2025-03-06"))).unwrap();
    assert_eq!((a.id, b.id), (1, 2));
    assert_eq!(a.time_remaining, 30 * 60);
    assert!(a.is_active);

    let update = TaskUpdate { is_completed: Some(true), ..TaskUpdate::default() };
    let updated = store.update_task(2, &update).unwrap();
    assert!(updated.is_completed);

    store.delete_task(1).unwrap();
    assert!(matches!(store.delete_task(1), Err(StorageError::TaskNotFound(1))));
    assert!(matches!(store.get_task(7), Err(StorageError::TaskNotFound(7))));

    let reopened = JsonStore::open(dir.path()).unwrap();
    let tasks = reopened.list_tasks().unwrap();
    assert_eq!(tasks.len(), 1);
    assert!(tasks[0].is_completed);
}

#[test]
fn test_put_replaces_by_key() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    store.put_schedule_entry(&entry("Gym_health_daily", "2025-03-06")).unwrap();
    store.put_schedule_entry(&entry("Gym_health_daily", "2025-03-07")).unwrap();

    let entries = store.list_schedule_entries().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].next_date, date("2025-03-07"));

    assert!(store.remove_schedule_entry("Gym_health_daily").unwrap());
    assert!(!store.remove_schedule_entry("Gym_health_daily").unwrap());
}

#[test]
fn test_schedule_entry_json_shape() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    store.put_schedule_entry(&entry("Gym_health_daily", "2025-03-06")).unwrap();

    let raw = fs::read_to_string(dir.path().join("schedule.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let object = json[0].as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort();
    assert_eq!(keys, vec!["created", "isRecurring", "key", "nextDate", "task"]);
    assert_eq!(json[0]["nextDate"], "2025-03-06");
    assert_eq!(json[0]["task"]["repeatDays"][0], "daily");
    assert_eq!(json[0]["task"]["groupId"], "health");
}

#[test]
fn test_corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tasks.json"), "{not json").unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    assert!(matches!(store.list_tasks(), Err(StorageError::Json(_))));
}

#[test]
fn test_economy_and_penalized_persist() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let state = UserEconomyState { points: 120, reward_minutes: -15, funday_count: 1, ..UserEconomyState::default() };
    store.write_economy_state(&state).unwrap();
    store.write_penalized(&BTreeSet::from([3, 5])).unwrap();

    let store = JsonStore::open(dir.path()).unwrap();
    assert_eq!(store.read_economy_state().unwrap(), state);
    assert_eq!(store.read_penalized().unwrap(), BTreeSet::from([3, 5]));

    let raw = fs::read_to_string(dir.path().join("economy.json")).unwrap();
    assert!(raw.contains("\"rewardMinutes\": -15"));
}

#[test]
fn test_clear_removes_everything() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let template = TaskTemplate::new("Read", "mind", TaskLevel::Easy);
    store.create_task(template.instantiate(date("2025-03-05"))).unwrap();
    store.put_schedule_entry(&entry("Gym_health_daily", "2025-03-06")).unwrap();

    store.clear_tasks().unwrap();
    store.clear_schedule_entries().unwrap();
    assert!(store.list_tasks().unwrap().is_empty());
    assert!(store.list_schedule_entries().unwrap().is_empty());
}

#[test]
fn test_sweep_with_unreadable_economy_leaves_tasks_untouched() {
    let dir = TempDir::new().unwrap();
    let mut store = JsonStore::open(dir.path()).unwrap();
    let template = TaskTemplate::new("Gym", "health", TaskLevel::Hard);
    store.create_task(template.instantiate(date("2025-03-01"))).unwrap();
    fs::write(dir.path().join("economy.json"), "{broken").unwrap();

    let mut engine = Engine::new(store, FixedClock::on(date("2025-03-05")));
    let err = engine.sweep_overdue().unwrap_err();
    assert!(matches!(err, Error::Storage(StorageError::Json(_))));

    let tasks = engine.tasks().unwrap();
    assert_eq!(tasks[0].last_interaction_date, None);
    assert!(engine.store().read_penalized().unwrap().is_empty());
}

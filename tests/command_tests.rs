use chrono::{NaiveDate, Weekday};
use funday::board::SortKey;
use funday::clock::FixedClock;
use funday::commands::*;
use funday::error::{Error, ValidationError};
use funday::models::{Recurrence, TaskLevel};
use funday::storage::JsonStore;
use funday::Engine;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn with_test_store<F>(f: F)
where
    F: FnOnce(&mut Engine<JsonStore, FixedClock>),
{
    let dir = TempDir::new().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    let mut engine = Engine::new(store, FixedClock::on(date("2025-03-05")));
    f(&mut engine);
}

fn request(name: &str, group: &str) -> AddRequest {
    AddRequest { name: name.into(), group: group.into(), ..AddRequest::default() }
}

#[test]
fn test_into_parts_repeat_wins_over_due() {
    let req = AddRequest {
        repeat: Some("mon, fri".into()),
        due: Some("2025-04-01".into()),
        ..request("Gym", "health")
    };
    let (template, recurrence) = req.into_parts().unwrap();
    assert_eq!(template.name, "Gym");
    assert_eq!(template.duration, 30);
    assert_eq!(recurrence, Recurrence::weekly([Weekday::Mon, Weekday::Fri]));
}

#[test]
fn test_into_parts_due_date() {
    let req = AddRequest { due: Some("2025-04-01".into()), ..request("Taxes", "admin") };
    let (_, recurrence) = req.into_parts().unwrap();
    assert_eq!(recurrence, Recurrence::OneTime(date("2025-04-01")));

    let req = AddRequest { due: Some("2025-04-01T09:30:00Z".into()), ..request("Taxes", "admin") };
    let (_, recurrence) = req.into_parts().unwrap();
    assert_eq!(recurrence, Recurrence::OneTime(date("2025-04-01")));

    let (_, recurrence) = request("Taxes", "admin").into_parts().unwrap();
    assert_eq!(recurrence, Recurrence::None);
}

#[test]
fn test_into_parts_rejects_bad_input() {
    let req = AddRequest { due: Some("04/01/2025".into()), ..request("Taxes", "admin") };
    assert_eq!(req.into_parts().unwrap_err(), ValidationError::InvalidDate("04/01/2025".into()));

    let req = AddRequest { repeat: Some("mon,someday".into()), ..request("Gym", "health") };
    assert_eq!(req.into_parts().unwrap_err(), ValidationError::UnknownWeekday("someday".into()));
}

#[test]
fn test_add_and_list() {
    with_test_store(|engine| {
        cmd_add(engine, AddRequest { level: TaskLevel::Easy, ..request("Laundry", "home") }, true).unwrap();
        cmd_list(engine, false, None, SortKey::Level).unwrap();

        let tasks = engine.tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Laundry");
        assert_eq!(tasks[0].group_id, "home");
        assert_eq!(tasks[0].due_date, date("2025-03-05"));
    });
}

#[test]
fn test_add_custom_without_reward_fails() {
    with_test_store(|engine| {
        let req = AddRequest { level: TaskLevel::Custom, ..request("Paint", "art") };
        let err = cmd_add(engine, req, true).unwrap_err();
        assert!(matches!(err, Error::Validation(ValidationError::NonPositiveCustomReward)));
        assert!(engine.tasks().unwrap().is_empty());
    });
}

#[test]
fn test_complete_and_uncomplete() {
    with_test_store(|engine| {
        cmd_add(engine, AddRequest { level: TaskLevel::Core, ..request("Deep work", "job") }, true).unwrap();
        let id = engine.tasks().unwrap()[0].id;

        cmd_complete(engine, id, true, true).unwrap();
        assert!(engine.tasks().unwrap()[0].is_completed);
        assert_eq!(engine.economy().unwrap().points, 25);

        cmd_complete(engine, id, false, true).unwrap();
        assert!(!engine.tasks().unwrap()[0].is_completed);
        assert_eq!(engine.economy().unwrap().points, 25);
    });
}

#[test]
fn test_edit_clears_notes() {
    with_test_store(|engine| {
        let req = AddRequest { notes: Some("bring towel".into()), ..request("Swim", "health") };
        cmd_add(engine, req, true).unwrap();

        cmd_edit(engine, 1, Some("Swim laps".into()), Some(String::new()), None, Some(45), true).unwrap();
        let task = &engine.tasks().unwrap()[0];
        assert_eq!(task.name, "Swim laps");
        assert_eq!(task.notes, None);
        assert_eq!(task.duration, 45);
    });
}

#[test]
fn test_schedule_and_tick() {
    with_test_store(|engine| {
        let req = AddRequest { repeat: Some("daily".into()), ..request("Stretch", "health") };
        cmd_add(engine, req, true).unwrap();
        cmd_schedule_list(engine).unwrap();
        assert_eq!(engine.schedule_entries().unwrap().len(), 1);

        engine.clock_mut().advance_days(1);
        cmd_tick(engine, true).unwrap();

        let tasks = engine.tasks().unwrap();
        assert_eq!(tasks.len(), 2);
        // Yesterday's instance was left open and charged.
        assert_eq!(engine.economy().unwrap().reward_minutes, -10);

        cmd_schedule_remove(engine, "Stretch_health_daily".into(), true).unwrap();
        assert!(engine.schedule_entries().unwrap().is_empty());
    });
}

#[test]
fn test_remove_and_clear() {
    with_test_store(|engine| {
        cmd_add(engine, request("One", "a"), true).unwrap();
        cmd_add(engine, request("Two", "a"), true).unwrap();
        let req = AddRequest { due: Some("2025-03-09".into()), ..request("Three", "a") };
        cmd_add(engine, req, true).unwrap();

        cmd_remove(engine, 1, true).unwrap();
        assert_eq!(engine.tasks().unwrap().len(), 1);
        assert!(cmd_remove(engine, 1, true).is_err());

        cmd_clear(engine, true).unwrap();
        assert!(engine.tasks().unwrap().is_empty());
        assert!(engine.schedule_entries().unwrap().is_empty());
    });
}

#[test]
fn test_stats_spend_and_resets() {
    with_test_store(|engine| {
        for name in ["A", "B", "C", "D"] {
            cmd_add(engine, AddRequest { level: TaskLevel::Core, ..request(name, "x") }, true).unwrap();
        }
        for id in 1..=4 {
            cmd_complete(engine, id, true, true).unwrap();
        }
        assert_eq!(engine.economy().unwrap().funday_count, 1);

        cmd_stats(engine).unwrap();
        cmd_funday_spend(engine, true).unwrap();
        let state = engine.economy().unwrap();
        assert_eq!((state.funday_count, state.fundays_spent), (0, 1));

        cmd_funday_spend(engine, true).unwrap();
        assert_eq!(engine.economy().unwrap().fundays_spent, 1);

        cmd_reset_minutes(engine, true).unwrap();
        assert_eq!(engine.economy().unwrap().reward_minutes, 0);
        assert_eq!(engine.economy().unwrap().points, 100);

        cmd_reset(engine, true).unwrap();
        assert_eq!(engine.economy().unwrap().points, 0);
        assert_eq!(engine.tasks().unwrap().len(), 4);
    });
}

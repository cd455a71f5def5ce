use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use funday::clock::end_of_day;
use funday::models::{Reward, TaskInstance, TaskLevel, TaskTemplate, UserEconomyState};
use funday::rewards::{
    apply_completion, apply_penalty, completion_reward, sweep_overdue, table_reward, LATE_COMPLETION_REWARD,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(d: &str, h: u32, m: u32) -> NaiveDateTime {
    date(d).and_time(NaiveTime::from_hms_opt(h, m, 0).unwrap())
}

fn task(id: u64, level: TaskLevel, due: &str) -> TaskInstance {
    let template = TaskTemplate::new(format!("Task {}", id), "home", level);
    TaskInstance::from_new(id, template.instantiate(date(due)), "2025-03-01T08:00:00+00:00".into())
}

#[test]
fn test_static_table() {
    assert_eq!(table_reward(TaskLevel::Easy), Reward::new(2, 5));
    assert_eq!(table_reward(TaskLevel::Mid), Reward::new(5, 10));
    assert_eq!(table_reward(TaskLevel::Hard), Reward::new(10, 20));
    assert_eq!(table_reward(TaskLevel::Core), Reward::new(25, 45));
}

#[test]
fn test_hard_task_on_time() {
    let t = task(1, TaskLevel::Hard, "2025-03-05");
    assert_eq!(completion_reward(&t, at("2025-03-05", 18, 0)), Reward::new(10, 20));
}

#[test]
fn test_custom_reward_on_time_and_late() {
    let mut t = task(1, TaskLevel::Custom, "2025-03-05");
    t.reward_points = Some(7);
    t.reward_time = Some(12);

    assert_eq!(completion_reward(&t, at("2025-03-05", 23, 59)), Reward::new(7, 12));
    assert_eq!(completion_reward(&t, at("2025-03-06", 0, 0)), Reward::new(0, 5));
}

#[test]
fn test_end_of_day_boundary() {
    let t = task(1, TaskLevel::Core, "2025-03-05");
    let last_ms = end_of_day(date("2025-03-05"));
    assert_eq!(completion_reward(&t, last_ms), Reward::new(25, 45));
    let just_after = last_ms + chrono::Duration::milliseconds(1);
    assert_eq!(completion_reward(&t, just_after), LATE_COMPLETION_REWARD);
}

#[test]
fn test_half_override_falls_back_to_table() {
    let mut t = task(1, TaskLevel::Easy, "2025-03-05");
    t.reward_points = Some(50);
    assert_eq!(completion_reward(&t, at("2025-03-05", 9, 0)), Reward::new(2, 5));
}

#[test]
fn test_sweep_charges_overdue_open_tasks_once() {
    let mut done = task(3, TaskLevel::Core, "2025-03-01");
    done.is_completed = true;
    let tasks = vec![
        task(1, TaskLevel::Hard, "2025-03-04"),
        task(2, TaskLevel::Easy, "2025-03-02"),
        done,
        task(4, TaskLevel::Mid, "2025-03-05"),
    ];
    let today = date("2025-03-05");

    let first = sweep_overdue(&tasks, today, &BTreeSet::new());
    assert_eq!(first.penalized_ids, BTreeSet::from([1, 2]));
    assert_eq!(first.total_minutes_penalty, 20 + 5);

    let second = sweep_overdue(&tasks, today, &first.penalized_ids);
    assert!(second.is_empty());
    assert_eq!(second.total_minutes_penalty, 0);
}

#[test]
fn test_sweep_only_charges_new_ids() {
    let tasks = vec![task(1, TaskLevel::Hard, "2025-03-01"), task(2, TaskLevel::Core, "2025-03-01")];
    let already = BTreeSet::from([1, 99]);
    let outcome = sweep_overdue(&tasks, date("2025-03-05"), &already);
    assert_eq!(outcome.penalized_ids, BTreeSet::from([2]));
    assert_eq!(outcome.total_minutes_penalty, 45);
}

#[test]
fn test_sweep_penalty_ignores_days_late() {
    let tasks = vec![task(1, TaskLevel::Mid, "2024-01-01")];
    let outcome = sweep_overdue(&tasks, date("2025-03-05"), &BTreeSet::new());
    assert_eq!(outcome.total_minutes_penalty, 10);
}

#[test]
fn test_custom_task_penalty_uses_mid_row() {
    let mut t = task(1, TaskLevel::Custom, "2025-03-01");
    t.reward_points = Some(40);
    t.reward_time = Some(90);
    let outcome = sweep_overdue(&[t], date("2025-03-05"), &BTreeSet::new());
    assert_eq!(outcome.total_minutes_penalty, 10);
}

#[test]
fn test_apply_completion_moves_counters_together() {
    let state = UserEconomyState { points: 95, fundays_spent: 0, ..UserEconomyState::default() };
    let next = apply_completion(&state, Reward::new(10, 20));
    assert_eq!(next.points, 105);
    assert_eq!(next.reward_minutes, 20);
    assert_eq!(next.completed_tasks, 1);
    assert_eq!(next.funday_count, 1);
}

#[test]
fn test_penalty_can_go_negative() {
    let tasks = vec![task(1, TaskLevel::Core, "2025-03-01")];
    let outcome = sweep_overdue(&tasks, date("2025-03-05"), &BTreeSet::new());
    let next = apply_penalty(&UserEconomyState::default(), &outcome);
    assert_eq!(next.reward_minutes, -45);
    assert_eq!(next.points, 0);
}

use chrono::{NaiveDate, Weekday};
use funday::error::ValidationError;
use funday::models::{Recurrence, ScheduleEntry, TaskLevel, TaskTemplate};
use funday::scheduler::{
    due_actions, next_occurrence, next_weekly_occurrence, occurs_on, plan_submission, schedule_key, DueAction,
    ScheduleKind,
};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// 2025-03-05 is a Wednesday.
const WEDNESDAY: &str = "2025-03-05";

fn template() -> TaskTemplate {
    TaskTemplate::new("Gym", "health", TaskLevel::Hard)
}

#[test]
fn test_weekly_next_occurrence_same_week() {
    let days = [Weekday::Mon, Weekday::Fri].into_iter().collect();
    let next = next_weekly_occurrence(&days, date(WEDNESDAY)).unwrap();
    assert_eq!(next, date("2025-03-07"));
}

#[test]
fn test_weekly_next_occurrence_wraps_to_next_week() {
    let days = [Weekday::Mon].into_iter().collect();
    let next = next_weekly_occurrence(&days, date(WEDNESDAY)).unwrap();
    assert_eq!(next, date("2025-03-10"));
}

#[test]
fn test_weekly_next_occurrence_skips_today() {
    // Wednesday selected on a Wednesday: next one is a week later.
    let days = [Weekday::Wed].into_iter().collect();
    let next = next_weekly_occurrence(&days, date(WEDNESDAY)).unwrap();
    assert_eq!(next, date("2025-03-12"));
}

#[test]
fn test_weekly_next_occurrence_from_saturday_to_sunday() {
    let days = [Weekday::Sun, Weekday::Tue].into_iter().collect();
    let next = next_weekly_occurrence(&days, date("2025-03-08")).unwrap();
    assert_eq!(next, date("2025-03-09"));
}

#[test]
fn test_next_occurrence_daily_and_one_time() {
    let today = date(WEDNESDAY);
    assert_eq!(next_occurrence(&Recurrence::Daily, today), Some(date("2025-03-06")));
    assert_eq!(next_occurrence(&Recurrence::OneTime(date("2025-04-01")), today), Some(date("2025-04-01")));
    assert_eq!(next_occurrence(&Recurrence::None, today), None);
}

#[test]
fn test_daily_wins_over_weekdays() {
    let r = Recurrence::from_repeat_days(&["monday", "daily", "friday"]).unwrap();
    assert_eq!(r, Recurrence::Daily);
    assert_eq!(r.repeat_days(), vec!["daily".to_string()]);
}

#[test]
fn test_unknown_weekday_rejected() {
    let err = Recurrence::from_repeat_days(&["mon", "someday"]).unwrap_err();
    assert_eq!(err, ValidationError::UnknownWeekday("someday".into()));
}

#[test]
fn test_schedule_keys() {
    let t = template();
    assert_eq!(schedule_key(&t, &Recurrence::Daily).unwrap(), "Gym_health_daily");
    assert_eq!(
        schedule_key(&t, &Recurrence::weekly([Weekday::Fri, Weekday::Mon])).unwrap(),
        "Gym_health_monday-friday"
    );
    assert_eq!(
        schedule_key(&t, &Recurrence::OneTime(date("2025-04-01"))).unwrap(),
        "Gym_health_2025-04-01"
    );
    assert!(schedule_key(&t, &Recurrence::None).is_none());
}

#[test]
fn test_plan_without_recurrence_is_due_today() {
    let plan = plan_submission(template(), Recurrence::None, date(WEDNESDAY)).unwrap();
    let task = plan.immediate.unwrap();
    assert_eq!(task.due_date, date(WEDNESDAY));
    assert!(plan.entry.is_none());
    assert_eq!(plan.confirmation.kind, ScheduleKind::Today);
}

#[test]
fn test_plan_due_today_is_immediate() {
    let plan = plan_submission(template(), Recurrence::OneTime(date(WEDNESDAY)), date(WEDNESDAY)).unwrap();
    assert!(plan.immediate.is_some());
    assert!(plan.entry.is_none());
}

#[test]
fn test_plan_future_due_date_is_deferred() {
    let plan = plan_submission(template(), Recurrence::OneTime(date("2025-03-20")), date(WEDNESDAY)).unwrap();
    assert!(plan.immediate.is_none());
    let entry = plan.entry.unwrap();
    assert!(!entry.is_recurring);
    assert_eq!(entry.next_date, date("2025-03-20"));
    assert!(entry.task.repeat_days.is_empty());
    assert_eq!(plan.confirmation.to_string(), "Task scheduled for Thu, Mar 20, 2025.");
}

#[test]
fn test_plan_past_due_date_rejected() {
    let err = plan_submission(template(), Recurrence::OneTime(date("2025-03-01")), date(WEDNESDAY)).unwrap_err();
    assert!(matches!(err, ValidationError::DueDateInPast { .. }));
}

#[test]
fn test_plan_daily_creates_today_and_schedules_tomorrow() {
    let plan = plan_submission(template(), Recurrence::Daily, date(WEDNESDAY)).unwrap();
    assert_eq!(plan.immediate.unwrap().due_date, date(WEDNESDAY));
    let entry = plan.entry.unwrap();
    assert!(entry.is_recurring);
    assert_eq!(entry.next_date, date("2025-03-06"));
    assert_eq!(entry.task.repeat_days, vec!["daily".to_string()]);
    assert_eq!(
        plan.confirmation.to_string(),
        "Task scheduled for daily repetition. Next upcoming task will be on Thu, Mar 6, 2025."
    );
}

#[test]
fn test_plan_weekly_including_today() {
    let plan = plan_submission(template(), Recurrence::weekly([Weekday::Wed, Weekday::Fri]), date(WEDNESDAY)).unwrap();
    assert!(plan.immediate.is_some());
    assert_eq!(plan.entry.as_ref().unwrap().next_date, date("2025-03-07"));
    assert!(plan.confirmation.created_today);
    assert_eq!(plan.confirmation.label(), "Wednesday, Friday (Task created for today)");
}

#[test]
fn test_plan_weekly_excluding_today() {
    let plan = plan_submission(template(), Recurrence::weekly([Weekday::Mon]), date(WEDNESDAY)).unwrap();
    assert!(plan.immediate.is_none());
    assert_eq!(plan.entry.unwrap().next_date, date("2025-03-10"));
    assert_eq!(plan.confirmation.label(), "Monday");
}

#[test]
fn test_plan_validation_runs_first() {
    let empty = TaskTemplate::new("   ", "health", TaskLevel::Easy);
    assert_eq!(plan_submission(empty, Recurrence::Daily, date(WEDNESDAY)).unwrap_err(), ValidationError::EmptyName);

    let no_group = TaskTemplate::new("Gym", "", TaskLevel::Easy);
    assert_eq!(plan_submission(no_group, Recurrence::None, date(WEDNESDAY)).unwrap_err(), ValidationError::MissingGroup);

    let custom = TaskTemplate::new("Gym", "health", TaskLevel::Custom).with_reward(0, 10);
    assert_eq!(
        plan_submission(custom, Recurrence::None, date(WEDNESDAY)).unwrap_err(),
        ValidationError::NonPositiveCustomReward
    );
}

fn entry(recurrence: Recurrence, next: &str) -> ScheduleEntry {
    let mut task = template();
    task.repeat_days = recurrence.repeat_days();
    ScheduleEntry {
        key: schedule_key(&task, &recurrence).unwrap(),
        task,
        is_recurring: recurrence.is_recurring(),
        next_date: date(next),
        created: false,
    }
}

#[test]
fn test_due_actions_ignore_future_entries() {
    let entries = vec![entry(Recurrence::Daily, "2025-03-06")];
    assert!(due_actions(&entries, date(WEDNESDAY)).is_empty());
}

#[test]
fn test_due_action_for_recurring_entry_advances() {
    let entries = vec![entry(Recurrence::weekly([Weekday::Wed, Weekday::Fri]), WEDNESDAY)];
    let actions = due_actions(&entries, date(WEDNESDAY));
    assert_eq!(actions.len(), 1);
    match &actions[0] {
        DueAction::Advance { task, advanced } => {
            assert_eq!(task.as_ref().unwrap().due_date, date(WEDNESDAY));
            assert_eq!(advanced.next_date, date("2025-03-07"));
            assert!(!advanced.created);
        }
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_missed_recurring_entry_is_not_backfilled() {
    // Due last Monday, checked on Wednesday: nothing today, next Monday scheduled.
    let entries = vec![entry(Recurrence::weekly([Weekday::Mon]), "2025-03-03")];
    match &due_actions(&entries, date(WEDNESDAY))[0] {
        DueAction::Advance { task, advanced } => {
            assert!(task.is_none());
            assert_eq!(advanced.next_date, date("2025-03-10"));
        }
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_due_action_for_one_time_entry_consumes() {
    let mut created = entry(Recurrence::OneTime(date("2025-03-04")), "2025-03-04");
    let fresh = entry(Recurrence::OneTime(date(WEDNESDAY)), WEDNESDAY);
    created.created = true;
    let actions = due_actions(&[fresh, created], date(WEDNESDAY));
    match &actions[0] {
        DueAction::Consume { task, .. } => assert_eq!(task.as_ref().unwrap().due_date, date(WEDNESDAY)),
        other => panic!("unexpected action {:?}", other),
    }
    match &actions[1] {
        DueAction::Consume { task, .. } => assert!(task.is_none()),
        other => panic!("unexpected action {:?}", other),
    }
}

#[test]
fn test_entry_recurrence_round_trip() {
    let weekly = Recurrence::weekly([Weekday::Tue, Weekday::Sat]);
    assert_eq!(entry(weekly, WEDNESDAY).recurrence(), weekly);
    assert_eq!(entry(Recurrence::Daily, WEDNESDAY).recurrence(), Recurrence::Daily);
    let once = Recurrence::OneTime(date("2025-04-01"));
    assert_eq!(entry(once, "2025-04-01").recurrence(), once);
}

#[test]
fn test_occurs_on() {
    let weekly = Recurrence::weekly([Weekday::Wed]);
    assert!(occurs_on(&weekly, date(WEDNESDAY)));
    assert!(!occurs_on(&weekly, date("2025-03-06")));
    assert!(occurs_on(&Recurrence::Daily, date("2025-03-06")));
}

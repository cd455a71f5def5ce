//! Recurrence scheduling.
//!
//! Turns a task submission into an immediate instance and/or a deferred
//! [`ScheduleEntry`], computes next occurrences, and decides what a due
//! entry should materialize. Everything here is pure; the engine performs
//! the resulting writes.

use std::fmt;

use chrono::{Datelike, NaiveDate};

use crate::clock::{add_days, format_for_display, weekday_index, weekday_name};
use crate::error::ValidationError;
use crate::models::{NewTask, Recurrence, ScheduleEntry, TaskTemplate, WeekdaySet, DAILY_MARKER};

/// Stable identity of a schedule entry: `{name}_{group}_{signature}`.
///
/// The signature is `daily`, the dash-joined weekday names, or the due
/// date for one-time entries. Immediate tasks have no key.
pub fn schedule_key(template: &TaskTemplate, recurrence: &Recurrence) -> Option<String> {
    let signature = match recurrence {
        Recurrence::None => return None,
        Recurrence::Daily => DAILY_MARKER.to_string(),
        Recurrence::WeeklyOnDays(days) => days
            .iter()
            .map(weekday_name)
            .collect::<Vec<_>>()
            .join("-"),
        Recurrence::OneTime(date) => date.format("%Y-%m-%d").to_string(),
    };
    Some(format!("{}_{}_{}", template.name, template.group_id, signature))
}

/// First selected weekday strictly after `today`, wrapping into next week.
pub fn next_weekly_occurrence(days: &WeekdaySet, today: NaiveDate) -> Option<NaiveDate> {
    let current = weekday_index(today);
    let first = days.indices().next()?;
    let offset = match days.indices().find(|&d| d > current) {
        Some(d) => d - current,
        None => 7 - current + first,
    };
    Some(add_days(today, offset as i64))
}

/// The date the next instance is due, counted from `today`.
///
/// One-time recurrences return their own date; `None` has no next date.
pub fn next_occurrence(recurrence: &Recurrence, today: NaiveDate) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::None => None,
        Recurrence::OneTime(date) => Some(*date),
        Recurrence::Daily => Some(add_days(today, 1)),
        Recurrence::WeeklyOnDays(days) => next_weekly_occurrence(days, today),
    }
}

/// Whether an instance of `recurrence` falls on `date`.
pub fn occurs_on(recurrence: &Recurrence, date: NaiveDate) -> bool {
    match recurrence {
        Recurrence::None => false,
        Recurrence::OneTime(d) => *d == date,
        Recurrence::Daily => true,
        Recurrence::WeeklyOnDays(days) => days.contains(date.weekday()),
    }
}

/// How a submission was scheduled, for the caller to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleKind {
    Today,
    Daily,
    OneTime,
    /// Capitalized weekday names, e.g. `Monday, Friday`.
    Weekly(String),
}

/// Informational record produced by a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub kind: ScheduleKind,
    pub next_date: NaiveDate,
    /// An instance due today was created alongside the schedule entry.
    pub created_today: bool,
}

impl Confirmation {
    /// Short description of the recurrence.
    pub fn label(&self) -> String {
        match &self.kind {
            ScheduleKind::Today => "today".to_string(),
            ScheduleKind::Daily => "daily".to_string(),
            ScheduleKind::OneTime => "one-time".to_string(),
            ScheduleKind::Weekly(days) if self.created_today => format!("{} (Task created for today)", days),
            ScheduleKind::Weekly(days) => days.clone(),
        }
    }
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = format_for_display(self.next_date);
        match &self.kind {
            ScheduleKind::Today => write!(f, "Task added for today."),
            ScheduleKind::Daily => write!(
                f,
                "Task scheduled for daily repetition. Next upcoming task will be on {}.",
                date
            ),
            ScheduleKind::OneTime => write!(f, "Task scheduled for {}.", date),
            ScheduleKind::Weekly(_) => write!(
                f,
                "Task scheduled for {}. Next upcoming task will be on {}.",
                self.label(),
                date
            ),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Outcome of planning a submission: what to create and what to schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub immediate: Option<NewTask>,
    pub entry: Option<ScheduleEntry>,
    pub confirmation: Confirmation,
}

/// Decides how a new task is materialized.
///
/// Validation happens first, so a rejected submission never produces a
/// partial plan.
pub fn plan_submission(
    template: TaskTemplate,
    recurrence: Recurrence,
    today: NaiveDate,
) -> Result<Submission, ValidationError> {
    let mut template = template.validated()?;

    let immediate_only = |template: &TaskTemplate| Submission {
        immediate: Some(template.instantiate(today)),
        entry: None,
        confirmation: Confirmation { kind: ScheduleKind::Today, next_date: today, created_today: true },
    };

    let (kind, created_today) = match &recurrence {
        Recurrence::None => return Ok(immediate_only(&template)),
        Recurrence::OneTime(due) if *due == today => return Ok(immediate_only(&template)),
        Recurrence::OneTime(due) if *due < today => {
            return Err(ValidationError::DueDateInPast { due: *due, today });
        }
        Recurrence::OneTime(_) => (ScheduleKind::OneTime, false),
        Recurrence::Daily => (ScheduleKind::Daily, true),
        Recurrence::WeeklyOnDays(days) => {
            let labels = days
                .iter()
                .map(|d| capitalize(weekday_name(d)))
                .collect::<Vec<_>>()
                .join(", ");
            (ScheduleKind::Weekly(labels), occurs_on(&recurrence, today))
        }
    };

    template.repeat_days = recurrence.repeat_days();
    let (key, next_date) = match (schedule_key(&template, &recurrence), next_occurrence(&recurrence, today)) {
        (Some(key), Some(next)) => (key, next),
        // Only Recurrence::None lacks a key or a next date, and it returned above.
        _ => return Ok(immediate_only(&template)),
    };

    let immediate = created_today.then(|| template.instantiate(today));
    let entry = ScheduleEntry {
        key,
        task: template,
        is_recurring: recurrence.is_recurring(),
        next_date,
        created: false,
    };

    Ok(Submission {
        immediate,
        entry: Some(entry),
        confirmation: Confirmation { kind, next_date, created_today },
    })
}

/// What the materialization pass does with one due entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DueAction {
    /// Recurring entry: create `task` if today qualifies, then store
    /// `advanced` in place of the entry.
    Advance { task: Option<NewTask>, advanced: ScheduleEntry },
    /// One-time entry: create `task` if not done yet, mark the entry as
    /// created, then remove it.
    Consume { task: Option<NewTask>, entry: ScheduleEntry },
}

impl DueAction {
    pub fn key(&self) -> &str {
        match self {
            DueAction::Advance { advanced, .. } => &advanced.key,
            DueAction::Consume { entry, .. } => &entry.key,
        }
    }
}

/// Collects the actions for every entry whose `next_date` has arrived.
///
/// Missed occurrences of recurring entries are not back-filled: at most one
/// instance is created per entry per pass, and only if today matches.
pub fn due_actions(entries: &[ScheduleEntry], today: NaiveDate) -> Vec<DueAction> {
    entries
        .iter()
        .filter(|e| e.next_date <= today)
        .filter_map(|entry| {
            let recurrence = entry.recurrence();
            if !entry.is_recurring {
                let task = (!entry.created).then(|| entry.task.instantiate(entry.next_date));
                return Some(DueAction::Consume { task, entry: entry.clone() });
            }
            let next_date = next_occurrence(&recurrence, today)?;
            let task = occurs_on(&recurrence, today).then(|| entry.task.instantiate(today));
            let advanced = ScheduleEntry { next_date, created: false, ..entry.clone() };
            Some(DueAction::Advance { task, advanced })
        })
        .collect()
}

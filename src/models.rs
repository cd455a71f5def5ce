use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::clock::{parse_weekday, weekday_name};
use crate::error::ValidationError;

/// Difficulty of a task; drives its default reward.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskLevel {
    Easy,
    #[default]
    Mid,
    Hard,
    Core,
    /// Reward comes from the task's own `reward_points` / `reward_time`.
    Custom,
}

impl TaskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskLevel::Easy => "easy",
            TaskLevel::Mid => "mid",
            TaskLevel::Hard => "hard",
            TaskLevel::Core => "core",
            TaskLevel::Custom => "custom",
        }
    }
}

impl fmt::Display for TaskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(TaskLevel::Easy),
            "mid" => Ok(TaskLevel::Mid),
            "hard" => Ok(TaskLevel::Hard),
            "core" => Ok(TaskLevel::Core),
            "custom" => Ok(TaskLevel::Custom),
            other => Err(format!("unknown level '{}'. Supported: easy, mid, hard, core, custom.", other)),
        }
    }
}

/// Points and reward minutes granted (or, for minutes, deducted) by a task.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Reward {
    pub points: u64,
    pub minutes: i64,
}

impl Reward {
    pub const fn new(points: u64, minutes: i64) -> Self {
        Reward { points, minutes }
    }
}

/// The reusable part of a task: everything except its date and runtime state.
///
/// This is also the `task` object embedded in a persisted [`ScheduleEntry`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTemplate {
    pub name: String,
    pub level: TaskLevel,
    /// Planned duration in minutes.
    pub duration: u32,
    /// Recurrence as stored: `["daily"]`, weekday names, or empty.
    #[serde(default)]
    pub repeat_days: Vec<String>,
    pub group_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_points: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_time: Option<i64>,
}

pub const DEFAULT_DURATION_MINUTES: u32 = 30;

impl TaskTemplate {
    pub fn new(name: impl Into<String>, group_id: impl Into<String>, level: TaskLevel) -> Self {
        TaskTemplate {
            name: name.into(),
            level,
            duration: DEFAULT_DURATION_MINUTES,
            repeat_days: Vec::new(),
            group_id: group_id.into(),
            custom_color: None,
            notes: None,
            reward_points: None,
            reward_time: None,
        }
    }

    /// Sets an explicit reward that replaces the level table.
    pub fn with_reward(mut self, points: u64, minutes: i64) -> Self {
        self.reward_points = Some(points);
        self.reward_time = Some(minutes);
        self
    }

    /// Checks the template and trims its text fields.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.group_id = self.group_id.trim().to_string();
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.group_id.is_empty() {
            return Err(ValidationError::MissingGroup);
        }
        if self.level == TaskLevel::Custom {
            let points_ok = self.reward_points.map_or(false, |p| p > 0);
            let minutes_ok = self.reward_time.map_or(false, |m| m > 0);
            if !points_ok || !minutes_ok {
                return Err(ValidationError::NonPositiveCustomReward);
            }
        }
        self.notes = self
            .notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        self.custom_color = self.custom_color.filter(|c| !c.is_empty());
        Ok(self)
    }

    /// A not-yet-stored task instance of this template, due on `due_date`.
    pub fn instantiate(&self, due_date: NaiveDate) -> NewTask {
        NewTask {
            name: self.name.clone(),
            level: self.level,
            due_date,
            duration: self.duration,
            group_id: self.group_id.clone(),
            time_remaining: self.duration.saturating_mul(60),
            custom_color: self.custom_color.clone(),
            notes: self.notes.clone(),
            reward_points: self.reward_points,
            reward_time: self.reward_time,
        }
    }
}

/// A task as handed to the store for creation: no id, no timestamp.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    pub level: TaskLevel,
    pub due_date: NaiveDate,
    pub duration: u32,
    pub group_id: String,
    /// Seconds left on the task timer.
    pub time_remaining: u32,
    pub custom_color: Option<String>,
    pub notes: Option<String>,
    pub reward_points: Option<u64>,
    pub reward_time: Option<i64>,
}

/// A concrete, actionable task.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskInstance {
    pub id: u64,
    pub name: String,
    pub level: TaskLevel,
    pub due_date: NaiveDate,
    pub duration: u32,
    pub group_id: String,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub time_remaining: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_points: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reward_time: Option<i64>,
    #[serde(default)]
    pub last_interaction_date: Option<NaiveDate>,
    /// Creation timestamp (RFC 3339), stamped by the store.
    pub created_at: String,
}

impl TaskInstance {
    pub fn from_new(id: u64, task: NewTask, created_at: String) -> Self {
        TaskInstance {
            id,
            name: task.name,
            level: task.level,
            due_date: task.due_date,
            duration: task.duration,
            group_id: task.group_id,
            is_completed: false,
            is_active: false,
            time_remaining: task.time_remaining,
            custom_color: task.custom_color,
            notes: task.notes,
            reward_points: task.reward_points,
            reward_time: task.reward_time,
            last_interaction_date: None,
            created_at,
        }
    }

    /// Explicit reward override, only when both halves are present.
    pub fn reward_override(&self) -> Option<Reward> {
        match (self.reward_points, self.reward_time) {
            (Some(points), Some(minutes)) => Some(Reward::new(points, minutes)),
            _ => None,
        }
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(c) = update.is_completed { self.is_completed = c; }
        if let Some(d) = update.last_interaction_date { self.last_interaction_date = d; }
        if let Some(n) = &update.name { self.name = n.clone(); }
        if let Some(n) = &update.notes { self.notes = n.clone(); }
        if let Some(c) = &update.custom_color { self.custom_color = c.clone(); }
        if let Some(d) = update.duration {
            self.duration = d;
            self.time_remaining = d.saturating_mul(60);
        }
    }
}

/// Partial update of a stored task. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub is_completed: Option<bool>,
    pub last_interaction_date: Option<Option<NaiveDate>>,
    pub name: Option<String>,
    pub notes: Option<Option<String>>,
    pub custom_color: Option<Option<String>>,
    pub duration: Option<u32>,
}

impl TaskUpdate {
    /// The update that puts `task` back the way it is now, for the fields
    /// this update touches.
    pub fn inverse_for(&self, task: &TaskInstance) -> TaskUpdate {
        TaskUpdate {
            is_completed: self.is_completed.map(|_| task.is_completed),
            last_interaction_date: self.last_interaction_date.map(|_| task.last_interaction_date),
            name: self.name.as_ref().map(|_| task.name.clone()),
            notes: self.notes.as_ref().map(|_| task.notes.clone()),
            custom_color: self.custom_color.as_ref().map(|_| task.custom_color.clone()),
            duration: self.duration.map(|_| task.duration),
        }
    }

    /// True when the update only touches completion bookkeeping.
    pub fn is_completion_only(&self) -> bool {
        self.name.is_none() && self.notes.is_none() && self.custom_color.is_none() && self.duration.is_none()
    }
}

/// A set of weekdays, iterated Sunday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub fn new() -> Self {
        WeekdaySet(0)
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_sunday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Selected weekday indices (0 = Sunday), ascending.
    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        (0..7u32).filter(move |i| self.0 & (1 << i) != 0)
    }

    pub fn iter(&self) -> impl Iterator<Item = Weekday> + '_ {
        self.indices().map(|i| match i {
            0 => Weekday::Sun,
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        })
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::new();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

/// When instances of a template are materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurrence {
    /// A single task due today.
    #[default]
    None,
    /// A single task due on the given date.
    OneTime(NaiveDate),
    Daily,
    WeeklyOnDays(WeekdaySet),
}

pub const DAILY_MARKER: &str = "daily";

impl Recurrence {
    /// Weekly recurrence; an empty selection means no recurrence at all.
    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Self {
        let set: WeekdaySet = days.into_iter().collect();
        if set.is_empty() {
            Recurrence::None
        } else {
            Recurrence::WeeklyOnDays(set)
        }
    }

    /// Parses a repeat selection such as `daily` or `mon,fri`.
    ///
    /// `daily` anywhere in the selection wins over individual weekdays.
    pub fn from_repeat_days<S: AsRef<str>>(days: &[S]) -> Result<Self, ValidationError> {
        if days.iter().any(|d| d.as_ref().trim().eq_ignore_ascii_case(DAILY_MARKER)) {
            return Ok(Recurrence::Daily);
        }
        let mut set = WeekdaySet::new();
        for d in days {
            let d = d.as_ref();
            if d.trim().is_empty() {
                continue;
            }
            let day = parse_weekday(d).ok_or_else(|| ValidationError::UnknownWeekday(d.to_string()))?;
            set.insert(day);
        }
        Ok(if set.is_empty() { Recurrence::None } else { Recurrence::WeeklyOnDays(set) })
    }

    /// The `repeatDays` form persisted inside a schedule entry's template.
    pub fn repeat_days(&self) -> Vec<String> {
        match self {
            Recurrence::Daily => vec![DAILY_MARKER.to_string()],
            Recurrence::WeeklyOnDays(set) => set.iter().map(|d| weekday_name(d).to_string()).collect(),
            Recurrence::None | Recurrence::OneTime(_) => Vec::new(),
        }
    }

    pub fn is_recurring(&self) -> bool {
        matches!(self, Recurrence::Daily | Recurrence::WeeklyOnDays(_))
    }
}

/// A deferred template awaiting materialization.
///
/// Serialized as `{key, task, isRecurring, nextDate, created}`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub key: String,
    pub task: TaskTemplate,
    pub is_recurring: bool,
    pub next_date: NaiveDate,
    /// Set once the instance for `next_date` has been created and the
    /// entry only awaits removal.
    pub created: bool,
}

impl ScheduleEntry {
    /// Recovers the recurrence from the persisted fields.
    ///
    /// Unrecognised weekday names are ignored so that one bad token does not
    /// make the whole list unreadable.
    pub fn recurrence(&self) -> Recurrence {
        if !self.is_recurring {
            return Recurrence::OneTime(self.next_date);
        }
        if self.task.repeat_days.iter().any(|d| d.eq_ignore_ascii_case(DAILY_MARKER)) {
            return Recurrence::Daily;
        }
        Recurrence::weekly(self.task.repeat_days.iter().filter_map(|d| parse_weekday(d)))
    }
}

/// Durable gamification counters of a user.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserEconomyState {
    /// Cumulative points; only an explicit reset lowers it.
    pub points: u64,
    /// Reward minutes balance; penalties may take it below zero.
    pub reward_minutes: i64,
    /// Derived: `max(0, points / 100 - fundays_spent)`.
    pub funday_count: u64,
    #[serde(default)]
    pub fundays_spent: u64,
    pub completed_tasks: u64,
    pub total_tasks: u64,
    pub level: u32,
    pub current_streak: u32,
}

impl Default for UserEconomyState {
    fn default() -> Self {
        UserEconomyState {
            points: 0,
            reward_minutes: 0,
            funday_count: 0,
            fundays_spent: 0,
            completed_tasks: 0,
            total_tasks: 0,
            level: 1,
            current_streak: 0,
        }
    }
}

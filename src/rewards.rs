use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};

use crate::clock::end_of_day;
use crate::funday;
use crate::models::{Reward, TaskInstance, TaskLevel, UserEconomyState};

/// Consolation reward for finishing a task after its due date.
pub const LATE_COMPLETION_REWARD: Reward = Reward::new(0, 5);

/// Static reward table.
///
/// `Custom` has no row of its own and reads as `Mid`: custom tasks carry
/// their reward on the task, and the overdue penalty falls back to this row.
pub fn table_reward(level: TaskLevel) -> Reward {
    match level {
        TaskLevel::Easy => Reward::new(2, 5),
        TaskLevel::Mid | TaskLevel::Custom => Reward::new(5, 10),
        TaskLevel::Hard => Reward::new(10, 20),
        TaskLevel::Core => Reward::new(25, 45),
    }
}

/// True once `now` is past 23:59:59.999 of the task's due date.
pub fn is_overdue_at(task: &TaskInstance, now: NaiveDateTime) -> bool {
    now > end_of_day(task.due_date)
}

/// Reward for completing `task` at `now`.
///
/// Precedence: late completion, then the task's own override, then the
/// level table.
pub fn completion_reward(task: &TaskInstance, now: NaiveDateTime) -> Reward {
    if is_overdue_at(task, now) {
        return LATE_COMPLETION_REWARD;
    }
    task.reward_override().unwrap_or_else(|| table_reward(task.level))
}

/// Result of one overdue sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Tasks charged in this pass; none of them were in `already_penalized`.
    pub penalized_ids: BTreeSet<u64>,
    /// Minutes to deduct from the reward balance.
    pub total_minutes_penalty: i64,
}

impl SweepOutcome {
    pub fn is_empty(&self) -> bool {
        self.penalized_ids.is_empty()
    }
}

/// Finds incomplete tasks due before `today` that have not been charged yet.
///
/// Each one costs the minutes it would have earned, independent of how
/// late it is. `today` is taken once by the caller for the whole pass.
pub fn sweep_overdue(tasks: &[TaskInstance], today: NaiveDate, already_penalized: &BTreeSet<u64>) -> SweepOutcome {
    let mut outcome = SweepOutcome::default();
    for task in tasks {
        if task.is_completed || already_penalized.contains(&task.id) || task.due_date >= today {
            continue;
        }
        if outcome.penalized_ids.insert(task.id) {
            outcome.total_minutes_penalty += table_reward(task.level).minutes;
        }
    }
    outcome
}

/// Credits a completion: points, minutes and the completed counter move
/// together, and the funday count is re-derived from the new points.
pub fn apply_completion(state: &UserEconomyState, reward: Reward) -> UserEconomyState {
    let mut next = state.clone();
    next.points += reward.points;
    next.reward_minutes += reward.minutes;
    next.completed_tasks += 1;
    next.funday_count = funday::recompute(next.points, next.fundays_spent);
    next
}

/// Deducts a sweep's penalty from the reward minutes.
pub fn apply_penalty(state: &UserEconomyState, outcome: &SweepOutcome) -> UserEconomyState {
    let mut next = state.clone();
    next.reward_minutes -= outcome.total_minutes_penalty;
    next
}

//! Funday currency derived from cumulative points.
//!
//! One funday is earned per 100 points. The available count is always
//! re-derived from `points` and `fundays_spent`, never incremented.

use crate::models::UserEconomyState;

pub const POINTS_PER_FUNDAY: u64 = 100;

/// `max(0, floor(points / 100) - fundays_spent)`.
pub fn recompute(points: u64, fundays_spent: u64) -> u64 {
    (points / POINTS_PER_FUNDAY).saturating_sub(fundays_spent)
}

/// Points still missing for the next funday; 100 right after a boundary.
pub fn points_to_next_funday(points: u64) -> u64 {
    POINTS_PER_FUNDAY - (points % POINTS_PER_FUNDAY)
}

/// Fundays earned in total, spent or not.
pub fn total_earnable(points: u64) -> u64 {
    points / POINTS_PER_FUNDAY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FundayBalance {
    pub funday_count: u64,
    pub fundays_spent: u64,
}

impl FundayBalance {
    pub fn of(state: &UserEconomyState) -> Self {
        FundayBalance { funday_count: state.funday_count, fundays_spent: state.fundays_spent }
    }
}

/// Re-derives `funday_count` in place.
pub fn refresh(state: &mut UserEconomyState) {
    state.funday_count = recompute(state.points, state.fundays_spent);
}

/// Spends one funday if any is available.
///
/// Returns the new balance, or `None` (and leaves `state` untouched) when
/// there was nothing to spend.
pub fn spend(state: &mut UserEconomyState) -> Option<FundayBalance> {
    let available = recompute(state.points, state.fundays_spent);
    if available == 0 {
        return None;
    }
    state.funday_count = available - 1;
    state.fundays_spent += 1;
    Some(FundayBalance::of(state))
}

/// Highest milestone shown.
pub const MAX_MILESTONE: u64 = 1_000_000;

/// Next point milestone: 100, 500, 1000, then every 500 up to [`MAX_MILESTONE`].
pub fn next_milestone(points: u64) -> u64 {
    match points {
        p if p < 100 => 100,
        p if p < 500 => 500,
        p if p < 1000 => 1000,
        p => ((p / 500 + 1) * 500).min(MAX_MILESTONE),
    }
}

fn previous_milestone(next: u64) -> u64 {
    match next {
        100 => 0,
        500 => 100,
        1000 => 500,
        n => n - 500,
    }
}

/// Percentage of the way from the previous milestone to the next one.
pub fn milestone_progress(points: u64) -> f64 {
    let next = next_milestone(points);
    let prev = previous_milestone(next);
    ((points - prev) as f64 / (next - prev) as f64 * 100.0).min(100.0)
}

/// A badge shown on the profile; unlocking grants nothing by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
}

pub fn achievements(state: &UserEconomyState) -> Vec<Achievement> {
    vec![
        Achievement {
            id: "first-task",
            title: "First Steps",
            description: "Complete your first task (+5 minutes)",
            unlocked: state.completed_tasks >= 1,
        },
        Achievement {
            id: "task-master",
            title: "Task Master",
            description: "Complete 10 tasks (+15 minutes)",
            unlocked: state.completed_tasks >= 10,
        },
        Achievement {
            id: "point-collector",
            title: "Point Collector",
            description: "Earn 100 achievement points (+20 minutes)",
            unlocked: state.points >= 100,
        },
        Achievement {
            id: "level-up",
            title: "Level Up!",
            description: "Reach level 2 (+10 minutes)",
            unlocked: state.level >= 2,
        },
        Achievement {
            id: "streak-starter",
            title: "Streak Starter",
            description: "Maintain a 3-day streak (+25 minutes)",
            unlocked: state.current_streak >= 3,
        },
        Achievement {
            id: "productivity-king",
            title: "Productivity King",
            description: "Complete 50 tasks (+50 minutes)",
            unlocked: state.completed_tasks >= 50,
        },
    ]
}

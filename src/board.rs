use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::models::{TaskInstance, TaskLevel};

/// Which slice of the task list a board shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BoardView {
    /// Every open task.
    #[default]
    All,
    /// Completed tasks only.
    Completed,
    /// Open tasks of one group.
    Group(String),
    /// Open and completed tasks alike.
    Everything,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Level,
    Name,
    Date,
}

impl SortKey {
    pub fn next(self) -> Self {
        match self {
            SortKey::Level => SortKey::Name,
            SortKey::Name => SortKey::Date,
            SortKey::Date => SortKey::Level,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SortKey::Level => "level",
            SortKey::Name => "name",
            SortKey::Date => "date",
        })
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "level" => Ok(SortKey::Level),
            "name" => Ok(SortKey::Name),
            "date" => Ok(SortKey::Date),
            other => Err(format!("unknown sort key '{}'. Supported: level, name, date.", other)),
        }
    }
}

/// Hardest first; custom tasks sit with `mid`.
fn level_rank(level: TaskLevel) -> u8 {
    match level {
        TaskLevel::Core => 0,
        TaskLevel::Hard => 1,
        TaskLevel::Mid | TaskLevel::Custom => 2,
        TaskLevel::Easy => 3,
    }
}

fn compare(a: &TaskInstance, b: &TaskInstance, key: SortKey) -> Ordering {
    match key {
        SortKey::Level => level_rank(a.level).cmp(&level_rank(b.level)),
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Date => a.due_date.cmp(&b.due_date),
    }
    .then(a.id.cmp(&b.id))
}

/// Filters `tasks` down to `view` and sorts the result.
pub fn arrange(mut tasks: Vec<TaskInstance>, view: &BoardView, key: SortKey) -> Vec<TaskInstance> {
    tasks.retain(|t| match view {
        BoardView::All => !t.is_completed,
        BoardView::Completed => t.is_completed,
        BoardView::Group(g) => &t.group_id == g && !t.is_completed,
        BoardView::Everything => true,
    });
    tasks.sort_by(|a, b| compare(a, b, key));
    tasks
}

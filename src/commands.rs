use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::board::{arrange, BoardView, SortKey};
use crate::clock::{extract_date_part, format_for_display, parse_date, Clock};
use crate::engine::{CompletionOutcome, Engine};
use crate::error::{Result, ValidationError};
use crate::funday;
use crate::models::{Recurrence, TaskInstance, TaskLevel, TaskTemplate, TaskUpdate, DEFAULT_DURATION_MINUTES};
use crate::rewards::table_reward;
use crate::storage::Store;

/// Fields of a new task as typed on the command line or in the TUI.
#[derive(Debug, Clone, Default)]
pub struct AddRequest {
    pub name: String,
    pub group: String,
    pub level: TaskLevel,
    pub points: Option<u64>,
    pub minutes: Option<i64>,
    /// `YYYY-MM-DD` or an ISO timestamp; empty or absent means today.
    pub due: Option<String>,
    /// `daily` or a comma separated weekday list such as `mon,fri`.
    pub repeat: Option<String>,
    pub duration: Option<u32>,
    pub notes: Option<String>,
    pub color: Option<String>,
}

impl AddRequest {
    /// Splits the request into a template and its recurrence.
    ///
    /// A repeat selection takes precedence over a due date.
    pub fn into_parts(self) -> std::result::Result<(TaskTemplate, Recurrence), ValidationError> {
        let repeat: Vec<&str> = self
            .repeat
            .as_deref()
            .map(|r| r.split(',').map(str::trim).filter(|d| !d.is_empty()).collect())
            .unwrap_or_default();
        let mut recurrence = Recurrence::from_repeat_days(&repeat)?;
        if recurrence == Recurrence::None {
            if let Some(due) = self.due.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                let date = parse_date(due)
                    .or_else(|| extract_date_part(due))
                    .ok_or_else(|| ValidationError::InvalidDate(due.to_string()))?;
                recurrence = Recurrence::OneTime(date);
            }
        }

        let mut template = TaskTemplate::new(self.name, self.group, self.level);
        template.duration = self.duration.unwrap_or(DEFAULT_DURATION_MINUTES);
        template.notes = self.notes;
        template.custom_color = self.color;
        template.reward_points = self.points;
        template.reward_time = self.minutes;
        Ok((template, recurrence))
    }
}

/// Creates a task now and/or schedules it, then prints the confirmation.
pub fn cmd_add<S: Store, C: Clock>(engine: &mut Engine<S, C>, request: AddRequest, silent: bool) -> Result<()> {
    let (template, recurrence) = request.into_parts()?;
    let outcome = engine.submit(template, recurrence)?;
    if !silent {
        if let Some(t) = &outcome.instance {
            println!("Task added (id = {})", t.id);
        }
        println!("{}", outcome.confirmation);
    }
    Ok(())
}

fn reward_label(t: &TaskInstance) -> String {
    let reward = t.reward_override().unwrap_or_else(|| table_reward(t.level));
    format!("+{}p / {}m", reward.points, reward.minutes)
}

/// Lists tasks in a formatted table.
///
/// By default shows open tasks, hardest first.
pub fn cmd_list<S: Store, C: Clock>(engine: &Engine<S, C>, all: bool, group: Option<String>, sort: SortKey) -> Result<()> {
    let view = match (all, group) {
        (_, Some(g)) => BoardView::Group(g),
        (true, None) => BoardView::Everything,
        (false, None) => BoardView::All,
    };
    let tasks = arrange(engine.tasks()?, &view, sort);
    if tasks.is_empty() {
        println!("No tasks found.");
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("ID").add_attribute(Attribute::Bold),
            Cell::new("Name").add_attribute(Attribute::Bold),
            Cell::new("Group").add_attribute(Attribute::Bold),
            Cell::new("Level").add_attribute(Attribute::Bold),
            Cell::new("Due").add_attribute(Attribute::Bold),
            Cell::new("Time Left").add_attribute(Attribute::Bold),
            Cell::new("Reward").add_attribute(Attribute::Bold),
            Cell::new("Status").add_attribute(Attribute::Bold),
        ]);

    let today = engine.clock().today();

    for t in tasks {
        let days_left = (t.due_date - today).num_days();
        let time_left_str = if days_left < 0 {
            format!("{}d overdue", days_left.abs())
        } else if days_left == 0 {
            "Today".to_string()
        } else {
            format!("{}d", days_left)
        };

        let level_color = match t.level {
            TaskLevel::Core => Color::Red,
            TaskLevel::Hard => Color::Yellow,
            TaskLevel::Mid => Color::Blue,
            TaskLevel::Easy => Color::Green,
            TaskLevel::Custom => Color::Magenta,
        };

        let status = if t.is_completed { "Done" } else { "Pending" };
        let status_color = if t.is_completed { Color::Green } else { Color::Yellow };

        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(&t.name),
            Cell::new(&t.group_id),
            Cell::new(t.level).fg(level_color),
            Cell::new(t.due_date),
            Cell::new(time_left_str).fg(if days_left < 0 && !t.is_completed { Color::Red } else { Color::Reset }),
            Cell::new(reward_label(&t)),
            Cell::new(status).fg(status_color),
        ]);
    }

    println!("{table}");
    Ok(())
}

/// Marks a task completed (`done = true`) or open again.
pub fn cmd_complete<S: Store, C: Clock>(engine: &mut Engine<S, C>, id: u64, done: bool, silent: bool) -> Result<()> {
    let outcome = engine.set_completed(id, done)?;
    if silent {
        return Ok(());
    }
    match outcome {
        CompletionOutcome::Completed { reward, economy, .. } => {
            println!(
                "Task {} marked as complete. +{} points, {:+} minutes ({} points total).",
                id, reward.points, reward.minutes, economy.points
            );
        }
        CompletionOutcome::Reopened { .. } => println!("Task {} reopened.", id),
        CompletionOutcome::Unchanged { .. } => {
            println!("Task {} is already {}.", id, if done { "complete" } else { "open" })
        }
    }
    Ok(())
}

/// Removes a task by ID.
pub fn cmd_remove<S: Store, C: Clock>(engine: &mut Engine<S, C>, id: u64, silent: bool) -> Result<()> {
    engine.delete_task(id)?;
    if !silent { println!("Task {} removed.", id); }
    Ok(())
}

/// Edits the descriptive fields of an open task.
pub fn cmd_edit<S: Store, C: Clock>(
    engine: &mut Engine<S, C>,
    id: u64,
    name: Option<String>,
    notes: Option<String>,
    color: Option<String>,
    duration: Option<u32>,
    silent: bool,
) -> Result<()> {
    let update = TaskUpdate {
        name,
        notes: notes.map(|n| Some(n).filter(|n| !n.trim().is_empty())),
        custom_color: color.map(|c| Some(c).filter(|c| !c.is_empty())),
        duration,
        ..TaskUpdate::default()
    };
    engine.edit_task(id, update)?;
    if !silent { println!("Task {} updated.", id); }
    Ok(())
}

/// Lists pending schedule entries.
pub fn cmd_schedule_list<S: Store, C: Clock>(engine: &Engine<S, C>) -> Result<()> {
    let entries = engine.schedule_entries()?;
    if entries.is_empty() {
        println!("No scheduled tasks.");
        return Ok(());
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["Key", "Name", "Group", "Repeat", "Next"]);
    for e in entries {
        let repeat = if e.is_recurring { e.task.repeat_days.join(", ") } else { "once".into() };
        table.add_row(vec![
            e.key,
            e.task.name,
            e.task.group_id,
            repeat,
            e.next_date.to_string(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Removes a schedule entry by key.
pub fn cmd_schedule_remove<S: Store, C: Clock>(engine: &mut Engine<S, C>, key: String, silent: bool) -> Result<()> {
    let removed = engine.remove_schedule_entry(&key)?;
    if !silent {
        if removed {
            println!("Scheduled task '{}' removed.", key);
        } else {
            eprintln!("Scheduled task '{}' not found.", key);
        }
    }
    Ok(())
}

/// Runs one evaluation pass: due entries, overdue sweep, funday refresh.
pub fn cmd_tick<S: Store, C: Clock>(engine: &mut Engine<S, C>, silent: bool) -> Result<()> {
    let report = engine.evaluate()?;
    if !silent {
        for t in &report.materialized {
            println!("Created '{}' (id = {}) due {}", t.name, t.id, t.due_date);
        }
        if !report.sweep.is_empty() {
            println!(
                "{} overdue task(s) cost {} reward minutes.",
                report.sweep.penalized_ids.len(),
                report.sweep.total_minutes_penalty
            );
        }
        if report.materialized.is_empty() && report.sweep.is_empty() {
            println!("Nothing to do.");
        }
    }
    Ok(())
}

/// Prints the economy counters, funday progress and achievements.
pub fn cmd_stats<S: Store, C: Clock>(engine: &Engine<S, C>) -> Result<()> {
    let state = engine.economy()?;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL)
        .set_header(vec!["Stat", "Value"]);
    table.add_row(vec!["Level".to_string(), state.level.to_string()]);
    table.add_row(vec!["Points".to_string(), state.points.to_string()]);
    table.add_row(vec!["Reward minutes".to_string(), state.reward_minutes.to_string()]);
    table.add_row(vec!["Fundays available".to_string(), state.funday_count.to_string()]);
    table.add_row(vec!["Fundays spent".to_string(), state.fundays_spent.to_string()]);
    table.add_row(vec!["Points to next funday".to_string(), funday::points_to_next_funday(state.points).to_string()]);
    table.add_row(vec![
        "Next milestone".to_string(),
        format!("{} ({:.0}%)", funday::next_milestone(state.points), funday::milestone_progress(state.points)),
    ]);
    table.add_row(vec!["Completed tasks".to_string(), format!("{} / {}", state.completed_tasks, state.total_tasks)]);
    table.add_row(vec!["Day streak".to_string(), state.current_streak.to_string()]);
    println!("{table}");

    let mut badges = Table::new();
    badges.load_preset(UTF8_FULL)
        .set_header(vec!["Achievement", "Description", "Unlocked"]);
    for a in funday::achievements(&state) {
        badges.add_row(vec![
            Cell::new(a.title),
            Cell::new(a.description),
            Cell::new(if a.unlocked { "yes" } else { "no" }).fg(if a.unlocked { Color::Green } else { Color::Grey }),
        ]);
    }
    println!("{badges}");
    Ok(())
}

/// Spends one funday if available.
pub fn cmd_funday_spend<S: Store, C: Clock>(engine: &mut Engine<S, C>, silent: bool) -> Result<()> {
    let spent = engine.spend_funday()?;
    if !silent {
        match spent {
            Some(b) => println!(
                "Enjoy your funday ({}). {} left, {} spent so far.",
                format_for_display(engine.clock().today()),
                b.funday_count,
                b.fundays_spent
            ),
            None => println!("No fundays available yet. Earn 1 funday for every 100 achievement points."),
        }
    }
    Ok(())
}

fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}

/// Resets level, points, streak and task counters. Tasks stay.
pub fn cmd_reset<S: Store, C: Clock>(engine: &mut Engine<S, C>, force: bool) -> Result<()> {
    if !force && !confirm("This will permanently reset your level, points, streak, and task counters. Continue?") {
        println!("Aborted.");
        return Ok(());
    }
    engine.reset_stats()?;
    println!("Stats reset successfully.");
    Ok(())
}

/// Sets the reward minutes balance to zero.
pub fn cmd_reset_minutes<S: Store, C: Clock>(engine: &mut Engine<S, C>, silent: bool) -> Result<()> {
    engine.reset_reward_minutes()?;
    if !silent { println!("Reward minutes reset."); }
    Ok(())
}

/// Deletes every task and scheduled task.
pub fn cmd_clear<S: Store, C: Clock>(engine: &mut Engine<S, C>, force: bool) -> Result<()> {
    if !force && !confirm("Are you sure you want to delete all tasks and scheduled tasks? This cannot be undone.") {
        println!("Aborted.");
        return Ok(());
    }
    engine.clear_all()?;
    println!("All tasks cleared.");
    Ok(())
}

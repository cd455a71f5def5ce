use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use crate::clock::Clock;
use crate::funday::points_to_next_funday;
use crate::models::{TaskInstance, TaskLevel, UserEconomyState};
use crate::storage::Store;
use super::app::{AddStep, App, InputMode};

const BOARD_HELP: &str =
    "q: Quit | a: Add | Space: Done/Undo | d: Del | c: Toggle Done | s: Sort | f: Spend Funday | r: Refresh";

pub fn draw<S: Store, C: Clock>(f: &mut Frame, app: &mut App<S, C>) {
    let [header_area, board_area, status_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(f.area());

    f.render_widget(economy_header(&app.economy), header_area);

    let today = app.engine.clock().today();
    let rows: Vec<Row> = app.tasks.iter().map(|t| task_row(t, (t.due_date - today).num_days())).collect();
    let widths = [
        Constraint::Length(4),
        Constraint::Min(20),
        Constraint::Length(12),
        Constraint::Length(7),
        Constraint::Length(12),
        Constraint::Length(12),
        Constraint::Length(8),
    ];
    let board = Table::new(rows, widths)
        .header(
            Row::new(vec!["ID", "Name", "Group", "Level", "Due", "Time Left", "Status"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(format!("Tasks (sorted by {})", app.sort)))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");
    f.render_stateful_widget(board, board_area, &mut app.state);

    let status = match app.input_mode {
        InputMode::Normal if !app.status.is_empty() => app.status.as_str(),
        InputMode::Normal => BOARD_HELP,
        InputMode::Adding => "Enter: Next Step | Esc: Cancel",
    };
    let status = Paragraph::new(status)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, status_area);

    if app.input_mode == InputMode::Adding {
        let area = popup_area(f.area(), 60);
        f.render_widget(Clear, area);
        let prompt = Paragraph::new(app.input_buffer.as_str())
            .style(Style::default().fg(Color::Yellow))
            .block(Block::default().borders(Borders::ALL).title(step_title(app.add_state.step)));
        f.render_widget(prompt, area);
    }
}

fn economy_header(e: &UserEconomyState) -> Paragraph<'static> {
    Paragraph::new(format!(
        "Level {} | {} points ({} to next funday) | {} reward min | {} funday(s) | {}/{} done",
        e.level,
        e.points,
        points_to_next_funday(e.points),
        e.reward_minutes,
        e.funday_count,
        e.completed_tasks,
        e.total_tasks,
    ))
    .style(Style::default().fg(Color::Magenta))
    .block(Block::default().borders(Borders::ALL).title("Funday"))
}

fn task_row(t: &TaskInstance, days_left: i64) -> Row<'static> {
    let time_left = match days_left {
        d if d < 0 => format!("{}d overdue", -d),
        0 => "Today".to_string(),
        d => format!("{}d", d),
    };
    let color = if t.is_completed {
        Color::DarkGray
    } else if days_left < 0 {
        Color::Red
    } else if matches!(t.level, TaskLevel::Core | TaskLevel::Hard) {
        Color::Yellow
    } else {
        Color::Green
    };
    Row::new(vec![
        Cell::from(t.id.to_string()),
        Cell::from(t.name.clone()),
        Cell::from(t.group_id.clone()),
        Cell::from(t.level.to_string()),
        Cell::from(t.due_date.to_string()),
        Cell::from(time_left),
        Cell::from(if t.is_completed { "Done" } else { "Pending" }),
    ])
    .style(Style::default().fg(color))
}

fn step_title(step: AddStep) -> &'static str {
    match step {
        AddStep::Name => "Add Task: Enter Name",
        AddStep::Group => "Add Task: Enter Group",
        AddStep::Level => "Add Task: Level (easy, mid, hard, core, custom) [mid]",
        AddStep::Reward => "Add Task: Reward points,minutes",
        AddStep::Repeat => "Add Task: Repeat (daily or mon,fri) (Optional)",
        AddStep::Due => "Add Task: Due Date YYYY-MM-DD (Optional, today)",
    }
}

/// One-line input box (plus borders) centered in `area`.
fn popup_area(area: Rect, percent_x: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(3)]).flex(Flex::Center).areas(area);
    let [popup] = Layout::horizontal([Constraint::Percentage(percent_x)]).flex(Flex::Center).areas(row);
    popup
}

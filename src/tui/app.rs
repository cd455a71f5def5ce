use ratatui::widgets::TableState;
use crate::board::{arrange, BoardView, SortKey};
use crate::clock::Clock;
use crate::commands::AddRequest;
use crate::engine::{CompletionOutcome, Engine};
use crate::models::{TaskInstance, TaskLevel, UserEconomyState};
use crate::storage::Store;

#[derive(PartialEq)]
pub enum InputMode {
    Normal,
    Adding,
}

/// Steps of the "Add Task" wizard, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddStep {
    #[default]
    Name,
    Group,
    Level,
    /// Only asked for custom tasks.
    Reward,
    Repeat,
    /// Skipped when a repeat selection was given.
    Due,
}

/// State for the multi-step "Add Task" wizard.
#[derive(Default)]
pub struct AddState {
    pub step: AddStep,
    pub request: AddRequest,
}

pub struct App<S, C> {
    pub engine: Engine<S, C>,
    pub tasks: Vec<TaskInstance>,
    pub economy: UserEconomyState,
    pub state: TableState,
    pub input_mode: InputMode,
    pub input_buffer: String,
    pub add_state: AddState,
    pub show_completed: bool,
    pub sort: SortKey,
    /// Last message for the status line.
    pub status: String,
}

impl<S: Store, C: Clock> App<S, C> {
    /// Creates the app, runs an evaluation pass and loads the board.
    pub fn new(engine: Engine<S, C>) -> App<S, C> {
        let mut app = App {
            engine,
            tasks: Vec::new(),
            economy: UserEconomyState::default(),
            state: TableState::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            add_state: AddState::default(),
            show_completed: false,
            sort: SortKey::default(),
            status: String::new(),
        };
        app.evaluate();
        app
    }

    /// Materializes due entries, charges overdue tasks and reloads.
    pub fn evaluate(&mut self) {
        self.status = match self.engine.evaluate() {
            Ok(report) => {
                let mut parts = Vec::new();
                if !report.materialized.is_empty() {
                    parts.push(format!("{} scheduled task(s) created", report.materialized.len()));
                }
                if !report.sweep.is_empty() {
                    parts.push(format!(
                        "{} overdue task(s): -{} min",
                        report.sweep.penalized_ids.len(),
                        report.sweep.total_minutes_penalty
                    ));
                }
                parts.join(" | ")
            }
            Err(e) => format!("Error: {}", e),
        };
        self.reload();
    }

    /// Selects the next task.
    pub fn next(&mut self) {
        if self.tasks.is_empty() { return; }
        let i = match self.state.selected() {
            Some(i) if i >= self.tasks.len() - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    /// Selects the previous task.
    pub fn previous(&mut self) {
        if self.tasks.is_empty() { return; }
        let i = match self.state.selected() {
            Some(0) => self.tasks.len() - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    fn selected_task(&self) -> Option<&TaskInstance> {
        self.state.selected().and_then(|i| self.tasks.get(i))
    }

    /// Completes the selected task, or reopens it if already completed.
    pub fn toggle_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let (id, done) = (task.id, !task.is_completed);
        self.status = match self.engine.set_completed(id, done) {
            Ok(CompletionOutcome::Completed { task, reward, .. }) => {
                format!("'{}' done: +{} points, +{} min", task.name, reward.points, reward.minutes)
            }
            Ok(CompletionOutcome::Reopened { task }) => format!("'{}' reopened", task.name),
            Ok(CompletionOutcome::Unchanged { .. }) => String::new(),
            Err(e) => format!("Error: {}", e),
        };
        self.reload();
    }

    /// Deletes the selected task.
    pub fn delete_selected(&mut self) {
        let Some(task) = self.selected_task() else { return };
        let (id, name) = (task.id, task.name.clone());
        self.status = match self.engine.delete_task(id) {
            Ok(()) => format!("'{}' deleted", name),
            Err(e) => format!("Error: {}", e),
        };
        self.reload();
    }

    /// Spends one funday.
    pub fn spend_funday(&mut self) {
        self.status = match self.engine.spend_funday() {
            Ok(Some(b)) => format!("Funday spent! {} left", b.funday_count),
            Ok(None) => "No fundays available yet".to_string(),
            Err(e) => format!("Error: {}", e),
        };
        self.reload();
    }

    /// Reloads tasks and economy from storage and keeps the selection in range.
    pub fn reload(&mut self) {
        let view = if self.show_completed { BoardView::Everything } else { BoardView::All };
        match (self.engine.tasks(), self.engine.economy()) {
            (Ok(tasks), Ok(economy)) => {
                self.tasks = arrange(tasks, &view, self.sort);
                self.economy = economy;
            }
            (Err(e), _) | (_, Err(e)) => self.status = format!("Error: {}", e),
        }

        if self.tasks.is_empty() {
            self.state.select(None);
        } else if let Some(i) = self.state.selected() {
            if i >= self.tasks.len() {
                self.state.select(Some(self.tasks.len() - 1));
            }
        } else {
            self.state.select(Some(0));
        }
    }

    /// Toggles the visibility of completed tasks.
    pub fn toggle_completed(&mut self) {
        self.show_completed = !self.show_completed;
        self.reload();
    }

    /// Switches to the next sort order.
    pub fn cycle_sort(&mut self) {
        self.sort = self.sort.next();
        self.reload();
    }

    /// Initiates the "Add Task" wizard.
    pub fn start_add(&mut self) {
        self.input_mode = InputMode::Adding;
        self.add_state = AddState::default();
        self.input_buffer.clear();
    }

    /// Leaves the wizard without creating anything.
    pub fn cancel_add(&mut self) {
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.add_state = AddState::default();
    }

    /// Handles the text entered for the current wizard step.
    pub fn handle_input(&mut self) {
        if self.input_mode != InputMode::Adding {
            return;
        }
        let input = self.input_buffer.trim().to_string();
        let request = &mut self.add_state.request;
        let next = match self.add_state.step {
            AddStep::Name => {
                if input.is_empty() { return; }
                request.name = input;
                AddStep::Group
            }
            AddStep::Group => {
                if input.is_empty() { return; }
                request.group = input;
                AddStep::Level
            }
            AddStep::Level => {
                if !input.is_empty() {
                    match input.parse::<TaskLevel>() {
                        Ok(level) => request.level = level,
                        Err(e) => {
                            self.status = e;
                            return;
                        }
                    }
                }
                if request.level == TaskLevel::Custom { AddStep::Reward } else { AddStep::Repeat }
            }
            AddStep::Reward => {
                let mut parts = input.split(',').map(|p| p.trim().parse::<i64>());
                match (parts.next(), parts.next()) {
                    (Some(Ok(points)), Some(Ok(minutes))) if points > 0 && minutes > 0 => {
                        request.points = Some(points as u64);
                        request.minutes = Some(minutes);
                        AddStep::Repeat
                    }
                    _ => {
                        self.status = "Enter positive points and minutes, e.g. 7,12".to_string();
                        return;
                    }
                }
            }
            AddStep::Repeat => {
                if input.is_empty() {
                    AddStep::Due
                } else {
                    request.repeat = Some(input);
                    self.finish_add();
                    return;
                }
            }
            AddStep::Due => {
                if !input.is_empty() {
                    request.due = Some(input);
                }
                self.finish_add();
                return;
            }
        };
        self.add_state.step = next;
        self.input_buffer.clear();
    }

    fn finish_add(&mut self) {
        let request = std::mem::take(&mut self.add_state.request);
        self.status = match request.into_parts() {
            Ok((template, recurrence)) => match self.engine.submit(template, recurrence) {
                Ok(outcome) => outcome.confirmation.to_string(),
                Err(e) => format!("Error: {}", e),
            },
            Err(e) => format!("Error: {}", e),
        };
        self.input_mode = InputMode::Normal;
        self.input_buffer.clear();
        self.reload();
    }
}

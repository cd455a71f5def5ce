pub mod app;
pub mod ui;

use std::{error::Error, io};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use crate::clock::Clock;
use crate::engine::Engine;
use crate::storage::Store;
use app::{App, InputMode};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

/// Runs the interactive board until the user quits.
pub fn run_tui<S: Store, C: Clock>(engine: Engine<S, C>) -> Result<(), Box<dyn Error>> {
    let mut terminal = enter()?;
    let mut app = App::new(engine);
    let res = event_loop(&mut terminal, &mut app);
    leave(&mut terminal)?;
    res?;
    Ok(())
}

fn enter() -> io::Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(stdout))
}

fn leave(terminal: &mut Term) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()
}

fn event_loop<B: Backend, S: Store, C: Clock>(terminal: &mut Terminal<B>, app: &mut App<S, C>) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        let keep_going = match app.input_mode {
            InputMode::Normal => on_board_key(app, key),
            InputMode::Adding => {
                on_wizard_key(app, key);
                true
            }
        };
        if !keep_going {
            return Ok(());
        }
    }
}

/// Returns false when the user asked to quit.
fn on_board_key<S: Store, C: Clock>(app: &mut App<S, C>, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return false,
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::Char(' ') => app.toggle_selected(),
        KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(),
        KeyCode::Char('a') => app.start_add(),
        KeyCode::Char('c') => app.toggle_completed(),
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('f') => app.spend_funday(),
        KeyCode::Char('r') => app.evaluate(),
        _ => {}
    }
    true
}

fn on_wizard_key<S: Store, C: Clock>(app: &mut App<S, C>, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.handle_input(),
        KeyCode::Esc => app.cancel_add(),
        KeyCode::Char(c) => app.input_buffer.push(c),
        KeyCode::Backspace => {
            app.input_buffer.pop();
        }
        _ => {}
    }
}

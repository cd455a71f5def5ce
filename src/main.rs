//! # Funday
//!
//! A terminal habit tracker with recurring tasks and a small reward economy.
//!
//! ## Features
//!
//! *   **Levels and rewards**: every task is easy, mid, hard, core or custom.
//!     Completing it earns points and reward minutes; finishing late still
//!     earns 5 minutes.
//! *   **Recurrence**: schedule a task for a future date, every day, or on
//!     chosen weekdays. A recurring task is created today as well when today
//!     qualifies.
//! *   **Overdue penalty**: each task left open past its due date costs the
//!     minutes it would have earned, once.
//! *   **Fundays**: every 100 points earns a funday you can spend.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive board
//! funday
//!
//! # A task for today
//! funday add "Laundry" --group home --level easy
//!
//! # Every Monday and Friday
//! funday add "Gym" --group health --level hard --repeat mon,fri
//!
//! # Create due scheduled tasks and charge overdue ones
//! funday tick
//!
//! funday complete 3
//! funday funday spend
//! ```
//!
//! ## Data Storage
//!
//! Data lives in your local data directory:
//! *   Linux: `~/.local/share/funday/`
//! *   macOS: `~/Library/Application Support/funday/`
//! *   Windows: `%APPDATA%\funday\`
//!
//! Override it with `--data-dir` or the `FUNDAY_DATA_DIR` environment
//! variable. Set `FUNDAY_LOG=debug` for diagnostics on stderr.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use funday::board::SortKey;
use funday::clock::SystemClock;
use funday::commands::*;
use funday::config::Config;
use funday::models::TaskLevel;
use funday::storage::JsonStore;
use funday::tui::run_tui;
use funday::Engine;

#[derive(Parser)]
#[command(name = "funday")]
#[command(about = "Habit tracker with recurring tasks and fundays", long_about = None)]
struct Cli {
    /// Directory for the data files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task name (quoted if it has spaces)
        name: String,
        /// Group the task belongs to
        #[arg(short, long)]
        group: String,
        /// easy, mid, hard, core or custom
        #[arg(short, long, default_value = "mid")]
        level: TaskLevel,
        /// Reward points (required for custom)
        #[arg(long)]
        points: Option<u64>,
        /// Reward minutes (required for custom)
        #[arg(long)]
        minutes: Option<i64>,
        /// Due date in YYYY-MM-DD; a future date schedules the task
        #[arg(short, long)]
        due: Option<String>,
        /// Repeat: daily, or weekdays such as mon,wed,fri
        #[arg(short, long)]
        repeat: Option<String>,
        /// Planned duration in minutes
        #[arg(short = 'D', long)]
        duration: Option<u32>,
        /// Free-form notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Custom color, e.g. #ff8800
        #[arg(long)]
        color: Option<String>,
    },
    /// List tasks
    List {
        /// Show completed tasks too
        #[arg(short, long)]
        all: bool,
        /// Only open tasks of this group
        #[arg(short, long)]
        group: Option<String>,
        /// Sort by level, name or date
        #[arg(short, long, default_value = "level")]
        sort: SortKey,
    },
    /// Mark a task as complete
    Complete {
        id: u64,
    },
    /// Mark a completed task as open again
    Uncomplete {
        id: u64,
    },
    /// Remove a task
    Remove {
        id: u64,
    },
    /// Edit an open task
    Edit {
        id: u64,
        /// New task name
        #[arg(long)]
        name: Option<String>,
        /// New notes (empty to clear)
        #[arg(short, long)]
        notes: Option<String>,
        /// New color (empty to clear)
        #[arg(long)]
        color: Option<String>,
        /// New duration in minutes
        #[arg(short = 'D', long)]
        duration: Option<u32>,
    },
    /// Manage scheduled tasks
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommands,
    },
    /// Create due scheduled tasks and charge overdue ones
    Tick,
    /// Show points, fundays and achievements
    Stats,
    /// Fundays
    Funday {
        #[command(subcommand)]
        command: FundayCommands,
    },
    /// Reset level, points, streak and counters
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Set the reward minutes balance to zero
    ResetMinutes,
    /// Delete all tasks and scheduled tasks
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum ScheduleCommands {
    /// List scheduled tasks
    List,
    /// Remove a scheduled task
    Remove {
        /// Schedule key, as shown by `schedule list`
        key: String,
    },
}

#[derive(Subcommand)]
enum FundayCommands {
    /// Spend one funday
    Spend,
}

fn init_logging(filter: &str, to_sink: bool) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if to_sink {
        let _ = builder.with_writer(io::sink).try_init();
    } else {
        let _ = builder.with_writer(io::stderr).try_init();
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let shell_enum = match shell.as_str() {
            "bash" => Shell::Bash,
            "zsh" => Shell::Zsh,
            "fish" => Shell::Fish,
            "powershell" => Shell::PowerShell,
            "elvish" => Shell::Elvish,
            _ => {
                eprintln!("Unsupported shell: {}", shell);
                return ExitCode::FAILURE;
            }
        };
        let mut cmd = Cli::command();
        generate(shell_enum, &mut cmd, "funday", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    let config = Config::resolve(cli.data_dir);
    init_logging(&config.log_filter, matches!(cli.command, Some(Commands::Ui) | None));

    let store = match JsonStore::open(&config.data_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot open data directory {}: {}", config.data_dir.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let mut engine = Engine::new(store, SystemClock);

    let result = match cli.command {
        Some(Commands::Add { name, group, level, points, minutes, due, repeat, duration, notes, color }) => {
            let request = AddRequest { name, group, level, points, minutes, due, repeat, duration, notes, color };
            cmd_add(&mut engine, request, false)
        }
        Some(Commands::List { all, group, sort }) => cmd_list(&engine, all, group, sort),
        Some(Commands::Complete { id }) => cmd_complete(&mut engine, id, true, false),
        Some(Commands::Uncomplete { id }) => cmd_complete(&mut engine, id, false, false),
        Some(Commands::Remove { id }) => cmd_remove(&mut engine, id, false),
        Some(Commands::Edit { id, name, notes, color, duration }) => {
            cmd_edit(&mut engine, id, name, notes, color, duration, false)
        }
        Some(Commands::Schedule { command }) => match command {
            ScheduleCommands::List => cmd_schedule_list(&engine),
            ScheduleCommands::Remove { key } => cmd_schedule_remove(&mut engine, key, false),
        },
        Some(Commands::Tick) => cmd_tick(&mut engine, false),
        Some(Commands::Stats) => cmd_stats(&engine),
        Some(Commands::Funday { command: FundayCommands::Spend }) => cmd_funday_spend(&mut engine, false),
        Some(Commands::Reset { force }) => cmd_reset(&mut engine, force),
        Some(Commands::ResetMinutes) => cmd_reset_minutes(&mut engine, false),
        Some(Commands::Clear { force }) => cmd_clear(&mut engine, force),
        Some(Commands::Completions { .. }) => Ok(()),
        Some(Commands::Ui) | None => {
            if let Err(e) = run_tui(engine) {
                eprintln!("Error running TUI: {}", e);
                return ExitCode::FAILURE;
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

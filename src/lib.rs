//! # Funday
//!
//! Recurring-task scheduling and reward economy for a personal habit
//! tracker.
//!
//! * [`scheduler`] turns a task submission into an instance due today, a
//!   deferred [`models::ScheduleEntry`], or both, and materializes entries
//!   when their date comes.
//! * [`rewards`] prices completions (with a reduced reward for late ones)
//!   and charges overdue tasks exactly once.
//! * [`funday`] derives the spendable funday count from cumulative points.
//! * [`engine::Engine`] runs these against a [`storage::Store`] and a
//!   [`clock::Clock`], both injected by the host.

pub mod board;
pub mod clock;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod funday;
pub mod models;
pub mod rewards;
pub mod scheduler;
pub mod storage;
pub mod tui;

pub use engine::Engine;
pub use error::{Error, Result};

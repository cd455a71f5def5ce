use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "FUNDAY_DATA_DIR";
pub const LOG_ENV: &str = "FUNDAY_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

/// Runtime settings of the binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `tasks.json`, `schedule.json`, `economy.json` and `penalized.json`.
    pub data_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Config {
    /// Resolves the configuration.
    ///
    /// The data directory is taken in the following order:
    /// 1. `data_dir` (the `--data-dir` flag).
    /// 2. `FUNDAY_DATA_DIR` environment variable.
    /// 3. `~/.local/share/funday` (on Linux).
    /// 4. `./funday` (fallback).
    pub fn resolve(data_dir: Option<PathBuf>) -> Config {
        let data_dir = data_dir
            .or_else(|| std::env::var(DATA_DIR_ENV).ok().filter(|v| !v.is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| {
                let mut p = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
                p.push("funday");
                p
            });
        let log_filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Config { data_dir, log_filter }
    }
}

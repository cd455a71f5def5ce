use std::collections::{BTreeSet, HashSet};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::StorageError;
use crate::models::{NewTask, ScheduleEntry, TaskInstance, TaskUpdate, UserEconomyState};

type StoreResult<T> = Result<T, StorageError>;

/// Row store for task instances.
pub trait TaskStore {
    fn list_tasks(&self) -> StoreResult<Vec<TaskInstance>>;

    /// Stores a new task, assigning its id and creation timestamp.
    fn create_task(&mut self, task: NewTask) -> StoreResult<TaskInstance>;

    /// Applies a partial update and returns the stored result.
    fn update_task(&mut self, id: u64, update: &TaskUpdate) -> StoreResult<TaskInstance>;

    fn delete_task(&mut self, id: u64) -> StoreResult<()>;

    /// Deletes every task.
    fn clear_tasks(&mut self) -> StoreResult<()>;

    fn get_task(&self, id: u64) -> StoreResult<TaskInstance> {
        self.list_tasks()?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(StorageError::TaskNotFound(id))
    }
}

/// Keyed store of pending schedule entries.
pub trait ScheduleStore {
    fn list_schedule_entries(&self) -> StoreResult<Vec<ScheduleEntry>>;

    /// Inserts the entry, replacing any entry with the same key.
    fn put_schedule_entry(&mut self, entry: &ScheduleEntry) -> StoreResult<()>;

    /// Returns whether an entry with that key existed.
    fn remove_schedule_entry(&mut self, key: &str) -> StoreResult<bool>;

    fn clear_schedule_entries(&mut self) -> StoreResult<()>;
}

/// Economy counters plus the ids the overdue sweep has already charged.
pub trait EconomyStore {
    fn read_economy_state(&self) -> StoreResult<UserEconomyState>;
    fn write_economy_state(&mut self, state: &UserEconomyState) -> StoreResult<()>;
    fn read_penalized(&self) -> StoreResult<BTreeSet<u64>>;
    fn write_penalized(&mut self, ids: &BTreeSet<u64>) -> StoreResult<()>;
}

/// Everything the engine needs from its host.
pub trait Store: TaskStore + ScheduleStore + EconomyStore {}

impl<T: TaskStore + ScheduleStore + EconomyStore> Store for T {}

fn next_task_id(tasks: &[TaskInstance]) -> u64 {
    tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
}

/// Stores everything as pretty-printed JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Opens (and creates if needed) the data directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(JsonStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn tasks_path(&self) -> PathBuf {
        self.dir.join("tasks.json")
    }

    fn schedule_path(&self) -> PathBuf {
        self.dir.join("schedule.json")
    }

    fn economy_path(&self) -> PathBuf {
        self.dir.join("economy.json")
    }

    fn penalized_path(&self) -> PathBuf {
        self.dir.join("penalized.json")
    }

    /// A missing file reads as the default value.
    fn read_json<T: DeserializeOwned + Default>(path: &Path) -> StoreResult<T> {
        if !path.exists() {
            return Ok(T::default());
        }
        let mut f = OpenOptions::new().read(true).open(path)?;
        let mut s = String::new();
        f.read_to_string(&mut s)?;
        if s.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&s)?)
    }

    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> StoreResult<()> {
        let s = serde_json::to_string_pretty(value)?;
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        f.write_all(s.as_bytes())?;
        debug!(path = %path.display(), bytes = s.len(), "wrote store file");
        Ok(())
    }

    fn save_tasks(&self, tasks: &[TaskInstance]) -> StoreResult<()> {
        Self::write_json(&self.tasks_path(), tasks)
    }

    fn save_entries(&self, entries: &[ScheduleEntry]) -> StoreResult<()> {
        Self::write_json(&self.schedule_path(), entries)
    }
}

impl TaskStore for JsonStore {
    fn list_tasks(&self) -> StoreResult<Vec<TaskInstance>> {
        Self::read_json(&self.tasks_path())
    }

    fn create_task(&mut self, task: NewTask) -> StoreResult<TaskInstance> {
        let mut tasks = self.list_tasks()?;
        let created = TaskInstance::from_new(next_task_id(&tasks), task, Local::now().to_rfc3339());
        tasks.push(created.clone());
        self.save_tasks(&tasks)?;
        Ok(created)
    }

    fn update_task(&mut self, id: u64, update: &TaskUpdate) -> StoreResult<TaskInstance> {
        let mut tasks = self.list_tasks()?;
        let task = tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::TaskNotFound(id))?;
        task.apply(update);
        let updated = task.clone();
        self.save_tasks(&tasks)?;
        Ok(updated)
    }

    fn delete_task(&mut self, id: u64) -> StoreResult<()> {
        let mut tasks = self.list_tasks()?;
        let len_before = tasks.len();
        tasks.retain(|t| t.id != id);
        if tasks.len() == len_before {
            return Err(StorageError::TaskNotFound(id));
        }
        self.save_tasks(&tasks)
    }

    fn clear_tasks(&mut self) -> StoreResult<()> {
        let path = self.tasks_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl ScheduleStore for JsonStore {
    fn list_schedule_entries(&self) -> StoreResult<Vec<ScheduleEntry>> {
        Self::read_json(&self.schedule_path())
    }

    fn put_schedule_entry(&mut self, entry: &ScheduleEntry) -> StoreResult<()> {
        let mut entries = self.list_schedule_entries()?;
        if let Some(e) = entries.iter_mut().find(|e| e.key == entry.key) {
            *e = entry.clone();
        } else {
            entries.push(entry.clone());
        }
        self.save_entries(&entries)
    }

    fn remove_schedule_entry(&mut self, key: &str) -> StoreResult<bool> {
        let mut entries = self.list_schedule_entries()?;
        let len_before = entries.len();
        entries.retain(|e| e.key != key);
        if entries.len() == len_before {
            return Ok(false);
        }
        self.save_entries(&entries)?;
        Ok(true)
    }

    fn clear_schedule_entries(&mut self) -> StoreResult<()> {
        let path = self.schedule_path();
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl EconomyStore for JsonStore {
    fn read_economy_state(&self) -> StoreResult<UserEconomyState> {
        Self::read_json(&self.economy_path())
    }

    fn write_economy_state(&mut self, state: &UserEconomyState) -> StoreResult<()> {
        Self::write_json(&self.economy_path(), state)
    }

    fn read_penalized(&self) -> StoreResult<BTreeSet<u64>> {
        Self::read_json(&self.penalized_path())
    }

    fn write_penalized(&mut self, ids: &BTreeSet<u64>) -> StoreResult<()> {
        Self::write_json(&self.penalized_path(), ids)
    }
}

/// Write operations of [`MemoryStore`] that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteOp {
    CreateTask,
    UpdateTask,
    DeleteTask,
    ClearTasks,
    PutEntry,
    RemoveEntry,
    ClearEntries,
    WriteEconomy,
    WritePenalized,
}

/// In-process store, mainly for tests and embedding hosts.
///
/// Writes listed with [`MemoryStore::fail_on`] return
/// [`StorageError::Unavailable`] without changing anything.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Vec<TaskInstance>,
    entries: Vec<ScheduleEntry>,
    economy: UserEconomyState,
    penalized: BTreeSet<u64>,
    failing: HashSet<WriteOp>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_economy(economy: UserEconomyState) -> Self {
        MemoryStore { economy, ..MemoryStore::default() }
    }

    pub fn fail_on(&mut self, op: WriteOp) {
        self.failing.insert(op);
    }

    pub fn recover(&mut self) {
        self.failing.clear();
    }

    /// Inserts a fully formed task as-is, bypassing id assignment.
    pub fn insert_task(&mut self, task: TaskInstance) {
        self.tasks.retain(|t| t.id != task.id);
        self.tasks.push(task);
    }

    fn check(&self, op: WriteOp) -> StoreResult<()> {
        if self.failing.contains(&op) {
            return Err(StorageError::Unavailable(format!("{:?} rejected", op)));
        }
        Ok(())
    }
}

impl TaskStore for MemoryStore {
    fn list_tasks(&self) -> StoreResult<Vec<TaskInstance>> {
        Ok(self.tasks.clone())
    }

    fn create_task(&mut self, task: NewTask) -> StoreResult<TaskInstance> {
        self.check(WriteOp::CreateTask)?;
        let created = TaskInstance::from_new(next_task_id(&self.tasks), task, Local::now().to_rfc3339());
        self.tasks.push(created.clone());
        Ok(created)
    }

    fn update_task(&mut self, id: u64, update: &TaskUpdate) -> StoreResult<TaskInstance> {
        self.check(WriteOp::UpdateTask)?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(StorageError::TaskNotFound(id))?;
        task.apply(update);
        Ok(task.clone())
    }

    fn delete_task(&mut self, id: u64) -> StoreResult<()> {
        self.check(WriteOp::DeleteTask)?;
        let len_before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == len_before {
            return Err(StorageError::TaskNotFound(id));
        }
        Ok(())
    }

    fn clear_tasks(&mut self) -> StoreResult<()> {
        self.check(WriteOp::ClearTasks)?;
        self.tasks.clear();
        Ok(())
    }
}

impl ScheduleStore for MemoryStore {
    fn list_schedule_entries(&self) -> StoreResult<Vec<ScheduleEntry>> {
        Ok(self.entries.clone())
    }

    fn put_schedule_entry(&mut self, entry: &ScheduleEntry) -> StoreResult<()> {
        self.check(WriteOp::PutEntry)?;
        if let Some(e) = self.entries.iter_mut().find(|e| e.key == entry.key) {
            *e = entry.clone();
        } else {
            self.entries.push(entry.clone());
        }
        Ok(())
    }

    fn remove_schedule_entry(&mut self, key: &str) -> StoreResult<bool> {
        self.check(WriteOp::RemoveEntry)?;
        let len_before = self.entries.len();
        self.entries.retain(|e| e.key != key);
        Ok(self.entries.len() != len_before)
    }

    fn clear_schedule_entries(&mut self) -> StoreResult<()> {
        self.check(WriteOp::ClearEntries)?;
        self.entries.clear();
        Ok(())
    }
}

impl EconomyStore for MemoryStore {
    fn read_economy_state(&self) -> StoreResult<UserEconomyState> {
        Ok(self.economy.clone())
    }

    fn write_economy_state(&mut self, state: &UserEconomyState) -> StoreResult<()> {
        self.check(WriteOp::WriteEconomy)?;
        self.economy = state.clone();
        Ok(())
    }

    fn read_penalized(&self) -> StoreResult<BTreeSet<u64>> {
        Ok(self.penalized.clone())
    }

    fn write_penalized(&mut self, ids: &BTreeSet<u64>) -> StoreResult<()> {
        self.check(WriteOp::WritePenalized)?;
        self.penalized = ids.clone();
        Ok(())
    }
}

//! Orchestration of scheduler, rewards and funday ledger over a [`Store`].
//!
//! Every public operation reads what it needs, computes the new state with
//! the pure functions of the other modules, and writes it back. When a
//! later write of an operation fails, the earlier writes of that same
//! operation are undone before the error is returned, so the store never
//! keeps half a transition.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::error::{Error, Result, ValidationError};
use crate::funday::{self, FundayBalance};
use crate::models::{Recurrence, Reward, ScheduleEntry, TaskInstance, TaskTemplate, TaskUpdate, UserEconomyState};
use crate::rewards::{self, SweepOutcome};
use crate::scheduler::{self, Confirmation, DueAction};
use crate::storage::Store;

/// What a submission created.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    /// Instance due today, if one was created.
    pub instance: Option<TaskInstance>,
    /// Schedule entry stored for later materialization.
    pub entry: Option<ScheduleEntry>,
    pub confirmation: Confirmation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompletionOutcome {
    /// The task went from open to completed and `reward` was credited.
    Completed { task: TaskInstance, reward: Reward, economy: UserEconomyState },
    /// The task went back to open; the economy is left as it was.
    Reopened { task: TaskInstance },
    /// The task already had the requested state.
    Unchanged { task: TaskInstance },
}

/// Result of one evaluation pass.
#[derive(Debug, Clone, Default)]
pub struct EvaluationReport {
    pub materialized: Vec<TaskInstance>,
    pub sweep: SweepOutcome,
}

pub struct Engine<S, C> {
    store: S,
    clock: C,
}

impl<S: Store, C: Clock> Engine<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Engine { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn tasks(&self) -> Result<Vec<TaskInstance>> {
        Ok(self.store.list_tasks()?)
    }

    pub fn schedule_entries(&self) -> Result<Vec<ScheduleEntry>> {
        Ok(self.store.list_schedule_entries()?)
    }

    pub fn economy(&self) -> Result<UserEconomyState> {
        Ok(self.store.read_economy_state()?)
    }

    /// Creates a task now, schedules it for later, or both.
    ///
    /// Nothing is written when validation fails. A schedule entry with the
    /// same key as an existing one replaces it.
    pub fn submit(&mut self, template: TaskTemplate, recurrence: Recurrence) -> Result<SubmitOutcome> {
        let today = self.clock.today();
        let plan = scheduler::plan_submission(template, recurrence, today)?;

        let previous_entry = match &plan.entry {
            Some(entry) => self
                .store
                .list_schedule_entries()?
                .into_iter()
                .find(|e| e.key == entry.key),
            None => None,
        };

        let instance = match plan.immediate {
            Some(new_task) => Some(self.store.create_task(new_task)?),
            None => None,
        };

        if let Some(entry) = &plan.entry {
            if let Err(e) = self.store.put_schedule_entry(entry) {
                self.undo_created(instance.as_ref());
                return Err(e.into());
            }
        }

        if instance.is_some() {
            if let Err(e) = self.bump_total_tasks(1) {
                self.undo_created(instance.as_ref());
                if let Some(entry) = &plan.entry {
                    self.undo_entry(&entry.key, previous_entry.as_ref());
                }
                return Err(e);
            }
        }

        info!(
            schedule = %plan.confirmation.label(),
            created_today = instance.is_some(),
            next_date = %plan.confirmation.next_date,
            key = plan.entry.as_ref().map(|e| e.key.as_str()).unwrap_or("-"),
            "task submitted"
        );

        Ok(SubmitOutcome { instance, entry: plan.entry, confirmation: plan.confirmation })
    }

    /// Materializes every schedule entry whose date has come.
    ///
    /// Each entry is its own transition: a failure stops the pass and undoes
    /// only the entry being processed.
    pub fn materialize_due(&mut self) -> Result<Vec<TaskInstance>> {
        let today = self.clock.today();
        let entries = self.store.list_schedule_entries()?;
        let mut created = Vec::new();

        for action in scheduler::due_actions(&entries, today) {
            let original = entries.iter().find(|e| e.key == action.key()).cloned();
            if let Some(task) = self.run_due_action(action, original.as_ref())? {
                created.push(task);
            }
        }

        if !created.is_empty() {
            info!(count = created.len(), %today, "materialized scheduled tasks");
        }
        Ok(created)
    }

    fn run_due_action(&mut self, action: DueAction, original: Option<&ScheduleEntry>) -> Result<Option<TaskInstance>> {
        match action {
            DueAction::Advance { task, advanced } => {
                let instance = match task {
                    Some(t) => Some(self.store.create_task(t)?),
                    None => None,
                };
                if let Err(e) = self.store.put_schedule_entry(&advanced) {
                    self.undo_created(instance.as_ref());
                    return Err(e.into());
                }
                if instance.is_some() {
                    if let Err(e) = self.bump_total_tasks(1) {
                        self.undo_created(instance.as_ref());
                        self.undo_entry(&advanced.key, original);
                        return Err(e);
                    }
                }
                debug!(key = %advanced.key, next_date = %advanced.next_date, "advanced recurring entry");
                Ok(instance)
            }
            DueAction::Consume { task, entry } => {
                let mut instance = None;
                if let Some(t) = task {
                    let created = self.store.create_task(t)?;
                    let marked = ScheduleEntry { created: true, ..entry.clone() };
                    if let Err(e) = self.store.put_schedule_entry(&marked) {
                        self.undo_created(Some(&created));
                        return Err(e.into());
                    }
                    if let Err(e) = self.bump_total_tasks(1) {
                        self.undo_created(Some(&created));
                        self.undo_entry(&entry.key, original);
                        return Err(e);
                    }
                    instance = Some(created);
                }
                // The entry is marked created by now, so a failed removal is retried
                // by the next pass without creating the task again.
                self.store.remove_schedule_entry(&entry.key)?;
                debug!(key = %entry.key, "consumed one-time entry");
                Ok(instance)
            }
        }
    }

    /// Charges every newly overdue task once.
    ///
    /// Today is read once for the whole pass. Charged tasks get their
    /// `last_interaction_date` stamped and their ids recorded so later
    /// sweeps skip them.
    pub fn sweep_overdue(&mut self) -> Result<SweepOutcome> {
        let today = self.clock.today();
        let tasks = self.store.list_tasks()?;
        let already = self.store.read_penalized()?;
        let outcome = rewards::sweep_overdue(&tasks, today, &already);
        if outcome.is_empty() {
            return Ok(outcome);
        }

        let before = self.store.read_economy_state()?;
        let stamp = TaskUpdate { last_interaction_date: Some(Some(today)), ..TaskUpdate::default() };
        let mut stamped: Vec<(u64, TaskUpdate)> = Vec::new();
        for id in &outcome.penalized_ids {
            let Some(task) = tasks.iter().find(|t| t.id == *id) else { continue };
            if let Err(e) = self.store.update_task(*id, &stamp) {
                self.undo_updates(&stamped);
                return Err(e.into());
            }
            stamped.push((*id, stamp.inverse_for(task)));
        }

        let after = rewards::apply_penalty(&before, &outcome);
        if let Err(e) = self.store.write_economy_state(&after) {
            self.undo_updates(&stamped);
            return Err(e.into());
        }

        let mut penalized = already;
        penalized.extend(outcome.penalized_ids.iter().copied());
        if let Err(e) = self.store.write_penalized(&penalized) {
            self.undo_economy(&before);
            self.undo_updates(&stamped);
            return Err(e.into());
        }

        info!(
            tasks = outcome.penalized_ids.len(),
            minutes = outcome.total_minutes_penalty,
            %today,
            "applied overdue penalty"
        );
        Ok(outcome)
    }

    /// Materializes due entries, sweeps overdue tasks and re-derives the
    /// funday count.
    pub fn evaluate(&mut self) -> Result<EvaluationReport> {
        let materialized = self.materialize_due()?;
        let sweep = self.sweep_overdue()?;
        self.refresh_fundays()?;
        Ok(EvaluationReport { materialized, sweep })
    }

    /// Marks a task completed or open again.
    ///
    /// Only the open → completed transition touches the economy. Reopening
    /// keeps the reward already granted.
    pub fn set_completed(&mut self, id: u64, completed: bool) -> Result<CompletionOutcome> {
        let task = self.store.get_task(id)?;
        if task.is_completed == completed {
            return Ok(CompletionOutcome::Unchanged { task });
        }

        let now = self.clock.now();
        let update = TaskUpdate {
            is_completed: Some(completed),
            last_interaction_date: Some(Some(now.date())),
            ..TaskUpdate::default()
        };
        let inverse = update.inverse_for(&task);
        let updated = self.store.update_task(id, &update)?;

        if !completed {
            info!(task_id = id, "task reopened");
            return Ok(CompletionOutcome::Reopened { task: updated });
        }

        let reward = rewards::completion_reward(&task, now);
        let economy = match self.store.read_economy_state() {
            Ok(state) => rewards::apply_completion(&state, reward),
            Err(e) => {
                self.undo_updates(&[(id, inverse)]);
                return Err(e.into());
            }
        };
        if let Err(e) = self.store.write_economy_state(&economy) {
            self.undo_updates(&[(id, inverse)]);
            return Err(e.into());
        }

        info!(task_id = id, points = reward.points, minutes = reward.minutes, "task completed");
        Ok(CompletionOutcome::Completed { task: updated, reward, economy })
    }

    /// Edits the descriptive fields of an open task.
    ///
    /// Completion is changed through [`Engine::set_completed`] only; any
    /// completion fields in `update` are ignored.
    pub fn edit_task(&mut self, id: u64, mut update: TaskUpdate) -> Result<TaskInstance> {
        update.is_completed = None;
        update.last_interaction_date = None;
        if let Some(name) = &update.name {
            let trimmed = name.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::EmptyName.into());
            }
            update.name = Some(trimmed.to_string());
        }

        let task = self.store.get_task(id)?;
        if task.is_completed && !update.is_completion_only() {
            return Err(Error::CompletedTaskImmutable(id));
        }
        Ok(self.store.update_task(id, &update)?)
    }

    /// Deletes a task and forgets whether it was penalized.
    pub fn delete_task(&mut self, id: u64) -> Result<()> {
        self.store.get_task(id)?;
        let penalized = self.store.read_penalized()?;
        let pruned = penalized.contains(&id);
        if pruned {
            let mut next = penalized.clone();
            next.remove(&id);
            self.store.write_penalized(&next)?;
        }
        if let Err(e) = self.store.delete_task(id) {
            if pruned {
                self.undo_penalized(&penalized);
            }
            return Err(e.into());
        }
        info!(task_id = id, "task deleted");
        Ok(())
    }

    /// Drops a pending schedule entry. Returns whether it existed.
    pub fn remove_schedule_entry(&mut self, key: &str) -> Result<bool> {
        let removed = self.store.remove_schedule_entry(key)?;
        if removed {
            info!(%key, "schedule entry removed");
        }
        Ok(removed)
    }

    /// Deletes every task and schedule entry.
    pub fn clear_all(&mut self) -> Result<()> {
        let penalized = self.store.read_penalized()?;
        let entries = self.store.list_schedule_entries()?;

        self.store.write_penalized(&BTreeSet::new())?;
        if let Err(e) = self.store.clear_schedule_entries() {
            self.undo_penalized(&penalized);
            return Err(e.into());
        }
        if let Err(e) = self.store.clear_tasks() {
            for entry in &entries {
                if let Err(err) = self.store.put_schedule_entry(entry) {
                    warn!(key = %entry.key, error = %err, "could not restore schedule entry");
                }
            }
            self.undo_penalized(&penalized);
            return Err(e.into());
        }
        info!(entries = entries.len(), "cleared all tasks and schedule entries");
        Ok(())
    }

    /// Spends one funday. `Ok(None)` when none is available.
    pub fn spend_funday(&mut self) -> Result<Option<FundayBalance>> {
        let mut state = self.store.read_economy_state()?;
        let Some(balance) = funday::spend(&mut state) else {
            debug!("no funday to spend");
            return Ok(None);
        };
        self.store.write_economy_state(&state)?;
        info!(funday_count = balance.funday_count, fundays_spent = balance.fundays_spent, "funday spent");
        Ok(Some(balance))
    }

    /// Re-derives the funday count, writing only when it changed.
    pub fn refresh_fundays(&mut self) -> Result<UserEconomyState> {
        let mut state = self.store.read_economy_state()?;
        let stored = state.funday_count;
        funday::refresh(&mut state);
        if state.funday_count != stored {
            self.store.write_economy_state(&state)?;
            if state.funday_count > stored {
                info!(earned = state.funday_count - stored, available = state.funday_count, "earned fundays");
            }
        }
        Ok(state)
    }

    /// Puts every economy counter back to its initial value.
    pub fn reset_stats(&mut self) -> Result<UserEconomyState> {
        let state = UserEconomyState::default();
        self.store.write_economy_state(&state)?;
        info!("economy state reset");
        Ok(state)
    }

    /// Zeroes the reward minutes balance.
    pub fn reset_reward_minutes(&mut self) -> Result<UserEconomyState> {
        let mut state = self.store.read_economy_state()?;
        state.reward_minutes = 0;
        self.store.write_economy_state(&state)?;
        Ok(state)
    }

    fn bump_total_tasks(&mut self, by: u64) -> Result<()> {
        let mut state = self.store.read_economy_state()?;
        state.total_tasks += by;
        self.store.write_economy_state(&state)?;
        Ok(())
    }

    fn undo_created(&mut self, task: Option<&TaskInstance>) {
        if let Some(task) = task {
            if let Err(e) = self.store.delete_task(task.id) {
                warn!(task_id = task.id, error = %e, "could not roll back created task");
            }
        }
    }

    fn undo_entry(&mut self, key: &str, previous: Option<&ScheduleEntry>) {
        let result = match previous {
            Some(entry) => self.store.put_schedule_entry(entry),
            None => self.store.remove_schedule_entry(key).map(|_| ()),
        };
        if let Err(e) = result {
            warn!(%key, error = %e, "could not roll back schedule entry");
        }
    }

    fn undo_updates(&mut self, updates: &[(u64, TaskUpdate)]) {
        for (id, update) in updates {
            if let Err(e) = self.store.update_task(*id, update) {
                warn!(task_id = id, error = %e, "could not roll back task update");
            }
        }
    }

    fn undo_economy(&mut self, state: &UserEconomyState) {
        if let Err(e) = self.store.write_economy_state(state) {
            warn!(error = %e, "could not roll back economy state");
        }
    }

    fn undo_penalized(&mut self, ids: &BTreeSet<u64>) {
        if let Err(e) = self.store.write_penalized(ids) {
            warn!(error = %e, "could not roll back penalized ids");
        }
    }
}

//! Progression engine. Owns the catalog, ledger and player record and runs
//! the lock/unlock state machine.
//!
//! Every location is either locked or unlocked, and only moves forward:
//! a location unlocks when the [`UnlockRules`] entry of another location
//! fires after that location's task completes. The engine never writes to
//! the screen; it queues [`EngineEvent`]s that the adapter drains each frame.

use chrono::Utc;

use super::catalog::{Catalog, Location};
use super::config::{GameConfig, UnlockRules};
use super::error::ParseError;
use super::inventory::InventoryLedger;
use super::save::{PlayerInfo, PlayerStore, SaveSnapshot, Storage};
use super::tasks::{PendingTask, Refusal, Stage, TaskRegistry};

pub const MSG_LOCKED: &str = "这个地点暂时无法访问！";
pub const MSG_NO_HANDLER: &str = "该位置暂时无法互动！";
pub const MSG_UNKNOWN_LOCATION: &str = "找不到这个地点！";
pub const MSG_BUSY: &str = "请先完成当前的任务！";
pub const MSG_WRONG_ANSWER: &str = "答案不正确，请重试！";
pub const MSG_TASK_FAILED: &str = "任务失败，请重试！";

/// Something the adapter should react to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineEvent {
    Message { text: String, important: bool },
    InventoryChanged,
    Rerender,
}

/// Why an activation did not start a task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    Busy,
    UnknownLocation,
    Locked,
    NoHandler,
    MissingItem(&'static str),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(String),
    Failed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerResult {
    /// No puzzle is waiting for an answer.
    NotWaiting,
    Incorrect,
    Resolved(TaskOutcome),
}

/// A location card as the adapter displays it.
#[derive(Clone, Debug)]
pub struct LocationView<'a> {
    pub location: &'a Location,
    pub badge: Option<&'static str>,
    pub completed: bool,
}

/// The open task dialog.
#[derive(Clone, Debug, PartialEq)]
pub enum DialogView<'a> {
    Puzzle {
        location: &'a str,
        title: &'static str,
        prompt: &'static str,
        attempts: u32,
    },
    Progress {
        location: &'a str,
        text: &'static str,
        fraction: f64,
    },
}

pub struct ProgressionEngine<S: Storage> {
    catalog: Catalog,
    ledger: InventoryLedger,
    player: PlayerInfo,
    completed: Vec<String>,
    registry: TaskRegistry,
    rules: UnlockRules,
    store: PlayerStore<S>,
    pending: Option<PendingTask>,
    rng_seed: u64,
    events: Vec<EngineEvent>,
}

impl<S: Storage> ProgressionEngine<S> {
    /// Parse the catalog and restore (or create) the player record.
    pub fn new(
        raw: &str,
        config: &GameConfig,
        registry: TaskRegistry,
        storage: S,
        rng_seed: u64,
    ) -> Result<Self, ParseError> {
        let catalog = Catalog::parse(raw)?;

        for (location, action) in catalog.unknown_actions(&registry) {
            tracing::error!(location, action, "未找到动作处理方法");
        }
        if catalog.unlocked_names().is_empty() {
            tracing::warn!("no location is accessible at load time");
        }

        let mut engine = Self {
            catalog,
            ledger: InventoryLedger::new(),
            player: PlayerInfo {
                id: String::new(),
                nickname: config.default_nickname.clone(),
                history: Vec::new(),
            },
            completed: Vec::new(),
            registry,
            rules: config.unlock_rules.clone(),
            store: PlayerStore::new(storage, config.storage_key.clone()),
            pending: None,
            rng_seed,
            events: Vec::new(),
        };

        match engine.store.load() {
            Some(saved) => {
                engine.ledger.restore(&saved.inventory);
                for name in &saved.unlocked {
                    engine.catalog.unlock(name);
                }
                engine.completed = saved.completed;
                engine.player = saved.player;
                tracing::info!(
                    player = %engine.player.id,
                    items = engine.ledger.len(),
                    "restored saved player"
                );
            }
            None => {
                engine.player = PlayerInfo::fresh(&config.default_nickname, &mut engine.rng_seed);
                tracing::info!(player = %engine.player.id, "created new player");
                engine.persist();
            }
        }

        Ok(engine)
    }

    // ── Snapshot for the adapter ─────────────────────────────

    pub fn locations(&self) -> Vec<LocationView<'_>> {
        self.catalog
            .locations()
            .iter()
            .map(|location| LocationView {
                location,
                badge: self.registry.badge(location.action.as_deref(), &self.ledger),
                completed: self.completed.contains(&location.name),
            })
            .collect()
    }

    pub fn location_count(&self) -> usize {
        self.catalog.len()
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn player(&self) -> &PlayerInfo {
        &self.player
    }

    #[cfg(test)]
    pub fn is_unlocked(&self, name: &str) -> bool {
        self.catalog.find(name).is_some_and(|l| l.is_accessible)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self, now_ms: f64) -> Option<DialogView<'_>> {
        let task = self.pending.as_ref()?;
        Some(match &task.stage {
            Stage::Puzzle {
                title,
                prompt,
                attempts,
                ..
            } => DialogView::Puzzle {
                location: &task.location,
                title: *title,
                prompt: *prompt,
                attempts: *attempts,
            },
            Stage::Progress { text, timer } => DialogView::Progress {
                location: &task.location,
                text: *text,
                fraction: timer.fraction(now_ms),
            },
        })
    }

    pub fn take_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Entry points ─────────────────────────────────────────

    /// Activate the location at a display index.
    pub fn activate_index(&mut self, index: usize, now_ms: f64) -> Result<(), Rejection> {
        match self.catalog.get(index) {
            Some(location) => {
                let name = location.name.clone();
                self.activate(&name, now_ms)
            }
            None => self.reject(Rejection::UnknownLocation, MSG_UNKNOWN_LOCATION),
        }
    }

    /// A click on a location card. Starts its task if every gate passes.
    pub fn activate(&mut self, name: &str, now_ms: f64) -> Result<(), Rejection> {
        if self.has_pending() {
            return self.reject(Rejection::Busy, MSG_BUSY);
        }
        let Some(location) = self.catalog.find(name) else {
            return self.reject(Rejection::UnknownLocation, MSG_UNKNOWN_LOCATION);
        };
        if !location.is_accessible {
            return self.reject(Rejection::Locked, MSG_LOCKED);
        }

        match self
            .registry
            .begin(&location.name, location.action.as_deref(), &self.ledger, now_ms)
        {
            Ok(task) => {
                tracing::debug!(location = name, action = %task.action, "task started");
                self.pending = Some(task);
                self.events.push(EngineEvent::Rerender);
                Ok(())
            }
            Err(Refusal::NoHandler(e)) => {
                tracing::error!(location = name, "{e}");
                self.reject(Rejection::NoHandler, MSG_NO_HANDLER)
            }
            Err(Refusal::MissingItem { item, message }) => {
                self.reject(Rejection::MissingItem(item), message)
            }
        }
    }

    /// Submit an answer to the open puzzle.
    pub fn submit_answer(&mut self, answer: &str) -> AnswerResult {
        let Some(task) = self.pending.as_mut() else {
            return AnswerResult::NotWaiting;
        };
        match task.answer(answer) {
            None => AnswerResult::NotWaiting,
            Some(false) => {
                self.message(MSG_WRONG_ANSWER, false);
                AnswerResult::Incorrect
            }
            Some(true) => match self.pending.take() {
                Some(task) => AnswerResult::Resolved(self.complete(task)),
                None => AnswerResult::NotWaiting,
            },
        }
    }

    /// Advance the clock. Completes a timed task once its deadline passes.
    pub fn tick(&mut self, now_ms: f64) -> Option<TaskOutcome> {
        if !self.pending.as_ref()?.is_ready(now_ms) {
            return None;
        }
        let task = self.pending.take()?;
        Some(self.complete(task))
    }

    // ── Internals ────────────────────────────────────────────

    fn complete(&mut self, task: PendingTask) -> TaskOutcome {
        let completion = match self.registry.finish(&task.action, &mut self.rng_seed) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(location = %task.location, "任务执行失败: {e}");
                self.message(MSG_TASK_FAILED, false);
                self.events.push(EngineEvent::Rerender);
                return TaskOutcome::Failed;
            }
        };

        self.grant(&completion.item);
        self.message(&completion.message, true);

        if !self.completed.contains(&task.location) {
            self.completed.push(task.location.clone());
            self.player.push_history(
                format!("在{}完成了任务：{}", task.location, completion.label),
                Utc::now(),
            );
        }

        for target in self.rules.targets(&task.location) {
            if self.catalog.find(target).is_none() {
                tracing::warn!(from = %task.location, to = %target, "unlock target not in catalog");
            } else if self.catalog.unlock(target) {
                tracing::info!(location = %target, "unlocked");
            }
        }

        tracing::info!(location = %task.location, label = %completion.label, "task completed");
        self.persist();
        self.events.push(EngineEvent::Rerender);
        TaskOutcome::Completed(completion.label)
    }

    fn grant(&mut self, item: &str) {
        self.ledger.add(item);
        self.persist();
        self.events.push(EngineEvent::InventoryChanged);
    }

    fn persist(&mut self) {
        let snapshot = SaveSnapshot {
            player: &self.player,
            inventory: self.ledger.snapshot(),
            unlocked: self.catalog.unlocked_names(),
            completed: self.completed.clone(),
        };
        if let Err(e) = self.store.save(snapshot) {
            tracing::warn!("Relic Trail: セーブに失敗: {e}");
        }
    }

    fn message(&mut self, text: &str, important: bool) {
        self.events.push(EngineEvent::Message {
            text: text.to_string(),
            important,
        });
    }

    fn reject(&mut self, rejection: Rejection, text: &str) -> Result<(), Rejection> {
        self.message(text, false);
        Err(rejection)
    }
}

//! Task resolver: the registry of location actions and the in-flight task
//! state the engine holds while a dialog is open.
//!
//! A task runs in three steps:
//!
//! 1. [`TaskRegistry::begin`] checks the precondition and yields a
//!    [`PendingTask`] (nothing is shown when the check fails).
//! 2. The adapter drives the pending task: answers go to
//!    [`PendingTask::answer`], frame timestamps to [`PendingTask::is_ready`].
//! 3. [`TaskRegistry::finish`] draws the reward and builds the completion
//!    label without touching the ledger. The engine commits it.

use std::collections::HashMap;

use crate::time::ProgressTimer;

use super::error::TaskError;
use super::inventory::InventoryLedger;
use super::rng::rng_range;

/// Placeholder replaced by the rewarded item in labels and messages.
const ITEM_PLACEHOLDER: &str = "{item}";

pub const TREASURES: &[&str] = &["金币", "宝石", "古老卷轴", "神秘法器"];

#[derive(Clone, Copy, Debug)]
pub struct Requirement {
    pub item: &'static str,
    /// Shown when the item is missing.
    pub refusal: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub enum TaskFlow {
    /// Free-text question validated by a pure predicate.
    Puzzle {
        title: &'static str,
        prompt: &'static str,
        check: fn(&str) -> bool,
    },
    /// Fixed-duration progress bar with no failure path.
    Progress {
        text: &'static str,
        duration_ms: f64,
    },
}

#[derive(Clone, Copy, Debug)]
pub enum Reward {
    Item(&'static str),
    /// One item drawn uniformly from the set.
    OneOf(&'static [&'static str]),
}

#[derive(Clone, Copy, Debug)]
pub struct TaskSpec {
    pub requires: Option<Requirement>,
    pub flow: TaskFlow,
    pub reward: Reward,
    /// May contain `{item}`.
    pub success_message: &'static str,
    /// Completion label logged to history. May contain `{item}`.
    pub label: &'static str,
    /// Card badge once the fixed reward is owned.
    pub badge: Option<&'static str>,
}

/// Why a task could not start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Refusal {
    NoHandler(TaskError),
    MissingItem {
        item: &'static str,
        message: &'static str,
    },
}

#[derive(Clone, Debug)]
pub enum Stage {
    Puzzle {
        title: &'static str,
        prompt: &'static str,
        check: fn(&str) -> bool,
        attempts: u32,
    },
    Progress {
        text: &'static str,
        timer: ProgressTimer,
    },
}

/// A task waiting on the player (an answer) or the clock (a deadline).
#[derive(Clone, Debug)]
pub struct PendingTask {
    pub location: String,
    pub action: String,
    pub stage: Stage,
}

impl PendingTask {
    /// Validate an answer. `None` when this task is not a puzzle.
    pub fn answer(&mut self, answer: &str) -> Option<bool> {
        match &mut self.stage {
            Stage::Puzzle {
                check, attempts, ..
            } => {
                *attempts += 1;
                Some(check(answer))
            }
            Stage::Progress { .. } => None,
        }
    }

    /// True once a progress task has reached its deadline.
    pub fn is_ready(&self, now_ms: f64) -> bool {
        match &self.stage {
            Stage::Progress { timer, .. } => timer.is_done(now_ms),
            Stage::Puzzle { .. } => false,
        }
    }
}

/// Result of a finished task, not yet applied to any state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Completion {
    pub label: String,
    pub item: String,
    pub message: String,
}

#[derive(Clone, Debug, Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, TaskSpec>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The four tasks of the bundled adventure.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(
            "findBook",
            TaskSpec {
                requires: None,
                flow: TaskFlow::Puzzle {
                    title: "书架密码",
                    prompt: "找到一个写着数字的纸条：1-3-5，这可能是打开书架的密码...",
                    check: check_bookshelf_code,
                },
                reward: Reward::Item("古籍"),
                success_message: "你找到了一本神秘的古籍！书中记载着关于神庙的秘密...",
                label: "找到古籍",
                badge: Some("已找到古籍"),
            },
        );
        registry.register(
            "solvePuzzle",
            TaskSpec {
                requires: Some(Requirement {
                    item: "古籍",
                    refusal: "需要先在图书馆找到古籍！",
                }),
                flow: TaskFlow::Puzzle {
                    title: "符文谜题",
                    prompt: "古籍上记载：东南西北，依次点亮符文。提示：用英文字母 E、N、S、W 表示方向...",
                    check: check_rune_order,
                },
                reward: Reward::Item("符文钥匙"),
                success_message: "符文发出耀眼的光芒，你获得了符文钥匙！",
                label: "解开符文谜题",
                badge: Some("已解开符文"),
            },
        );
        registry.register(
            "negotiateGuard",
            TaskSpec {
                requires: Some(Requirement {
                    item: "符文钥匙",
                    refusal: "守卫拦住了你：没有符文钥匙，不能通过！",
                }),
                flow: TaskFlow::Progress {
                    text: "正在与守卫交涉...",
                    duration_ms: 3000.0,
                },
                reward: Reward::Item("通行证"),
                success_message: "守卫看到符文钥匙，恭敬地为你让开了道路。",
                label: "获得守卫的信任",
                badge: Some("已获得通行证"),
            },
        );
        registry.register(
            "searchTreasure",
            TaskSpec {
                requires: Some(Requirement {
                    item: "通行证",
                    refusal: "没有通行证，无法进入密室！",
                }),
                flow: TaskFlow::Progress {
                    text: "正在搜索宝藏...",
                    duration_ms: 5000.0,
                },
                reward: Reward::OneOf(TREASURES),
                success_message: "恭喜！你找到了传说中的宝藏：{item}！",
                label: "找到宝藏：{item}",
                badge: None,
            },
        );
        registry
    }

    pub fn register(&mut self, action: impl Into<String>, spec: TaskSpec) {
        self.tasks.insert(action.into(), spec);
    }

    pub fn contains(&self, action: &str) -> bool {
        self.tasks.contains_key(action)
    }

    pub fn get(&self, action: &str) -> Option<&TaskSpec> {
        self.tasks.get(action)
    }

    /// Check the precondition and open the task. Nothing changes on refusal.
    pub fn begin(
        &self,
        location: &str,
        action: Option<&str>,
        ledger: &InventoryLedger,
        now_ms: f64,
    ) -> Result<PendingTask, Refusal> {
        let action = action.unwrap_or_default();
        let spec = self
            .get(action)
            .ok_or_else(|| Refusal::NoHandler(TaskError::NoHandler(action.to_string())))?;

        if let Some(req) = spec.requires {
            if !ledger.has(req.item) {
                return Err(Refusal::MissingItem {
                    item: req.item,
                    message: req.refusal,
                });
            }
        }

        let stage = match spec.flow {
            TaskFlow::Puzzle {
                title,
                prompt,
                check,
            } => Stage::Puzzle {
                title,
                prompt,
                check,
                attempts: 0,
            },
            TaskFlow::Progress { text, duration_ms } => Stage::Progress {
                text,
                timer: ProgressTimer::start(now_ms, duration_ms),
            },
        };

        Ok(PendingTask {
            location: location.to_string(),
            action: action.to_string(),
            stage,
        })
    }

    /// Draw the reward and build the label for a finished task.
    pub fn finish(&self, action: &str, rng_seed: &mut u64) -> Result<Completion, TaskError> {
        let spec = self
            .get(action)
            .ok_or_else(|| TaskError::NoHandler(action.to_string()))?;

        let item = match spec.reward {
            Reward::Item(item) => item,
            Reward::OneOf(pool) => {
                if pool.is_empty() {
                    return Err(TaskError::EmptyRewardPool(action.to_string()));
                }
                pool[rng_range(rng_seed, pool.len() as u32) as usize]
            }
        };

        Ok(Completion {
            label: spec.label.replace(ITEM_PLACEHOLDER, item),
            item: item.to_string(),
            message: spec.success_message.replace(ITEM_PLACEHOLDER, item),
        })
    }

    /// Badge for a card whose action's fixed reward is already owned.
    pub fn badge(&self, action: Option<&str>, ledger: &InventoryLedger) -> Option<&'static str> {
        let spec = self.get(action?)?;
        match spec.reward {
            Reward::Item(item) if ledger.has(item) => spec.badge,
            _ => None,
        }
    }
}

fn check_bookshelf_code(answer: &str) -> bool {
    answer == "135"
}

fn check_rune_order(answer: &str) -> bool {
    answer.to_lowercase() == "ensw"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger_with(items: &[&str]) -> InventoryLedger {
        let mut ledger = InventoryLedger::new();
        for item in items {
            ledger.add(item);
        }
        ledger
    }

    #[test]
    fn builtin_has_four_tasks() {
        let registry = TaskRegistry::builtin();
        for action in ["findBook", "solvePuzzle", "negotiateGuard", "searchTreasure"] {
            assert!(registry.contains(action), "{action}");
        }
        assert!(!registry.contains("flyAway"));
    }

    #[test]
    fn bookshelf_code_is_exact() {
        assert!(check_bookshelf_code("135"));
        assert!(!check_bookshelf_code(" 135"));
        assert!(!check_bookshelf_code("1-3-5"));
    }

    #[test]
    fn rune_order_ignores_case() {
        assert!(check_rune_order("ensw"));
        assert!(check_rune_order("ENSW"));
        assert!(check_rune_order("EnSw"));
        assert!(!check_rune_order("nsew"));
    }

    #[test]
    fn missing_action_has_no_handler() {
        let registry = TaskRegistry::builtin();
        let ledger = InventoryLedger::new();
        let refusal = registry.begin("x", None, &ledger, 0.0).unwrap_err();
        assert_eq!(refusal, Refusal::NoHandler(TaskError::NoHandler(String::new())));
        let refusal = registry.begin("x", Some("flyAway"), &ledger, 0.0).unwrap_err();
        assert_eq!(refusal, Refusal::NoHandler(TaskError::NoHandler("flyAway".into())));
    }

    #[test]
    fn precondition_checked_before_opening() {
        let registry = TaskRegistry::builtin();
        let refusal = registry
            .begin("守卫营地", Some("negotiateGuard"), &InventoryLedger::new(), 0.0)
            .unwrap_err();
        assert_eq!(
            refusal,
            Refusal::MissingItem {
                item: "符文钥匙",
                message: "守卫拦住了你：没有符文钥匙，不能通过！",
            }
        );
    }

    #[test]
    fn puzzle_counts_attempts() {
        let registry = TaskRegistry::builtin();
        let mut task = registry
            .begin("图书馆", Some("findBook"), &InventoryLedger::new(), 0.0)
            .unwrap();
        assert_eq!(task.answer("000"), Some(false));
        assert_eq!(task.answer("135"), Some(true));
        match task.stage {
            Stage::Puzzle { attempts, .. } => assert_eq!(attempts, 2),
            Stage::Progress { .. } => panic!("expected puzzle"),
        }
        assert!(!task.is_ready(1e12));
    }

    #[test]
    fn progress_ready_at_deadline() {
        let registry = TaskRegistry::builtin();
        let mut task = registry
            .begin("守卫营地", Some("negotiateGuard"), &ledger_with(&["符文钥匙"]), 100.0)
            .unwrap();
        assert_eq!(task.answer("anything"), None);
        assert!(!task.is_ready(3099.0));
        assert!(task.is_ready(3100.0));
    }

    #[test]
    fn fixed_reward_completion() {
        let registry = TaskRegistry::builtin();
        let mut seed = 1;
        let completion = registry.finish("findBook", &mut seed).unwrap();
        assert_eq!(completion.label, "找到古籍");
        assert_eq!(completion.item, "古籍");
    }

    #[test]
    fn treasure_label_names_item() {
        let registry = TaskRegistry::builtin();
        for start in 0..32u64 {
            let mut seed = start;
            let completion = registry.finish("searchTreasure", &mut seed).unwrap();
            assert!(TREASURES.contains(&completion.item.as_str()));
            assert_eq!(completion.label, format!("找到宝藏：{}", completion.item));
            assert!(completion.message.contains(&completion.item));
        }
    }

    #[test]
    fn empty_pool_is_a_task_failure() {
        let mut registry = TaskRegistry::new();
        registry.register(
            "nothing",
            TaskSpec {
                requires: None,
                flow: TaskFlow::Progress {
                    text: "...",
                    duration_ms: 0.0,
                },
                reward: Reward::OneOf(&[]),
                success_message: "",
                label: "",
                badge: None,
            },
        );
        let mut seed = 0;
        assert_eq!(
            registry.finish("nothing", &mut seed),
            Err(TaskError::EmptyRewardPool("nothing".into()))
        );
    }

    #[test]
    fn badge_requires_owned_reward() {
        let registry = TaskRegistry::builtin();
        assert_eq!(registry.badge(Some("findBook"), &InventoryLedger::new()), None);
        assert_eq!(
            registry.badge(Some("findBook"), &ledger_with(&["古籍"])),
            Some("已找到古籍")
        );
        assert_eq!(registry.badge(Some("searchTreasure"), &ledger_with(&["金币"])), None);
        assert_eq!(registry.badge(None, &ledger_with(&["古籍"])), None);
    }
}

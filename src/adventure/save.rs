//! Relic Trail セーブ/ロード機能。
//!
//! ## バージョニング方針
//!
//! - `SAVE_VERSION`: 現在のセーブ形式バージョン。フィールド追加時にインクリメントする。
//! - `MIN_COMPATIBLE_VERSION`: 互換性を維持できる最小バージョン。
//!   新フィールドの追加のみの場合はこの値を変えない（旧データを維持できる）。
//!   既存フィールドの意味変更や削除など破壊的変更を行った場合のみインクリメントする。
//!
//! ## v2 変更点
//! - `unlocked` / `completed` を追加（リロード後もアンロック状態を復元する）
//! - 追加のみなので MIN_COMPATIBLE_VERSION=1 のまま

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StoreError;
use super::rng::rng_range;

const SAVE_VERSION: u32 = 2;

const MIN_COMPATIBLE_VERSION: u32 = 1;

const ID_PREFIX: &str = "player_";
const ID_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

// ── Storage backends ─────────────────────────────────────────

/// String-keyed record storage. Writes are full overwrites.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str);
}

/// In-memory storage for native runs and tests. Clones share the same map,
/// so a test can keep a handle and "reload" from it.
#[derive(Clone, Debug, Default)]
pub struct MemoryStorage {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Browser `localStorage`.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalStorage;

#[cfg(target_arch = "wasm32")]
fn get_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok()?
}

#[cfg(target_arch = "wasm32")]
impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        get_storage()?.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let storage = get_storage().ok_or(StoreError::Unavailable)?;
        storage
            .set_item(key, value)
            .map_err(|e| StoreError::Write(format!("{e:?}")))
    }

    fn remove(&mut self, key: &str) {
        if let Some(storage) = get_storage() {
            let _ = storage.remove_item(key);
        }
    }
}

// ── Player record ────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub action: String,
    /// Serialized as an ISO-8601 UTC string.
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

impl PlayerInfo {
    /// A first-run record with a freshly generated id.
    pub fn fresh(nickname: &str, rng_seed: &mut u64) -> Self {
        Self {
            id: generate_player_id(rng_seed),
            nickname: nickname.to_string(),
            history: Vec::new(),
        }
    }

    pub fn push_history(&mut self, action: String, timestamp: DateTime<Utc>) {
        self.history.push(HistoryEntry { action, timestamp });
    }
}

/// `player_` followed by 9 base-36 characters.
pub fn generate_player_id(rng_seed: &mut u64) -> String {
    let mut id = String::with_capacity(ID_PREFIX.len() + ID_LEN);
    id.push_str(ID_PREFIX);
    for _ in 0..ID_LEN {
        let idx = rng_range(rng_seed, BASE36.len() as u32) as usize;
        id.push(BASE36[idx] as char);
    }
    id
}

#[derive(Serialize, Deserialize)]
struct SaveData {
    version: u32,
    player: PlayerInfo,
    #[serde(default)]
    inventory: Vec<String>,
    // v2+
    #[serde(default)]
    unlocked: Vec<String>,
    #[serde(default)]
    completed: Vec<String>,
}

/// Everything restored from a saved record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedGame {
    pub player: PlayerInfo,
    pub inventory: Vec<String>,
    pub unlocked: Vec<String>,
    pub completed: Vec<String>,
}

/// Borrowed view of the live state, serialized on every save.
pub struct SaveSnapshot<'a> {
    pub player: &'a PlayerInfo,
    pub inventory: Vec<String>,
    pub unlocked: Vec<String>,
    pub completed: Vec<String>,
}

/// Loads and saves the player record under a single key.
#[derive(Clone, Debug)]
pub struct PlayerStore<S: Storage> {
    storage: S,
    key: String,
}

impl<S: Storage> PlayerStore<S> {
    pub fn new(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    /// Load the saved record. Absent, unparseable or too-old records yield
    /// `None`; the latter two are discarded from storage.
    pub fn load(&mut self) -> Option<SavedGame> {
        let json = self.storage.get(&self.key)?;

        let save_data: SaveData = match serde_json::from_str(&json) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!("Relic Trail: セーブデータのパースに失敗（破棄します）: {e}");
                self.storage.remove(&self.key);
                return None;
            }
        };

        if save_data.version < MIN_COMPATIBLE_VERSION {
            tracing::info!(
                "Relic Trail: セーブバージョンが古すぎます (saved={}, min_compatible={})。新規ゲームを開始します。",
                save_data.version,
                MIN_COMPATIBLE_VERSION
            );
            self.storage.remove(&self.key);
            return None;
        }

        if save_data.version < SAVE_VERSION {
            tracing::info!(
                "Relic Trail: 旧バージョンのセーブデータをマイグレーション (saved={}, current={})。",
                save_data.version,
                SAVE_VERSION
            );
        }

        Some(SavedGame {
            player: save_data.player,
            inventory: save_data.inventory,
            unlocked: save_data.unlocked,
            completed: save_data.completed,
        })
    }

    /// Serialize and overwrite the stored record.
    pub fn save(&mut self, snapshot: SaveSnapshot<'_>) -> Result<(), StoreError> {
        let save_data = SaveData {
            version: SAVE_VERSION,
            player: snapshot.player.clone(),
            inventory: snapshot.inventory,
            unlocked: snapshot.unlocked,
            completed: snapshot.completed,
        };
        let json = serde_json::to_string(&save_data)?;
        self.storage.set(&self.key, &json)
    }
}

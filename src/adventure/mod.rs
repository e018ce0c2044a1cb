//! Relic Trail, a point-and-click adventure across unlockable locations.
//!
//! Input dispatch and the message log live here; game rules live in
//! [`engine`]. Location cards are picked with [1]-[9] or a click, puzzle
//! answers are typed and submitted with Enter, [M] toggles the music.

pub mod actions;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod render;
pub mod rng;
pub mod save;
pub mod tasks;

use std::cell::RefCell;
use std::rc::Rc;

use ratzilla::ratatui::layout::Rect;
use ratzilla::ratatui::Frame;

use crate::audio::{BackgroundMusic, PLAY_BLOCKED};
use crate::input::{ClickState, InputEvent};

use actions::*;
use config::GameConfig;
use engine::{AnswerResult, DialogView, EngineEvent, ProgressionEngine};
use error::InitError;
use save::Storage;
use tasks::TaskRegistry;

const MAX_LOG: usize = 50;
const MAX_ANSWER_CHARS: usize = 24;
const MUSIC_HINT: &str = "按 M 键开始背景音乐";

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub text: String,
    pub is_important: bool,
}

/// Banner text shown over the help bar until `until_ms`.
#[derive(Clone, Debug)]
pub struct Notice {
    pub text: String,
    pub until_ms: f64,
}

pub struct AdventureGame<S: Storage> {
    engine: ProgressionEngine<S>,
    music: BackgroundMusic,
    /// Text typed into the open puzzle dialog.
    answer: String,
    log: Vec<LogEntry>,
    notice: Option<Notice>,
    /// Inventory panel is highlighted until this time.
    inventory_flash_until: f64,
    notice_ms: f64,
    now_ms: f64,
}

impl<S: Storage> AdventureGame<S> {
    pub fn new(
        raw: &str,
        config: &GameConfig,
        storage: S,
        rng_seed: u64,
        now_ms: f64,
    ) -> Result<Self, InitError> {
        let engine =
            ProgressionEngine::new(raw, config, TaskRegistry::builtin(), storage, rng_seed)?;
        let music = BackgroundMusic::new(&config.music_src, config.music_volume);

        let mut game = Self {
            engine,
            music,
            answer: String::new(),
            log: Vec::new(),
            notice: None,
            inventory_flash_until: 0.0,
            notice_ms: config.notice_ms,
            now_ms,
        };
        let greeting = format!("欢迎，{}！点击一个地点开始探险。", game.engine.player().nickname);
        game.add_log(&greeting, false);
        if game.music.is_available() {
            game.show(MUSIC_HINT, false);
        }
        game.drain_events();
        Ok(game)
    }

    pub fn engine(&self) -> &ProgressionEngine<S> {
        &self.engine
    }

    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        self.now_ms = now_ms;
        let consumed = if self.puzzle_open() {
            self.handle_puzzle_input(event)
        } else {
            self.handle_explore_input(event)
        };
        self.drain_events();
        consumed
    }

    pub fn tick(&mut self, now_ms: f64) {
        self.now_ms = now_ms;
        self.engine.tick(now_ms);
        self.drain_events();
        if self.music.take_rejection() {
            self.show(PLAY_BLOCKED, false);
        }
        if self.notice.as_ref().is_some_and(|n| n.until_ms <= now_ms) {
            self.notice = None;
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, click_state: &Rc<RefCell<ClickState>>) {
        render::render(self, f, area, click_state);
    }

    // ── Input Handling ──────────────────────────────────────

    fn puzzle_open(&self) -> bool {
        matches!(self.engine.pending(self.now_ms), Some(DialogView::Puzzle { .. }))
    }

    fn handle_puzzle_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(ch) => {
                if self.answer.chars().count() < MAX_ANSWER_CHARS {
                    self.answer.push(*ch);
                }
                true
            }
            InputEvent::Backspace | InputEvent::Click(ERASE_ANSWER) => {
                self.answer.pop();
                true
            }
            InputEvent::Enter | InputEvent::Click(SUBMIT_ANSWER) => {
                let answer = std::mem::take(&mut self.answer);
                !matches!(self.engine.submit_answer(&answer), AnswerResult::NotWaiting)
            }
            InputEvent::Click(TOGGLE_MUSIC) => {
                self.toggle_music();
                true
            }
            // Cards under the dialog are not reachable.
            InputEvent::Click(_) => false,
        }
    }

    fn handle_explore_input(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Key(ch @ '1'..='9') => {
                let index = (*ch as u8 - b'1') as usize;
                // Rejections reach the player as engine messages.
                let _ = self.engine.activate_index(index, self.now_ms);
                true
            }
            InputEvent::Key('m' | 'M') | InputEvent::Click(TOGGLE_MUSIC) => {
                self.toggle_music();
                true
            }
            InputEvent::Click(id) if (LOCATION_BASE..LOCATION_BASE + MAX_LOCATIONS).contains(id) => {
                let index = (id - LOCATION_BASE) as usize;
                // Rejections reach the player as engine messages.
                let _ = self.engine.activate_index(index, self.now_ms);
                true
            }
            _ => false,
        }
    }

    fn toggle_music(&mut self) {
        let state = self.music.toggle();
        self.show(state.message(), false);
    }

    // ── Engine events ───────────────────────────────────────

    fn drain_events(&mut self) {
        for event in self.engine.take_events() {
            match event {
                EngineEvent::Message { text, important } => self.show(&text, important),
                EngineEvent::InventoryChanged => {
                    self.inventory_flash_until = self.now_ms + self.notice_ms;
                }
                // Cards are rebuilt from the engine on every frame.
                EngineEvent::Rerender => {}
            }
        }
    }

    fn show(&mut self, text: &str, is_important: bool) {
        self.add_log(text, is_important);
        self.notice = Some(Notice {
            text: text.to_string(),
            until_ms: self.now_ms + self.notice_ms,
        });
    }

    fn add_log(&mut self, text: &str, is_important: bool) {
        self.log.push(LogEntry {
            text: text.to_string(),
            is_important,
        });
        if self.log.len() > MAX_LOG {
            self.log.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adventure::save::MemoryStorage;

    const DATA: &str = "图书馆|古老的图书馆|书中自有黄金屋|true|findBook|破解书架密码\n\
                        神庙|神秘的神庙|墙上刻着符文|false|solvePuzzle|点亮符文\n\
                        守卫营地|戒备森严的营地|守卫似乎在等什么|false|negotiateGuard|与守卫交涉\n\
                        密室|隐藏的密室|宝藏就在眼前|false|searchTreasure|搜索宝藏";

    fn game() -> AdventureGame<MemoryStorage> {
        AdventureGame::new(DATA, &GameConfig::default(), MemoryStorage::new(), 5, 0.0).unwrap()
    }

    fn press(g: &mut AdventureGame<MemoryStorage>, keys: &str, now: f64) {
        for ch in keys.chars() {
            g.handle_input(&InputEvent::Key(ch), now);
        }
    }

    fn last_log(g: &AdventureGame<MemoryStorage>) -> &str {
        &g.log.last().unwrap().text
    }

    #[test]
    fn new_game_greets_player() {
        let g = game();
        assert!(last_log(&g).starts_with("欢迎，冒险者"));
        assert!(g.notice.is_none());
    }

    #[test]
    fn parse_failure_is_init_error() {
        let result =
            AdventureGame::new("   ", &GameConfig::default(), MemoryStorage::new(), 0, 0.0);
        assert!(matches!(result, Err(InitError::Parse(_))));
    }

    #[test]
    fn typing_answer_solves_library() {
        let mut g = game();
        press(&mut g, "1", 0.0);
        assert!(g.puzzle_open());
        press(&mut g, "13", 0.0);
        g.handle_input(&InputEvent::Backspace, 0.0);
        press(&mut g, "35", 0.0);
        assert_eq!(g.answer, "135");
        assert!(g.handle_input(&InputEvent::Enter, 0.0));

        assert!(!g.puzzle_open());
        assert!(g.answer.is_empty());
        assert!(g.engine.inventory().has("古籍"));
        assert!(g.log.iter().any(|e| e.is_important && e.text.contains("古籍")));
        assert!(g.inventory_flash_until > 0.0);
    }

    #[test]
    fn wrong_answer_keeps_dialog_open() {
        let mut g = game();
        g.handle_input(&InputEvent::Click(LOCATION_BASE), 0.0);
        press(&mut g, "999", 0.0);
        g.handle_input(&InputEvent::Click(SUBMIT_ANSWER), 0.0);
        assert!(g.puzzle_open());
        assert_eq!(last_log(&g), engine::MSG_WRONG_ANSWER);
        assert!(g.answer.is_empty());
    }

    #[test]
    fn keys_go_to_answer_while_puzzle_open() {
        let mut g = game();
        press(&mut g, "1", 0.0);
        press(&mut g, "m2", 0.0);
        assert_eq!(g.answer, "m2");
        // Card clicks are swallowed by the dialog.
        assert!(!g.handle_input(&InputEvent::Click(LOCATION_BASE + 1), 0.0));
    }

    #[test]
    fn answer_length_is_capped() {
        let mut g = game();
        press(&mut g, "1", 0.0);
        press(&mut g, &"x".repeat(100), 0.0);
        assert_eq!(g.answer.chars().count(), MAX_ANSWER_CHARS);
    }

    #[test]
    fn locked_card_click_shows_notice() {
        let mut g = game();
        g.handle_input(&InputEvent::Click(LOCATION_BASE + 1), 100.0);
        let notice = g.notice.clone().unwrap();
        assert_eq!(notice.text, engine::MSG_LOCKED);
        assert_eq!(notice.until_ms, 3100.0);

        g.tick(3099.0);
        assert!(g.notice.is_some());
        g.tick(3100.0);
        assert!(g.notice.is_none());
    }

    #[test]
    fn rejected_number_key_is_reported() {
        let mut g = game();
        assert!(g.handle_input(&InputEvent::Key('2'), 0.0));
        assert_eq!(last_log(&g), engine::MSG_LOCKED);
        assert!(g.handle_input(&InputEvent::Key('9'), 0.0));
        assert_eq!(last_log(&g), engine::MSG_UNKNOWN_LOCATION);
        assert!(!g.puzzle_open());
    }

    #[test]
    fn music_is_unavailable_natively() {
        let mut g = game();
        press(&mut g, "m", 0.0);
        assert_eq!(last_log(&g), "音频功能未启用，请确保音频文件存在");
    }

    #[test]
    fn timed_task_completes_on_tick() {
        let mut g = game();
        press(&mut g, "1", 0.0);
        press(&mut g, "135", 0.0);
        g.handle_input(&InputEvent::Enter, 0.0);
        press(&mut g, "2", 0.0);
        press(&mut g, "ensw", 0.0);
        g.handle_input(&InputEvent::Enter, 0.0);

        press(&mut g, "3", 1000.0);
        assert!(matches!(
            g.engine.pending(2000.0),
            Some(DialogView::Progress { .. })
        ));
        // Another card while busy is refused.
        press(&mut g, "1", 1500.0);
        assert_eq!(last_log(&g), engine::MSG_BUSY);

        g.tick(3999.0);
        assert!(!g.engine.inventory().has("通行证"));
        g.tick(4000.0);
        assert!(g.engine.inventory().has("通行证"));
        assert!(g.engine.is_unlocked("密室"));
    }

    #[test]
    fn log_is_bounded() {
        let mut g = game();
        for _ in 0..(MAX_LOG * 2) {
            press(&mut g, "2", 0.0);
        }
        assert_eq!(g.log.len(), MAX_LOG);
    }
}

//! Game configuration, built once by `main` and handed to the game.

use std::collections::HashMap;

/// Which locations a completed location unlocks, keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UnlockRules {
    rules: HashMap<String, Vec<String>>,
}

impl UnlockRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// The linear chain of the bundled adventure.
    pub fn reference_chain() -> Self {
        Self::new()
            .rule("图书馆", ["神庙"])
            .rule("神庙", ["守卫营地"])
            .rule("守卫营地", ["密室"])
    }

    pub fn rule<I, S>(mut self, completed: &str, unlocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules
            .entry(completed.to_string())
            .or_default()
            .extend(unlocks.into_iter().map(Into::into));
        self
    }

    pub fn targets(&self, completed: &str) -> &[String] {
        self.rules.get(completed).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub data_url: String,
    pub storage_key: String,
    pub default_nickname: String,
    pub unlock_rules: UnlockRules,
    pub music_src: String,
    pub music_volume: f64,
    /// How long a notice stays on the banner.
    pub notice_ms: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            data_url: "data/locations.txt".into(),
            storage_key: "playerInfo".into(),
            default_nickname: "冒险者".into(),
            unlock_rules: UnlockRules::reference_chain(),
            music_src: "data/audio/background.mp3".into(),
            music_volume: 0.3,
            notice_ms: 3000.0,
        }
    }
}

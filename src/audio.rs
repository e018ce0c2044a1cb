//! Background music. Fire-and-forget: nothing here can fail the game.

#[cfg(any(target_arch = "wasm32", test))]
use std::{cell::Cell, rc::Rc};

/// Shown when the browser refused to start playback (autoplay policy).
pub const PLAY_BLOCKED: &str = "点击音乐开关来启用音乐";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MusicState {
    /// The audio file is missing or the browser refused to load it.
    Unavailable,
    Playing,
    Paused,
}

impl MusicState {
    pub fn message(self) -> &'static str {
        match self {
            MusicState::Unavailable => "音频功能未启用，请确保音频文件存在",
            MusicState::Playing => "音乐已开启",
            MusicState::Paused => "音乐已暂停",
        }
    }
}

/// Play/pause bookkeeping. `play()` resolves later, so a rejection arrives
/// through the shared flag and is folded in on the next poll or toggle.
#[cfg(any(target_arch = "wasm32", test))]
#[derive(Debug, Default)]
struct Playback {
    playing: bool,
    rejected: Rc<Cell<bool>>,
}

#[cfg(any(target_arch = "wasm32", test))]
impl Playback {
    /// Mark playback as started. The returned flag is set if the browser rejects it.
    fn started(&mut self) -> Rc<Cell<bool>> {
        self.rejected.set(false);
        self.playing = true;
        self.rejected.clone()
    }

    fn paused(&mut self) {
        self.playing = false;
    }

    /// True once per rejected `play()`; playback counts as stopped afterwards.
    fn take_rejection(&mut self) -> bool {
        if self.rejected.replace(false) {
            self.playing = false;
            true
        } else {
            false
        }
    }

    /// Whether the next toggle should pause. A rejected start is retried instead.
    fn should_pause(&mut self) -> bool {
        self.take_rejection();
        self.playing
    }
}

pub struct BackgroundMusic {
    #[cfg(target_arch = "wasm32")]
    element: Option<web_sys::HtmlAudioElement>,
    #[cfg(target_arch = "wasm32")]
    playback: Playback,
}

#[cfg(target_arch = "wasm32")]
impl BackgroundMusic {
    pub fn new(src: &str, volume: f64) -> Self {
        let element = match web_sys::HtmlAudioElement::new_with_src(src) {
            Ok(el) => {
                el.set_loop(true);
                el.set_volume(volume);
                Some(el)
            }
            Err(e) => {
                tracing::warn!("音频初始化失败: {e:?}");
                None
            }
        };
        Self {
            element,
            playback: Playback::default(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.element.as_ref().is_some_and(|el| el.error().is_none())
    }

    pub fn toggle(&mut self) -> MusicState {
        let Some(el) = self.element.as_ref().filter(|el| el.error().is_none()) else {
            return MusicState::Unavailable;
        };

        if self.playback.should_pause() {
            if let Err(e) = el.pause() {
                tracing::warn!("音频暂停失败: {e:?}");
            }
            self.playback.paused();
            return MusicState::Paused;
        }

        match el.play() {
            Ok(promise) => {
                let rejected = self.playback.started();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(e) = wasm_bindgen_futures::JsFuture::from(promise).await {
                        tracing::warn!("音频播放失败: {e:?}");
                        rejected.set(true);
                    }
                });
                MusicState::Playing
            }
            Err(e) => {
                tracing::warn!("音频播放失败: {e:?}");
                MusicState::Unavailable
            }
        }
    }

    /// True once after the browser rejected a `play()` request.
    pub fn take_rejection(&mut self) -> bool {
        self.playback.take_rejection()
    }
}

/// Native builds have no audio device; music is always unavailable.
#[cfg(not(target_arch = "wasm32"))]
impl BackgroundMusic {
    pub fn new(src: &str, volume: f64) -> Self {
        tracing::debug!(src, volume, "audio disabled on native target");
        Self {}
    }

    pub fn is_available(&self) -> bool {
        false
    }

    pub fn toggle(&mut self) -> MusicState {
        MusicState::Unavailable
    }

    pub fn take_rejection(&mut self) -> bool {
        false
    }
}

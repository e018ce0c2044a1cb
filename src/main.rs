// The browser build drives the UI; a native build only runs the headless load.
#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod adventure;
mod audio;
mod input;
mod time;
mod widgets;

use adventure::config::GameConfig;
use adventure::error::InitError;
use adventure::rng::initial_seed;
use adventure::AdventureGame;

#[cfg(target_arch = "wasm32")]
use std::{cell::RefCell, io, rc::Rc};

#[cfg(target_arch = "wasm32")]
use adventure::actions::RETRY_LOAD;
#[cfg(target_arch = "wasm32")]
use adventure::save::LocalStorage;
#[cfg(target_arch = "wasm32")]
use input::{ClickState, InputEvent};
#[cfg(target_arch = "wasm32")]
use ratzilla::event::{KeyCode, MouseButton, MouseEventKind};
#[cfg(target_arch = "wasm32")]
use ratzilla::ratatui::Terminal;
#[cfg(target_arch = "wasm32")]
use ratzilla::{DomBackend, WebRenderer};

/// Top-level application state.
#[cfg(target_arch = "wasm32")]
enum App {
    /// Waiting for the location data fetch.
    Loading,
    /// Start-up failed; the reason is shown with a retry button.
    Failed(String),
    Ready(AdventureGame<LocalStorage>),
}

/// Pixel position of a click relative to the grid, plus the grid's size.
#[cfg(target_arch = "wasm32")]
fn grid_relative(mouse_x: u32, mouse_y: u32) -> Option<(f64, f64, f64, f64)> {
    let window = web_sys::window()?;
    let document = window.document()?;

    // DomBackend creates a <div> as the grid container inside <body>.
    let grid = document.query_selector("body > div").ok()??;
    let rect = grid.get_bounding_client_rect();

    Some((
        mouse_x as f64 - rect.left(),
        mouse_y as f64 - rect.top(),
        rect.width(),
        rect.height(),
    ))
}

#[cfg(target_arch = "wasm32")]
async fn fetch_locations(url: &str) -> Result<String, InitError> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| InitError::DataLoad(e.to_string()))?;
    if !response.ok() {
        return Err(InitError::DataLoad(format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }
    response
        .text()
        .await
        .map_err(|e| InitError::DataLoad(e.to_string()))
}

/// (Re)start loading. The game only replaces `App::Loading` once the data
/// parsed completely, so a partial catalog is never shown.
#[cfg(target_arch = "wasm32")]
fn spawn_load(app: Rc<RefCell<App>>, config: Rc<GameConfig>) {
    *app.borrow_mut() = App::Loading;
    wasm_bindgen_futures::spawn_local(async move {
        let loaded = match fetch_locations(&config.data_url).await {
            Ok(raw) => AdventureGame::new(
                &raw,
                &config,
                LocalStorage,
                initial_seed(),
                time::now_ms(),
            ),
            Err(e) => Err(e),
        };
        let next = match loaded {
            Ok(game) => {
                tracing::info!("Relic Trail: data loaded from {}", config.data_url);
                App::Ready(game)
            }
            Err(e) => {
                tracing::error!("游戏初始化失败: {e}");
                App::Failed(e.to_string())
            }
        };
        *app.borrow_mut() = next;
    });
}

/// Route an input event to the current app state.
#[cfg(target_arch = "wasm32")]
fn dispatch(app: &Rc<RefCell<App>>, config: &Rc<GameConfig>, event: InputEvent) {
    let retry = {
        let mut state = app.borrow_mut();
        match &mut *state {
            App::Ready(game) => {
                game.handle_input(&event, time::now_ms());
                false
            }
            App::Failed(_) => matches!(
                event,
                InputEvent::Click(RETRY_LOAD) | InputEvent::Key('r' | 'R')
            ),
            App::Loading => false,
        }
    };
    if retry {
        spawn_load(app.clone(), config.clone());
    }
}

#[cfg(target_arch = "wasm32")]
fn main() -> io::Result<()> {
    console_error_panic_hook::set_once();
    tracing_wasm::set_as_global_default();

    let config = Rc::new(GameConfig::default());
    let app = Rc::new(RefCell::new(App::Loading));
    let click_state = Rc::new(RefCell::new(ClickState::new()));
    let backend = DomBackend::new()?;
    let terminal = Terminal::new(backend)?;

    spawn_load(app.clone(), config.clone());

    // Mouse/touch click handler
    terminal.on_mouse_event({
        let app = app.clone();
        let config = config.clone();
        let click_state = click_state.clone();
        move |mouse_event| {
            if mouse_event.event != MouseEventKind::Pressed
                || mouse_event.button != MouseButton::Left
            {
                return;
            }

            let Some((x, y, w, h)) = grid_relative(mouse_event.x, mouse_event.y) else {
                return;
            };
            let hit = click_state.borrow().hit_test_pixels(x, y, w, h);
            tracing::debug!(x, y, ?hit, "click");

            if let Some(id) = hit {
                dispatch(&app, &config, InputEvent::Click(id));
            }
        }
    });

    // Keyboard handler
    terminal.on_key_event({
        let app = app.clone();
        let config = config.clone();
        move |key_event| {
            let event = match key_event.code {
                KeyCode::Char(c) => InputEvent::Key(c),
                KeyCode::Backspace => InputEvent::Backspace,
                KeyCode::Enter => InputEvent::Enter,
                _ => return,
            };
            dispatch(&app, &config, event);
        }
    });

    terminal.draw_web({
        let click_state = click_state.clone();
        move |f| {
            let size = f.area();
            {
                let mut cs = click_state.borrow_mut();
                cs.terminal_cols = size.width;
                cs.terminal_rows = size.height;
                cs.clear_targets();
            }

            let mut state = app.borrow_mut();
            match &mut *state {
                App::Ready(game) => {
                    game.tick(time::now_ms());
                    game.render(f, size, &click_state);
                }
                App::Loading => adventure::render::render_loading(f, size),
                App::Failed(reason) => {
                    adventure::render::render_load_error(f, size, reason, &click_state)
                }
            }
        }
    });

    Ok(())
}

/// Native run: load the bundled data headlessly and log what a player would see.
#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), InitError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relic_trail=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GameConfig::default();
    let raw = std::fs::read_to_string(&config.data_url)
        .map_err(|e| InitError::DataLoad(format!("{}: {e}", config.data_url)))?;
    let game = AdventureGame::new(
        &raw,
        &config,
        adventure::save::MemoryStorage::new(),
        initial_seed(),
        time::now_ms(),
    )?;

    let engine = game.engine();
    tracing::info!(
        player = %engine.player().id,
        locations = engine.location_count(),
        "Relic Trail loaded"
    );
    for view in engine.locations() {
        tracing::info!(
            name = %view.location.name,
            accessible = view.location.is_accessible,
            action = view.location.action.as_deref().unwrap_or("-"),
            "location"
        );
    }
    Ok(())
}

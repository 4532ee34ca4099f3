//! Sector Breaker entry point
//!
//! In the browser this wires DOM events, the HUD and the frame loop to a
//! `Session`; the page's own renderer draws each frame's snapshot. Natively
//! it runs a headless autopilot game and prints the outcome.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent};

    use sector_breaker::audio::WebAudioBackend;
    use sector_breaker::sim::GamePhase;
    use sector_breaker::{Session, Settings, Tuning};

    // Hand each frame to the page's renderer, if it registered one
    #[wasm_bindgen(inline_js = "
        export function render_frame(json) {
            if (typeof window.sectorBreakerRender === 'function') {
                window.sectorBreakerRender(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn render_frame(json: &str);
    }

    type Game = Rc<RefCell<Session<WebAudioBackend>>>;

    fn document() -> Option<Document> {
        web_sys::window()?.document()
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            if el.text_content().as_deref() != Some(text) {
                el.set_text_content(Some(text));
            }
        }
    }

    fn set_display(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = el
                .style()
                .set_property("display", if visible { "block" } else { "none" });
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(session: &Session<WebAudioBackend>, now_ms: f64) {
        let Some(document) = document() else { return };
        let hud = session.hud();

        set_text(&document, "score", &hud.score.to_string());
        set_text(&document, "lives", &hud.lives.to_string());
        set_text(&document, "level", &hud.level.to_string());

        set_display(&document, "boss-hud", hud.boss_visible);
        if let Some(bar) = document
            .get_element_by_id("boss-health-bar")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        {
            let _ = bar.style().set_property("width", &hud.boss_bar_css());
        }

        set_display(&document, "tutorial-overlay", hud.tutorial_visible(now_ms));

        match hud.message(now_ms) {
            Some(banner) => {
                set_display(&document, "message-overlay", true);
                set_text(&document, "message-title", &banner.title);
                set_text(&document, "message-sub", banner.subtitle.as_deref().unwrap_or(""));
            }
            None => set_display(&document, "message-overlay", false),
        }

        set_display(&document, "restart-btn", hud.show_restart);
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Sector Breaker starting...");

        let Some(document) = document() else {
            log::error!("No document - cannot start");
            return;
        };

        // Hide loading indicator
        set_display(&document, "loading", false);

        let seed = js_sys::Date::now() as u64;
        let game: Game = Rc::new(RefCell::new(Session::new(
            seed,
            Tuning::default(),
            Settings::default(),
            WebAudioBackend::new(),
        )));

        setup_input_handlers(game.clone());
        setup_restart_button(game.clone());
        setup_form_overlay(game.clone());
        setup_auto_pause(game.clone());

        request_animation_frame(game);

        log::info!("Sector Breaker running!");
    }

    fn setup_input_handlers(game: Game) {
        let Some(window) = web_sys::window() else { return };

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                if game.borrow_mut().input_mut().key_down(&event.key()) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                game.borrow_mut().input_mut().key_up(&event.key());
            });
            let _ = window
                .add_event_listener_with_callback("keyup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse move - absolute position across the window
        {
            let game = game.clone();
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let width = window_clone
                    .inner_width()
                    .ok()
                    .and_then(|w| w.as_f64())
                    .unwrap_or(1.0);
                let fraction = (event.client_x() as f64 / width.max(1.0)) as f32;
                game.borrow_mut().pointer_at(fraction);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Mouse click - launch
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input_mut().tap();
            });
            let _ = window
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch start (launch) and move share the position logic
        for (kind, launches) in [("touchstart", true), ("touchmove", false)] {
            let game = game.clone();
            let window_clone = window.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let mut g = game.borrow_mut();
                if launches {
                    g.input_mut().tap();
                }
                if let Some(touch) = event.touches().get(0) {
                    let width = window_clone
                        .inner_width()
                        .ok()
                        .and_then(|w| w.as_f64())
                        .unwrap_or(1.0);
                    let fraction = (touch.client_x() as f64 / width.max(1.0)) as f32;
                    g.pointer_at(fraction);
                }
            });
            let _ = window.add_event_listener_with_callback(kind, closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Touch end - hand control back to the keys
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: TouchEvent| {
                game.borrow_mut().input_mut().pointer_released();
            });
            let _ = window
                .add_event_listener_with_callback("touchend", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Game) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Game, time: f64) {
        {
            let mut g = game.borrow_mut();
            g.frame(time);
            update_hud(&g, time);

            match g.snapshot_json(time) {
                Ok(json) => render_frame(&json),
                Err(e) => log::warn!("Snapshot error: {}", e),
            }
        }

        request_animation_frame(game);
    }

    fn setup_restart_button(game: Game) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("restart-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
                log::info!("Game restarted with seed: {}", seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// The page's modal form pauses the game while open
    fn setup_form_overlay(game: Game) {
        let Some(document) = document() else { return };

        if let Some(btn) = document.get_element_by_id("form-toggle-btn") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Some(document) = self::document() {
                    set_display(&document, "form-container", true);
                }
                let mut g = game.borrow_mut();
                if matches!(g.state().phase, GamePhase::Playing | GamePhase::Boss) {
                    g.input_mut().request_pause();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(btn) = document.get_element_by_id("form-close-btn") {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                if let Some(document) = self::document() {
                    set_display(&document, "form-container", false);
                }
                let mut g = game.borrow_mut();
                if g.state().phase == GamePhase::Paused {
                    g.input_mut().request_pause();
                }
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Game) {
        let Some(window) = web_sys::window() else { return };

        // Window blur (tab switch, click outside)
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().on_blur();
        });
        let _ = window.add_event_listener_with_callback("blur", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Command line of the headless demo:
/// `sector-breaker [TUNING.json] [--settings SETTINGS.json] [--quality low|medium|high]`
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default, PartialEq)]
struct DemoArgs {
    tuning_path: Option<String>,
    settings_path: Option<String>,
    quality: Option<sector_breaker::QualityPreset>,
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_args(args: impl IntoIterator<Item = String>) -> Result<DemoArgs, String> {
    use sector_breaker::QualityPreset;

    let mut parsed = DemoArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--settings" => {
                parsed.settings_path = Some(args.next().ok_or("--settings needs a file")?);
            }
            "--quality" => {
                let name = args.next().ok_or("--quality needs a preset")?;
                let preset = QualityPreset::from_str(&name)
                    .ok_or_else(|| format!("unknown quality preset: {}", name))?;
                parsed.quality = Some(preset);
            }
            _ if parsed.tuning_path.is_none() && !arg.starts_with("--") => {
                parsed.tuning_path = Some(arg);
            }
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }
    Ok(parsed)
}

/// Headless demo: the autopilot plays until the run ends or time runs out
#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use sector_breaker::audio::NullBackend;
    use sector_breaker::sim::GameEvent;
    use sector_breaker::{Session, Settings, Tuning};

    env_logger::init();
    log::info!("Sector Breaker (native) starting...");

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let tuning = match &args.tuning_path {
        Some(path) => {
            let loaded = std::fs::read_to_string(path)
                .map_err(|e| format!("cannot read {}: {}", path, e))
                .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
            match loaded {
                Ok(tuning) => {
                    log::info!("Loaded tuning from {}", path);
                    tuning
                }
                Err(e) => {
                    eprintln!("Invalid tuning: {}", e);
                    std::process::exit(1);
                }
            }
        }
        None => Tuning::default(),
    };

    let mut settings = match &args.settings_path {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => Settings::from_json_or_default(&json),
            Err(e) => {
                log::warn!("Cannot read settings {}: {}", path, e);
                Settings::default()
            }
        },
        None => Settings::default(),
    };
    if let Some(preset) = args.quality {
        settings.quality = preset;
    }
    log::info!("Quality preset: {}", settings.quality.as_str());

    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let mut session = Session::new(seed, tuning, settings, NullBackend::default());
    session.input_mut().set_autopilot(true);

    // Ten minutes of game time
    let frame_ms = 1000.0 / 60.0;
    let mut bricks_destroyed = 0u32;
    let mut frames = 0u32;
    while frames < 60 * 60 * 10 && !session.state().is_terminal() {
        frames += 1;
        for event in session.frame(frames as f64 * frame_ms) {
            match event {
                GameEvent::BrickDestroyed { .. } => bricks_destroyed += 1,
                GameEvent::LevelStarted { level, boss } => {
                    println!("Sector {}{}", level, if boss { " (boss)" } else { "" });
                }
                _ => {}
            }
        }
    }

    let state = session.state();
    println!(
        "\n{:?} after {} ticks: sector {}, score {}, lives {}, bricks destroyed {}, tones played {}",
        state.phase,
        state.time_ticks,
        state.level,
        state.score,
        state.lives,
        bricks_destroyed,
        session.audio().backend().played.len()
    );
}

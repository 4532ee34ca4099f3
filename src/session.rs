//! One running game, driven by the host's frame callback
//!
//! Each `frame` call samples input, runs fixed simulation steps out of an
//! accumulator, then hands the resulting events to audio and the HUD.

use serde::Serialize;

use crate::audio::{AudioBackend, AudioManager};
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::hud::{Banner, Hud};
use crate::input::InputState;
use crate::settings::Settings;
use crate::sim::{
    Ball, Boss, GameEvent, GamePhase, GameState, Paddle, Particle, Powerup, tick,
};
use crate::tuning::Tuning;

/// Longest frame gap fed to the accumulator (seconds)
const MAX_FRAME_DT: f32 = 0.1;

/// What the host renderer needs for one frame
#[derive(Debug, Serialize)]
pub struct RenderSnapshot<'a> {
    pub time_ticks: u64,
    pub phase: GamePhase,
    pub paddle: &'a Paddle,
    pub balls: &'a [Ball],
    pub bricks: Vec<BrickView>,
    pub boss: BossView<'a>,
    pub powerups: &'a [Powerup],
    pub particles: &'a [Particle],
    pub hud: &'a Hud,
    pub tutorial: bool,
    pub message: Option<&'a Banner>,
}

/// A standing brick as drawn
#[derive(Debug, Serialize)]
pub struct BrickView {
    pub x: f32,
    pub y: f32,
    pub color: u32,
    pub hp: u8,
    pub flashing: bool,
}

#[derive(Debug, Serialize)]
pub struct BossView<'a> {
    pub active: bool,
    pub x: f32,
    pub y: f32,
    pub flashing: bool,
    pub projectiles: &'a [crate::sim::Projectile],
}

impl<'a> BossView<'a> {
    fn new(boss: &'a Boss, now: u64) -> Self {
        Self {
            active: boss.is_active(),
            x: boss.pos.x,
            y: boss.pos.y,
            flashing: boss.is_flashing(now),
            projectiles: &boss.projectiles,
        }
    }
}

/// Game session: state, settings, audio, HUD, input and frame timing
pub struct Session<B: AudioBackend> {
    state: GameState,
    /// Tuning as given, before settings adjust the cosmetic limits
    base_tuning: Tuning,
    settings: Settings,
    audio: AudioManager<B>,
    hud: Hud,
    input: InputState,
    accumulator: f32,
    last_time_ms: Option<f64>,
}

impl<B: AudioBackend> Session<B> {
    pub fn new(seed: u64, base_tuning: Tuning, settings: Settings, backend: B) -> Self {
        let mut tuning = base_tuning.clone();
        settings.apply_to(&mut tuning);
        let mut audio = AudioManager::new(backend);
        audio.set_volumes(
            settings.effective_sfx_volume(),
            settings.effective_music_volume(),
        );
        log::info!("Session started with seed {}", seed);
        Self {
            state: GameState::with_tuning(seed, tuning),
            base_tuning,
            settings,
            audio,
            hud: Hud::new(),
            input: InputState::new(),
            accumulator: 0.0,
            last_time_ms: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn hud(&self) -> &Hud {
        &self.hud
    }

    pub fn audio(&self) -> &AudioManager<B> {
        &self.audio
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    /// Pointer moved to `fraction` across the play surface
    pub fn pointer_at(&mut self, fraction: f32) {
        let width = self.state.paddle.width;
        self.input.pointer_at(fraction, width, &self.state.tuning);
    }

    /// Replace settings; cosmetic limits and volumes apply immediately
    pub fn set_settings(&mut self, settings: Settings) {
        let mut tuning = self.base_tuning.clone();
        settings.apply_to(&mut tuning);
        self.state.tuning.max_particles = tuning.max_particles;
        self.state.tuning.hit_flash_ticks = tuning.hit_flash_ticks;
        self.audio.set_volumes(
            settings.effective_sfx_volume(),
            settings.effective_music_volume(),
        );
        self.settings = settings;
    }

    /// Page lost focus: pause a running game
    pub fn on_blur(&mut self) {
        if !self.settings.pause_on_blur {
            return;
        }
        if matches!(self.state.phase, GamePhase::Playing | GamePhase::Boss) {
            self.input.request_pause();
            log::info!("Auto-paused (focus lost)");
        }
    }

    /// Advance to host time `now_ms`. Returns the events raised this frame.
    pub fn frame(&mut self, now_ms: f64) -> Vec<GameEvent> {
        let dt = match self.last_time_ms {
            Some(last) => (((now_ms - last) / 1000.0) as f32).clamp(0.0, MAX_FRAME_DT),
            None => SIM_DT,
        };
        self.last_time_ms = Some(now_ms);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = self.input.tick_input();
            tick(&mut self.state, &input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.clear_one_shots();
        }
        // Drop time we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }

        let events = self.state.drain_events();
        self.dispatch(&events, now_ms);
        events
    }

    fn dispatch(&mut self, events: &[GameEvent], now_ms: f64) {
        self.audio.handle_events(events);
        for event in events {
            match event {
                GameEvent::Launched | GameEvent::Resumed => self.audio.start_music(now_ms),
                GameEvent::Paused | GameEvent::GameOver | GameEvent::Victory => {
                    self.audio.stop_music()
                }
                _ => {}
            }
        }
        self.audio.update(now_ms);

        self.hud.sync(&self.state);
        self.hud.handle_events(events, now_ms);
        self.hud.expire(now_ms);
    }

    /// Fresh run with the same tuning and settings
    pub fn restart(&mut self, seed: u64) {
        self.state.restart(seed);
        self.input.reset();
        self.hud.reset();
        self.audio.stop_music();
        self.accumulator = 0.0;
    }

    /// Borrowed view for the renderer
    pub fn snapshot(&self, now_ms: f64) -> RenderSnapshot<'_> {
        let now = self.state.time_ticks;
        RenderSnapshot {
            time_ticks: now,
            phase: self.state.phase,
            paddle: &self.state.paddle,
            balls: &self.state.balls,
            bricks: self
                .state
                .bricks
                .iter()
                .filter(|b| b.active)
                .map(|b| BrickView {
                    x: b.pos.x,
                    y: b.pos.y,
                    color: b.kind.color(),
                    hp: b.hp,
                    flashing: b.is_flashing(now),
                })
                .collect(),
            boss: BossView::new(&self.state.boss, now),
            powerups: &self.state.powerups,
            particles: &self.state.particles,
            hud: &self.hud,
            tutorial: self.hud.tutorial_visible(now_ms),
            message: self.hud.message(now_ms),
        }
    }

    /// Snapshot serialized for a JavaScript renderer
    pub fn snapshot_json(&self, now_ms: f64) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot(now_ms))
    }
}

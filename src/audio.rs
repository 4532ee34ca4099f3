//! Audio: synthesized sound cues and a background music loop
//!
//! Every cue is a handful of short oscillator tones, so no audio files are
//! needed. The simulation never talks to audio directly; the session maps
//! `GameEvent`s to cues. Output goes through an `AudioBackend` so the same
//! manager drives Web Audio in the browser and a silent backend elsewhere.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::sim::GameEvent;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Sawtooth,
    Triangle,
}

/// One scheduled oscillator blip
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    /// Frequency in Hz
    pub freq: f32,
    pub waveform: Waveform,
    /// Seconds until the envelope has decayed
    pub duration: f64,
    /// Peak gain before volume settings
    pub volume: f32,
    /// Seconds after the cue fires
    pub delay: f64,
}

impl Tone {
    const fn new(freq: f32, waveform: Waveform, duration: f64, volume: f32, delay: f64) -> Self {
        Self {
            freq,
            waveform,
            duration,
            volume,
            delay,
        }
    }
}

/// Default cue gain
const VOL: f32 = 0.1;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Ball or projectile hits paddle
    PaddleHit,
    /// Ball hits a brick that survives
    BrickHit,
    /// Ball hits a wall
    WallHit,
    /// Brick destroyed
    BrickBreak,
    /// Boss takes damage
    BossHit,
    /// Boss fires
    BossShoot,
    /// Pickup caught
    PowerUp,
    /// Lives exhausted
    GameOver,
    /// Sector cleared
    LevelClear,
}

impl SoundCue {
    /// Tones for this cue. `variation` in [0, 1) detunes cues that vary.
    pub fn tones(self, variation: f32) -> Vec<Tone> {
        use Waveform::*;
        match self {
            SoundCue::PaddleHit => vec![Tone::new(440.0, Square, 0.1, VOL, 0.0)],
            SoundCue::BrickHit => vec![Tone::new(600.0 + variation * 200.0, Sine, 0.1, VOL, 0.0)],
            SoundCue::WallHit => vec![Tone::new(200.0, Triangle, 0.05, VOL, 0.0)],
            SoundCue::BrickBreak => vec![
                Tone::new(800.0, Sawtooth, 0.1, 0.2, 0.0),
                Tone::new(600.0, Sawtooth, 0.1, 0.2, 0.05),
            ],
            SoundCue::BossHit => vec![
                Tone::new(150.0, Sawtooth, 0.3, 0.3, 0.0),
                Tone::new(100.0, Square, 0.3, 0.3, 0.0),
            ],
            SoundCue::BossShoot => vec![Tone::new(1200.0, Triangle, 0.1, 0.05, 0.0)],
            SoundCue::PowerUp => vec![
                Tone::new(880.0, Sine, 0.1, VOL, 0.0),
                Tone::new(1320.0, Sine, 0.15, VOL, 0.08),
            ],
            SoundCue::GameOver => vec![
                Tone::new(300.0, Sawtooth, 0.5, VOL, 0.0),
                Tone::new(250.0, Sawtooth, 0.5, VOL, 0.4),
                Tone::new(200.0, Sawtooth, 1.0, VOL, 0.8),
            ],
            SoundCue::LevelClear => vec![
                Tone::new(523.25, Sine, 0.2, VOL, 0.0),
                Tone::new(659.25, Sine, 0.2, VOL, 0.2),
                Tone::new(783.99, Sine, 0.4, VOL, 0.4),
                Tone::new(1046.5, Sine, 0.6, VOL, 0.6),
            ],
        }
    }

    /// Cue for a simulation event, if it has one
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::PaddleHit { .. } | GameEvent::ProjectileReflected => {
                Some(SoundCue::PaddleHit)
            }
            GameEvent::WallHit => Some(SoundCue::WallHit),
            GameEvent::BrickHit { .. } => Some(SoundCue::BrickHit),
            GameEvent::BrickDestroyed { .. } => Some(SoundCue::BrickBreak),
            GameEvent::BossHit { .. } => Some(SoundCue::BossHit),
            GameEvent::BossFired => Some(SoundCue::BossShoot),
            GameEvent::PowerupCollected { .. } => Some(SoundCue::PowerUp),
            GameEvent::GameOver => Some(SoundCue::GameOver),
            GameEvent::LevelCleared { .. } => Some(SoundCue::LevelClear),
            _ => None,
        }
    }
}

/// Where tones end up
pub trait AudioBackend {
    /// Output is running (browsers start suspended until a user gesture)
    fn is_ready(&self) -> bool;
    /// Ask a suspended output to start. May take effect later.
    fn try_resume(&mut self);
    /// Schedule one tone at `gain` (already scaled by volume settings)
    fn play_tone(&mut self, tone: &Tone, gain: f32);
}

/// Silent backend for headless runs and tests; keeps a log of what it was asked to play
#[derive(Debug, Clone)]
pub struct NullBackend {
    pub ready: bool,
    pub resume_attempts: u32,
    pub played: Vec<(Tone, f32)>,
}

impl Default for NullBackend {
    fn default() -> Self {
        Self {
            ready: true,
            resume_attempts: 0,
            played: Vec::new(),
        }
    }
}

impl AudioBackend for NullBackend {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn try_resume(&mut self) {
        self.resume_attempts += 1;
    }

    fn play_tone(&mut self, tone: &Tone, gain: f32) {
        self.played.push((*tone, gain));
    }
}

/// Pending reschedule owned by a `MusicLoop`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleHandle {
    /// Host time (ms) at which the next step plays
    pub due_ms: f64,
}

/// Background bassline
const MUSIC_PATTERN: [Tone; 8] = [
    Tone::new(110.0, Waveform::Triangle, 0.2, 0.06, 0.0),
    Tone::new(130.81, Waveform::Triangle, 0.2, 0.05, 0.0),
    Tone::new(164.81, Waveform::Triangle, 0.2, 0.05, 0.0),
    Tone::new(130.81, Waveform::Triangle, 0.2, 0.05, 0.0),
    Tone::new(98.0, Waveform::Triangle, 0.2, 0.06, 0.0),
    Tone::new(123.47, Waveform::Triangle, 0.2, 0.05, 0.0),
    Tone::new(146.83, Waveform::Triangle, 0.2, 0.05, 0.0),
    Tone::new(123.47, Waveform::Triangle, 0.2, 0.05, 0.0),
];

/// Milliseconds between music steps
pub const MUSIC_STEP_MS: f64 = 250.0;

/// Self-rescheduling music loop with cooperative cancellation.
///
/// `stop` clears the playing flag and drops the pending handle; `poll`
/// checks the flag before doing anything, so nothing plays or reschedules
/// after a stop until `start` is called again.
#[derive(Debug, Clone, Default)]
pub struct MusicLoop {
    playing: bool,
    pending: Option<ScheduleHandle>,
    step: usize,
}

impl MusicLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn pending(&self) -> Option<ScheduleHandle> {
        self.pending
    }

    /// Start from the first step. No-op if already playing.
    pub fn start(&mut self, now_ms: f64) {
        if self.playing {
            return;
        }
        self.playing = true;
        self.step = 0;
        self.pending = Some(ScheduleHandle { due_ms: now_ms });
    }

    pub fn stop(&mut self) {
        self.playing = false;
        self.pending = None;
    }

    /// Tone due at `now_ms`, if any. Reschedules the following step.
    pub fn poll(&mut self, now_ms: f64) -> Option<Tone> {
        if !self.playing {
            return None;
        }
        let handle = self.pending.take()?;
        if now_ms < handle.due_ms {
            self.pending = Some(handle);
            return None;
        }

        let tone = MUSIC_PATTERN[self.step];
        self.step = (self.step + 1) % MUSIC_PATTERN.len();

        // After a long stall resync instead of replaying the backlog
        let mut due_ms = handle.due_ms + MUSIC_STEP_MS;
        if due_ms <= now_ms {
            due_ms = now_ms + MUSIC_STEP_MS;
        }
        self.pending = Some(ScheduleHandle { due_ms });
        Some(tone)
    }
}

/// Audio manager for the game
pub struct AudioManager<B: AudioBackend> {
    backend: B,
    music: MusicLoop,
    sfx_volume: f32,
    music_volume: f32,
    /// Pitch variation only; never touches gameplay RNG
    rng: Pcg32,
}

impl<B: AudioBackend> AudioManager<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            music: MusicLoop::new(),
            sfx_volume: 0.8,
            music_volume: 0.4,
            rng: Pcg32::seed_from_u64(0x5eed),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn music(&self) -> &MusicLoop {
        &self.music
    }

    /// Effective volumes (0.0 - 1.0), normally from `Settings`
    pub fn set_volumes(&mut self, sfx: f32, music: f32) {
        self.sfx_volume = sfx.clamp(0.0, 1.0);
        self.music_volume = music.clamp(0.0, 1.0);
    }

    /// Output is usable, resuming it if needed. Cues are skipped, not queued,
    /// while it is not.
    fn ensure_ready(&mut self) -> bool {
        if self.backend.is_ready() {
            return true;
        }
        self.backend.try_resume();
        self.backend.is_ready()
    }

    /// Play a sound effect
    pub fn play(&mut self, cue: SoundCue) {
        if self.sfx_volume <= 0.0 {
            return;
        }
        if !self.ensure_ready() {
            log::debug!("Audio not ready, skipped {:?}", cue);
            return;
        }
        let variation: f32 = self.rng.random();
        for tone in cue.tones(variation) {
            self.backend.play_tone(&tone, self.sfx_volume);
        }
    }

    /// Play the cue for each event that has one
    pub fn handle_events(&mut self, events: &[GameEvent]) {
        for cue in events.iter().filter_map(SoundCue::for_event) {
            self.play(cue);
        }
    }

    pub fn start_music(&mut self, now_ms: f64) {
        if !self.music.is_playing() {
            log::debug!("Music started");
        }
        self.music.start(now_ms);
    }

    pub fn stop_music(&mut self) {
        if self.music.is_playing() {
            log::debug!("Music stopped");
        }
        self.music.stop();
    }

    /// Drive the music loop; call once per host frame
    pub fn update(&mut self, now_ms: f64) {
        let Some(tone) = self.music.poll(now_ms) else {
            return;
        };
        if self.music_volume > 0.0 && self.ensure_ready() {
            self.backend.play_tone(&tone, self.music_volume);
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudioBackend;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, AudioContextState, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioBackend, Tone, Waveform};

    /// Web Audio output
    pub struct WebAudioBackend {
        ctx: Option<AudioContext>,
    }

    impl Default for WebAudioBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudioBackend {
        pub fn new() -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self { ctx }
        }

        /// Create an oscillator with gain envelope
        fn create_osc(
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }
    }

    fn osc_type(waveform: Waveform) -> OscillatorType {
        match waveform {
            Waveform::Sine => OscillatorType::Sine,
            Waveform::Square => OscillatorType::Square,
            Waveform::Sawtooth => OscillatorType::Sawtooth,
            Waveform::Triangle => OscillatorType::Triangle,
        }
    }

    impl AudioBackend for WebAudioBackend {
        fn is_ready(&self) -> bool {
            self.ctx
                .as_ref()
                .is_some_and(|ctx| ctx.state() == AudioContextState::Running)
        }

        fn try_resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                let _ = ctx.resume();
            }
        }

        fn play_tone(&mut self, tone: &Tone, gain: f32) {
            let Some(ctx) = &self.ctx else { return };
            let Some((osc, env)) = Self::create_osc(ctx, tone.freq, osc_type(tone.waveform)) else {
                return;
            };
            let t = ctx.current_time() + tone.delay;

            env.gain().set_value_at_time(tone.volume * gain, t).ok();
            env.gain()
                .exponential_ramp_to_value_at_time(0.01, t + tone.duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + tone.duration).ok();
        }
    }
}

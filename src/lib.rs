//! Sector Breaker - a 3D brick-breaker with a boss sector
//!
//! Core modules:
//! - `sim`: Frame-stepped simulation (collisions, layouts, boss, game state)
//! - `tuning`: Data-driven game balance
//! - `settings`: Player preferences (volumes, particle quality)
//! - `audio`: Synthesized sound cues and background music scheduling
//! - `input`: Keyboard/pointer/touch mapping to tick input
//! - `hud`: Heads-up display model and transient banners
//! - `session`: Orchestrates one running game for a host frame loop

pub mod audio;
pub mod hud;
pub mod input;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use session::Session;
pub use settings::{QualityPreset, Settings};
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (one display frame at 60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;
    /// Milliseconds covered by one simulation tick
    pub const TICK_MS: f64 = 1000.0 / 60.0;
}

/// Convert a duration in seconds to whole simulation ticks (rounded)
#[inline]
pub fn seconds_to_ticks(seconds: f32) -> u64 {
    (seconds / consts::SIM_DT).round().max(0.0) as u64
}

/// Milliseconds elapsed after `ticks` simulation ticks
#[inline]
pub fn ticks_to_ms(ticks: u64) -> f64 {
    ticks as f64 * consts::TICK_MS
}

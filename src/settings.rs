//! Player settings and preferences
//!
//! Kept apart from `Tuning`: these change how the game looks and sounds,
//! never how it plays. Not persisted between runs.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 256,
            QualityPreset::High => 1024,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Particle bursts on hits
    pub particles: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Music volume (0.0 - 1.0)
    pub music_volume: f32,
    /// Silence everything
    pub muted: bool,
    /// Pause a running game when the page loses focus
    pub pause_on_blur: bool,

    // === Accessibility ===
    /// Reduced motion (no particles, no hit flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,

            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            pause_on_blur: true,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Parse settings from JSON; missing fields keep their defaults.
    /// Invalid input falls back to defaults entirely.
    pub fn from_json_or_default(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(settings) => settings.clamped(),
            Err(err) => {
                log::warn!("Ignoring invalid settings: {}", err);
                Self::default()
            }
        }
    }

    /// Volumes forced into 0..=1
    pub fn clamped(mut self) -> Self {
        self.master_volume = self.master_volume.clamp(0.0, 1.0);
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);
        self.music_volume = self.music_volume.clamp(0.0, 1.0);
        self
    }

    /// Gain applied to sound effects
    pub fn effective_sfx_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.sfx_volume
        }
    }

    /// Gain applied to background music
    pub fn effective_music_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * self.music_volume
        }
    }

    /// Effective particle count cap (respects reduced_motion)
    pub fn max_particles(&self) -> usize {
        if !self.particles || self.reduced_motion {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Effective hit-flash length (respects reduced_motion)
    pub fn effective_flash_ticks(&self, tuning: &Tuning) -> u64 {
        if self.reduced_motion {
            0
        } else {
            tuning.hit_flash_ticks
        }
    }

    /// Push the cosmetic limits into the simulation tuning
    pub fn apply_to(&self, tuning: &mut Tuning) {
        tuning.max_particles = self.max_particles();
        tuning.hit_flash_ticks = self.effective_flash_ticks(tuning);
    }
}

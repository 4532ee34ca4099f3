//! Heads-up display model
//!
//! Pure data: the host copies these fields into whatever DOM or overlay it
//! uses. Banners carry their own expiry time instead of relying on timers.

use serde::Serialize;

use crate::sim::{GameEvent, GamePhase, GameState};

/// How long the level-1 controls hint stays up
pub const TUTORIAL_MS: f64 = 15_000.0;
/// "SECTOR n UNLOCKED"
pub const SECTOR_BANNER_MS: f64 = 2_000.0;
/// "WARNING: BOSS DETECTED"
pub const BOSS_BANNER_MS: f64 = 3_000.0;

/// A centered message overlay
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Banner {
    pub title: String,
    pub subtitle: Option<String>,
    /// Host time (ms) at which it disappears; None = until restart
    pub until_ms: Option<f64>,
}

impl Banner {
    fn timed(title: impl Into<String>, now_ms: f64, duration_ms: f64) -> Self {
        Self {
            title: title.into(),
            subtitle: None,
            until_ms: Some(now_ms + duration_ms),
        }
    }

    fn sticky(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: Some(subtitle.into()),
            until_ms: None,
        }
    }

    pub fn is_visible(&self, now_ms: f64) -> bool {
        self.until_ms.is_none_or(|until| now_ms < until)
    }
}

/// Everything the HUD shows
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hud {
    pub score: u64,
    pub lives: u8,
    pub level: u32,
    /// Boss health bar shown
    pub boss_visible: bool,
    /// Boss health bar fill, 0-100
    pub boss_percent: f32,
    pub paused: bool,
    /// Restart control shown (terminal states)
    pub show_restart: bool,
    tutorial_until: Option<f64>,
    message: Option<Banner>,
}

impl Hud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the counters and boss bar from the simulation
    pub fn sync(&mut self, state: &GameState) {
        self.score = state.score;
        self.lives = state.lives;
        self.level = state.level;
        self.boss_visible = state.boss.is_active();
        self.boss_percent = if self.boss_visible {
            state.boss.hp_fraction() * 100.0
        } else {
            0.0
        };
        self.paused = state.phase == GamePhase::Paused;
        self.show_restart = state.is_terminal();
    }

    /// Raise banners for this frame's events
    pub fn handle_events(&mut self, events: &[GameEvent], now_ms: f64) {
        for event in events {
            match event {
                GameEvent::LevelStarted { level: 1, boss: false } => {
                    self.tutorial_until = Some(now_ms + TUTORIAL_MS);
                    self.message = None;
                }
                GameEvent::LevelStarted { level, boss: false } => {
                    self.tutorial_until = None;
                    self.message = Some(Banner::timed(
                        format!("SECTOR {} UNLOCKED", level),
                        now_ms,
                        SECTOR_BANNER_MS,
                    ));
                }
                GameEvent::LevelStarted { boss: true, .. } => {
                    self.tutorial_until = None;
                    self.message = Some(Banner::timed(
                        "WARNING: BOSS DETECTED",
                        now_ms,
                        BOSS_BANNER_MS,
                    ));
                }
                GameEvent::Victory => {
                    self.message = Some(Banner::sticky(
                        "MISSION ACCOMPLISHED",
                        "THE GALAXY IS SAFE.",
                    ));
                }
                GameEvent::GameOver => {
                    self.tutorial_until = None;
                    self.message = Some(Banner::sticky(
                        "GAME OVER",
                        format!("FINAL SCORE: {}", self.score),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Drop banners whose time is up
    pub fn expire(&mut self, now_ms: f64) {
        if self.tutorial_until.is_some_and(|until| now_ms >= until) {
            self.tutorial_until = None;
        }
        if self.message.as_ref().is_some_and(|m| !m.is_visible(now_ms)) {
            self.message = None;
        }
    }

    pub fn tutorial_visible(&self, now_ms: f64) -> bool {
        self.tutorial_until.is_some_and(|until| now_ms < until)
    }

    /// Current message overlay, if any
    pub fn message(&self, now_ms: f64) -> Option<&Banner> {
        self.message.as_ref().filter(|m| m.is_visible(now_ms))
    }

    /// Clear everything (restart)
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Boss bar width as a CSS percentage
    pub fn boss_bar_css(&self) -> String {
        format!("{:.1}%", self.boss_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::Tuning;

    #[test]
    fn test_tutorial_on_first_level() {
        let mut hud = Hud::new();
        hud.handle_events(&[GameEvent::LevelStarted { level: 1, boss: false }], 1000.0);
        assert!(hud.tutorial_visible(15_999.0));
        assert!(!hud.tutorial_visible(16_000.0));
        assert_eq!(hud.message(1000.0), None);
    }

    #[test]
    fn test_sector_banner_expires() {
        let mut hud = Hud::new();
        hud.handle_events(&[GameEvent::LevelStarted { level: 3, boss: false }], 0.0);
        assert_eq!(hud.message(1999.0).map(|m| m.title.as_str()), Some("SECTOR 3 UNLOCKED"));
        hud.expire(2000.0);
        assert_eq!(hud.message(2000.0), None);
    }

    #[test]
    fn test_boss_warning() {
        let mut hud = Hud::new();
        hud.handle_events(&[GameEvent::LevelStarted { level: 5, boss: true }], 0.0);
        let banner = hud.message(2999.0).cloned();
        assert_eq!(banner.map(|b| b.title), Some("WARNING: BOSS DETECTED".to_string()));
        assert_eq!(hud.message(3000.0), None);
    }

    #[test]
    fn test_terminal_banners_stick() {
        let mut hud = Hud::new();
        hud.handle_events(&[GameEvent::Victory], 0.0);
        hud.expire(1e9);
        let banner = hud.message(1e9).cloned().map(|b| (b.title, b.subtitle));
        assert_eq!(
            banner,
            Some((
                "MISSION ACCOMPLISHED".to_string(),
                Some("THE GALAXY IS SAFE.".to_string())
            ))
        );
        hud.reset();
        assert_eq!(hud.message(0.0), None);
    }

    #[test]
    fn test_sync_boss_bar() {
        let tuning = Tuning {
            boss_fire_chance: 0.0,
            ..Default::default()
        };
        let mut state = GameState::with_tuning(1, tuning);
        let mut hud = Hud::new();
        hud.sync(&state);
        assert!(!hud.boss_visible);
        assert_eq!(hud.lives, 3);

        let boss_level = state.tuning.final_level;
        crate::sim::start_level(&mut state, boss_level);
        state.boss.hp = 125;
        hud.sync(&state);
        assert!(hud.boss_visible);
        assert!((hud.boss_percent - 25.0).abs() < 1e-4);
        assert_eq!(hud.boss_bar_css(), "25.0%");
        assert_eq!(hud.level, 5);
    }
}

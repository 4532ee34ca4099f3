//! Keyboard, pointer and touch mapping to `TickInput`
//!
//! Host event handlers feed raw keys and pointer fractions in; the session
//! reads one `TickInput` per simulation step and clears the one-shot flags
//! once a step has consumed them.

use crate::sim::TickInput;
use crate::tuning::Tuning;

/// What a key press means to the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Left,
    Right,
    Launch,
    Pause,
    ToggleAutopilot,
}

impl KeyAction {
    /// Map a DOM `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowLeft" | "a" | "A" => Some(KeyAction::Left),
            "ArrowRight" | "d" | "D" => Some(KeyAction::Right),
            " " | "Enter" | "ArrowUp" | "w" | "W" => Some(KeyAction::Launch),
            "Escape" | "p" | "P" => Some(KeyAction::Pause),
            "i" | "I" => Some(KeyAction::ToggleAutopilot),
            _ => None,
        }
    }
}

/// Paddle x for a pointer at `fraction` (0 = left edge, 1 = right edge) of
/// the play surface, kept far enough from the walls for a paddle of `width`
pub fn pointer_to_target_x(fraction: f32, width: f32, tuning: &Tuning) -> f32 {
    let f = fraction.clamp(0.0, 1.0);
    let limit = tuning.paddle_limit(width);
    ((2.0 * f - 1.0) * tuning.boundary_x).clamp(-limit, limit)
}

/// Accumulated input between simulation steps
#[derive(Debug, Clone, Default)]
pub struct InputState {
    left_held: bool,
    right_held: bool,
    target_x: Option<f32>,
    launch: bool,
    pause: bool,
    autopilot: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a key press. Returns true if the key is bound.
    pub fn key_down(&mut self, key: &str) -> bool {
        let Some(action) = KeyAction::from_key(key) else {
            return false;
        };
        match action {
            KeyAction::Left => {
                self.left_held = true;
                // Keys take over from the pointer
                self.target_x = None;
            }
            KeyAction::Right => {
                self.right_held = true;
                self.target_x = None;
            }
            KeyAction::Launch => self.launch = true,
            KeyAction::Pause => self.pause = true,
            KeyAction::ToggleAutopilot => {
                self.autopilot = !self.autopilot;
                log::info!("Autopilot: {}", self.autopilot);
            }
        }
        true
    }

    pub fn key_up(&mut self, key: &str) {
        match KeyAction::from_key(key) {
            Some(KeyAction::Left) => self.left_held = false,
            Some(KeyAction::Right) => self.right_held = false,
            _ => {}
        }
    }

    /// Pointer or touch moved to `fraction` across the play surface
    pub fn pointer_at(&mut self, fraction: f32, paddle_width: f32, tuning: &Tuning) {
        self.target_x = Some(pointer_to_target_x(fraction, paddle_width, tuning));
    }

    /// Pointer left the surface or the touch ended
    pub fn pointer_released(&mut self) {
        self.target_x = None;
    }

    /// Click or tap
    pub fn tap(&mut self) {
        self.launch = true;
    }

    /// Pause from outside the keyboard (menu button, focus loss)
    pub fn request_pause(&mut self) {
        self.pause = true;
    }

    pub fn autopilot(&self) -> bool {
        self.autopilot
    }

    pub fn set_autopilot(&mut self, on: bool) {
        self.autopilot = on;
    }

    /// Input for the next simulation step
    pub fn tick_input(&self) -> TickInput {
        TickInput {
            left: self.left_held,
            right: self.right_held,
            target_x: self.target_x,
            launch: self.launch,
            pause: self.pause,
            autopilot: self.autopilot,
        }
    }

    /// Clear one-shot inputs after a step consumed them
    pub fn clear_one_shots(&mut self) {
        self.launch = false;
        self.pause = false;
    }

    /// Forget everything except the autopilot toggle
    pub fn reset(&mut self) {
        *self = Self {
            autopilot: self.autopilot,
            ..Self::default()
        };
    }
}

//! Brick layout generation
//!
//! Each level picks a pattern that decides which grid cells hold bricks and
//! how tough they are. On top of the pattern every populated cell rolls for
//! a special multi-ball or item brick.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::{Brick, BrickKind, GameState};
use crate::tuning::Tuning;

/// Named grid patterns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// Every cell, single-hit bricks
    Grid,
    /// Alternating cells omitted
    Checkerboard,
    /// Full grid with a 3-hit core inside a 2-hit ring
    Fortress,
    /// Manhattan-distance diamond: 3-hit core, hollow band, 2-hit shell
    Diamond,
}

/// Pattern used for a (non-boss) level
pub fn pattern_for_level(level: u32) -> Pattern {
    match level {
        0 | 1 => Pattern::Grid,
        2 => Pattern::Checkerboard,
        3 => Pattern::Fortress,
        _ => Pattern::Diamond,
    }
}

/// Grid rows for a level (grows with the level, capped)
pub fn rows_for_level(level: u32, tuning: &Tuning) -> u32 {
    (level + 2).min(tuning.max_brick_rows)
}

/// Layout-determined kind for a cell, or None if the cell stays empty
pub fn cell_kind(pattern: Pattern, row: u32, col: u32, rows: u32, cols: u32) -> Option<BrickKind> {
    match pattern {
        Pattern::Grid => Some(BrickKind::Normal),
        Pattern::Checkerboard => ((row + col) % 2 == 0).then_some(BrickKind::Normal),
        Pattern::Fortress => {
            let on_ring = row == 0 || col == 0 || row + 1 == rows || col + 1 == cols;
            Some(if on_ring {
                BrickKind::Hard
            } else {
                BrickKind::Armored
            })
        }
        Pattern::Diamond => {
            let center_r = (rows as f32 - 1.0) / 2.0;
            let center_c = (cols as f32 - 1.0) / 2.0;
            let d = (row as f32 - center_r).abs() + (col as f32 - center_c).abs();
            if d <= 1.0 {
                Some(BrickKind::Armored)
            } else if d <= 2.0 {
                None // hollow band
            } else if d <= 4.0 {
                Some(BrickKind::Hard)
            } else {
                None
            }
        }
    }
}

/// World-space center of a grid cell
pub fn cell_center(row: u32, col: u32, cols: u32, tuning: &Tuning) -> Vec2 {
    let step_x = tuning.brick_width + tuning.brick_padding;
    let step_y = tuning.brick_height + tuning.brick_padding;
    let start_x = -((cols as f32 - 1.0) * step_x) / 2.0;
    Vec2::new(
        start_x + col as f32 * step_x,
        tuning.brick_start_y + row as f32 * step_y,
    )
}

/// Populate `state.bricks` for a brick level. Returns the pattern used.
pub fn build_level(state: &mut GameState, level: u32) -> Pattern {
    let pattern = pattern_for_level(level);
    let rows = rows_for_level(level, &state.tuning);
    let cols = state.tuning.brick_cols;
    let size = Vec2::new(state.tuning.brick_width, state.tuning.brick_height);

    state.bricks.clear();
    for row in 0..rows {
        for col in 0..cols {
            let Some(mut kind) = cell_kind(pattern, row, col, rows, cols) else {
                continue;
            };

            // Special bricks override the layout kind
            let roll: f32 = state.rng.random();
            if roll < state.tuning.multi_ball_chance {
                kind = BrickKind::MultiBall;
            } else if roll < state.tuning.multi_ball_chance + state.tuning.item_chance {
                kind = BrickKind::Item;
            }

            let pos = cell_center(row, col, cols, &state.tuning);
            let id = state.next_entity_id();
            state.bricks.push(Brick::new(id, kind, pos, size));
        }
    }

    log::info!(
        "Level {}: {:?} layout, {}x{} grid, {} bricks",
        level,
        pattern,
        rows,
        cols,
        state.bricks.len()
    );
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain_tuning() -> Tuning {
        Tuning {
            multi_ball_chance: 0.0,
            item_chance: 0.0,
            ..Default::default()
        }
    }

    fn count_kind(state: &GameState, kind: BrickKind) -> usize {
        state.bricks.iter().filter(|b| b.kind == kind).count()
    }

    #[test]
    fn test_patterns_by_level() {
        assert_eq!(pattern_for_level(1), Pattern::Grid);
        assert_eq!(pattern_for_level(2), Pattern::Checkerboard);
        assert_eq!(pattern_for_level(3), Pattern::Fortress);
        assert_eq!(pattern_for_level(4), Pattern::Diamond);
    }

    #[test]
    fn test_grid_level_one() {
        let mut state = GameState::with_tuning(1, plain_tuning());
        build_level(&mut state, 1);
        // 3 rows x 6 cols
        assert_eq!(state.bricks.len(), 18);
        assert_eq!(count_kind(&state, BrickKind::Normal), 18);
        assert!(state.bricks.iter().all(|b| b.hp == 1 && b.active));
    }

    #[test]
    fn test_checkerboard_omits_half() {
        let mut state = GameState::with_tuning(1, plain_tuning());
        build_level(&mut state, 2);
        // 4 rows x 6 cols, half populated
        assert_eq!(state.bricks.len(), 12);
    }

    #[test]
    fn test_fortress_core() {
        let mut state = GameState::with_tuning(1, plain_tuning());
        build_level(&mut state, 3);
        // 5 rows x 6 cols; interior is 3 x 4
        assert_eq!(state.bricks.len(), 30);
        assert_eq!(count_kind(&state, BrickKind::Armored), 12);
        assert_eq!(count_kind(&state, BrickKind::Hard), 18);
        assert!(state
            .bricks
            .iter()
            .filter(|b| b.kind == BrickKind::Armored)
            .all(|b| b.hp == 3));
    }

    #[test]
    fn test_diamond_is_hollow() {
        let mut state = GameState::with_tuning(1, plain_tuning());
        build_level(&mut state, 4);
        // 6x6 grid centered at (2.5, 2.5): core d=1 has 4 cells,
        // d=2 band (8 cells) is hollow, shell d=3..4 has 12 + 8 cells
        assert_eq!(count_kind(&state, BrickKind::Armored), 4);
        assert_eq!(count_kind(&state, BrickKind::Hard), 20);
        assert_eq!(state.bricks.len(), 24);
    }

    #[test]
    fn test_specials_override_layout() {
        let tuning = Tuning {
            multi_ball_chance: 1.0,
            ..Default::default()
        };
        let mut state = GameState::with_tuning(1, tuning);
        build_level(&mut state, 3);
        assert!(state.bricks.iter().all(|b| b.kind == BrickKind::MultiBall && b.hp == 1));
    }

    #[test]
    fn test_specials_are_rare() {
        let mut state = GameState::new(2024);
        let mut specials = 0;
        let mut total = 0;
        for _ in 0..50 {
            build_level(&mut state, 1);
            total += state.bricks.len();
            specials += state
                .bricks
                .iter()
                .filter(|b| matches!(b.kind, BrickKind::MultiBall | BrickKind::Item))
                .count();
        }
        // ~10% expected
        let ratio = specials as f32 / total as f32;
        assert!(ratio > 0.03 && ratio < 0.2, "special ratio {ratio}");
    }

    #[test]
    fn test_grid_is_centered_and_below_ceiling() {
        let tuning = Tuning::default();
        let left = cell_center(0, 0, 6, &tuning);
        let right = cell_center(0, 5, 6, &tuning);
        assert!((left.x + right.x).abs() < 1e-5);
        let top = cell_center(tuning.max_brick_rows - 1, 0, 6, &tuning);
        assert!(top.y + tuning.brick_height / 2.0 < tuning.boundary_y);
    }
}

//! Touch position to numpad key
//!
//! Grid cells are computed from the raw touch coordinates and the
//! touchpad's maximum X/Y. Anything outside the grid (the reserved band
//! above the first row, or edges past the last row/col) is simply no key.

use crate::constants::{
    SECONDARY_REGION_MAX_X, SECONDARY_REGION_MAX_Y, TOGGLE_REGION_MAX_Y, TOGGLE_REGION_MIN_X,
};
use crate::input::{KeyCode, TouchBounds};
use crate::layout::Layout;

/// Fixed control corners of the touch surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    /// Top-right: advance to the next mode
    Toggle,
    /// Top-left: brightness (numpad) or calculator
    Secondary,
}

/// Control corner hit by (x, y), if any
pub fn region_at(x: i32, y: i32, bounds: &TouchBounds) -> Option<Region> {
    let (x, y) = (x as f64, y as f64);
    let (max_x, max_y) = (bounds.max_x as f64, bounds.max_y as f64);

    if x > TOGGLE_REGION_MIN_X * max_x && y < TOGGLE_REGION_MAX_Y * max_y {
        Some(Region::Toggle)
    } else if x < SECONDARY_REGION_MAX_X * max_x && y < SECONDARY_REGION_MAX_Y * max_y {
        Some(Region::Secondary)
    } else {
        None
    }
}

/// Raw grid cell; the row is negative inside the top offset band
pub fn cell_at(x: i32, y: i32, layout: &Layout, bounds: &TouchBounds) -> (i64, i64) {
    let col = (layout.cols as f64 * x as f64 / (bounds.max_x as f64 + 1.0)).floor();
    let row = (layout.rows as f64 * y as f64 / bounds.max_y as f64 - layout.top_offset).floor();
    (row as i64, col as i64)
}

/// Key under (x, y), or None for an unmapped position
pub fn key_at(x: i32, y: i32, layout: &Layout, bounds: &TouchBounds) -> Option<KeyCode> {
    let (row, col) = cell_at(x, y, layout, bounds);
    layout.key_at(row, col)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::keycodes::*;
    use std::time::Duration;

    fn bounds() -> TouchBounds {
        TouchBounds {
            min_x: 0,
            max_x: 1000,
            min_y: 0,
            max_y: 1000,
        }
    }

    fn grid_4x3(top_offset: f64) -> Layout {
        Layout::new(
            "test",
            top_offset,
            vec![
                vec![KEY_KP7, KEY_KP8, KEY_KP9],
                vec![KEY_KP4, KEY_KP5, KEY_KP6],
                vec![KEY_KP1, KEY_KP2, KEY_KP3],
                vec![KEY_KP0, KEY_KPDOT, KEY_KPENTER],
            ],
            1,
            Duration::ZERO,
        )
        .unwrap()
    }

    #[test]
    fn test_center_touch_maps_to_middle_key() {
        // col = floor(3*500/1001) = 1, row = floor(4*250/1000) = 1
        let layout = grid_4x3(0.0);
        assert_eq!(cell_at(500, 250, &layout, &bounds()), (1, 1));
        assert_eq!(key_at(500, 250, &layout, &bounds()), Some(layout.keys[1][1]));
    }

    #[test]
    fn test_max_x_stays_in_last_column() {
        let layout = grid_4x3(0.0);
        assert_eq!(cell_at(1000, 0, &layout, &bounds()).1, 2);
    }

    #[test]
    fn test_max_y_is_unmapped() {
        // rows*max_y/max_y = rows, one past the last row
        let layout = grid_4x3(0.0);
        assert_eq!(cell_at(0, 1000, &layout, &bounds()).0, 4);
        assert_eq!(key_at(0, 1000, &layout, &bounds()), None);
    }

    #[test]
    fn test_offset_band_is_unmapped() {
        let layout = grid_4x3(0.5);
        // 4*100/1000 - 0.5 = -0.1 -> row -1
        assert_eq!(cell_at(500, 100, &layout, &bounds()).0, -1);
        assert_eq!(key_at(500, 100, &layout, &bounds()), None);
        // 4*200/1000 - 0.5 = 0.3 -> row 0
        assert_eq!(key_at(500, 200, &layout, &bounds()), Some(KEY_KP8));
    }

    #[test]
    fn test_negative_offset_shifts_rows_down() {
        let layout = grid_4x3(-1.0);
        assert_eq!(key_at(0, 0, &layout, &bounds()), Some(KEY_KP4));
        assert_eq!(key_at(0, 800, &layout, &bounds()), None);
    }

    #[test]
    fn test_same_cell_same_key() {
        let layout = grid_4x3(0.0);
        let a = key_at(340, 260, &layout, &bounds());
        let b = key_at(600, 480, &layout, &bounds());
        assert_eq!(cell_at(340, 260, &layout, &bounds()), cell_at(600, 480, &layout, &bounds()));
        assert_eq!(a, b);
    }

    #[test]
    fn test_every_out_of_grid_cell_is_none() {
        let layout = grid_4x3(0.3);
        for x in (-50..=1100).step_by(25) {
            for y in (-50..=1100).step_by(25) {
                let (row, col) = cell_at(x, y, &layout, &bounds());
                let outside = row < 0 || row >= 4 || col < 0 || col >= 3;
                assert_eq!(key_at(x, y, &layout, &bounds()).is_none(), outside);
            }
        }
    }

    #[test]
    fn test_regions() {
        let b = bounds();
        assert_eq!(region_at(980, 50, &b), Some(Region::Toggle));
        assert_eq!(region_at(950, 50, &b), None);
        assert_eq!(region_at(980, 90, &b), None);
        assert_eq!(region_at(30, 30, &b), Some(Region::Secondary));
        assert_eq!(region_at(60, 30, &b), None);
        assert_eq!(region_at(500, 500, &b), None);
    }
}

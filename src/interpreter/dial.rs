//! Dial angle math
//!
//! Angles are measured around the dial pivot and normalised into [0, 2π).
//! A point on top of the pivot has no angle.

use std::f64::consts::{PI, TAU};

/// Dial centre and radius in touchpad coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DialPivot {
    pub x: i32,
    pub y: i32,
    pub radius: i32,
}

impl DialPivot {
    /// Whether (x, y) lies on the dial face
    pub fn contains(&self, x: i32, y: i32) -> bool {
        let dx = x as f64 - self.x as f64;
        let dy = y as f64 - self.y as f64;
        dx.hypot(dy) <= self.radius as f64
    }
}

/// Polar angle of (x, y) around (ox, oy): π + sign(dy)·acos(dx/r)
pub fn get_angle(ox: i32, oy: i32, x: i32, y: i32) -> Option<f64> {
    // f64 so pivots far outside the touch surface cannot overflow
    let dx = x as f64 - ox as f64;
    let dy = y as f64 - oy as f64;
    let r = dx.hypot(dy);
    if r == 0.0 {
        return None;
    }
    let sign = if dy < 0.0 { -1.0 } else { 1.0 };
    // clamp guards acos against rounding just past ±1
    let angle = PI + sign * (dx / r).clamp(-1.0, 1.0).acos();
    Some(angle.rem_euclid(TAU))
}

/// Net rotation from start to current, in [0, 2π). Zero if either is undefined.
pub fn angle_delta(start: Option<f64>, current: Option<f64>) -> f64 {
    match (start, current) {
        (Some(s), Some(c)) => (c - s).rem_euclid(TAU),
        _ => 0.0,
    }
}

/// Shortest signed step between two angles, in (-π, π]
pub fn signed_step(from: f64, to: f64) -> f64 {
    let step = (to - from).rem_euclid(TAU);
    if step > PI {
        step - TAU
    } else {
        step
    }
}

//! Data-driven game balance
//!
//! Physics is expressed per tick (one animation frame), spawning in
//! milliseconds. The defaults are the classic flappy constants.

use serde::{Deserialize, Serialize};

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Downward acceleration (px/tick²)
    pub gravity: f32,
    /// Velocity set by a jump (negative = upward, px/tick)
    pub jump_force: f32,
    /// Leftward obstacle speed (px/tick)
    pub pipe_speed: f32,
    /// Obstacle width (px)
    pub pipe_width: f32,
    /// Time between spawns (ms)
    pub pipe_frequency_ms: f32,
    /// Smallest navigable gap (px)
    pub min_gap: f32,
    /// Largest navigable gap (px)
    pub max_gap: f32,
    /// Keep-out band above and below every gap (px)
    pub spawn_margin: f32,
    /// Collision box scale relative to the sprite box
    pub hitbox_scale: f32,
    pub player_width: f32,
    pub player_height: f32,
    /// Fixed horizontal player position (px)
    pub player_start_x: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            jump_force: -10.0,
            pipe_speed: 2.0,
            pipe_width: 80.0,
            pipe_frequency_ms: 1500.0,
            min_gap: 100.0,
            max_gap: 400.0,
            spawn_margin: 50.0,
            hitbox_scale: 0.5,
            player_width: 40.0,
            player_height: 30.0,
            player_start_x: 100.0,
        }
    }
}

impl Tuning {
    /// Ticks an obstacle needs to travel its own width
    pub fn ticks_per_pipe_width(&self) -> u32 {
        if self.pipe_speed <= 0.0 {
            return u32::MAX;
        }
        (self.pipe_width / self.pipe_speed).ceil() as u32
    }
}

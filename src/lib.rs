//! Flappy Fish - An underwater tap-to-swim arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, spawning, collisions, scoring)
//! - `clock`: Frame loop driver over a pluggable scheduler
//! - `app`: Controller composing the simulation, loop and high score
//! - `renderer`: WebGPU rendering pipeline
//! - `platform`: Input mapping and browser glue
//! - `persistence`: Key/value storage (LocalStorage on web)
//! - `scores` / `ranking`: Score repository and live leaderboard feed
//! - `tuning`: Data-driven game balance

pub mod app;
pub mod clock;
pub mod highscore;
pub mod persistence;
pub mod platform;
pub mod ranking;
pub mod renderer;
pub mod scores;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use app::{App, FinishedGame, FrameOutcome};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Nominal frame time at 60 Hz (ms)
    pub const FRAME_DT_MS: f32 = 1000.0 / 60.0;
    /// Longest frame delta fed to the simulation (ms)
    pub const MAX_FRAME_DT_MS: f32 = 100.0;

    /// Viewport used before the canvas reports its size
    pub const DEFAULT_VIEWPORT_WIDTH: f32 = 800.0;
    pub const DEFAULT_VIEWPORT_HEIGHT: f32 = 600.0;

    pub const DEFAULT_PLAYER_NAME: &str = "Player";
}

//! Game simulation module
//!
//! All gameplay logic lives here. This module must stay platform-free:
//! - One tick per animation frame, physics in px/tick
//! - Seeded RNG only
//! - Obstacles kept in spawn order
//! - No rendering, storage or network dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{PipeHit, Rect, hitbox, obstacle_collision};
pub use state::{
    GameEvent, GameOverCause, GamePhase, GameState, Obstacle, Player, Snapshot, Viewport,
};
pub use tick::tick;

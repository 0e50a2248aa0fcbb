//! Game state and core simulation types
//!
//! The store owns the player, the obstacle queue and the score bookkeeping.
//! Commands return the event they caused, or `None` when they were not
//! valid in the current phase.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use crate::consts::DEFAULT_PLAYER_NAME;
use crate::highscore::is_new_high_score;
use crate::tuning::Tuning;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for a name, nothing simulated yet
    #[default]
    Idle,
    /// Active gameplay
    Playing,
    /// Frozen until resumed
    Paused,
    /// Session ended, waiting for a restart
    GameOver,
}

/// Playfield size in CSS pixels (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(
            crate::consts::DEFAULT_VIEWPORT_WIDTH,
            crate::consts::DEFAULT_VIEWPORT_HEIGHT,
        )
    }
}

/// The fish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Vertical velocity (px/tick, positive = down)
    pub velocity: f32,
    pub width: f32,
    pub height: f32,
}

impl Player {
    /// Fresh player, vertically centred
    pub fn spawn(tuning: &Tuning, viewport: Viewport) -> Self {
        Self {
            x: tuning.player_start_x,
            y: viewport.height / 2.0,
            velocity: 0.0,
            width: tuning.player_width,
            height: tuning.player_height,
        }
    }

    /// Lowest legal y for this viewport
    pub fn max_y(&self, viewport: Viewport) -> f32 {
        (viewport.height - self.height).max(0.0)
    }

    /// Sprite bounding box
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// A pipe pair with a navigable gap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Left edge
    pub x: f32,
    /// Bottom of the top segment / top of the gap
    pub top: f32,
    pub width: f32,
    /// Gap height
    pub gap: f32,
    /// Already counted toward the score
    pub scored: bool,
}

impl Obstacle {
    pub fn new(x: f32, top: f32, width: f32, gap: f32) -> Self {
        Self {
            x,
            top,
            width,
            gap,
            scored: false,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Top of the bottom segment
    pub fn gap_bottom(&self) -> f32 {
        self.top + self.gap
    }

    /// Fully past the left edge of the screen
    pub fn is_off_screen(&self) -> bool {
        self.x <= -self.width
    }
}

/// What ended a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverCause {
    Ceiling,
    Floor,
    TopPipe,
    BottomPipe,
}

/// State transitions and notable simulation moments
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Started { name: String },
    Jumped,
    Paused,
    Resumed,
    ObstacleSpawned { top: f32, gap: f32 },
    Scored { score: u64 },
    GameOver {
        cause: GameOverCause,
        score: u64,
        high_score: u64,
        new_high_score: bool,
    },
}

/// Read-only view handed to the renderer and HUD each frame
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub player: &'a Player,
    pub obstacles: &'a [Obstacle],
    pub score: u64,
    pub high_score: u64,
    pub player_name: &'a str,
    pub viewport: Viewport,
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Balance constants
    pub tuning: Tuning,
    pub(crate) viewport: Viewport,
    pub(crate) phase: GamePhase,
    pub(crate) player: Player,
    /// Live obstacles in spawn order (left to right)
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) score: u64,
    pub(crate) high_score: u64,
    pub(crate) player_name: String,
    /// Playing time accumulated since the last spawn (ms)
    pub(crate) since_spawn_ms: f32,
    /// Ticks simulated this session
    pub(crate) time_ticks: u64,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create an idle store seeded for obstacle placement
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport, high_score: u64) -> Self {
        let player = Player::spawn(&tuning, viewport);
        Self {
            tuning,
            viewport,
            phase: GamePhase::Idle,
            player,
            obstacles: Vec::new(),
            score: 0,
            high_score,
            player_name: DEFAULT_PLAYER_NAME.to_string(),
            since_spawn_ms: 0.0,
            time_ticks: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Begin a fresh session for `name`
    pub fn start(&mut self, name: &str) -> GameEvent {
        self.player_name = name.to_string();
        self.score = 0;
        self.player = Player::spawn(&self.tuning, self.viewport);
        self.obstacles.clear();
        self.since_spawn_ms = 0.0;
        self.time_ticks = 0;
        self.phase = GamePhase::Playing;
        log::info!("Session started for {}", self.player_name);
        GameEvent::Started {
            name: self.player_name.clone(),
        }
    }

    /// Start again with the last known name
    pub fn restart(&mut self) -> GameEvent {
        let name = self.player_name.clone();
        self.start(&name)
    }

    /// Swim upward while playing; tap-to-restart after game over
    pub fn jump(&mut self) -> Option<GameEvent> {
        match self.phase {
            GamePhase::Playing => {
                self.player.velocity = self.tuning.jump_force;
                Some(GameEvent::Jumped)
            }
            GamePhase::GameOver => Some(self.restart()),
            GamePhase::Idle | GamePhase::Paused => None,
        }
    }

    pub fn pause(&mut self) -> Option<GameEvent> {
        if self.phase != GamePhase::Playing {
            return None;
        }
        self.phase = GamePhase::Paused;
        log::info!("Paused at score {}", self.score);
        Some(GameEvent::Paused)
    }

    /// Spawn timing only accumulates playing time, so nothing is re-armed
    /// here beyond the phase; the loop driver drops its last timestamp.
    pub fn resume(&mut self) -> Option<GameEvent> {
        if self.phase != GamePhase::Paused {
            return None;
        }
        self.phase = GamePhase::Playing;
        log::info!("Resumed");
        Some(GameEvent::Resumed)
    }

    /// Enter the terminal game-over phase, promoting the high score if beaten
    pub(crate) fn finish(&mut self, cause: GameOverCause) -> GameEvent {
        self.phase = GamePhase::GameOver;
        let new_high_score = is_new_high_score(self.high_score, self.score);
        if new_high_score {
            self.high_score = self.score;
        }
        log::info!(
            "Game over ({:?}) for {} with score {} (best {})",
            cause,
            self.player_name,
            self.score,
            self.high_score
        );
        GameEvent::GameOver {
            cause,
            score: self.score,
            high_score: self.high_score,
            new_high_score,
        }
    }

    /// Raise the displayed best to a score seen elsewhere (leaderboard top)
    pub fn observe_best(&mut self, points: u64) -> bool {
        if !is_new_high_score(self.high_score, points) {
            return false;
        }
        self.high_score = points;
        true
    }

    /// Track a window resize; the player is re-clamped on the next tick
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            player: &self.player,
            obstacles: &self.obstacles,
            score: self.score,
            high_score: self.high_score,
            player_name: &self.player_name,
            viewport: self.viewport,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }
}

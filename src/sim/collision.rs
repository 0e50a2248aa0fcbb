//! Collision detection and pass scoring
//!
//! Everything is axis-aligned: the fish collides through a shrunk hitbox so
//! grazing a pipe with a fin does not end the run.

use glam::Vec2;

use super::state::{GameOverCause, Obstacle, Player};

/// Axis-aligned rectangle in screen space (y down)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Same centre, each side scaled by `scale`
    pub fn scaled(&self, scale: f32) -> Self {
        let half = self.size() * scale * 0.5;
        let c = self.center();
        Self {
            min: c - half,
            max: c + half,
        }
    }

    /// Open-interval overlap with the horizontal span `[left, right]`
    #[inline]
    pub fn overlaps_x(&self, left: f32, right: f32) -> bool {
        self.max.x > left && self.min.x < right
    }
}

/// Which pipe segment was hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipeHit {
    Top,
    Bottom,
}

impl From<PipeHit> for GameOverCause {
    fn from(hit: PipeHit) -> Self {
        match hit {
            PipeHit::Top => GameOverCause::TopPipe,
            PipeHit::Bottom => GameOverCause::BottomPipe,
        }
    }
}

/// Collision box for the player
pub fn hitbox(player: &Player, scale: f32) -> Rect {
    player.bounds().scaled(scale)
}

/// Whether a clamped y sits on the ceiling or the floor
pub fn boundary_contact(y: f32, max_y: f32) -> Option<GameOverCause> {
    if y <= 0.0 {
        Some(GameOverCause::Ceiling)
    } else if y >= max_y {
        Some(GameOverCause::Floor)
    } else {
        None
    }
}

/// Check the hitbox against one obstacle, top segment first
pub fn obstacle_collision(hitbox: &Rect, obstacle: &Obstacle) -> Option<PipeHit> {
    if !hitbox.overlaps_x(obstacle.x, obstacle.right()) {
        return None;
    }
    if hitbox.min.y < obstacle.top {
        Some(PipeHit::Top)
    } else if hitbox.max.y > obstacle.gap_bottom() {
        Some(PipeHit::Bottom)
    } else {
        None
    }
}

/// First obstacle (in creation order) the hitbox touches
pub fn first_collision(hitbox: &Rect, obstacles: &[Obstacle]) -> Option<PipeHit> {
    obstacles
        .iter()
        .find_map(|obstacle| obstacle_collision(hitbox, obstacle))
}

/// Obstacle's right edge is behind the player's x
#[inline]
pub fn has_passed(obstacle: &Obstacle, player_x: f32) -> bool {
    obstacle.right() < player_x
}

/// Mark newly passed obstacles as scored, returning how many flipped
pub fn award_passed(obstacles: &mut [Obstacle], player_x: f32) -> u64 {
    let mut awarded = 0;
    for obstacle in obstacles.iter_mut() {
        if !obstacle.scored && has_passed(obstacle, player_x) {
            obstacle.scored = true;
            awarded += 1;
        }
    }
    awarded
}

//! Snapshot to triangle list
//!
//! Pure geometry in viewport pixels; the pipeline maps to clip space.

use glam::Vec2;

use super::shapes::{circle, ellipse, gradient_rect, rect, triangle};
use super::vertex::{Vertex, colors};
use crate::sim::{GamePhase, Obstacle, Player, Snapshot};

const LIP_HEIGHT: f32 = 16.0;
const LIP_OVERHANG: f32 = 4.0;
const SAND_HEIGHT: f32 = 6.0;
const FISH_SEGMENTS: u32 = 20;

/// Build the full frame for `snapshot`
pub fn build_scene(snapshot: &Snapshot) -> Vec<Vertex> {
    let viewport = snapshot.viewport;
    let size = Vec2::new(viewport.width, viewport.height);

    let mut vertices = gradient_rect(Vec2::ZERO, size, colors::WATER_TOP, colors::WATER_BOTTOM);
    vertices.extend(rect(
        Vec2::new(0.0, viewport.height - SAND_HEIGHT),
        Vec2::new(viewport.width, SAND_HEIGHT),
        colors::SAND,
    ));

    for obstacle in snapshot.obstacles {
        vertices.extend(pipe_pair(obstacle, viewport.height));
    }

    vertices.extend(fish(snapshot.player));

    if matches!(snapshot.phase, GamePhase::Paused | GamePhase::GameOver) {
        vertices.extend(rect(Vec2::ZERO, size, colors::DIM_OVERLAY));
    }

    vertices
}

/// Top and bottom segments around the gap, each with a lip at the gap edge
pub fn pipe_pair(obstacle: &Obstacle, height: f32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(24);
    let x = obstacle.x;
    let w = obstacle.width;
    let bottom_y = obstacle.gap_bottom();

    vertices.extend(rect(Vec2::new(x, 0.0), Vec2::new(w, obstacle.top), colors::PIPE));
    vertices.extend(rect(
        Vec2::new(x, bottom_y),
        Vec2::new(w, height - bottom_y),
        colors::PIPE,
    ));

    let lip_w = w + LIP_OVERHANG * 2.0;
    let lip_h = LIP_HEIGHT.min(obstacle.top);
    vertices.extend(rect(
        Vec2::new(x - LIP_OVERHANG, obstacle.top - lip_h),
        Vec2::new(lip_w, lip_h),
        colors::PIPE_LIP,
    ));
    let lip_h = LIP_HEIGHT.min(height - bottom_y);
    vertices.extend(rect(
        Vec2::new(x - LIP_OVERHANG, bottom_y),
        Vec2::new(lip_w, lip_h),
        colors::PIPE_LIP,
    ));

    vertices
}

/// Body, tail and eye inside the player's bounding box
pub fn fish(player: &Player) -> Vec<Vertex> {
    let bounds = player.bounds();
    let center = bounds.center();
    let half = bounds.size() * 0.5;

    // Body takes the front 80%, tail the rest
    let body_center = Vec2::new(center.x + half.x * 0.2, center.y);
    let body_radii = Vec2::new(half.x * 0.8, half.y);

    let mut vertices = ellipse(body_center, body_radii, colors::FISH_BODY, FISH_SEGMENTS);

    let tail_root = Vec2::new(body_center.x - body_radii.x * 0.8, center.y);
    vertices.extend(triangle(
        tail_root,
        Vec2::new(bounds.min.x, bounds.min.y),
        Vec2::new(bounds.min.x, bounds.max.y),
        colors::FISH_TAIL,
    ));

    let eye = Vec2::new(body_center.x + body_radii.x * 0.5, center.y - half.y * 0.3);
    vertices.extend(circle(eye, half.y * 0.18, colors::FISH_EYE, 8));

    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{GameState, Viewport};
    use crate::tuning::Tuning;

    fn bounds_of(vertices: &[Vertex]) -> (Vec2, Vec2) {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for v in vertices {
            let p = Vec2::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    #[test]
    fn test_fish_stays_in_player_box() {
        let player = Player {
            x: 100.0,
            y: 200.0,
            velocity: 0.0,
            width: 40.0,
            height: 30.0,
        };
        let (min, max) = bounds_of(&fish(&player));
        assert!(min.x >= 100.0 - 1e-3 && min.y >= 200.0 - 1e-3);
        assert!(max.x <= 140.0 + 1e-3 && max.y <= 230.0 + 1e-3);
    }

    #[test]
    fn test_pipe_pair_leaves_gap_open() {
        let obstacle = Obstacle::new(300.0, 150.0, 80.0, 200.0);
        let vertices = pipe_pair(&obstacle, 600.0);
        assert_eq!(vertices.len(), 24);
        // No vertex strictly inside the gap
        for v in &vertices {
            let y = v.position[1];
            assert!(y <= 150.0 || y >= 350.0, "vertex inside gap at y={y}");
        }
    }

    #[test]
    fn test_pipe_at_screen_top_drops_empty_lip() {
        let obstacle = Obstacle::new(300.0, 0.0, 80.0, 200.0);
        // Top segment and its lip are empty
        assert_eq!(pipe_pair(&obstacle, 600.0).len(), 12);
    }

    #[test]
    fn test_overlay_only_when_not_playing() {
        let mut state = GameState::new(1, Tuning::default(), Viewport::new(800.0, 600.0), 0);
        state.start("Ann");
        let playing = build_scene(&state.snapshot()).len();

        state.pause();
        let paused = build_scene(&state.snapshot()).len();
        assert_eq!(paused, playing + 6);
    }

    #[test]
    fn test_scene_grows_with_obstacles() {
        let mut state = GameState::new(1, Tuning::default(), Viewport::new(800.0, 600.0), 0);
        state.start("Ann");
        let empty = build_scene(&state.snapshot()).len();
        state.obstacles.push(Obstacle::new(500.0, 120.0, 80.0, 180.0));
        assert_eq!(build_scene(&state.snapshot()).len(), empty + 24);
    }
}

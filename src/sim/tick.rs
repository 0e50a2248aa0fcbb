//! Per-frame simulation tick
//!
//! Order is fixed: player, obstacles (with pass scoring), collisions, spawn.
//! Collisions therefore always see this tick's post-movement positions.

use super::collision::{award_passed, boundary_contact, first_collision, hitbox};
use super::spawn::spawn_obstacle;
use super::state::{GameEvent, GameOverCause, GamePhase, GameState};

/// Advance the session by one frame of `dt_ms` milliseconds.
///
/// Does nothing unless the session is playing. Returns the events raised
/// during the tick; a game over is always the last one.
pub fn tick(state: &mut GameState, dt_ms: f32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.phase != GamePhase::Playing {
        return events;
    }

    state.time_ticks += 1;

    // Player
    if let Some(cause) = integrate_player(state) {
        events.push(state.finish(cause));
        return events;
    }

    // Obstacles
    advance_obstacles(state);
    let awarded = award_passed(&mut state.obstacles, state.player.x);
    for _ in 0..awarded {
        state.score += 1;
        log::debug!("Scored: {}", state.score);
        events.push(GameEvent::Scored { score: state.score });
    }

    // Collisions
    let hb = hitbox(&state.player, state.tuning.hitbox_scale);
    if let Some(hit) = first_collision(&hb, &state.obstacles) {
        events.push(state.finish(hit.into()));
        return events;
    }

    // Spawning
    if let Some(event) = update_spawner(state, dt_ms) {
        events.push(event);
    }

    events
}

/// Gravity, integration and clamping. Returns the boundary touched, if any.
fn integrate_player(state: &mut GameState) -> Option<GameOverCause> {
    let max_y = state.player.max_y(state.viewport);
    let player = &mut state.player;
    player.velocity += state.tuning.gravity;
    player.y = (player.y + player.velocity).clamp(0.0, max_y);
    boundary_contact(player.y, max_y)
}

/// Scroll every obstacle left and drop the ones fully off screen
fn advance_obstacles(state: &mut GameState) {
    let speed = state.tuning.pipe_speed;
    for obstacle in state.obstacles.iter_mut() {
        obstacle.x -= speed;
    }
    state.obstacles.retain(|o| !o.is_off_screen());
}

/// Accumulate playing time and append an obstacle once the period elapses
fn update_spawner(state: &mut GameState, dt_ms: f32) -> Option<GameEvent> {
    state.since_spawn_ms += dt_ms;
    if state.since_spawn_ms <= state.tuning.pipe_frequency_ms {
        return None;
    }
    state.since_spawn_ms = 0.0;

    let obstacle = spawn_obstacle(&mut state.rng, &state.tuning, state.viewport);
    log::debug!(
        "Spawned obstacle top={:.1} gap={:.1}",
        obstacle.top,
        obstacle.gap
    );
    state.obstacles.push(obstacle);
    Some(GameEvent::ObstacleSpawned {
        top: obstacle.top,
        gap: obstacle.gap,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_DT_MS;
    use crate::sim::state::{Obstacle, Viewport};
    use crate::tuning::Tuning;
    use proptest::prelude::*;

    fn playing(seed: u64) -> GameState {
        let mut state = GameState::new(seed, Tuning::default(), Viewport::new(800.0, 600.0), 0);
        state.start("Ann");
        state
    }

    fn game_overs(events: &[GameEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::GameOver { .. }))
            .count()
    }

    #[test]
    fn test_idle_and_paused_do_not_tick() {
        let mut state = GameState::new(1, Tuning::default(), Viewport::default(), 0);
        let before = *state.player();
        assert!(tick(&mut state, FRAME_DT_MS).is_empty());
        assert_eq!(*state.player(), before);

        let mut state = playing(1);
        state.obstacles.push(Obstacle::new(400.0, 100.0, 80.0, 300.0));
        state.pause();
        let player = *state.player();
        let obstacles = state.obstacles().to_vec();
        for _ in 0..100 {
            assert!(tick(&mut state, FRAME_DT_MS).is_empty());
        }
        assert_eq!(*state.player(), player);
        assert_eq!(state.obstacles(), &obstacles[..]);
        assert_eq!(state.since_spawn_ms, 0.0);
    }

    #[test]
    fn test_jump_moves_player_up_next_tick() {
        let mut state = playing(1);
        let y0 = state.player().y;
        state.jump();
        assert_eq!(state.player().velocity, -10.0);

        tick(&mut state, FRAME_DT_MS);
        assert_eq!(state.player().velocity, -9.5);
        assert_eq!(state.player().y, y0 - 9.5);
    }

    #[test]
    fn test_gravity_integration() {
        let mut state = playing(1);
        let y0 = state.player().y;
        tick(&mut state, FRAME_DT_MS);
        tick(&mut state, FRAME_DT_MS);
        assert_eq!(state.player().velocity, 1.0);
        assert_eq!(state.player().y, y0 + 0.5 + 1.0);
    }

    #[test]
    fn test_falling_hits_floor_once() {
        let mut state = playing(1);
        let mut overs = 0;
        let mut last_cause = None;
        for _ in 0..200 {
            let events = tick(&mut state, FRAME_DT_MS);
            overs += game_overs(&events);
            for e in &events {
                if let GameEvent::GameOver { cause, .. } = e {
                    last_cause = Some(*cause);
                }
            }
        }
        assert_eq!(overs, 1);
        assert_eq!(last_cause, Some(GameOverCause::Floor));
        assert_eq!(state.phase(), GamePhase::GameOver);
        assert_eq!(state.player().y, 570.0);
    }

    #[test]
    fn test_ceiling_ends_game() {
        let mut state = playing(1);
        state.player.y = 5.0;
        state.jump();
        let events = tick(&mut state, FRAME_DT_MS);
        assert_eq!(state.player().y, 0.0);
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver { cause: GameOverCause::Ceiling, .. })
        ));
    }

    #[test]
    fn test_obstacle_removed_after_width_over_speed_ticks() {
        let mut state = playing(1);
        state.obstacles.push(Obstacle::new(0.0, 0.0, 80.0, 600.0));
        let ticks = state.tuning.ticks_per_pipe_width();
        for i in 0..ticks {
            // Keep the fish airborne and away from the spawn timer
            state.player.y = 300.0;
            state.player.velocity = 0.0;
            state.since_spawn_ms = 0.0;
            tick(&mut state, FRAME_DT_MS);
            if i + 1 < ticks {
                assert_eq!(state.obstacles().len(), 1, "removed early at tick {i}");
            }
        }
        assert!(state.obstacles().is_empty());
    }

    #[test]
    fn test_passing_an_obstacle_scores_exactly_once() {
        let mut state = playing(1);
        // Wide-open gap; right edge at 101 passes x = 100 after one tick
        state.obstacles.push(Obstacle::new(21.0, 0.0, 80.0, 600.0));
        let mut scored = 0;
        for _ in 0..20 {
            state.player.y = 300.0;
            state.player.velocity = 0.0;
            let events = tick(&mut state, FRAME_DT_MS);
            scored += events
                .iter()
                .filter(|e| matches!(e, GameEvent::Scored { .. }))
                .count();
        }
        assert_eq!(scored, 1);
        assert_eq!(state.score(), 1);
    }

    #[test]
    fn test_pipe_collision_ends_game() {
        let mut state = playing(1);
        // Pipe over the fish with the gap far below it
        state.obstacles.push(Obstacle::new(100.0, 450.0, 80.0, 100.0));
        let events = tick(&mut state, FRAME_DT_MS);
        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver { cause: GameOverCause::TopPipe, .. })
        ));
        assert_eq!(game_overs(&events), 1);
        // Terminal: further ticks change nothing
        let snapshot = state.obstacles().to_vec();
        assert!(tick(&mut state, FRAME_DT_MS).is_empty());
        assert_eq!(state.obstacles(), &snapshot[..]);
    }

    #[test]
    fn test_spawn_after_period() {
        let mut state = playing(42);
        let mut spawned_at = None;
        let mut elapsed = 0.0;
        for _ in 0..200 {
            state.player.y = 300.0;
            state.player.velocity = 0.0;
            elapsed += 100.0;
            let events = tick(&mut state, 100.0);
            if events
                .iter()
                .any(|e| matches!(e, GameEvent::ObstacleSpawned { .. }))
            {
                spawned_at = Some(elapsed);
                break;
            }
        }
        assert_eq!(spawned_at, Some(1600.0));
        assert_eq!(state.obstacles().len(), 1);
        let o = state.obstacles()[0];
        assert_eq!(o.x, 800.0);
        assert!(o.gap >= 100.0 && o.gap <= 400.0);
        assert_eq!(state.since_spawn_ms, 0.0);
    }

    #[test]
    fn test_pause_does_not_accumulate_spawn_time() {
        let mut state = playing(5);
        state.player.velocity = 0.0;
        tick(&mut state, 1000.0);
        state.pause();
        tick(&mut state, 10_000.0);
        state.resume();
        assert_eq!(state.since_spawn_ms, 1000.0);
        assert!(state.obstacles().is_empty());
    }

    proptest! {
        #[test]
        fn prop_player_stays_in_bounds(jumps in proptest::collection::vec(any::<bool>(), 1..400), seed in any::<u64>()) {
            let mut state = playing(seed);
            let max_y = state.player().max_y(state.viewport());
            let mut overs = 0;
            for jump in jumps {
                if jump {
                    state.jump();
                }
                let was_playing = state.phase() == GamePhase::Playing;
                let events = tick(&mut state, FRAME_DT_MS);
                overs += game_overs(&events);
                if was_playing {
                    prop_assert!(state.player().y >= 0.0 && state.player().y <= max_y);
                }
                if state.phase() == GamePhase::GameOver {
                    break;
                }
            }
            prop_assert!(overs <= 1);
        }

        #[test]
        fn prop_obstacles_only_move_left(seed in any::<u64>(), ticks in 1usize..600) {
            let mut state = playing(seed);
            let mut last: Vec<f32> = Vec::new();
            for _ in 0..ticks {
                state.player.y = 300.0;
                state.player.velocity = 0.0;
                state.obstacles.iter_mut().for_each(|o| { o.top = 0.0; o.gap = 600.0; });
                let events = tick(&mut state, FRAME_DT_MS);
                let spawned = events
                    .iter()
                    .filter(|e| matches!(e, GameEvent::ObstacleSpawned { .. }))
                    .count();
                let xs: Vec<f32> = state.obstacles().iter().map(|o| o.x).collect();
                // Survivors keep their order and moved left by exactly the pipe speed
                let survivors = xs.len() - spawned;
                let removed = last.len() - survivors;
                for (prev, now) in last.iter().skip(removed).zip(xs.iter().take(survivors)) {
                    prop_assert_eq!(*now, *prev - 2.0);
                }
                prop_assert!(xs.iter().all(|x| *x > -80.0));
                prop_assert!(xs.windows(2).all(|w| w[0] < w[1]));
                last = xs;
            }
        }
    }
}

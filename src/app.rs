//! Application controller
//!
//! Owns the game state, the loop driver and the durable high score, and
//! keeps them in step: the loop runs only while playing, and a finished game
//! is reported exactly once until the next start.

use crate::clock::{FrameScheduler, LoopDriver};
use crate::highscore::HighScoreStore;
use crate::persistence::KeyValueStore;
use crate::platform::Command;
use crate::sim::{GameEvent, GamePhase, GameState, Snapshot, Viewport, tick};
use crate::tuning::Tuning;

/// A game that just ended, to be handed to the score repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedGame {
    pub alias: String,
    pub points: u64,
    pub new_high_score: bool,
}

/// Result of one animation frame
#[derive(Debug, Default)]
pub struct FrameOutcome {
    pub events: Vec<GameEvent>,
    /// Set on the frame the session ended, once per session
    pub finished: Option<FinishedGame>,
}

pub struct App<S: FrameScheduler, K: KeyValueStore> {
    state: GameState,
    driver: LoopDriver<S>,
    high_scores: HighScoreStore<K>,
    /// Best score known to be persisted
    stored_best: u64,
    /// Finished game already reported for this session
    game_over_reported: bool,
    ranking_open: bool,
    /// The ranking panel paused the game and should resume it on close
    paused_by_ranking: bool,
}

impl<S: FrameScheduler, K: KeyValueStore> App<S, K> {
    pub fn new(seed: u64, tuning: Tuning, viewport: Viewport, scheduler: S, storage: K) -> Self {
        let high_scores = HighScoreStore::new(storage);
        let stored_best = high_scores.load();
        Self {
            state: GameState::new(seed, tuning, viewport, stored_best),
            driver: LoopDriver::new(scheduler),
            high_scores,
            stored_best,
            game_over_reported: false,
            ranking_open: false,
            paused_by_ranking: false,
        }
    }

    /// Start a session. Names are trimmed; a blank name is rejected.
    pub fn start(&mut self, name: &str) -> Option<GameEvent> {
        let name = name.trim();
        if name.is_empty() {
            log::warn!("Ignoring start with a blank name");
            return None;
        }
        let event = self.state.start(name);
        self.on_session_started();
        Some(event)
    }

    /// Apply a player command
    pub fn handle(&mut self, command: Command) -> Option<GameEvent> {
        match command {
            Command::Jump => {
                let event = self.state.jump()?;
                if matches!(event, GameEvent::Started { .. }) {
                    self.on_session_started();
                }
                Some(event)
            }
            Command::TogglePause => match self.state.phase() {
                GamePhase::Playing => self.pause(),
                GamePhase::Paused => self.resume(),
                GamePhase::Idle | GamePhase::GameOver => None,
            },
        }
    }

    pub fn pause(&mut self) -> Option<GameEvent> {
        let event = self.state.pause()?;
        self.driver.stop();
        Some(event)
    }

    pub fn resume(&mut self) -> Option<GameEvent> {
        let event = self.state.resume()?;
        self.paused_by_ranking = false;
        self.driver.start();
        Some(event)
    }

    /// Open or close the ranking panel. Opening pauses a running game and
    /// closing resumes it.
    pub fn set_ranking_open(&mut self, open: bool) -> Option<GameEvent> {
        if self.ranking_open == open {
            return None;
        }
        self.ranking_open = open;
        if open {
            let event = self.pause();
            self.paused_by_ranking = event.is_some();
            event
        } else if self.paused_by_ranking {
            self.resume()
        } else {
            None
        }
    }

    pub fn ranking_open(&self) -> bool {
        self.ranking_open
    }

    /// Run one frame at `now_ms` (animation frame timestamp)
    pub fn on_frame(&mut self, now_ms: f64) -> FrameOutcome {
        let Some(dt_ms) = self.driver.begin_frame(now_ms) else {
            return FrameOutcome::default();
        };

        let events = tick(&mut self.state, dt_ms);
        let mut finished = None;
        for event in &events {
            if let GameEvent::GameOver {
                score,
                new_high_score,
                ..
            } = event
            {
                finished = self.on_game_over(*score, *new_high_score);
            }
        }

        if self.state.phase() == GamePhase::Playing {
            self.driver.schedule_next();
        } else {
            self.driver.stop();
        }

        FrameOutcome { events, finished }
    }

    fn on_session_started(&mut self) {
        self.game_over_reported = false;
        self.paused_by_ranking = false;
        self.driver.start();
    }

    fn on_game_over(&mut self, score: u64, new_high_score: bool) -> Option<FinishedGame> {
        if self.game_over_reported {
            return None;
        }
        self.game_over_reported = true;

        match self.high_scores.record(self.stored_best, score) {
            Ok(true) => self.stored_best = score,
            Ok(false) => {}
            Err(e) => log::error!("Failed to save high score: {}", e),
        }

        Some(FinishedGame {
            alias: self.state.player_name().to_string(),
            points: score,
            new_high_score,
        })
    }

    /// End an unfinished session (cut off before game over) and report it.
    ///
    /// Returns `None` when no session is in progress or it was already
    /// reported.
    pub fn abandon(&mut self) -> Option<FinishedGame> {
        if !matches!(self.state.phase(), GamePhase::Playing | GamePhase::Paused) {
            return None;
        }
        self.driver.stop();
        let score = self.state.score();
        self.on_game_over(score, score > self.stored_best)
    }

    /// Seed the displayed best from a leaderboard
    pub fn observe_best(&mut self, points: u64) -> bool {
        self.state.observe_best(points)
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.state.resize(viewport);
    }

    /// Stop the loop for good (page unload)
    pub fn shutdown(&mut self) {
        if self.driver.stop() {
            log::info!("Loop stopped");
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        self.state.snapshot()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.driver.is_running()
    }

    pub fn driver(&self) -> &LoopDriver<S> {
        &self.driver
    }

    pub fn high_scores(&self) -> &HighScoreStore<K> {
        &self.high_scores
    }
}

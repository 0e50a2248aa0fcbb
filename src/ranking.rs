//! Leaderboard panel state and the live ranking feed
//!
//! The feed speaks the SignalR JSON hub protocol over a plain WebSocket:
//! every message is a JSON object terminated by a record separator (0x1E).
//! The hub pushes `ScoreUpdated` with the current top-score list whenever a
//! score is registered.

use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;

use crate::scores::{Score, ScoreError, ScoreRepository, ScoreService};

/// SignalR record separator
pub const RECORD_SEPARATOR: char = '\u{1e}';

/// Hub method carrying the top-score list
pub const SCORE_UPDATED: &str = "ScoreUpdated";

/// First frame a client sends after the socket opens
pub fn handshake() -> String {
    format!(r#"{{"protocol":"json","version":1}}{RECORD_SEPARATOR}"#)
}

/// A decoded hub message
#[derive(Debug, Clone, PartialEq)]
pub enum FeedMessage {
    /// Empty handshake response
    HandshakeAck,
    ScoreUpdated(Vec<Score>),
    Ping,
    /// Server is closing the connection
    Close { error: Option<String> },
    /// Valid message we have no use for
    Ignored,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type")]
    kind: Option<u8>,
    target: Option<String>,
    #[serde(default)]
    arguments: Vec<serde_json::Value>,
    error: Option<String>,
}

fn decode_message(record: &str) -> Result<FeedMessage, String> {
    let raw: RawMessage = serde_json::from_str(record).map_err(|e| e.to_string())?;
    let message = match raw.kind {
        None if raw.error.is_some() => FeedMessage::Close { error: raw.error },
        None => FeedMessage::HandshakeAck,
        Some(1) if raw.target.as_deref() == Some(SCORE_UPDATED) => {
            let list = raw
                .arguments
                .into_iter()
                .next()
                .ok_or_else(|| format!("{SCORE_UPDATED} without arguments"))?;
            let scores: Vec<Score> = serde_json::from_value(list).map_err(|e| e.to_string())?;
            FeedMessage::ScoreUpdated(scores)
        }
        Some(6) => FeedMessage::Ping,
        Some(7) => FeedMessage::Close { error: raw.error },
        Some(_) => FeedMessage::Ignored,
    };
    Ok(message)
}

/// Split a text frame into hub messages; malformed records are skipped
pub fn decode_frames(text: &str) -> Vec<FeedMessage> {
    text.split(RECORD_SEPARATOR)
        .filter(|record| !record.trim().is_empty())
        .filter_map(|record| match decode_message(record) {
            Ok(message) => Some(message),
            Err(e) => {
                log::warn!("Skipping malformed ranking message: {}", e);
                None
            }
        })
        .collect()
}

/// Which list the panel shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RankingMode {
    /// Global top scores
    #[default]
    Top,
    /// The current player's scores
    Player,
}

/// One formatted leaderboard line
#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub rank: usize,
    pub alias: String,
    pub points: u64,
    pub when: String,
}

/// Leaderboard panel state
#[derive(Debug, Clone)]
pub struct RankingBoard {
    entries: Vec<Score>,
    mode: RankingMode,
    visible: bool,
    limit: usize,
}

impl RankingBoard {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            mode: RankingMode::Top,
            visible: false,
            limit,
        }
    }

    pub fn entries(&self) -> &[Score] {
        &self.entries
    }

    pub fn mode(&self) -> RankingMode {
        self.mode
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Show the panel; it always opens on the top scores
    pub fn open(&mut self) {
        self.visible = true;
        self.mode = RankingMode::Top;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    /// Flip visibility; returns the new state
    pub fn toggle(&mut self) -> bool {
        if self.visible {
            self.close();
        } else {
            self.open();
        }
        self.visible
    }

    pub fn set_mode(&mut self, mode: RankingMode) {
        self.mode = mode;
    }

    /// Replace entries with a load result; a failed load empties the list
    pub fn set_loaded(&mut self, result: Result<Vec<Score>, ScoreError>) {
        match result {
            Ok(mut scores) => {
                scores.truncate(self.limit);
                log::debug!("Ranking loaded ({} entries)", scores.len());
                self.entries = scores;
            }
            Err(e) => {
                log::error!("Failed to load ranking: {}", e);
                self.entries.clear();
            }
        }
    }

    /// Apply pushed messages. Pushed lists only replace the Top view.
    /// Returns whether the entries changed.
    pub fn apply_feed(&mut self, messages: Vec<FeedMessage>) -> bool {
        let mut changed = false;
        for message in messages {
            match message {
                FeedMessage::ScoreUpdated(mut scores) if self.mode == RankingMode::Top => {
                    scores.truncate(self.limit);
                    self.entries = scores;
                    changed = true;
                }
                FeedMessage::Close { error: Some(error) } => {
                    log::warn!("Ranking hub closed: {}", error);
                }
                FeedMessage::HandshakeAck => log::info!("Ranking hub connected"),
                _ => {}
            }
        }
        changed
    }

    /// Highest points on the board
    pub fn best_points(&self) -> Option<u64> {
        self.entries.iter().map(|s| s.points).max()
    }

    pub fn rows(&self, now: DateTime<Utc>) -> Vec<RankingRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, score)| RankingRow {
                rank: i + 1,
                alias: score.alias.clone(),
                points: score.points,
                when: format_relative(score.created_at, now),
            })
            .collect()
    }
}

/// Load the list for `mode`
pub async fn fetch_entries<R: ScoreRepository>(
    service: &ScoreService<R>,
    mode: RankingMode,
    alias: &str,
    limit: usize,
) -> Result<Vec<Score>, ScoreError> {
    match mode {
        RankingMode::Top => service.top_scores(limit).await,
        RankingMode::Player => service.scores_by_alias(alias).await,
    }
}

/// Human-friendly age of a score ("3 mins ago", "Yesterday", "4/2/25")
pub fn format_relative(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(created_at);
    let days = diff.num_days();
    let hours = diff.num_hours();
    let mins = diff.num_minutes();

    if days >= 1 {
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            format!(
                "{}/{}/{:02}",
                created_at.month(),
                created_at.day(),
                created_at.year() % 100
            )
        }
    } else if hours >= 1 {
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if mins >= 1 {
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn score(id: u64, points: u64) -> Score {
        Score {
            id,
            alias: format!("p{id}"),
            points,
            max_combo: None,
            duration_sec: None,
            metadata: None,
            session_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap(),
        }
    }

    fn update_frame(points: &[u64]) -> String {
        let list: Vec<serde_json::Value> = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                serde_json::json!({
                    "id": i + 1,
                    "alias": format!("p{}", i + 1),
                    "points": p,
                    "createdAt": "2025-04-02T12:00:00Z"
                })
            })
            .collect();
        let message = serde_json::json!({
            "type": 1,
            "target": "ScoreUpdated",
            "arguments": [list]
        });
        format!("{message}{RECORD_SEPARATOR}")
    }

    #[test]
    fn test_handshake_is_terminated() {
        let hs = handshake();
        assert!(hs.ends_with(RECORD_SEPARATOR));
        let json: serde_json::Value = serde_json::from_str(hs.trim_end_matches(RECORD_SEPARATOR)).unwrap();
        assert_eq!(json["protocol"], "json");
        assert_eq!(json["version"], 1);
    }

    #[test]
    fn test_decode_mixed_frame() {
        let text = format!(
            "{{}}{sep}{{\"type\":6}}{sep}{}{{\"type\":1,\"target\":\"Other\",\"arguments\":[]}}{sep}",
            update_frame(&[30, 20]),
            sep = RECORD_SEPARATOR
        );
        let messages = decode_frames(&text);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], FeedMessage::HandshakeAck);
        assert_eq!(messages[1], FeedMessage::Ping);
        match &messages[2] {
            FeedMessage::ScoreUpdated(scores) => {
                assert_eq!(scores.len(), 2);
                assert_eq!(scores[0].points, 30);
            }
            other => panic!("unexpected message {other:?}"),
        }
        assert_eq!(messages[3], FeedMessage::Ignored);
    }

    #[test]
    fn test_malformed_records_are_skipped() {
        let text = format!(
            "not json{sep}{{\"type\":1,\"target\":\"ScoreUpdated\",\"arguments\":[]}}{sep}{{\"type\":7,\"error\":\"bye\"}}{sep}",
            sep = RECORD_SEPARATOR
        );
        let messages = decode_frames(&text);
        assert_eq!(
            messages,
            vec![FeedMessage::Close {
                error: Some("bye".into())
            }]
        );
    }

    #[test]
    fn test_feed_updates_only_top_view() {
        let mut board = RankingBoard::new(10);
        assert!(board.apply_feed(decode_frames(&update_frame(&[9, 4]))));
        assert_eq!(board.best_points(), Some(9));

        board.set_mode(RankingMode::Player);
        assert!(!board.apply_feed(decode_frames(&update_frame(&[50]))));
        assert_eq!(board.best_points(), Some(9));
    }

    #[test]
    fn test_feed_respects_limit() {
        let mut board = RankingBoard::new(2);
        board.apply_feed(decode_frames(&update_frame(&[9, 8, 7])));
        assert_eq!(board.entries().len(), 2);
    }

    #[test]
    fn test_failed_load_empties_board() {
        let mut board = RankingBoard::new(10);
        board.set_loaded(Ok(vec![score(1, 5)]));
        assert_eq!(board.entries().len(), 1);

        board.set_loaded(Err(ScoreError::Status { status: 503 }));
        assert!(board.entries().is_empty());
        assert_eq!(board.best_points(), None);
    }

    #[test]
    fn test_toggle_visibility() {
        let mut board = RankingBoard::new(10);
        assert!(!board.is_visible());
        assert!(board.toggle());
        assert!(!board.toggle());
    }

    #[test]
    fn test_reopening_resets_to_top() {
        let mut board = RankingBoard::new(10);
        board.toggle();
        board.set_mode(RankingMode::Player);
        board.toggle();
        assert_eq!(board.mode(), RankingMode::Player);

        assert!(board.toggle());
        assert_eq!(board.mode(), RankingMode::Top);
        assert!(board.apply_feed(decode_frames(&update_frame(&[12]))));
        assert_eq!(board.best_points(), Some(12));
    }

    #[test]
    fn test_feed_accepts_offsetless_timestamps() {
        let message = serde_json::json!({
            "type": 1,
            "target": "ScoreUpdated",
            "arguments": [[
                { "id": 1, "alias": "Ann", "points": 7, "createdAt": "2025-03-01T10:00:00.1234567" },
                { "id": 2, "alias": "Bo", "points": 3, "createdAt": "2025-03-01T09:00:00Z" }
            ]]
        });
        let messages = decode_frames(&format!("{message}{RECORD_SEPARATOR}"));
        match messages.as_slice() {
            [FeedMessage::ScoreUpdated(scores)] => assert_eq!(scores.len(), 2),
            other => panic!("unexpected messages {other:?}"),
        }
    }

    #[test]
    fn test_fetch_by_mode() {
        use crate::scores::InMemoryScoreRepository;

        let service = ScoreService::new(InMemoryScoreRepository::new());
        pollster::block_on(async {
            service.register("Ann", 4).await.unwrap();
            service.register("Bo", 8).await.unwrap();

            let top = fetch_entries(&service, RankingMode::Top, "Ann", 10).await.unwrap();
            assert_eq!(top.len(), 2);
            let mine = fetch_entries(&service, RankingMode::Player, "Ann", 10).await.unwrap();
            assert_eq!(mine.len(), 1);
            assert_eq!(mine[0].alias, "Ann");
        });
    }

    #[test]
    fn test_format_relative() {
        let then = Utc.with_ymd_and_hms(2025, 4, 2, 12, 0, 0).unwrap();
        assert_eq!(format_relative(then, then + Duration::seconds(30)), "Just now");
        assert_eq!(format_relative(then, then + Duration::minutes(1)), "1 min ago");
        assert_eq!(format_relative(then, then + Duration::minutes(45)), "45 mins ago");
        assert_eq!(format_relative(then, then + Duration::hours(1)), "1 hour ago");
        assert_eq!(format_relative(then, then + Duration::hours(5)), "5 hours ago");
        assert_eq!(format_relative(then, then + Duration::days(1)), "Yesterday");
        assert_eq!(format_relative(then, then + Duration::days(3)), "3 days ago");
        assert_eq!(format_relative(then, then + Duration::days(30)), "4/2/25");
    }

    #[test]
    fn test_rows_are_ranked() {
        let mut board = RankingBoard::new(10);
        board.set_loaded(Ok(vec![score(1, 9), score(2, 3)]));
        let now = Utc.with_ymd_and_hms(2025, 4, 2, 12, 10, 0).unwrap();
        let rows = board.rows(now);
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[0].when, "10 mins ago");
    }
}

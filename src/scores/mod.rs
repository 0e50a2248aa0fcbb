//! Score persistence
//!
//! `ScoreRepository` is the storage seam; pick a backend when composing the
//! app:
//! - `InMemoryScoreRepository`: local, full CRUD
//! - `ApiScoreRepository`: the HTTP score API
//!
//! `ScoreService` is the thin use-case layer the game talks to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod api;
pub mod memory;

pub use api::ApiScoreRepository;
pub use memory::InMemoryScoreRepository;

/// Default number of leaderboard rows
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// A stored score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    pub id: u64,
    pub alias: String,
    pub points: u64,
    #[serde(default)]
    pub max_combo: Option<u32>,
    #[serde(default)]
    pub duration_sec: Option<f64>,
    #[serde(default)]
    pub metadata: Option<String>,
    /// Client session GUID
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// API timestamps: RFC 3339, or an offset-less ISO 8601 form read as UTC
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp {raw:?}")))
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }
}

/// Payload for creating a score
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewScore {
    pub alias: String,
    pub points: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_combo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl NewScore {
    pub fn new(alias: impl Into<String>, points: u64) -> Self {
        Self {
            alias: alias.into(),
            points,
            ..Default::default()
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScorePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_combo: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl ScorePatch {
    pub fn apply(&self, score: &mut Score) {
        if let Some(alias) = &self.alias {
            score.alias = alias.clone();
        }
        if let Some(points) = self.points {
            score.points = points;
        }
        if let Some(max_combo) = self.max_combo {
            score.max_combo = Some(max_combo);
        }
        if let Some(duration) = self.duration_sec {
            score.duration_sec = Some(duration);
        }
        if let Some(metadata) = &self.metadata {
            score.metadata = Some(metadata.clone());
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoreError {
    #[error("invalid score endpoint: {0}")]
    InvalidUrl(String),
    #[error("score request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("score API returned status {status}")]
    Status { status: u16 },
    #[error("score {0} not found")]
    NotFound(u64),
}

/// Storage seam for scores.
///
/// Futures are not required to be `Send`; everything runs on the browser's
/// single thread.
#[allow(async_fn_in_trait)]
pub trait ScoreRepository {
    async fn create(&self, score: NewScore) -> Result<Score, ScoreError>;
    /// Highest points first, at most `limit` rows
    async fn top_scores(&self, limit: usize) -> Result<Vec<Score>, ScoreError>;
    /// All scores for one alias, highest points first
    async fn by_alias(&self, alias: &str) -> Result<Vec<Score>, ScoreError>;
    async fn by_id(&self, id: u64) -> Result<Option<Score>, ScoreError>;
    async fn update(&self, id: u64, patch: ScorePatch) -> Result<Score, ScoreError>;
    /// Returns whether a score was removed
    async fn delete(&self, id: u64) -> Result<bool, ScoreError>;
}

/// Sort in place, highest points first (stable for ties)
pub(crate) fn sort_descending(scores: &mut [Score]) {
    scores.sort_by(|a, b| b.points.cmp(&a.points));
}

/// Score use cases used by the game and the ranking panel
pub struct ScoreService<R: ScoreRepository> {
    repository: R,
}

impl<R: ScoreRepository> ScoreService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Submit a finished game
    pub async fn register(&self, alias: &str, points: u64) -> Result<Score, ScoreError> {
        let score = self.repository.create(NewScore::new(alias, points)).await?;
        log::info!("Registered score {} for {}", score.points, score.alias);
        Ok(score)
    }

    pub async fn top_scores(&self, limit: usize) -> Result<Vec<Score>, ScoreError> {
        self.repository.top_scores(limit).await
    }

    pub async fn scores_by_alias(&self, alias: &str) -> Result<Vec<Score>, ScoreError> {
        self.repository.by_alias(alias).await
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_uses_api_field_names() {
        let json = r#"{
            "id": 3,
            "alias": "Ann",
            "points": 12,
            "maxCombo": null,
            "sessionId": "0b5c",
            "createdAt": "2025-03-01T10:00:00Z"
        }"#;
        let score: Score = serde_json::from_str(json).unwrap();
        assert_eq!(score.id, 3);
        assert_eq!(score.points, 12);
        assert_eq!(score.session_id.as_deref(), Some("0b5c"));
        assert_eq!(score.duration_sec, None);
    }

    #[test]
    fn test_created_at_accepts_offset_and_offsetless_forms() {
        let json = r#"[
            { "id": 1, "alias": "Ann", "points": 9, "createdAt": "2025-03-01T10:00:00.1234567" },
            { "id": 2, "alias": "Bo", "points": 4, "createdAt": "2025-03-01T12:00:00+02:00" }
        ]"#;
        let scores: Vec<Score> = serde_json::from_str(json).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(
            scores[0].created_at.to_rfc3339(),
            "2025-03-01T10:00:00.123456700+00:00"
        );
        assert_eq!(scores[1].created_at.to_rfc3339(), "2025-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_timestamp_parse() {
        assert!(timestamp::parse("2025-03-01T10:00:00Z").is_some());
        assert!(timestamp::parse("2025-03-01 10:00:00").is_some());
        assert!(timestamp::parse("yesterday").is_none());
        assert!(serde_json::from_str::<Score>(
            r#"{ "id": 1, "alias": "Ann", "points": 9, "createdAt": "soon" }"#
        )
        .is_err());
    }

    #[test]
    fn test_new_score_omits_empty_optionals() {
        let json = serde_json::to_value(NewScore::new("Ann", 7)).unwrap();
        assert_eq!(json, serde_json::json!({ "alias": "Ann", "points": 7 }));
    }

    #[test]
    fn test_service_register_and_rank() {
        let service = ScoreService::new(InMemoryScoreRepository::new());
        pollster::block_on(async {
            service.register("Ann", 3).await.unwrap();
            service.register("Bo", 9).await.unwrap();
            service.register("Ann", 5).await.unwrap();

            let top = service.top_scores(2).await.unwrap();
            let points: Vec<u64> = top.iter().map(|s| s.points).collect();
            assert_eq!(points, vec![9, 5]);

            let mine = service.scores_by_alias("Ann").await.unwrap();
            let points: Vec<u64> = mine.iter().map(|s| s.points).collect();
            assert_eq!(points, vec![5, 3]);
        });
    }
}

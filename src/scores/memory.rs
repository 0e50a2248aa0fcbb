//! In-memory score repository

use std::cell::RefCell;

use chrono::Utc;

use super::{NewScore, Score, ScoreError, ScorePatch, ScoreRepository, sort_descending};

#[derive(Debug)]
struct Inner {
    scores: Vec<Score>,
    next_id: u64,
}

/// Scores kept for the lifetime of the page. Ids start at 1.
#[derive(Debug)]
pub struct InMemoryScoreRepository {
    inner: RefCell<Inner>,
}

impl Default for InMemoryScoreRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryScoreRepository {
    pub fn new() -> Self {
        Self {
            inner: RefCell::new(Inner {
                scores: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ScoreRepository for InMemoryScoreRepository {
    async fn create(&self, score: NewScore) -> Result<Score, ScoreError> {
        let mut inner = self.inner.borrow_mut();
        let stored = Score {
            id: inner.next_id,
            alias: score.alias,
            points: score.points,
            max_combo: score.max_combo,
            duration_sec: score.duration_sec,
            metadata: score.metadata,
            session_id: score.session_id,
            created_at: Utc::now(),
        };
        inner.next_id += 1;
        inner.scores.push(stored.clone());
        Ok(stored)
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<Score>, ScoreError> {
        let mut scores = self.inner.borrow().scores.clone();
        sort_descending(&mut scores);
        scores.truncate(limit);
        Ok(scores)
    }

    async fn by_alias(&self, alias: &str) -> Result<Vec<Score>, ScoreError> {
        let mut scores: Vec<Score> = self
            .inner
            .borrow()
            .scores
            .iter()
            .filter(|s| s.alias == alias)
            .cloned()
            .collect();
        sort_descending(&mut scores);
        Ok(scores)
    }

    async fn by_id(&self, id: u64) -> Result<Option<Score>, ScoreError> {
        Ok(self.inner.borrow().scores.iter().find(|s| s.id == id).cloned())
    }

    async fn update(&self, id: u64, patch: ScorePatch) -> Result<Score, ScoreError> {
        let mut inner = self.inner.borrow_mut();
        let score = inner
            .scores
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(ScoreError::NotFound(id))?;
        patch.apply(score);
        Ok(score.clone())
    }

    async fn delete(&self, id: u64) -> Result<bool, ScoreError> {
        let mut inner = self.inner.borrow_mut();
        let before = inner.scores.len();
        inner.scores.retain(|s| s.id != id);
        Ok(inner.scores.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_create_assigns_sequential_ids() {
        let repo = InMemoryScoreRepository::new();
        let a = block_on(repo.create(NewScore::new("Ann", 1))).unwrap();
        let b = block_on(repo.create(NewScore::new("Bo", 2))).unwrap();
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(repo.len(), 2);
    }

    #[test]
    fn test_top_scores_sorted_and_limited() {
        let repo = InMemoryScoreRepository::new();
        for (alias, points) in [("a", 4), ("b", 10), ("c", 7), ("d", 1)] {
            block_on(repo.create(NewScore::new(alias, points))).unwrap();
        }
        let top = block_on(repo.top_scores(3)).unwrap();
        let aliases: Vec<&str> = top.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["b", "c", "a"]);
        assert!(block_on(repo.top_scores(0)).unwrap().is_empty());
    }

    #[test]
    fn test_by_alias_filters() {
        let repo = InMemoryScoreRepository::new();
        block_on(repo.create(NewScore::new("Ann", 2))).unwrap();
        block_on(repo.create(NewScore::new("Bo", 9))).unwrap();
        block_on(repo.create(NewScore::new("Ann", 6))).unwrap();
        let scores = block_on(repo.by_alias("Ann")).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].points, 6);
        assert!(block_on(repo.by_alias("Nobody")).unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete() {
        let repo = InMemoryScoreRepository::new();
        let s = block_on(repo.create(NewScore::new("Ann", 2))).unwrap();

        let patch = ScorePatch {
            points: Some(20),
            metadata: Some("replay".into()),
            ..Default::default()
        };
        let updated = block_on(repo.update(s.id, patch)).unwrap();
        assert_eq!(updated.points, 20);
        assert_eq!(updated.alias, "Ann");
        assert_eq!(updated.metadata.as_deref(), Some("replay"));
        assert_eq!(block_on(repo.by_id(s.id)).unwrap(), Some(updated));

        assert!(matches!(
            block_on(repo.update(99, ScorePatch::default())),
            Err(ScoreError::NotFound(99))
        ));

        assert!(block_on(repo.delete(s.id)).unwrap());
        assert!(!block_on(repo.delete(s.id)).unwrap());
        assert_eq!(block_on(repo.by_id(s.id)).unwrap(), None);
        assert!(repo.is_empty());
    }
}

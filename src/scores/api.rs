//! Score repository backed by the HTTP score API
//!
//! Routes, relative to the configured base:
//! `POST scores`, `GET scores/top?limit=N`, `GET scores/alias/{alias}`,
//! `GET|PUT|DELETE scores/{id}`.

use reqwest::{Client, Response, StatusCode, Url};

use super::{NewScore, Score, ScoreError, ScorePatch, ScoreRepository};

pub struct ApiScoreRepository {
    client: Client,
    base: Url,
}

impl ApiScoreRepository {
    pub fn new(base_url: &str) -> Result<Self, ScoreError> {
        let base = Url::parse(base_url)
            .map_err(|e| ScoreError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ScoreError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `{base}/scores/{segments...}`, each segment percent-encoded
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, ScoreError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ScoreError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .push("scores")
            .extend(segments);
        Ok(url)
    }
}

/// Map non-2xx statuses to `ScoreError::Status`
fn check(response: Response) -> Result<Response, ScoreError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ScoreError::Status {
            status: status.as_u16(),
        })
    }
}

impl ScoreRepository for ApiScoreRepository {
    async fn create(&self, score: NewScore) -> Result<Score, ScoreError> {
        let url = self.endpoint(&[])?;
        let response = self.client.post(url).json(&score).send().await?;
        Ok(check(response)?.json().await?)
    }

    async fn top_scores(&self, limit: usize) -> Result<Vec<Score>, ScoreError> {
        let mut url = self.endpoint(&["top"])?;
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        let response = self.client.get(url).send().await?;
        Ok(check(response)?.json().await?)
    }

    async fn by_alias(&self, alias: &str) -> Result<Vec<Score>, ScoreError> {
        let url = self.endpoint(&["alias", alias])?;
        let response = self.client.get(url).send().await?;
        Ok(check(response)?.json().await?)
    }

    async fn by_id(&self, id: u64) -> Result<Option<Score>, ScoreError> {
        let url = self.endpoint(&[&id.to_string()])?;
        let response = self.client.get(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(check(response)?.json().await?))
    }

    async fn update(&self, id: u64, patch: ScorePatch) -> Result<Score, ScoreError> {
        let url = self.endpoint(&[&id.to_string()])?;
        let response = self.client.put(url).json(&patch).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScoreError::NotFound(id));
        }
        Ok(check(response)?.json().await?)
    }

    async fn delete(&self, id: u64) -> Result<bool, ScoreError> {
        let url = self.endpoint(&[&id.to_string()])?;
        let response = self.client.delete(url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(response)?;
        Ok(true)
    }
}

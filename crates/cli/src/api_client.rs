use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tally_core::{ItemKey, ItemStats, RatingIntent, RatingSummary, Vote};

/// HTTP client for a tally server.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url).context("invalid server URL")?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("tally-cli/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base_url.join(path).context("failed to build API URL")
    }

    fn rating_url(&self, item_key: &ItemKey) -> Result<Url> {
        let mut url = self.url("/api/rating")?;
        url.query_pairs_mut()
            .append_pair("item_key", item_key.as_str());
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req.send().await?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            anyhow::bail!("API error ({}): {}", status, body);
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn get_rating(&self, item_key: &ItemKey) -> Result<RatingSummary> {
        let url = self.rating_url(item_key)?;
        self.send_json(self.http.get(url)).await
    }

    pub async fn set_rating(
        &self,
        item_key: &ItemKey,
        intent: RatingIntent,
    ) -> Result<RatingSummary> {
        let url = self.rating_url(item_key)?;
        let req = SetRatingRequest::from(intent);
        self.send_json(self.http.post(url).json(&req)).await
    }

    pub async fn stats(&self, limit: Option<u32>) -> Result<Vec<ItemStats>> {
        let mut url = self.url("/api/stats")?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        self.send_json(self.http.get(url)).await
    }

    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.url("/api/health")?;
        self.send_json(self.http.get(url)).await
    }
}

// =============================================================================
// Request/response types (mirrored from server handlers)
// =============================================================================

/// Write body; `None` serializes as `null`, which clears the vote.
#[derive(Debug, Serialize)]
pub struct SetRatingRequest {
    pub rating: Option<Vote>,
}

impl From<RatingIntent> for SetRatingRequest {
    fn from(intent: RatingIntent) -> Self {
        let rating = match intent {
            RatingIntent::Set(vote) => Some(vote),
            RatingIntent::Clear => None,
        };
        Self { rating }
    }
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

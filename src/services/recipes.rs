use std::time::Duration;

use axum::body::Bytes;
use reqwest::{Client, Url};
use serde::de::IgnoredAny;

use crate::{
    config::Config,
    error::{ApiError, ApiResult},
    services::metrics::record_upstream,
};

const MISSING_KEY: &str = "Recipe API key is not configured";

/// Thin pass-through client for the Spoonacular recipe API.
pub struct RecipeService {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    search_limit: u32,
}

impl RecipeService {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        search_limit: u32,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            search_limit,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(
            config.spoonacular_base_url.clone(),
            config.spoonacular_api_key.clone(),
            config.recipe_search_limit,
            Duration::from_secs(config.upstream_timeout_seconds),
        )
    }

    /// GET /recipes/complexSearch with the configured result cap and nutrition data.
    pub async fn search(&self, query: &str) -> ApiResult<Bytes> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::Validation("Search query is required".into()));
        }
        let api_key = self.api_key()?;

        let mut url = self.url(&["recipes", "complexSearch"])?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("number", &self.search_limit.to_string())
            .append_pair("addRecipeNutrition", "true")
            .append_pair("apiKey", api_key);

        self.fetch("search", url, "Failed to fetch recipes").await
    }

    /// GET /recipes/{id}/information including nutrition.
    pub async fn information(&self, id: &str) -> ApiResult<Bytes> {
        let api_key = self.api_key()?;

        let mut url = self.url(&["recipes", id, "information"])?;
        url.query_pairs_mut()
            .append_pair("includeNutrition", "true")
            .append_pair("apiKey", api_key);

        self.fetch("information", url, "Failed to fetch recipe details").await
    }

    fn api_key(&self) -> ApiResult<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            tracing::error!("SPOONACULAR_API_KEY is not set");
            ApiError::Config(MISSING_KEY)
        })
    }

    /// Appends percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> ApiResult<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid recipe API base URL: {e}"))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("Recipe API base URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Returns the upstream body untouched once it is known to be JSON.
    async fn fetch(&self, endpoint: &str, url: Url, failure: &'static str) -> ApiResult<Bytes> {
        let response = self.client.get(url).send().await.map_err(|e| {
            record_upstream(endpoint, "transport_error");
            // reqwest errors carry the URL, which includes the api key.
            tracing::warn!("Recipe API {endpoint} request failed: {}", e.without_url());
            ApiError::Upstream(failure)
        })?;

        let status = response.status();
        if !status.is_success() {
            record_upstream(endpoint, "upstream_error");
            let text = response.text().await.unwrap_or_default();
            tracing::warn!("Recipe API {endpoint} error {}: {}", status, text);
            return Err(ApiError::Upstream(failure));
        }

        let body = response.bytes().await.map_err(|e| {
            record_upstream(endpoint, "transport_error");
            tracing::warn!("Recipe API {endpoint} body read failed: {}", e.without_url());
            ApiError::Upstream(failure)
        })?;
        if let Err(e) = serde_json::from_slice::<IgnoredAny>(&body) {
            record_upstream(endpoint, "invalid_body");
            tracing::warn!("Recipe API {endpoint} returned invalid JSON: {e}");
            return Err(ApiError::Upstream(failure));
        }
        record_upstream(endpoint, "ok");
        Ok(body)
    }
}

//! HTTP client implementation for the nutrition log API.
//!
//! This module provides a reqwest-based implementation of the [`NutritionClient`](crate::NutritionClient) trait.

use crate::config::Config;
use crate::normalize::{self, NutrientProfile};
use crate::retry::RetryPolicy;
use crate::utils::capitalize_query;
use crate::{
    DailyCalorieSnapshot, FoodLogAck, FoodLogRequest, FoodSuggestion, NutritionClient,
    NutritionError, ProfileMetrics, ProfileSubmission,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

/// Client for the nutrition log API using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestNutritionClient {
    base_url: String,
    token: SecretString,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl ReqwestNutritionClient {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - Root of the backend (e.g., "http://localhost:5000"); `/api/...` is appended
    /// * `token` - Bearer token issued by the login service
    pub fn new(base_url: &str, token: SecretString) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.base_url, config.token.clone()).with_retry_policy(RetryPolicy {
            max_retries: config.max_retries,
            ..RetryPolicy::default()
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn ensure_token(&self) -> Result<(), NutritionError> {
        if self.token.expose_secret().trim().is_empty() {
            return Err(NutritionError::Unauthenticated("no bearer token".into()));
        }
        Ok(())
    }

    /// Build an authenticated GET request.
    fn get_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .bearer_auth(self.token.expose_secret())
    }

    /// Build an authenticated POST request.
    fn post_request(&self, url: &str) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .bearer_auth(self.token.expose_secret())
    }

    /// GET a body as text, retrying transient failures.
    ///
    /// Food payloads are read as text because they may contain bare `NaN`
    /// tokens that a strict JSON decoder would reject.
    async fn fetch_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, NutritionError> {
        self.ensure_token()?;
        self.retry
            .retry_async_if(NutritionError::is_transient, || async move {
                let mut request = self.get_request(url);
                if !query.is_empty() {
                    request = request.query(query);
                }
                let resp = request.send().await?;
                if !resp.status().is_success() {
                    return Err(Self::error_from_response(resp).await);
                }
                Ok::<_, NutritionError>(resp.text().await?)
            })
            .await
    }

    /// Execute a request once and decode a strict JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, NutritionError> {
        self.ensure_token()?;
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(Self::error_from_response(resp).await);
        }
        let text = resp.text().await?;
        decode(&text)
    }

    /// Extract error information from a failed response.
    async fn error_from_response(resp: reqwest::Response) -> NutritionError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let message = error_message(&body);
        tracing::debug!(status, %message, "request rejected");

        match status {
            401 | 403 => NutritionError::Unauthenticated(message),
            404 => NutritionError::NotFound(message),
            400 | 422 => NutritionError::InvalidInput(message),
            _ => NutritionError::Api { status, message },
        }
    }
}

/// Prefer the backend's `{"error": "..."}` message; otherwise a body snippet.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(256).collect())
}

fn decode<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, NutritionError> {
    serde_json::from_str(text).map_err(|e| {
        let body_snippet: String = text.chars().take(512).collect();
        NutritionError::Decode(format!("{} - body: {}", e, body_snippet))
    })
}

#[async_trait]
impl NutritionClient for ReqwestNutritionClient {
    async fn search_foods(&self, query: &str) -> Result<Vec<FoodSuggestion>, NutritionError> {
        let query = capitalize_query(query);
        let url = self.url("fetch-food-data");
        let text = self.fetch_text(&url, &[("query", query.as_str())]).await?;
        let suggestions = normalize::suggestions_from_text(&text);
        tracing::debug!(%query, count = suggestions.len(), "food suggestions received");
        Ok(suggestions)
    }

    async fn get_food_detail(&self, fdc_id: i64) -> Result<NutrientProfile, NutritionError> {
        let url = self.url(&format!("fetch-food-details/{}", fdc_id));
        let text = self.fetch_text(&url, &[]).await?;
        Ok(normalize::normalize_text(&text))
    }

    async fn get_daily_calories(&self) -> Result<DailyCalorieSnapshot, NutritionError> {
        let url = self.url("daily-calories");
        let text = self.fetch_text(&url, &[]).await?;
        decode(&text)
    }

    async fn add_food_log(&self, request: &FoodLogRequest) -> Result<FoodLogAck, NutritionError> {
        let url = self.url("add-food-log");
        self.execute_json(self.post_request(&url).json(request))
            .await
    }

    async fn submit_profile(
        &self,
        profile: &ProfileSubmission,
    ) -> Result<ProfileMetrics, NutritionError> {
        let url = self.url("submit-data");
        self.execute_json(self.post_request(&url).json(profile))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_prefers_error_field() {
        assert_eq!(
            error_message(r#"{"error": "Meal time and foods are required"}"#),
            "Meal time and foods are required"
        );
        assert_eq!(error_message("plain failure"), "plain failure");
        assert_eq!(error_message(&"x".repeat(1000)).len(), 256);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ReqwestNutritionClient::new("http://h/", SecretString::new("t".into()));
        assert_eq!(client.url("daily-calories"), "http://h/api/daily-calories");
    }

    #[test]
    fn empty_token_is_unauthenticated() {
        let client = ReqwestNutritionClient::new("http://h", SecretString::new("".into()));
        assert!(client.ensure_token().unwrap_err().is_unauthenticated());
    }

    #[test]
    fn decode_reports_body_snippet() {
        let err = decode::<DailyCalorieSnapshot>("{\"calorie_target\": \"lots\"}").unwrap_err();
        match err {
            NutritionError::Decode(msg) => assert!(msg.contains("lots")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

//! Transcript provider client.
//!
//! Recordings live with a third-party transcription service; this client
//! fetches the finished transcript for a recording id.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

use crate::config::TranscriptConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct TranscriptClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl TranscriptClient {
    pub fn new(config: &TranscriptConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    /// Fetch the transcript text for an external recording id.
    pub async fn fetch_transcript(&self, recording_id: &str) -> Result<String> {
        let url = format!(
            "{}/v1/recordings/{}/transcript",
            self.base_url, recording_id
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .context("Transcript request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Transcript API error ({}): {}", status, body);
        }

        let payload: TranscriptBody = response
            .json()
            .await
            .context("Failed to parse transcript response")?;

        Ok(payload.transcript)
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptBody {
    #[serde(default)]
    transcript: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> TranscriptClient {
        TranscriptClient::new(&TranscriptConfig {
            api_key: "test-api-key".to_string(),
            base_url,
        })
    }

    #[tokio::test]
    async fn fetches_transcript_with_bearer_auth() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/recordings/rec-123/transcript"))
            .and(header("Authorization", "Bearer test-api-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "transcript": "Ana: let's start with the numbers."
            })))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let transcript = client
            .fetch_transcript("rec-123")
            .await
            .expect("should fetch transcript");

        assert_eq!(transcript, "Ana: let's start with the numbers.");
    }

    #[tokio::test]
    async fn missing_transcript_field_defaults_to_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/recordings/rec-123/transcript"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let transcript = client.fetch_transcript("rec-123").await.expect("should fetch");

        assert_eq!(transcript, "");
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/recordings/rec-404/transcript"))
            .respond_with(ResponseTemplate::new(404).set_body_string("recording not found"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.fetch_transcript("rec-404").await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("404"));
    }
}

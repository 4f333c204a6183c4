//! Language-model client shared by the meeting intelligence operations.
//!
//! Every operation goes through the same chat-completions request shape
//! (model, messages, temperature, max_tokens) against one configured
//! backend; each operation pins its own temperature and max_tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::LlmConfig;

const SUMMARY_TEMPERATURE: f32 = 0.3;
const SUMMARY_MAX_TOKENS: u32 = 500;
const EXTRACTION_TEMPERATURE: f32 = 0.2;
const EXTRACTION_MAX_TOKENS: u32 = 800;
const FOLLOWUP_TEMPERATURE: f32 = 0.7;
const FOLLOWUP_MAX_TOKENS: u32 = 400;

/// Language-model API error types
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network-level error (connection failed, timeout, etc.)
    #[error("Network error: {0}")]
    Network(String),

    /// Backend returned an error response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body doesn't match the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Client for the chat-completions backend
pub struct LlmClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

/// One email prepared for summarization: sender, subject, truncated body,
/// and received timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct EmailDigest {
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub date: DateTime<Utc>,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
        }
    }

    /// Summarize recent email threads ahead of a meeting.
    pub async fn summarize_thread(&self, emails: &[EmailDigest]) -> Result<String, LlmError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "You are an assistant preparing a short pre-meeting brief. \
                          Summarize the email threads below: open questions, commitments, \
                          and anything the attendees expect to discuss."
                    .to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: build_summary_prompt(emails),
            },
        ];

        self.chat(messages, SUMMARY_TEMPERATURE, SUMMARY_MAX_TOKENS)
            .await
    }

    /// Extract discrete action items from a meeting transcript.
    pub async fn extract_action_items(&self, transcript: &str) -> Result<Vec<String>, LlmError> {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "Extract the action items from the meeting transcript. \
                          Respond with a JSON array of strings, one per action item, \
                          and nothing else."
                    .to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: transcript.to_string(),
            },
        ];

        let content = self
            .chat(messages, EXTRACTION_TEMPERATURE, EXTRACTION_MAX_TOKENS)
            .await?;

        parse_action_items(&content)
    }

    /// Draft a follow-up email from an already-rendered prompt.
    pub async fn draft_followup(&self, prompt: &str) -> Result<String, LlmError> {
        let messages = vec![ChatMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        }];

        self.chat(messages, FOLLOWUP_TEMPERATURE, FOLLOWUP_MAX_TOKENS)
            .await
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("response contained no choices".to_string()))?;

        Ok(choice.message.content)
    }
}

fn build_summary_prompt(emails: &[EmailDigest]) -> String {
    let mut prompt = String::from("Recent emails from the meeting attendees:\n\n");

    for email in emails {
        prompt.push_str(&format!(
            "From: {}\nSubject: {}\nDate: {}\n{}\n\n",
            email.sender,
            email.subject,
            email.date.to_rfc3339(),
            email.body
        ));
    }

    prompt.push_str("Write a concise pre-meeting brief.");
    prompt
}

/// Parse the model's action-item response as a JSON array of strings.
///
/// Models occasionally wrap JSON in a markdown code fence; strip it before
/// parsing.
fn parse_action_items(content: &str) -> Result<Vec<String>, LlmError> {
    let trimmed = strip_code_fence(content.trim());

    serde_json::from_str(trimmed).map_err(|e| {
        LlmError::InvalidResponse(format!(
            "Failed to parse action items: {}. Content: {}",
            e, content
        ))
    })
}

fn strip_code_fence(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Drop an optional language tag after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches(['\r', '\n'])
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim_end()
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> LlmClient {
        LlmClient::new(&LlmConfig {
            api_key: "test-api-key".to_string(),
            base_url,
            model: "test-model".to_string(),
        })
    }

    fn completion_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn summarize_thread_returns_first_choice_content() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-api-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "temperature": 0.3,
                "max_tokens": 500
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body("Ana is waiting on the revised quote.")),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let emails = vec![EmailDigest {
            sender: "ana@example.com".to_string(),
            subject: "Quote".to_string(),
            body: "Any update on the revised quote?".to_string(),
            date: Utc::now(),
        }];

        let summary = client
            .summarize_thread(&emails)
            .await
            .expect("should summarize");

        assert_eq!(summary, "Ana is waiting on the revised quote.");
    }

    #[tokio::test]
    async fn followup_uses_fixed_temperature_and_max_tokens() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "temperature": 0.7,
                "max_tokens": 400,
                "messages": [{"role": "user", "content": "draft it"}]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(completion_body("Hi all, thanks...")),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let body = client.draft_followup("draft it").await.expect("should draft");

        assert_eq!(body, "Hi all, thanks...");
    }

    #[tokio::test]
    async fn extracts_action_items_from_json_array() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(completion_body(r#"["Send deck", "Book room"]"#)),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let items = client
            .extract_action_items("...transcript...")
            .await
            .expect("should extract");

        assert_eq!(items, vec!["Send deck".to_string(), "Book room".to_string()]);
    }

    #[tokio::test]
    async fn surfaces_api_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.draft_followup("draft it").await;

        assert!(matches!(result, Err(LlmError::Api { status: 429, .. })));
    }

    #[tokio::test]
    async fn rejects_response_without_choices() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.draft_followup("draft it").await;

        assert!(matches!(result, Err(LlmError::InvalidResponse(_))));
    }

    #[test]
    fn parses_fenced_action_items() {
        let fenced = "```json\n[\"Send deck\"]\n```";
        assert_eq!(
            parse_action_items(fenced).unwrap(),
            vec!["Send deck".to_string()]
        );
    }

    #[test]
    fn rejects_non_array_action_items() {
        assert!(parse_action_items("Sure! Here are the items:").is_err());
    }

    #[test]
    fn summary_prompt_includes_each_email() {
        let emails = vec![
            EmailDigest {
                sender: "ana@example.com".to_string(),
                subject: "Quote".to_string(),
                body: "Any update?".to_string(),
                date: Utc::now(),
            },
            EmailDigest {
                sender: "ben@example.com".to_string(),
                subject: "Agenda".to_string(),
                body: "Attached.".to_string(),
                date: Utc::now(),
            },
        ];

        let prompt = build_summary_prompt(&emails);
        assert!(prompt.contains("From: ana@example.com"));
        assert!(prompt.contains("Subject: Agenda"));
    }
}

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_redirect_uri: String,
    pub llm: LlmConfig,
    /// Transcript provider credentials; absent unless TRANSCRIPT_API_KEY is
    /// set, in which case transcript import no-ops with a warning.
    pub transcript: Option<TranscriptConfig>,
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct TranscriptConfig {
    pub api_key: String,
    pub base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let transcript = match env::var("TRANSCRIPT_API_KEY") {
            Ok(api_key) => Some(TranscriptConfig {
                api_key,
                base_url: env::var("TRANSCRIPT_API_URL")
                    .context("TRANSCRIPT_API_URL must be set when TRANSCRIPT_API_KEY is set")?,
            }),
            Err(_) => None,
        };

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            google_client_id: env::var("GOOGLE_CLIENT_ID")
                .context("GOOGLE_CLIENT_ID must be set")?,
            google_client_secret: env::var("GOOGLE_CLIENT_SECRET")
                .context("GOOGLE_CLIENT_SECRET must be set")?,
            oauth_redirect_uri: env::var("OAUTH_REDIRECT_URI").unwrap_or_else(|_| {
                "http://localhost:3000/api/accounts/oauth/callback".to_string()
            }),
            llm: LlmConfig {
                api_key: env::var("LLM_API_KEY").context("LLM_API_KEY must be set")?,
                base_url: env::var("LLM_BASE_URL")
                    .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
                model: env::var("LLM_MODEL")
                    .unwrap_or_else(|_| "openai/gpt-4o-mini".to_string()),
            },
            transcript,
        })
    }
}

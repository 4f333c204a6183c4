//! Meeting intelligence operations: prep summaries, transcript import,
//! action-item extraction, and follow-up drafts.
//!
//! Every operation catches its own failures and degrades to a benign
//! empty/default return; callers never see a typed error. The log lines
//! distinguish a missing record from a failed call.

use anyhow::{Context, Result};
use shared_types::{JsonText, Meeting};
use uuid::Uuid;

use crate::clients::llm::{EmailDigest, LlmClient};
use crate::clients::transcripts::TranscriptClient;
use crate::config::AppConfig;
use crate::db::{self, DbPool};

const PREP_EMAIL_LIMIT: i64 = 10;
const PREP_BODY_MAX_CHARS: usize = 500;
const FOLLOWUP_FALLBACK: &str = "Unable to generate follow-up email";

/// Generate a pre-meeting brief from recent attendee email threads.
///
/// Returns the stored summary, or an empty string when the meeting does
/// not exist or anything fails.
pub async fn generate_meeting_prep(pool: &DbPool, config: &AppConfig, meeting_id: Uuid) -> String {
    match prep_inner(pool, config, meeting_id).await {
        Ok(Some(summary)) => summary,
        Ok(None) => {
            tracing::warn!("Meeting {} not found, skipping prep", meeting_id);
            String::new()
        }
        Err(e) => {
            tracing::error!("Error generating meeting prep for {}: {:#}", meeting_id, e);
            String::new()
        }
    }
}

async fn prep_inner(
    pool: &DbPool,
    config: &AppConfig,
    meeting_id: Uuid,
) -> Result<Option<String>> {
    let mut conn = pool.get().await.context("Failed to get DB connection")?;

    let Some(meeting) = db::meetings::find_by_id(&mut conn, meeting_id).await? else {
        return Ok(None);
    };

    let emails =
        db::emails::recent_from_senders(&mut conn, &meeting.attendees, PREP_EMAIL_LIMIT).await?;

    let digests: Vec<EmailDigest> = emails
        .into_iter()
        .map(|email| EmailDigest {
            sender: email.sender,
            subject: email.subject,
            body: truncate_chars(&email.body, PREP_BODY_MAX_CHARS),
            date: email.received_at,
        })
        .collect();

    let llm = LlmClient::new(&config.llm);
    let summary = llm.summarize_thread(&digests).await?;

    db::meetings::set_prep_summary(&mut conn, meeting_id, &summary).await?;

    Ok(Some(summary))
}

/// Import a transcript from the transcript provider and attach it to the
/// meeting.
///
/// No-ops with a warning when provider credentials are not configured.
/// Returns the transcript on success, `None` on any failure; nothing is
/// written on the failure paths.
pub async fn import_transcript(
    pool: &DbPool,
    config: &AppConfig,
    meeting_id: Uuid,
    recording_id: &str,
) -> Option<String> {
    let Some(transcript_config) = config.transcript.as_ref() else {
        tracing::warn!("Transcript provider API key not configured");
        return None;
    };

    match import_inner(pool, transcript_config, meeting_id, recording_id).await {
        Ok(transcript) => Some(transcript),
        Err(e) => {
            tracing::error!(
                "Error importing transcript {} for meeting {}: {:#}",
                recording_id,
                meeting_id,
                e
            );
            None
        }
    }
}

async fn import_inner(
    pool: &DbPool,
    config: &crate::config::TranscriptConfig,
    meeting_id: Uuid,
    recording_id: &str,
) -> Result<String> {
    let client = TranscriptClient::new(config);
    let transcript = client.fetch_transcript(recording_id).await?;

    let mut conn = pool.get().await.context("Failed to get DB connection")?;

    if db::meetings::find_by_id(&mut conn, meeting_id).await?.is_some() {
        db::meetings::set_transcript(&mut conn, meeting_id, &transcript, recording_id).await?;
    } else {
        tracing::warn!("Meeting {} not found, transcript not attached", meeting_id);
    }

    Ok(transcript)
}

/// Extract action items from a meeting's stored transcript.
///
/// Returns an empty list when the meeting is missing, has no transcript,
/// or anything fails. The language model is only invoked when a transcript
/// exists.
pub async fn extract_action_items(
    pool: &DbPool,
    config: &AppConfig,
    meeting_id: Uuid,
) -> Vec<String> {
    match extract_inner(pool, config, meeting_id).await {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(
                "Error extracting action items for meeting {}: {:#}",
                meeting_id,
                e
            );
            Vec::new()
        }
    }
}

async fn extract_inner(
    pool: &DbPool,
    config: &AppConfig,
    meeting_id: Uuid,
) -> Result<Vec<String>> {
    let mut conn = pool.get().await.context("Failed to get DB connection")?;

    let Some(meeting) = db::meetings::find_by_id(&mut conn, meeting_id).await? else {
        tracing::warn!("Meeting {} not found, skipping extraction", meeting_id);
        return Ok(Vec::new());
    };

    let Some(transcript) = meeting.transcript.as_deref().filter(|t| !t.is_empty()) else {
        return Ok(Vec::new());
    };

    let llm = LlmClient::new(&config.llm);
    let items = llm.extract_action_items(transcript).await?;

    db::meetings::set_action_items(&mut conn, meeting_id, JsonText::new(items.clone())).await?;

    Ok(items)
}

/// Draft a follow-up email from the meeting's stored metadata.
///
/// Returns an empty string when the meeting does not exist, the fixed
/// fallback string when the model call fails.
pub async fn compose_followup(pool: &DbPool, config: &AppConfig, meeting_id: Uuid) -> String {
    let meeting = match load_meeting(pool, meeting_id).await {
        Ok(Some(meeting)) => meeting,
        Ok(None) => {
            tracing::warn!("Meeting {} not found, skipping follow-up", meeting_id);
            return String::new();
        }
        Err(e) => {
            tracing::error!("Error loading meeting {} for follow-up: {:#}", meeting_id, e);
            return String::new();
        }
    };

    let prompt = build_followup_prompt(&meeting);
    let llm = LlmClient::new(&config.llm);

    match llm.draft_followup(&prompt).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("Error generating follow-up for {}: {}", meeting_id, e);
            FOLLOWUP_FALLBACK.to_string()
        }
    }
}

async fn load_meeting(pool: &DbPool, meeting_id: Uuid) -> Result<Option<Meeting>> {
    let mut conn = pool.get().await.context("Failed to get DB connection")?;
    db::meetings::find_by_id(&mut conn, meeting_id).await
}

fn build_followup_prompt(meeting: &Meeting) -> String {
    let attendees = meeting.attendees.join(", ");
    let summary = meeting
        .prep_summary
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or("No summary available");
    let action_items = match meeting.action_items.as_ref().filter(|items| !items.is_empty()) {
        Some(items) => items.join("; "),
        None => "None".to_string(),
    };

    format!(
        "Generate a professional follow-up email after this meeting:\n\n\
         Title: {}\n\
         Attendees: {}\n\
         Summary: {}\n\
         Action Items: {}\n\n\
         Write a concise follow-up email.",
        meeting.title, attendees, summary, action_items
    )
}

/// Truncate to at most `max_chars` characters without splitting a
/// multi-byte character.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

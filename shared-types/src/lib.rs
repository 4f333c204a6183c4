use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod json_text;
pub use json_text::JsonText;

/// Calendar account with stored OAuth tokens, matching database column
/// order exactly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Account {
    pub id: Uuid,
    pub account_name: String,
    pub email_address: String,
    pub oauth_refresh_token: Option<String>,
    pub oauth_access_token: Option<String>,
    pub oauth_token_expires_at: Option<DateTime<Utc>>,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// API response for accounts (hides OAuth tokens)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Uuid,
    pub account_name: String,
    pub email_address: String,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse {
            id: account.id,
            account_name: account.account_name,
            email_address: account.email_address,
            last_synced: account.last_synced,
            created_at: account.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectAccountRequest {
    pub account_name: String,
}

/// Calendar event enriched with AI-derived artifacts, matching database
/// column order exactly.
///
/// Created by calendar sync; the transcript, prep summary, and action-item
/// columns are filled in later by the intelligence operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Meeting {
    pub id: Uuid,
    pub account_id: Uuid,
    pub calendar_id: String,
    pub event_id: String,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendees: JsonText<Vec<String>>,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub transcript: Option<String>,
    pub prep_summary: Option<String>,
    pub action_items: Option<JsonText<Vec<String>>>,
    pub recording_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Email row ingested by an external path; read-only in this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "diesel", derive(diesel::Queryable))]
pub struct Email {
    pub id: Uuid,
    pub sender: String,
    pub subject: String,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Counter pair returned by calendar sync.
///
/// A sync failure anywhere aborts the run and reports a single error, so
/// `errors` is 0 or 1 and `synced` reflects how many events were mapped
/// before the failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub synced: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportTranscriptRequest {
    pub recording_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrepSummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptImportResponse {
    pub transcript: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionItemsResponse {
    pub action_items: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowupResponse {
    pub body: String,
}

/// Query parameters for listing meetings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MeetingListQuery {
    pub account_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query parameters for listing emails
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmailListQuery {
    pub sender: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

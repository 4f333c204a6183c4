// Database models for Diesel
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use shared_types::JsonText;
use uuid::Uuid;

/// Insertable struct for meetings built from calendar events.
///
/// `id`, `created_at`, and `updated_at` come from database defaults; the
/// enrichment columns (transcript, prep summary, action items, recording
/// id) start NULL and are written later by the intelligence operations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = crate::schema::meetings)]
pub struct NewMeeting {
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
}

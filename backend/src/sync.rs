//! Calendar sync: provider events into Meeting rows.
//!
//! One call pulls the next 30 days of events from the account's primary
//! calendar and commits them as meetings in a single transaction.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::AsyncConnection;
use shared_types::{Account, JsonText, SyncReport};
use uuid::Uuid;

use crate::clients::calendar::{self, CalendarClient, CalendarEvent};
use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::models::NewMeeting;

const PRIMARY_CALENDAR: &str = "primary";
const SYNC_WINDOW_DAYS: i64 = 30;
const TOKEN_EXPIRY_SLACK_SECS: i64 = 60;

/// Sync upcoming events for one account.
///
/// Any failure aborts the whole run: no rows are committed and the report
/// carries a single error count. `synced` reflects how many events were
/// mapped before the failure.
pub async fn sync_calendar_events(
    pool: &DbPool,
    config: &AppConfig,
    account_id: Uuid,
) -> SyncReport {
    let mut report = SyncReport::default();

    if let Err(e) = sync_account(pool, config, account_id, &mut report).await {
        tracing::error!("Error syncing calendar for account {}: {:#}", account_id, e);
        report.errors += 1;
    }

    report
}

async fn sync_account(
    pool: &DbPool,
    config: &AppConfig,
    account_id: Uuid,
    report: &mut SyncReport,
) -> Result<()> {
    let mut conn = pool.get().await.context("Failed to get DB connection")?;

    let account = db::accounts::get_by_id(&mut conn, account_id).await?;
    let access_token = ensure_access_token(&mut conn, config, &account).await?;

    let now = Utc::now();
    let client = CalendarClient::new(access_token);
    let events = client
        .fetch_events(
            PRIMARY_CALENDAR,
            now,
            now + Duration::days(SYNC_WINDOW_DAYS),
        )
        .await?;

    let rows = map_events(account_id, PRIMARY_CALENDAR, events, report)?;

    conn.transaction::<_, anyhow::Error, _>(|conn| {
        async move {
            db::meetings::upsert_batch(conn, &rows).await?;
            db::accounts::touch_last_synced(conn, account_id).await?;
            Ok(())
        }
        .scope_boxed()
    })
    .await
    .context("Failed to commit synced meetings")?;

    Ok(())
}

/// Use the stored access token while it is still comfortably valid;
/// otherwise exchange the refresh token and persist the new access token.
async fn ensure_access_token(
    conn: &mut diesel_async::AsyncPgConnection,
    config: &AppConfig,
    account: &Account,
) -> Result<String> {
    if let (Some(token), Some(expires_at)) = (
        account.oauth_access_token.as_ref(),
        account.oauth_token_expires_at,
    ) {
        if expires_at > Utc::now() + Duration::seconds(TOKEN_EXPIRY_SLACK_SECS) {
            return Ok(token.clone());
        }
    }

    let refresh_token = account
        .oauth_refresh_token
        .as_deref()
        .context("Account has no refresh token; reconnect it")?;

    let refreshed = calendar::refresh_access_token(
        &config.google_client_id,
        &config.google_client_secret,
        refresh_token,
    )
    .await?;

    let expires_at = Utc::now() + Duration::seconds(refreshed.expires_in);
    db::accounts::update_access_token(conn, account.id, &refreshed.access_token, expires_at)
        .await?;

    Ok(refreshed.access_token)
}

fn map_events(
    account_id: Uuid,
    calendar_id: &str,
    events: Vec<CalendarEvent>,
    report: &mut SyncReport,
) -> Result<Vec<NewMeeting>> {
    let mut rows = Vec::with_capacity(events.len());

    for event in events {
        rows.push(meeting_from_event(account_id, calendar_id, event)?);
        report.synced += 1;
    }

    Ok(rows)
}

fn meeting_from_event(
    account_id: Uuid,
    calendar_id: &str,
    event: CalendarEvent,
) -> Result<NewMeeting> {
    let title = event
        .summary
        .with_context(|| format!("Event {} has no summary", event.id))?;
    let start_time = event
        .start
        .resolve()
        .with_context(|| format!("Event {} has no usable start time", event.id))?;
    let end_time = event
        .end
        .resolve()
        .with_context(|| format!("Event {} has no usable end time", event.id))?;

    let attendees: Vec<String> = event.attendees.into_iter().map(|a| a.email).collect();
    let meeting_link = event
        .conference_data
        .and_then(|c| c.entry_points.into_iter().next())
        .and_then(|entry| entry.uri);

    Ok(NewMeeting {
        account_id,
        calendar_id: calendar_id.to_string(),
        event_id: event.id,
        title,
        description: event.description,
        start_time,
        end_time,
        attendees: JsonText::new(attendees),
        location: event.location,
        meeting_link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::calendar::{
        ConferenceData, EntryPoint, EventAttendee, EventDateTime,
    };
    use chrono::TimeZone;

    fn timed(y: i32, mo: u32, d: u32, h: u32) -> EventDateTime {
        EventDateTime {
            date_time: Some(Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()),
            date: None,
        }
    }

    fn sample_event(id: &str) -> CalendarEvent {
        CalendarEvent {
            id: id.to_string(),
            summary: Some("Quarterly review".to_string()),
            description: Some("Numbers and next steps".to_string()),
            start: timed(2026, 3, 2, 15),
            end: timed(2026, 3, 2, 16),
            attendees: vec![
                EventAttendee {
                    email: "ana@example.com".to_string(),
                },
                EventAttendee {
                    email: "ben@example.com".to_string(),
                },
            ],
            location: Some("Room 4".to_string()),
            conference_data: Some(ConferenceData {
                entry_points: vec![
                    EntryPoint {
                        uri: Some("https://meet.example.com/abc".to_string()),
                    },
                    EntryPoint {
                        uri: Some("tel:+1-555-0100".to_string()),
                    },
                ],
            }),
        }
    }

    #[test]
    fn maps_timed_event_fields() {
        let meeting =
            meeting_from_event(Uuid::new_v4(), "primary", sample_event("evt-1")).unwrap();

        assert_eq!(meeting.event_id, "evt-1");
        assert_eq!(meeting.calendar_id, "primary");
        assert_eq!(meeting.title, "Quarterly review");
        assert_eq!(
            *meeting.attendees,
            vec!["ana@example.com".to_string(), "ben@example.com".to_string()]
        );
        assert_eq!(
            meeting.meeting_link.as_deref(),
            Some("https://meet.example.com/abc")
        );
        assert_eq!(
            meeting.start_time,
            Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn all_day_event_falls_back_to_date_fields() {
        let mut event = sample_event("evt-2");
        event.start = EventDateTime {
            date_time: None,
            date: Some(chrono::NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()),
        };
        event.end = EventDateTime {
            date_time: None,
            date: Some(chrono::NaiveDate::from_ymd_opt(2026, 3, 11).unwrap()),
        };

        let meeting = meeting_from_event(Uuid::new_v4(), "primary", event).unwrap();
        assert_eq!(
            meeting.start_time,
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
        );
        assert_eq!(
            meeting.end_time,
            Utc.with_ymd_and_hms(2026, 3, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn event_without_conference_data_has_no_link() {
        let mut event = sample_event("evt-3");
        event.conference_data = None;

        let meeting = meeting_from_event(Uuid::new_v4(), "primary", event).unwrap();
        assert!(meeting.meeting_link.is_none());
    }

    #[test]
    fn event_without_start_is_an_error() {
        let mut event = sample_event("evt-4");
        event.start = EventDateTime::default();

        let result = meeting_from_event(Uuid::new_v4(), "primary", event);
        assert!(result.is_err());
    }

    #[test]
    fn map_events_counts_every_valid_event() {
        let events = vec![sample_event("evt-1"), sample_event("evt-2")];
        let mut report = SyncReport::default();

        let rows = map_events(Uuid::new_v4(), "primary", events, &mut report).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(report.synced, 2);
        assert_eq!(report.errors, 0);
    }

    #[test]
    fn map_events_aborts_on_first_bad_event() {
        let mut bad = sample_event("evt-bad");
        bad.summary = None;
        let events = vec![sample_event("evt-1"), bad, sample_event("evt-3")];
        let mut report = SyncReport::default();

        let result = map_events(Uuid::new_v4(), "primary", events, &mut report);

        assert!(result.is_err());
        // Only the event mapped before the failure counts.
        assert_eq!(report.synced, 1);
    }
}

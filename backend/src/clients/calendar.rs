//! Google Calendar REST client for fetching upcoming events.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;

const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Client for listing events from a single calendar.
pub struct CalendarClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl CalendarClient {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
            access_token: access_token.into(),
        }
    }

    /// Override the API base URL (for testing against a local mock).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Fetch expanded single events for `calendar_id` between `time_min`
    /// and `time_max`, ordered by start time.
    pub async fn fetch_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .query(&[
                (
                    "timeMin",
                    time_min.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                (
                    "timeMax",
                    time_max.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
            ])
            .send()
            .await
            .context("Calendar events request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Calendar API error ({}): {}", status, body);
        }

        let events: EventsResponse = response
            .json()
            .await
            .context("Failed to parse events response")?;

        Ok(events.items)
    }
}

/// Exchange a refresh token for a fresh access token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenRefreshResponse> {
    refresh_access_token_at(GOOGLE_TOKEN_URL, client_id, client_secret, refresh_token).await
}

pub(crate) async fn refresh_access_token_at(
    token_url: &str,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenRefreshResponse> {
    let client = reqwest::Client::new();
    let response = client
        .post(token_url)
        .form(&[
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .send()
        .await
        .context("Token refresh request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        anyhow::bail!("Token refresh failed ({}): {}", status, body);
    }

    let refreshed: TokenRefreshResponse = response
        .json()
        .await
        .context("Failed to parse token response")?;

    Ok(refreshed)
}

#[derive(Debug, Deserialize)]
pub struct TokenRefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct EventsResponse {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// A calendar event as returned by the provider's events list.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    #[serde(default)]
    pub attendees: Vec<EventAttendee>,
    pub location: Option<String>,
    #[serde(rename = "conferenceData")]
    pub conference_data: Option<ConferenceData>,
}

/// Timed events carry `dateTime`; all-day events carry only `date`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventDateTime {
    #[serde(rename = "dateTime")]
    pub date_time: Option<DateTime<Utc>>,
    pub date: Option<NaiveDate>,
}

impl EventDateTime {
    /// Resolve to a timestamp, falling back from the timed field to the
    /// all-day date at midnight UTC.
    pub fn resolve(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .or_else(|| self.date.map(all_day_to_utc))
    }
}

fn all_day_to_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventAttendee {
    pub email: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConferenceData {
    #[serde(default, rename = "entryPoints")]
    pub entry_points: Vec<EntryPoint>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryPoint {
    pub uri: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn fetches_and_parses_events() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .and(query_param("singleEvents", "true"))
            .and(query_param("orderBy", "startTime"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "items": [
                    {
                        "id": "evt-1",
                        "summary": "Quarterly review",
                        "description": "Numbers and next steps",
                        "start": {"dateTime": "2026-03-02T15:00:00Z"},
                        "end": {"dateTime": "2026-03-02T16:00:00Z"},
                        "attendees": [
                            {"email": "ana@example.com"},
                            {"email": "ben@example.com"}
                        ],
                        "location": "Room 4",
                        "conferenceData": {
                            "entryPoints": [
                                {"uri": "https://meet.example.com/abc"},
                                {"uri": "tel:+1-555-0100"}
                            ]
                        }
                    },
                    {
                        "id": "evt-2",
                        "summary": "Offsite",
                        "start": {"date": "2026-03-10"},
                        "end": {"date": "2026-03-11"}
                    }
                ]
            })))
            .mount(&server)
            .await;

        let client = CalendarClient::new("test-token").with_base_url(server.uri());
        let time_min = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let time_max = Utc.with_ymd_and_hms(2026, 3, 31, 0, 0, 0).unwrap();

        let events = client
            .fetch_events("primary", time_min, time_max)
            .await
            .expect("should fetch events");

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, "evt-1");
        assert_eq!(events[0].attendees.len(), 2);
        assert_eq!(
            events[0]
                .conference_data
                .as_ref()
                .unwrap()
                .entry_points[0]
                .uri
                .as_deref(),
            Some("https://meet.example.com/abc")
        );
        assert!(events[1].start.date_time.is_none());
        assert_eq!(
            events[1].start.resolve().unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/calendars/primary/events"))
            .respond_with(ResponseTemplate::new(403).set_body_string("insufficient scope"))
            .mount(&server)
            .await;

        let client = CalendarClient::new("test-token").with_base_url(server.uri());
        let now = Utc::now();

        let result = client
            .fetch_events("primary", now, now + chrono::Duration::days(30))
            .await;

        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("403"));
    }

    #[tokio::test]
    async fn refreshes_access_token_with_refresh_grant() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "fresh-token",
                "expires_in": 3599
            })))
            .mount(&server)
            .await;

        let refreshed = refresh_access_token_at(
            &format!("{}/token", server.uri()),
            "client-id",
            "client-secret",
            "refresh-abc",
        )
        .await
        .expect("should refresh");

        assert_eq!(refreshed.access_token, "fresh-token");
        assert_eq!(refreshed.expires_in, 3599);
    }

    #[test]
    fn resolve_prefers_timed_over_all_day() {
        let timed = Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap();
        let both = EventDateTime {
            date_time: Some(timed),
            date: Some(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()),
        };
        assert_eq!(both.resolve(), Some(timed));

        let neither = EventDateTime::default();
        assert_eq!(neither.resolve(), None);
    }
}

use anyhow::Context;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{
    pooled_connection::{deadpool::Pool, AsyncDieselConnectionManager, ManagerConfig},
    AsyncPgConnection, RunQueryDsl,
};
use shared_types::{Account, Email, JsonText, Meeting};
use uuid::Uuid;

use crate::models::NewMeeting;

pub type DbPool = Pool<AsyncPgConnection>;

async fn establish_tls_connection(config: String) -> diesel::ConnectionResult<AsyncPgConnection> {
    // Set up rustls TLS configuration
    let root_store =
        rustls::RootCertStore::from_iter(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let tls_config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();
    let tls = tokio_postgres_rustls::MakeRustlsConnect::new(tls_config);

    // Parse the connection string and connect with TLS
    let (client, connection) = tokio_postgres::connect(&config, tls)
        .await
        .map_err(|e| diesel::ConnectionError::BadConnection(e.to_string()))?;

    // Spawn the connection task
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    // Build the async connection from the tokio-postgres client
    AsyncPgConnection::try_from(client).await
}

pub fn establish_connection_pool() -> anyhow::Result<DbPool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let mut manager_config = ManagerConfig::default();
    manager_config.custom_setup =
        Box::new(|url| Box::pin(establish_tls_connection(url.to_string())));

    let config = AsyncDieselConnectionManager::<AsyncPgConnection>::new_with_config(
        database_url,
        manager_config,
    );
    let pool = Pool::builder(config).build()?;

    Ok(pool)
}

// Calendar account database operations
pub mod accounts {
    use super::*;

    pub async fn list_all(conn: &mut AsyncPgConnection) -> anyhow::Result<Vec<Account>> {
        use crate::schema::accounts::dsl::*;

        let items = accounts
            .order_by(created_at.desc())
            .load::<Account>(conn)
            .await?;

        Ok(items)
    }

    pub async fn get_by_id(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
    ) -> anyhow::Result<Account> {
        use crate::schema::accounts::dsl::*;

        let account = accounts
            .filter(id.eq(account_id))
            .first::<Account>(conn)
            .await?;

        Ok(account)
    }

    pub async fn create(
        conn: &mut AsyncPgConnection,
        account_name_val: &str,
        email_addr: &str,
    ) -> anyhow::Result<Account> {
        use crate::schema::accounts::dsl::*;

        let new_account = diesel::insert_into(accounts)
            .values((account_name.eq(account_name_val), email_address.eq(email_addr)))
            .get_result::<Account>(conn)
            .await?;

        Ok(new_account)
    }

    pub async fn update_oauth_tokens(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
        refresh_token: &str,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<Account> {
        use crate::schema::accounts::dsl::*;

        let updated = diesel::update(accounts.filter(id.eq(account_id)))
            .set((
                oauth_refresh_token.eq(Some(refresh_token)),
                oauth_access_token.eq(Some(access_token)),
                oauth_token_expires_at.eq(Some(expires_at)),
            ))
            .get_result::<Account>(conn)
            .await?;

        Ok(updated)
    }

    /// Persist a refreshed access token without touching the refresh token.
    pub async fn update_access_token(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
        access_token: &str,
        expires_at: DateTime<Utc>,
    ) -> anyhow::Result<()> {
        use crate::schema::accounts::dsl::*;

        diesel::update(accounts.filter(id.eq(account_id)))
            .set((
                oauth_access_token.eq(Some(access_token)),
                oauth_token_expires_at.eq(Some(expires_at)),
            ))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn update_email_address(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
        email_addr: &str,
    ) -> anyhow::Result<()> {
        use crate::schema::accounts::dsl::*;

        diesel::update(accounts.filter(id.eq(account_id)))
            .set(email_address.eq(email_addr))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn touch_last_synced(
        conn: &mut AsyncPgConnection,
        account_id: Uuid,
    ) -> anyhow::Result<()> {
        use crate::schema::accounts::dsl::*;

        diesel::update(accounts.filter(id.eq(account_id)))
            .set(last_synced.eq(Some(Utc::now())))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn delete(conn: &mut AsyncPgConnection, account_id: Uuid) -> anyhow::Result<()> {
        use crate::schema::accounts::dsl::*;

        diesel::delete(accounts.filter(id.eq(account_id)))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Meeting database operations
pub mod meetings {
    use super::*;

    pub async fn list(
        conn: &mut AsyncPgConnection,
        acc_id: Option<Uuid>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> anyhow::Result<Vec<Meeting>> {
        use crate::schema::meetings::dsl::*;

        let mut query = meetings.order_by(start_time.asc()).into_boxed();

        if let Some(acc) = acc_id {
            query = query.filter(account_id.eq(acc));
        }
        if let Some(l) = limit {
            query = query.limit(l);
        }
        if let Some(o) = offset {
            query = query.offset(o);
        }

        let items = query.load::<Meeting>(conn).await?;
        Ok(items)
    }

    pub async fn find_by_id(
        conn: &mut AsyncPgConnection,
        meeting_id: Uuid,
    ) -> anyhow::Result<Option<Meeting>> {
        use crate::schema::meetings::dsl::*;

        let meeting = meetings
            .filter(id.eq(meeting_id))
            .first::<Meeting>(conn)
            .await
            .optional()?;

        Ok(meeting)
    }

    /// Upsert a batch of synced meetings in one statement.
    ///
    /// Conflicts on (account_id, event_id) refresh the calendar-sourced
    /// columns only; transcript, prep summary, action items, and recording
    /// id survive re-syncs.
    pub async fn upsert_batch(
        conn: &mut AsyncPgConnection,
        rows: &[NewMeeting],
    ) -> anyhow::Result<usize> {
        use crate::schema::meetings::dsl::*;
        use diesel::upsert::excluded;

        if rows.is_empty() {
            return Ok(0);
        }

        let count = diesel::insert_into(meetings)
            .values(rows)
            .on_conflict((account_id, event_id))
            .do_update()
            .set((
                title.eq(excluded(title)),
                description.eq(excluded(description)),
                start_time.eq(excluded(start_time)),
                end_time.eq(excluded(end_time)),
                attendees.eq(excluded(attendees)),
                location.eq(excluded(location)),
                meeting_link.eq(excluded(meeting_link)),
                updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await?;

        Ok(count)
    }

    pub async fn set_prep_summary(
        conn: &mut AsyncPgConnection,
        meeting_id: Uuid,
        summary: &str,
    ) -> anyhow::Result<()> {
        use crate::schema::meetings::dsl::*;

        diesel::update(meetings.filter(id.eq(meeting_id)))
            .set((prep_summary.eq(Some(summary)), updated_at.eq(Utc::now())))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn set_transcript(
        conn: &mut AsyncPgConnection,
        meeting_id: Uuid,
        transcript_text: &str,
        recording: &str,
    ) -> anyhow::Result<()> {
        use crate::schema::meetings::dsl::*;

        diesel::update(meetings.filter(id.eq(meeting_id)))
            .set((
                transcript.eq(Some(transcript_text)),
                recording_id.eq(Some(recording)),
                updated_at.eq(Utc::now()),
            ))
            .execute(conn)
            .await?;

        Ok(())
    }

    pub async fn set_action_items(
        conn: &mut AsyncPgConnection,
        meeting_id: Uuid,
        items: JsonText<Vec<String>>,
    ) -> anyhow::Result<()> {
        use crate::schema::meetings::dsl::*;

        diesel::update(meetings.filter(id.eq(meeting_id)))
            .set((action_items.eq(Some(items)), updated_at.eq(Utc::now())))
            .execute(conn)
            .await?;

        Ok(())
    }
}

// Email database operations (read-only; rows are owned by an external
// ingestion path)
pub mod emails {
    use super::*;

    pub async fn list(
        conn: &mut AsyncPgConnection,
        sender_filter: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> anyhow::Result<Vec<Email>> {
        use crate::schema::emails::dsl::*;

        let mut query = emails.order_by(received_at.desc()).into_boxed();

        if let Some(s) = sender_filter {
            query = query.filter(sender.eq(s.to_string()));
        }
        if let Some(l) = limit {
            query = query.limit(l);
        }
        if let Some(o) = offset {
            query = query.offset(o);
        }

        let items = query.load::<Email>(conn).await?;
        Ok(items)
    }

    /// The most recent emails whose sender is one of the given addresses,
    /// newest first.
    pub async fn recent_from_senders(
        conn: &mut AsyncPgConnection,
        senders: &[String],
        limit: i64,
    ) -> anyhow::Result<Vec<Email>> {
        use crate::schema::emails::dsl::*;

        let items = emails
            .filter(sender.eq_any(senders))
            .order_by(received_at.desc())
            .limit(limit)
            .load::<Email>(conn)
            .await?;

        Ok(items)
    }
}

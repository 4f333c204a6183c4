use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared_types::{
    AccountResponse, ActionItemsResponse, ConnectAccountRequest, Email, EmailListQuery,
    FollowupResponse, ImportTranscriptRequest, Meeting, MeetingListQuery, PrepSummaryResponse,
    SyncReport, TranscriptImportResponse,
};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::db::{self, DbPool};
use crate::error::{ApiError, ApiResult};
use crate::{intelligence, sync};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: AppConfig,
}

// Account handlers
pub async fn list_accounts(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<AccountResponse>>> {
    let mut conn = state.pool.get().await?;

    let accounts = db::accounts::list_all(&mut conn).await?;
    let responses: Vec<AccountResponse> = accounts.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let mut conn = state.pool.get().await?;

    db::accounts::delete(&mut conn, account_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct OAuthStartResponse {
    pub auth_url: String,
    pub account_id: Uuid,
}

// OAuth flow - Step 1: create the account row and hand back a consent URL
pub async fn start_google_oauth(
    State(state): State<AppState>,
    Json(payload): Json<ConnectAccountRequest>,
) -> ApiResult<Json<OAuthStartResponse>> {
    let mut conn = state.pool.get().await?;

    // Placeholder email until the OAuth callback reports the real one
    let account =
        db::accounts::create(&mut conn, &payload.account_name, "pending@oauth.flow").await?;

    let auth_url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?\
         client_id={}&\
         redirect_uri={}&\
         response_type=code&\
         scope=https://www.googleapis.com/auth/calendar.readonly&\
         access_type=offline&\
         prompt=consent&\
         state={}",
        urlencoding::encode(&state.config.google_client_id),
        urlencoding::encode(&state.config.oauth_redirect_uri),
        account.id
    );

    Ok(Json(OAuthStartResponse {
        auth_url,
        account_id: account.id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: String,
    pub state: String,
}

// OAuth flow - Step 2: exchange the code and persist tokens
pub async fn google_oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackParams>,
) -> impl IntoResponse {
    let account_id = match Uuid::parse_str(&params.state) {
        Ok(account_uuid) => account_uuid,
        Err(_) => return Redirect::to("/oauth/error?msg=invalid_state").into_response(),
    };

    #[derive(Serialize)]
    struct TokenRequest {
        code: String,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        grant_type: String,
    }

    #[derive(Deserialize, Debug)]
    struct TokenResponse {
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
    }

    let client = reqwest::Client::new();
    let token_response = match client
        .post("https://oauth2.googleapis.com/token")
        .form(&TokenRequest {
            code: params.code.clone(),
            client_id: state.config.google_client_id.clone(),
            client_secret: state.config.google_client_secret.clone(),
            redirect_uri: state.config.oauth_redirect_uri.clone(),
            grant_type: "authorization_code".to_string(),
        })
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(_) => return Redirect::to("/oauth/error?msg=token_exchange_failed").into_response(),
    };

    let tokens: TokenResponse = match token_response.json().await {
        Ok(t) => t,
        Err(_) => return Redirect::to("/oauth/error?msg=invalid_token_response").into_response(),
    };

    let refresh_token = match tokens.refresh_token {
        Some(rt) => rt,
        None => return Redirect::to("/oauth/error?msg=no_refresh_token").into_response(),
    };

    // Get the account's email address using the access token
    #[derive(Deserialize)]
    struct UserInfo {
        email: String,
    }

    let user_info: UserInfo = match client
        .get("https://www.googleapis.com/oauth2/v2/userinfo")
        .bearer_auth(&tokens.access_token)
        .send()
        .await
    {
        Ok(resp) => match resp.json().await {
            Ok(info) => info,
            Err(_) => return Redirect::to("/oauth/error?msg=failed_to_get_email").into_response(),
        },
        Err(_) => return Redirect::to("/oauth/error?msg=failed_to_get_email").into_response(),
    };

    let mut conn = match state.pool.get().await {
        Ok(c) => c,
        Err(_) => return Redirect::to("/oauth/error?msg=db_error").into_response(),
    };

    let expires_at = Utc::now() + chrono::Duration::seconds(tokens.expires_in);

    if db::accounts::update_oauth_tokens(
        &mut conn,
        account_id,
        &refresh_token,
        &tokens.access_token,
        expires_at,
    )
    .await
    .is_err()
    {
        return Redirect::to("/oauth/error?msg=db_update_failed").into_response();
    }

    if db::accounts::update_email_address(&mut conn, account_id, &user_info.email)
        .await
        .is_err()
    {
        return Redirect::to("/oauth/error?msg=email_update_failed").into_response();
    }

    Redirect::to("/oauth/success").into_response()
}

// Sync handler
pub async fn sync_account(
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
) -> ApiResult<Json<SyncReport>> {
    let report = sync::sync_calendar_events(&state.pool, &state.config, account_id).await;

    Ok(Json(report))
}

// Meeting handlers
pub async fn list_meetings(
    State(state): State<AppState>,
    Query(query): Query<MeetingListQuery>,
) -> ApiResult<Json<Vec<Meeting>>> {
    let mut conn = state.pool.get().await?;

    let meetings =
        db::meetings::list(&mut conn, query.account_id, query.limit, query.offset).await?;

    Ok(Json(meetings))
}

pub async fn get_meeting(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<Json<Meeting>> {
    let mut conn = state.pool.get().await?;

    let meeting = db::meetings::find_by_id(&mut conn, meeting_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Meeting"))?;

    Ok(Json(meeting))
}

// Intelligence handlers
pub async fn generate_meeting_prep(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<Json<PrepSummaryResponse>> {
    let summary =
        intelligence::generate_meeting_prep(&state.pool, &state.config, meeting_id).await;

    Ok(Json(PrepSummaryResponse { summary }))
}

pub async fn import_transcript(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
    Json(payload): Json<ImportTranscriptRequest>,
) -> ApiResult<Json<TranscriptImportResponse>> {
    if payload.recording_id.trim().is_empty() {
        return Err(ApiError::bad_request("recording_id must not be empty"));
    }

    let transcript = intelligence::import_transcript(
        &state.pool,
        &state.config,
        meeting_id,
        payload.recording_id.trim(),
    )
    .await;

    Ok(Json(TranscriptImportResponse { transcript }))
}

pub async fn extract_action_items(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<Json<ActionItemsResponse>> {
    let action_items =
        intelligence::extract_action_items(&state.pool, &state.config, meeting_id).await;

    Ok(Json(ActionItemsResponse { action_items }))
}

pub async fn compose_followup(
    State(state): State<AppState>,
    Path(meeting_id): Path<Uuid>,
) -> ApiResult<Json<FollowupResponse>> {
    let body = intelligence::compose_followup(&state.pool, &state.config, meeting_id).await;

    Ok(Json(FollowupResponse { body }))
}

// Email handlers (read-only)
pub async fn list_emails(
    State(state): State<AppState>,
    Query(query): Query<EmailListQuery>,
) -> ApiResult<Json<Vec<Email>>> {
    let mut conn = state.pool.get().await?;

    let emails = db::emails::list(
        &mut conn,
        query.sender.as_deref(),
        query.limit,
        query.offset,
    )
    .await?;

    Ok(Json(emails))
}

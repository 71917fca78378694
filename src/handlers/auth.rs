use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, Result},
    models::session::Session,
    services::auth::{LoginRequest, SignupRequest},
    state::AppState,
    validation::auth::MISSING_FIELDS_MESSAGE,
};

/// The request payload for logout.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LogoutRequest {
    pub access_token: String,
}

/// The response payload for session lookup.
#[derive(Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// Handles user signup. An unreadable body counts as missing fields.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(e) => {
            tracing::debug!("Unreadable signup body: {}", e);
            return Err(AppError::UserInput(MISSING_FIELDS_MESSAGE.to_string()));
        }
    };
    tracing::info!("📝 Signup attempt - Payload: {:?}", payload);

    let response = state.auth.signup(payload).await?;

    tracing::info!("✅ User registered: {}", response.user.id);
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user login. An unreadable body carries no credentials.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(e) => {
            tracing::debug!("Unreadable login body: {}", e);
            LoginRequest::default()
        }
    };
    tracing::info!("🔐 Login attempt - Payload: {:?}", payload);

    let response = state.auth.login(payload).await?;

    tracing::info!("✅ User logged in: {}", response.user.id);
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout. An unreadable body carries an empty token.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    body: std::result::Result<Json<LogoutRequest>, JsonRejection>,
) -> Result<Response> {
    let payload = match body {
        Ok(Json(payload)) => payload,
        Err(e) => {
            tracing::debug!("Unreadable logout body: {}", e);
            LogoutRequest::default()
        }
    };
    let response = state.auth.logout(&payload.access_token).await?;
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles session lookup by access token.
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Path(access_token): Path<String>,
) -> Result<Response> {
    tracing::debug!("🔑 Session lookup");

    let session = state.auth.get_session(&access_token).await?;
    Ok((StatusCode::OK, Json(SessionResponse { session })).into_response())
}

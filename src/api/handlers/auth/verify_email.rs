//! Email verification flow: an authenticated account requests a link, and
//! anyone holding the link can redeem it. Possession of the token is the only
//! credential at redemption time.

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{notify::verification_email, token::Claims};

use super::password::display_name;
use super::principal::require_auth;
use super::state::AppState;
use super::types::MessageResponse;

#[utoipa::path(
    post,
    path = "/api/auth/verify-email",
    responses(
        (status = 200, description = "Verification email dispatched", body = MessageResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Mail server down")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(headers, state))]
pub async fn request_verify_email(
    headers: HeaderMap,
    state: Extension<Arc<AppState>>,
) -> impl IntoResponse {
    let identity = match require_auth(&headers, &state).await {
        Ok(identity) => identity,
        Err(status) => return status.into_response(),
    };
    let account = identity.account().clone();

    let exp = (Utc::now() + Duration::seconds(state.config().email_token_ttl_seconds()))
        .timestamp();
    let token = match state.codec().encode(&Claims::for_email(&account.email, exp)) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint email verification token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token creation failed".to_string(),
            )
                .into_response();
        }
    };

    let name = display_name(state.as_ref(), account.clone()).await;
    let message =
        verification_email(&account.email, &name, &state.config().verify_email_url(&token));
    if let Err(err) = state.email().send(&message).await {
        error!("Failed to dispatch verification email: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Mail server down".to_string(),
        )
            .into_response();
    }

    Json(MessageResponse::new("mail sent successfully")).into_response()
}

#[utoipa::path(
    get,
    path = "/api/auth/verify-email/{token}",
    params(
        ("token" = String, Path, description = "Sealed verification token from the email link")
    ),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Email claim missing from token"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Account vanished since the token was minted")
    ),
    tag = "auth"
)]
#[instrument(skip(state, token))]
pub async fn redeem_verify_email(
    state: Extension<Arc<AppState>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    let Some(claims) = state.codec().decode(&token) else {
        return (StatusCode::FORBIDDEN, "Token not valid".to_string()).into_response();
    };
    let Some(email) = claims.email else {
        return (
            StatusCode::BAD_REQUEST,
            "Email not found in token".to_string(),
        )
            .into_response();
    };

    let account = match state.directory().find_account_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up account for email verification: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
                .into_response();
        }
    };

    // Redeeming twice is fine; the write is idempotent.
    if let Err(err) = state.directory().set_email_verified(account.id).await {
        error!("Failed to set email verified: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Verification failed".to_string(),
        )
            .into_response();
    }

    Json(MessageResponse::new("email verified successfully")).into_response()
}

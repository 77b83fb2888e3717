//! Password reset flow: request a reset link by email, redeem it with a new
//! password. The link is the only credential at redemption time.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::{
    api::handlers::valid_email,
    directory::Identity,
    notify::password_reset_email,
    token::Claims,
};

use super::state::AppState;
use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use super::utils::{hash_password, normalize_email, valid_password};

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email dispatched", body = MessageResponse),
        (status = 404, description = "No account with that email"),
        (status = 500, description = "Mail server down")
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let request: ForgotPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    let account = match state.directory().find_account_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            debug!("No account for password reset request");
            return (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up account for password reset: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
                .into_response();
        }
    };

    let exp = (Utc::now() + Duration::seconds(state.config().reset_token_ttl_seconds()))
        .timestamp();
    let token = match state.codec().encode(&Claims::for_email(&account.email, exp)) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint password reset token: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token creation failed".to_string(),
            )
                .into_response();
        }
    };

    let name = display_name(state.as_ref(), account.clone()).await;
    let message = password_reset_email(&account.email, &name, &state.config().reset_url(&token));
    if let Err(err) = state.email().send(&message).await {
        error!("Failed to dispatch password reset email: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Mail server down".to_string(),
        )
            .into_response();
    }

    Json(MessageResponse::new("mail sent successfully")).into_response()
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password/{token}",
    request_body = ResetPasswordRequest,
    params(
        ("token" = String, Path, description = "Sealed reset token from the email link")
    ),
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Malformed claims or weak password"),
        (status = 403, description = "Invalid or expired token"),
        (status = 404, description = "Account vanished since the token was minted")
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload, token))]
pub async fn reset_password(
    state: Extension<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let request: ResetPasswordRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    // Expired, tampered, and garbage tokens are indistinguishable here.
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

    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let account = match state.directory().find_account_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Account not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up account for password reset: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
                .into_response();
        }
    };

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash new password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Password update failed".to_string(),
            )
                .into_response();
        }
    };
    if let Err(err) = state
        .directory()
        .set_password_hash(account.id, &password_hash)
        .await
    {
        error!("Failed to store new password hash: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Password update failed".to_string(),
        )
            .into_response();
    }

    Json(MessageResponse::new("reset password successful")).into_response()
}

/// Best display name for outbound email: profile name when resolvable, the
/// address otherwise.
pub(super) async fn display_name(state: &AppState, account: crate::directory::Account) -> String {
    let email = account.email.clone();
    match crate::directory::resolve(state.directory(), account).await {
        Ok(Identity::Student(profile)) => profile.full_name,
        Ok(Identity::Institute(profile)) => profile.display_name,
        _ => email,
    }
}

//! Password login and access-token refresh.

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::api::handlers::valid_email;

use super::state::AppState;
use super::types::{AccessTokenResponse, LoginRequest, RefreshRequest};
use super::utils::{normalize_email, verify_password};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = super::session::TokenPair),
        (status = 401, description = "Unknown email, wrong password, or inactive account")
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn login(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    // Unknown email and wrong password are indistinguishable on purpose.
    let account = match state.directory().find_account_by_email(&email).await {
        Ok(Some(account)) => account,
        Ok(None) => {
            debug!("Login attempt for unknown email");
            return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up account for login: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string())
                .into_response();
        }
    };

    if !account.is_active || !verify_password(&request.password, &account.password_hash) {
        return (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()).into_response();
    }

    match state.sessions().issue_pair(account.id) {
        Ok(pair) => Json(pair).into_response(),
        Err(err) => {
            error!("Failed to issue session credentials: {err}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Login failed".to_string()).into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Fresh access token", body = AccessTokenResponse),
        (status = 401, description = "Invalid, expired, or wrong-kind refresh token")
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn refresh(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RefreshRequest>>,
) -> impl IntoResponse {
    let request: RefreshRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(account_id) = state.sessions().verify_refresh(&request.refresh_token) else {
        return (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string()).into_response();
    };

    // The account must still exist and be active at refresh time.
    match state.directory().find_account_by_id(account_id).await {
        Ok(Some(account)) if account.is_active => {}
        Ok(_) => {
            return (StatusCode::UNAUTHORIZED, "Invalid refresh token".to_string())
                .into_response();
        }
        Err(err) => {
            error!("Failed to look up account for refresh: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Refresh failed".to_string(),
            )
                .into_response();
        }
    }

    match state.sessions().issue_access(account_id) {
        Ok(access_token) => Json(AccessTokenResponse { access_token }).into_response(),
        Err(err) => {
            error!("Failed to issue access token: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Refresh failed".to_string(),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{TEST_PASSWORD, register_student, test_state};
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn login_missing_payload() {
        let state = test_state();
        let response = login(Extension(state), None).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_unknown_email_is_unauthorized() {
        let state = test_state();
        let response = login(
            Extension(state),
            Some(Json(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever-password".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_wrong_password_is_unauthorized() -> Result<()> {
        let state = test_state();
        register_student(&state, "alice@example.com", "+919999999999").await?;

        let response = login(
            Extension(state),
            Some(Json(LoginRequest {
                email: "alice@example.com".to_string(),
                password: "not-the-password".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }

    #[tokio::test]
    async fn login_and_refresh_round_trip() -> Result<()> {
        let state = test_state();
        let profile = register_student(&state, "alice@example.com", "+919999999999").await?;

        let response = login(
            Extension(state.clone()),
            Some(Json(LoginRequest {
                email: "alice@example.com".to_string(),
                password: TEST_PASSWORD.to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let pair: super::super::session::TokenPair = serde_json::from_slice(&bytes)?;
        assert_eq!(
            state.sessions().verify_access(&pair.access_token),
            Some(profile.account.id)
        );

        let response = refresh(
            Extension(state.clone()),
            Some(Json(RefreshRequest {
                refresh_token: pair.refresh_token,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: AccessTokenResponse = serde_json::from_slice(&bytes)?;
        assert_eq!(
            state.sessions().verify_access(&body.access_token),
            Some(profile.account.id)
        );
        Ok(())
    }

    #[tokio::test]
    async fn refresh_rejects_access_token() -> Result<()> {
        let state = test_state();
        let profile = register_student(&state, "alice@example.com", "+919999999999").await?;
        let pair = state.sessions().issue_pair(profile.account.id)?;

        let response = refresh(
            Extension(state),
            Some(Json(RefreshRequest {
                refresh_token: pair.access_token,
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        Ok(())
    }
}

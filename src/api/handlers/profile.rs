//! Authenticated profile view, shaped by the caller's resolved subtype.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

use crate::directory::Identity;

use super::auth::AppState;
use super::auth::principal::require_auth;
use super::auth::types::{InstituteProfileResponse, StudentProfileResponse};

#[utoipa::path(
    get,
    path = "/api/auth/profile",
    responses(
        (status = 200, description = "Resolved profile for the caller"),
        (status = 400, description = "Account has no subtype profile"),
        (status = 401, description = "Missing or invalid bearer token")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(headers, state))]
pub async fn profile(headers: HeaderMap, state: Extension<Arc<AppState>>) -> impl IntoResponse {
    let identity = match require_auth(&headers, &state).await {
        Ok(identity) => identity,
        Err(status) => return status.into_response(),
    };

    match identity {
        Identity::Student(profile) => {
            Json(StudentProfileResponse::from(&profile)).into_response()
        }
        Identity::Institute(profile) => {
            Json(InstituteProfileResponse::from(&profile)).into_response()
        }
        // Kind tag points at a missing subtype row; nothing useful to show.
        Identity::Account(_) => {
            (StatusCode::BAD_REQUEST, "Invalid user type".to_string()).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::auth::test_support::{
        access_headers, register_student, test_state, test_state_with_directory,
    };
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;
    use crate::directory::AccountKind;
    use crate::directory::test_support::account;

    #[tokio::test]
    async fn profile_requires_authentication() {
        let state = test_state();
        let response = profile(HeaderMap::new(), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn profile_returns_student_view() -> Result<()> {
        let state = test_state();
        let registered = register_student(&state, "alice@example.com", "+919999999999").await?;
        let headers = access_headers(&state, registered.account.id)?;

        let response = profile(headers, Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: StudentProfileResponse = serde_json::from_slice(&bytes)?;
        assert_eq!(body.email, "alice@example.com");
        assert_eq!(body.phone_number, "+919999999999");
        assert!(!body.phone_number_verified);
        Ok(())
    }

    #[tokio::test]
    async fn profile_for_orphan_account_is_bad_request() -> Result<()> {
        let (state, directory) = test_state_with_directory();
        let orphan = account("ghost@example.com", AccountKind::Student);
        directory.insert_account(orphan.clone()).await;

        let headers = access_headers(&state, orphan.id)?;
        let response = profile(headers, Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

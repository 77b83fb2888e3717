//! OTP flows: passwordless login and phone-number verification share one
//! mechanism. The code travels to the phone over SMS while the sealed token
//! (carrying the same code as a claim) travels back to the client, so
//! redemption is a stateless decode-and-compare.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, instrument};

use crate::{
    directory::StudentProfile,
    notify::otp_sms,
    token::{Claims, OneTimeCode},
};

use super::permission::{RoleGate, require_role};
use super::principal::require_auth;
use super::state::AppState;
use super::types::{MessageResponse, OtpRedeemRequest, OtpRequest, OtpTokenResponse};
use super::utils::normalize_phone;

/// Generate a code for the phone number, send it by SMS, and seal it into a
/// token for the caller. Shared by login and phone-verification entry points
/// and by OTP-gated registration.
pub(super) async fn dispatch_otp(state: &AppState, phone_number: &str) -> Result<String, Response> {
    let otp = OneTimeCode::generate(phone_number);
    let claims = Claims::for_otp(phone_number, &otp.code, otp.expires_at.timestamp());
    let token = match state.codec().encode(&claims) {
        Ok(token) => token,
        Err(err) => {
            error!("Failed to mint OTP token: {err}");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Token creation failed".to_string(),
            )
                .into_response());
        }
    };

    // The SMS carries the plaintext code, never the token.
    if let Err(err) = state.sms().send(phone_number, &otp_sms(&otp.code)).await {
        error!("Failed to dispatch OTP SMS: {err}");
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            "SMS provider down".to_string(),
        )
            .into_response());
    }

    Ok(token)
}

/// Decode the token, match the submitted code, and hand back the student it
/// was minted for. All token failures collapse into 403.
async fn redeem_otp(
    state: &AppState,
    token: &str,
    submitted: &str,
) -> Result<StudentProfile, Response> {
    let Some(claims) = state.codec().decode(token) else {
        return Err((StatusCode::FORBIDDEN, "Token not valid".to_string()).into_response());
    };
    let (Some(phone_number), Some(expected)) = (claims.phone_number, claims.otp) else {
        return Err((
            StatusCode::BAD_REQUEST,
            "OTP not found in token".to_string(),
        )
            .into_response());
    };

    let student = match state.directory().find_student_by_phone(&phone_number).await {
        Ok(Some(student)) => student,
        Ok(None) => {
            return Err((StatusCode::NOT_FOUND, "Student not found".to_string()).into_response());
        }
        Err(err) => {
            error!("Failed to look up student for OTP redemption: {err}");
            return Err(
                (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string()).into_response(),
            );
        }
    };

    // Exact string comparison; "000042" and "42" are different codes.
    if submitted != expected {
        debug!("OTP mismatch");
        return Err((StatusCode::FORBIDDEN, "OTP not valid".to_string()).into_response());
    }

    Ok(student)
}

#[utoipa::path(
    post,
    path = "/api/auth/student/login/otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP dispatched", body = OtpTokenResponse),
        (status = 400, description = "Phone number failed validation"),
        (status = 404, description = "No student with that phone number"),
        (status = 500, description = "SMS provider down")
    ),
    tag = "auth"
)]
#[instrument(skip(state, payload))]
pub async fn request_login_otp(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<OtpRequest>>,
) -> impl IntoResponse {
    request_otp(&state, payload).await
}

#[utoipa::path(
    post,
    path = "/api/auth/student/phone/otp",
    request_body = OtpRequest,
    responses(
        (status = 200, description = "OTP dispatched", body = OtpTokenResponse),
        (status = 400, description = "Phone number failed validation"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not a student"),
        (status = 404, description = "No student with that phone number"),
        (status = 500, description = "SMS provider down")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip(headers, state, payload))]
pub async fn request_phone_otp(
    headers: axum::http::HeaderMap,
    state: Extension<Arc<AppState>>,
    payload: Option<Json<OtpRequest>>,
) -> impl IntoResponse {
    // Only a resolved student (or an operator) may kick off phone
    // verification for an existing profile.
    let identity = match require_auth(&headers, &state).await {
        Ok(identity) => identity,
        Err(status) => return status.into_response(),
    };
    if let Err(status) = require_role(&identity, RoleGate::Student) {
        return (status, "Student role required".to_string()).into_response();
    }

    request_otp(&state, payload).await
}

async fn request_otp(state: &AppState, payload: Option<Json<OtpRequest>>) -> Response {
    let request: OtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let Some(phone_number) =
        normalize_phone(&request.phone_number, state.config().default_country_code())
    else {
        return (StatusCode::BAD_REQUEST, "Invalid phone number".to_string()).into_response();
    };

    match state.directory().find_student_by_phone(&phone_number).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (StatusCode::NOT_FOUND, "Student not found".to_string()).into_response();
        }
        Err(err) => {
            error!("Failed to look up student for OTP request: {err}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Lookup failed".to_string())
                .into_response();
        }
    }

    match dispatch_otp(state, &phone_number).await {
        Ok(token) => Json(OtpTokenResponse { token }).into_response(),
        Err(response) => response,
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/student/login/otp/{token}",
    request_body = OtpRedeemRequest,
    params(
        ("token" = String, Path, description = "Sealed OTP token from the request step")
    ),
    responses(
        (status = 200, description = "Login successful", body = super::session::TokenPair),
        (status = 403, description = "Invalid token or OTP mismatch"),
        (status = 404, description = "No student with the tokened phone number")
    ),
    tag = "auth"
)]
#[instrument(skip(state, token, payload))]
pub async fn redeem_login_otp(
    state: Extension<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Option<Json<OtpRedeemRequest>>,
) -> impl IntoResponse {
    let request: OtpRedeemRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let student = match redeem_otp(&state, &token, &request.otp).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    match state.sessions().issue_pair(student.account.id) {
        Ok(pair) => Json(pair).into_response(),
        Err(err) => {
            error!("Failed to issue session credentials: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login failed".to_string(),
            )
                .into_response()
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/student/register/otp/{token}",
    request_body = OtpRedeemRequest,
    params(
        ("token" = String, Path, description = "Sealed OTP token from the registration step")
    ),
    responses(
        (status = 200, description = "Phone number verified", body = MessageResponse),
        (status = 403, description = "Invalid token or OTP mismatch"),
        (status = 404, description = "No student with the tokened phone number")
    ),
    tag = "auth"
)]
#[instrument(skip(state, token, payload))]
pub async fn redeem_phone_verification(
    state: Extension<Arc<AppState>>,
    Path(token): Path<String>,
    payload: Option<Json<OtpRedeemRequest>>,
) -> impl IntoResponse {
    let request: OtpRedeemRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let student = match redeem_otp(&state, &token, &request.otp).await {
        Ok(student) => student,
        Err(response) => return response,
    };

    if let Err(err) = state
        .directory()
        .set_phone_number_verified(student.account.id)
        .await
    {
        error!("Failed to set phone number verified: {err}");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Verification failed".to_string(),
        )
            .into_response();
    }

    Json(MessageResponse::new("Phone number verified successfully")).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{decode_otp, register_student, test_state};
    use super::*;
    use anyhow::Result;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn request_unknown_phone_is_not_found() {
        let state = test_state();
        let response = request_login_otp(
            Extension(state),
            Some(Json(OtpRequest {
                phone_number: "+919999999999".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn request_rejects_unparseable_phone() {
        let state = test_state();
        let response = request_login_otp(
            Extension(state),
            Some(Json(OtpRequest {
                phone_number: "not-a-number".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_round_trip_issues_credentials() -> Result<()> {
        let state = test_state();
        let profile = register_student(&state, "alice@example.com", "+919999999999").await?;

        let response = request_login_otp(
            Extension(state.clone()),
            Some(Json(OtpRequest {
                phone_number: "+919999999999".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: OtpTokenResponse = serde_json::from_slice(&bytes)?;
        let code = decode_otp(&state, &body.token)?;

        let response = redeem_login_otp(
            Extension(state.clone()),
            Path(body.token),
            Some(Json(OtpRedeemRequest { otp: code })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let pair: super::super::session::TokenPair = serde_json::from_slice(&bytes)?;
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_eq!(
            state.sessions().verify_access(&pair.access_token),
            Some(profile.account.id)
        );
        Ok(())
    }

    #[tokio::test]
    async fn login_with_wrong_code_is_forbidden() -> Result<()> {
        let state = test_state();
        register_student(&state, "alice@example.com", "+919999999999").await?;

        let response = request_login_otp(
            Extension(state.clone()),
            Some(Json(OtpRequest {
                phone_number: "+919999999999".to_string(),
            })),
        )
        .await
        .into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let body: OtpTokenResponse = serde_json::from_slice(&bytes)?;

        let code = decode_otp(&state, &body.token)?;
        let wrong = if code == "000000" { "000001" } else { "000000" };

        let response = redeem_login_otp(
            Extension(state),
            Path(body.token),
            Some(Json(OtpRedeemRequest {
                otp: wrong.to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        Ok(())
    }

    #[tokio::test]
    async fn phone_otp_request_requires_student_bearer() -> Result<()> {
        use super::super::test_support::access_headers;

        let state = test_state();
        let profile = register_student(&state, "alice@example.com", "+919999999999").await?;

        let response = request_phone_otp(
            axum::http::HeaderMap::new(),
            Extension(state.clone()),
            Some(Json(OtpRequest {
                phone_number: "+919999999999".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let headers = access_headers(&state, profile.account.id)?;
        let response = request_phone_otp(
            headers,
            Extension(state),
            Some(Json(OtpRequest {
                phone_number: "+919999999999".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn redeem_with_garbage_token_is_forbidden() {
        let state = test_state();
        let response = redeem_login_otp(
            Extension(state),
            Path("garbage".to_string()),
            Some(Json(OtpRedeemRequest {
                otp: "000000".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn email_token_cannot_redeem_otp() -> Result<()> {
        let state = test_state();
        register_student(&state, "alice@example.com", "+919999999999").await?;

        let exp = (chrono::Utc::now() + chrono::Duration::minutes(30)).timestamp();
        let token = state
            .codec()
            .encode(&Claims::for_email("alice@example.com", exp))?;

        let response = redeem_login_otp(
            Extension(state),
            Path(token),
            Some(Json(OtpRedeemRequest {
                otp: "000000".to_string(),
            })),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        Ok(())
    }
}

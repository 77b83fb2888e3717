//! Student registration: direct (usable immediately) and OTP-gated (server
//! generates the password and immediately challenges the phone number).

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::{
    api::handlers::valid_email,
    directory::{CreateOutcome, NewStudent, StudentProfile},
};

use super::otp::dispatch_otp;
use super::state::AppState;
use super::types::{MessageResponse, RegisterOtpRequest, RegisterOtpResponse, RegisterRequest};
use super::utils::{
    generate_random_password, hash_password, normalize_email, normalize_phone, valid_password,
};

/// Validated, normalized registration input.
struct RegistrationInput {
    email: String,
    full_name: String,
    phone_number: String,
}

fn validate_registration(
    state: &AppState,
    email: &str,
    full_name: &str,
    phone_number: &str,
) -> Result<RegistrationInput, (StatusCode, String)> {
    let email = normalize_email(email);
    if !valid_email(&email) {
        return Err((StatusCode::BAD_REQUEST, "Invalid email".to_string()));
    }

    let full_name = full_name.trim();
    if full_name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Full name is required".to_string()));
    }

    let Some(phone_number) = normalize_phone(phone_number, state.config().default_country_code())
    else {
        return Err((StatusCode::BAD_REQUEST, "Invalid phone number".to_string()));
    };

    Ok(RegistrationInput {
        email,
        full_name: full_name.to_string(),
        phone_number,
    })
}

async fn create_student(
    state: &AppState,
    input: RegistrationInput,
    password_hash: String,
) -> Result<StudentProfile, (StatusCode, String)> {
    let outcome = state
        .directory()
        .create_student(NewStudent {
            email: input.email,
            full_name: input.full_name,
            phone_number: input.phone_number,
            password_hash,
        })
        .await
        .map_err(|err| {
            error!("Failed to create student: {err}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
        })?;

    match outcome {
        CreateOutcome::Created(profile) => Ok(profile),
        CreateOutcome::DuplicateEmail => Err((
            StatusCode::BAD_REQUEST,
            "Email already registered".to_string(),
        )),
        CreateOutcome::DuplicatePhone => Err((
            StatusCode::BAD_REQUEST,
            "Phone number already registered".to_string(),
        )),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/student/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Student created", body = MessageResponse),
        (status = 400, description = "Validation failed (bad phone, weak password, duplicate email/phone)")
    ),
    tag = "register"
)]
#[instrument(skip(state, payload))]
pub async fn register(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let input = match validate_registration(
        &state,
        &request.email,
        &request.full_name,
        &request.phone_number,
    ) {
        Ok(input) => input,
        Err((status, message)) => return (status, message).into_response(),
    };
    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    let password_hash = match hash_password(&request.password) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to hash password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    match create_student(&state, input, password_hash).await {
        Ok(_) => (
            StatusCode::CREATED,
            Json(MessageResponse::new("User created successfully")),
        )
            .into_response(),
        Err((status, message)) => (status, message).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/student/register/otp",
    request_body = RegisterOtpRequest,
    responses(
        (status = 201, description = "Student created, OTP dispatched", body = RegisterOtpResponse),
        (status = 400, description = "Validation failed (bad phone, duplicate email/phone)"),
        (status = 500, description = "SMS provider down")
    ),
    tag = "register"
)]
#[instrument(skip(state, payload))]
pub async fn register_with_otp(
    state: Extension<Arc<AppState>>,
    payload: Option<Json<RegisterOtpRequest>>,
) -> impl IntoResponse {
    let request: RegisterOtpRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    let input = match validate_registration(
        &state,
        &request.email,
        &request.full_name,
        &request.phone_number,
    ) {
        Ok(input) => input,
        Err((status, message)) => return (status, message).into_response(),
    };

    // The account holder never learns this password; the phone challenge
    // below is what makes the account usable.
    let random_password = generate_random_password();
    let password_hash = match random_password.and_then(|password| hash_password(&password)) {
        Ok(hash) => hash,
        Err(err) => {
            error!("Failed to generate registration password: {err}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Registration failed".to_string(),
            )
                .into_response();
        }
    };

    let profile = match create_student(&state, input, password_hash).await {
        Ok(profile) => profile,
        Err((status, message)) => return (status, message).into_response(),
    };

    match dispatch_otp(&state, &profile.phone_number).await {
        Ok(token) => (
            StatusCode::CREATED,
            Json(RegisterOtpResponse {
                message: "User created successfully".to_string(),
                token,
            }),
        )
            .into_response(),
        Err(response) => response,
    }
}

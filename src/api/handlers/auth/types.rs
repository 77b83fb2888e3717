//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::directory::{InstituteProfile, StudentProfile};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterOtpRequest {
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpRequest {
    pub phone_number: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpRedeemRequest {
    pub otp: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

/// Token handed back when an OTP is dispatched; the client round-trips it to
/// the redemption endpoint together with the code from the SMS.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OtpTokenResponse {
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterOtpResponse {
    pub message: String,
    pub token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct StudentProfileResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: String,
    pub email_verified: bool,
    pub phone_number_verified: bool,
}

impl From<&StudentProfile> for StudentProfileResponse {
    fn from(profile: &StudentProfile) -> Self {
        Self {
            id: profile.account.id.to_string(),
            email: profile.account.email.clone(),
            full_name: profile.full_name.clone(),
            phone_number: profile.phone_number.clone(),
            email_verified: profile.email_verified,
            phone_number_verified: profile.phone_number_verified,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct InstituteProfileResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub description: String,
}

impl From<&InstituteProfile> for InstituteProfileResponse {
    fn from(profile: &InstituteProfile) -> Self {
        Self {
            id: profile.account.id.to_string(),
            email: profile.account.email.clone(),
            display_name: profile.display_name.clone(),
            description: profile.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_request_round_trips() -> anyhow::Result<()> {
        let request = RegisterRequest {
            email: "alice@example.com".to_string(),
            full_name: "Alice".to_string(),
            phone_number: "+919999999999".to_string(),
            password: "hunter22".to_string(),
        };
        let value = serde_json::to_value(&request)?;
        let decoded: RegisterRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "alice@example.com");
        assert_eq!(decoded.phone_number, "+919999999999");
        Ok(())
    }

    #[test]
    fn message_response_serializes_message_field() -> anyhow::Result<()> {
        let value = serde_json::to_value(MessageResponse::new("mail sent successfully"))?;
        assert_eq!(
            value.get("message").and_then(serde_json::Value::as_str),
            Some("mail sent successfully")
        );
        Ok(())
    }
}

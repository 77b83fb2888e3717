//! Message bodies for the verification flows.

use super::EmailMessage;
use crate::token::OTP_TTL_MINUTES;

/// Password reset email with the link embedding the sealed token.
#[must_use]
pub fn password_reset_email(to: &str, name: &str, reset_link: &str) -> EmailMessage {
    let body = format!(
        "Hi {name},\n\n\
         We received a request to reset your password. Click the link below to create a new password:\n\n\
         {reset_link}\n\n\
         This link is valid for the next 30 minutes. If you didn't request this, you can ignore this email.\n\n\
         For any issues, please contact our support team.\n\n\
         Best regards,\n\
         Enrols\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: "Reset Your Password".to_string(),
        body,
    }
}

/// Address verification email with the link embedding the sealed token.
#[must_use]
pub fn verification_email(to: &str, name: &str, verification_link: &str) -> EmailMessage {
    let body = format!(
        "Hi {name},\n\n\
         Thank you for signing up with Enrols! Please verify your email address by clicking the link below:\n\n\
         {verification_link}\n\n\
         If you did not create an account, you can ignore this email.\n\n\
         Best regards,\n\
         Enrols\n"
    );
    EmailMessage {
        to: to.to_string(),
        subject: "Verify Your Email Address".to_string(),
        body,
    }
}

/// SMS body carrying the plaintext code. The token never travels over SMS.
#[must_use]
pub fn otp_sms(code: &str) -> String {
    format!("Your OTP is {code}. It is valid for {OTP_TTL_MINUTES} minutes.")
}

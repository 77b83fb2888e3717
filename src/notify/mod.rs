//! Outbound notification dispatch.
//!
//! Flows call the senders synchronously inside the request; a failed dispatch
//! surfaces as a 500 and the just-minted token is simply wasted (the client
//! re-requests). The traits keep the delivery mechanism swappable: log-only
//! senders for local dev, a Twilio-backed SMS sender for production.

mod templates;
mod twilio;

pub use templates::{otp_sms, password_reset_email, verification_email};
pub use twilio::TwilioSmsSender;

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery abstraction used by the link-based flows.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error so the flow reports 500.
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the message instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            "email send stub"
        );
        Ok(())
    }
}

/// SMS delivery abstraction used by the OTP flows.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver the plaintext body to the phone number, E.164 formatted.
    async fn send(&self, phone_number: &str, body: &str) -> Result<()>;
}

/// Local dev sender that logs the SMS instead of delivering it.
#[derive(Clone, Debug)]
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone_number: &str, body: &str) -> Result<()> {
        info!(to = %phone_number, body = %body, "sms send stub");
        Ok(())
    }
}

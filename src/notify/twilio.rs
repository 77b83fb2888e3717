//! Twilio REST SMS delivery.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use super::SmsSender;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";

/// SMS sender backed by the Twilio Messages API.
pub struct TwilioSmsSender {
    client: Client,
    account_sid: String,
    auth_token: SecretString,
    from_number: String,
}

impl TwilioSmsSender {
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(account_sid: String, auth_token: SecretString, from_number: String) -> Result<Self> {
        let client = Client::builder()
            .user_agent(crate::APP_USER_AGENT)
            .build()
            .context("failed to build Twilio HTTP client")?;
        Ok(Self {
            client,
            account_sid,
            auth_token,
            from_number,
        })
    }
}

impl std::fmt::Debug for TwilioSmsSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioSmsSender")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"***")
            .field("from_number", &self.from_number)
            .finish()
    }
}

#[async_trait]
impl SmsSender for TwilioSmsSender {
    async fn send(&self, phone_number: &str, body: &str) -> Result<()> {
        let url = format!(
            "{TWILIO_API_BASE}/Accounts/{}/Messages.json",
            self.account_sid
        );
        let params = [
            ("To", phone_number),
            ("From", self.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await
            .context("failed to reach SMS provider")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("SMS provider returned {status}"));
        }

        debug!(to = %phone_number, "sms dispatched");
        Ok(())
    }
}

//! Server action: assemble keys, config, and senders, then start the API.

use crate::{
    api,
    api::handlers::auth::{AuthConfig, SessionSigner},
    notify::{EmailSender, LogEmailSender, LogSmsSender, SmsSender, TwilioSmsSender},
    token::TokenCodec,
};
use anyhow::{Context, Result, anyhow};
use base64::{Engine, engine::general_purpose::STANDARD};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub secret_key: SecretString,
    pub encryption_key: SecretString,
    pub frontend_url: String,
    pub country_code: String,
    pub twilio_account_sid: Option<String>,
    pub twilio_auth_token: Option<SecretString>,
    pub twilio_from: Option<String>,
}

/// Handle the server action.
///
/// # Errors
/// Returns an error if key material is malformed or the server fails.
pub async fn handle(action: crate::cli::actions::Action) -> Result<()> {
    let crate::cli::actions::Action::Server(args) = action;

    let encryption_key = decode_encryption_key(&args.encryption_key)?;
    let signing_secret = args.secret_key.expose_secret().as_bytes();

    let config = AuthConfig::new(args.frontend_url.clone())
        .with_default_country_code(args.country_code.clone());
    let codec = TokenCodec::new(signing_secret, &encryption_key);
    let sessions = SessionSigner::new(
        signing_secret,
        config.access_ttl_seconds(),
        config.refresh_ttl_seconds(),
    );

    let email: Arc<dyn EmailSender> = Arc::new(LogEmailSender);
    let sms: Arc<dyn SmsSender> = match (
        args.twilio_account_sid,
        args.twilio_auth_token,
        args.twilio_from,
    ) {
        (Some(account_sid), Some(auth_token), Some(from_number)) => {
            info!("SMS delivery via Twilio");
            Arc::new(TwilioSmsSender::new(account_sid, auth_token, from_number)?)
        }
        _ => {
            info!("SMS delivery not configured, logging instead");
            Arc::new(LogSmsSender)
        }
    };

    api::new(args.port, args.dsn, config, codec, sessions, email, sms).await
}

/// The sealing key arrives base64-encoded and must decode to exactly 32 bytes.
fn decode_encryption_key(encoded: &SecretString) -> Result<[u8; 32]> {
    let bytes = STANDARD
        .decode(encoded.expose_secret().trim())
        .context("encryption key is not valid base64")?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| anyhow!("encryption key must decode to 32 bytes, got {len}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_encryption_key_accepts_32_bytes() -> Result<()> {
        let encoded = SecretString::from(STANDARD.encode([7u8; 32]));
        assert_eq!(decode_encryption_key(&encoded)?, [7u8; 32]);
        Ok(())
    }

    #[test]
    fn decode_encryption_key_rejects_bad_input() {
        assert!(decode_encryption_key(&SecretString::from("not base64!")).is_err());
        let short = SecretString::from(STANDARD.encode([7u8; 16]));
        assert!(decode_encryption_key(&short).is_err());
    }
}

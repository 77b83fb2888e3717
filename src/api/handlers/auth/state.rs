//! Auth configuration and shared request state.

use std::sync::Arc;

use crate::{
    directory::UserDirectory,
    notify::{EmailSender, SmsSender},
    token::TokenCodec,
};

use super::session::SessionSigner;

const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 30 * 60;
const DEFAULT_EMAIL_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_ACCESS_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_COUNTRY_CODE: &str = "+91";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    reset_token_ttl_seconds: i64,
    email_token_ttl_seconds: i64,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
    default_country_code: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            email_token_ttl_seconds: DEFAULT_EMAIL_TOKEN_TTL_SECONDS,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
            default_country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_email_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.email_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_default_country_code(mut self, country_code: String) -> Self {
        self.default_country_code = country_code;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn email_token_ttl_seconds(&self) -> i64 {
        self.email_token_ttl_seconds
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_seconds
    }

    #[must_use]
    pub fn default_country_code(&self) -> &str {
        &self.default_country_code
    }

    /// Frontend link for the password reset email.
    #[must_use]
    pub fn reset_url(&self, token: &str) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/reset-password?token={token}")
    }

    /// Frontend link for the email verification email.
    #[must_use]
    pub fn verify_email_url(&self, token: &str) -> String {
        let base = self.frontend_base_url.trim_end_matches('/');
        format!("{base}/verify-email?token={token}")
    }
}

/// Everything the auth handlers need, wired once at startup and injected via
/// `Extension<Arc<AppState>>`.
pub struct AppState {
    config: AuthConfig,
    codec: TokenCodec,
    sessions: SessionSigner,
    directory: Arc<dyn UserDirectory>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
}

impl AppState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        codec: TokenCodec,
        sessions: SessionSigner,
        directory: Arc<dyn UserDirectory>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
    ) -> Self {
        Self {
            config,
            codec,
            sessions,
            directory,
            email,
            sms,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionSigner {
        &self.sessions
    }

    #[must_use]
    pub fn directory(&self) -> &dyn UserDirectory {
        self.directory.as_ref()
    }

    #[must_use]
    pub fn email(&self) -> &dyn EmailSender {
        self.email.as_ref()
    }

    #[must_use]
    pub fn sms(&self) -> &dyn SmsSender {
        self.sms.as_ref()
    }
}

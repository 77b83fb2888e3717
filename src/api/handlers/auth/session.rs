//! Access/refresh credential issuance for authenticated requests.
//!
//! Both credentials are HS256 JWTs keyed by the process signing secret. The
//! `kind` claim keeps the two from being interchangeable: a refresh token
//! presented as a bearer credential is rejected, and vice versa.

use anyhow::Result;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

const KIND_ACCESS: &str = "access";
const KIND_REFRESH: &str = "refresh";

#[derive(Serialize, Deserialize, Debug)]
struct SessionClaims {
    sub: String,
    kind: String,
    exp: i64,
}

/// Credential pair returned by login flows.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl SessionSigner {
    #[must_use]
    pub fn new(signing_secret: &[u8], access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_secret),
            decoding: DecodingKey::from_secret(signing_secret),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Mint a fresh access/refresh pair for the account.
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_pair(&self, account_id: Uuid) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(account_id, KIND_ACCESS, self.access_ttl_seconds)?,
            refresh_token: self.issue(account_id, KIND_REFRESH, self.refresh_ttl_seconds)?,
        })
    }

    /// Mint a fresh access token only (refresh flow).
    ///
    /// # Errors
    /// Returns an error if signing fails.
    pub fn issue_access(&self, account_id: Uuid) -> Result<String> {
        self.issue(account_id, KIND_ACCESS, self.access_ttl_seconds)
    }

    fn issue(&self, account_id: Uuid, kind: &str, ttl_seconds: i64) -> Result<String> {
        let claims = SessionClaims {
            sub: account_id.to_string(),
            kind: kind.to_string(),
            exp: (Utc::now() + Duration::seconds(ttl_seconds)).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    /// Account id from a valid, unexpired access token.
    #[must_use]
    pub fn verify_access(&self, token: &str) -> Option<Uuid> {
        self.verify(token, KIND_ACCESS)
    }

    /// Account id from a valid, unexpired refresh token.
    #[must_use]
    pub fn verify_refresh(&self, token: &str) -> Option<Uuid> {
        self.verify(token, KIND_REFRESH)
    }

    fn verify(&self, token: &str, kind: &str) -> Option<Uuid> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation).ok()?;
        if data.claims.kind != kind {
            return None;
        }
        Uuid::parse_str(&data.claims.sub).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> SessionSigner {
        SessionSigner::new(b"test-signing-secret", 3600, 7200)
    }

    #[test]
    fn pair_round_trips_to_account_id() -> Result<()> {
        let signer = signer();
        let account_id = Uuid::new_v4();
        let pair = signer.issue_pair(account_id)?;

        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_eq!(signer.verify_access(&pair.access_token), Some(account_id));
        assert_eq!(signer.verify_refresh(&pair.refresh_token), Some(account_id));
        Ok(())
    }

    #[test]
    fn kinds_are_not_interchangeable() -> Result<()> {
        let signer = signer();
        let pair = signer.issue_pair(Uuid::new_v4())?;

        assert_eq!(signer.verify_access(&pair.refresh_token), None);
        assert_eq!(signer.verify_refresh(&pair.access_token), None);
        Ok(())
    }

    #[test]
    fn expired_tokens_are_rejected() -> Result<()> {
        let signer = SessionSigner::new(b"test-signing-secret", -10, -10);
        let pair = signer.issue_pair(Uuid::new_v4())?;

        assert_eq!(signer.verify_access(&pair.access_token), None);
        assert_eq!(signer.verify_refresh(&pair.refresh_token), None);
        Ok(())
    }

    #[test]
    fn foreign_signatures_are_rejected() -> Result<()> {
        let signer = signer();
        let other = SessionSigner::new(b"other-signing-secret", 3600, 7200);
        let pair = other.issue_pair(Uuid::new_v4())?;

        assert_eq!(signer.verify_access(&pair.access_token), None);
        Ok(())
    }
}

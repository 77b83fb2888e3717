//! Opaque verification tokens: signed claims wrapped in symmetric encryption.
//!
//! Claims are serialized as an HS256 JWT and the JWT is then sealed with
//! ChaCha20-Poly1305 (`nonce (12 bytes) || ciphertext`), base64-url encoded.
//! Clients hold the token but cannot read the OTP or address inside it.
//! Decoding is total: tampering, truncation, a bad key, and an expired `exp`
//! all surface as `None` with no distinguishable cause.

use anyhow::Result;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit},
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};

const NONCE_LEN: usize = 12;

/// Claims carried by a verification token.
///
/// `exp` is an absolute unix timestamp in seconds and is always required;
/// the remaining claims depend on the flow that minted the token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub otp: Option<String>,
    pub exp: i64,
}

impl Claims {
    /// Claims for email-link flows (password reset, email verification).
    #[must_use]
    pub fn for_email(email: &str, exp: i64) -> Self {
        Self {
            email: Some(email.to_string()),
            phone_number: None,
            otp: None,
            exp,
        }
    }

    /// Claims for OTP flows: the code rides inside the token so redemption
    /// needs no server-side OTP store.
    #[must_use]
    pub fn for_otp(phone_number: &str, otp: &str, exp: i64) -> Self {
        Self {
            email: None,
            phone_number: Some(phone_number.to_string()),
            otp: Some(otp.to_string()),
            exp,
        }
    }
}

/// Encodes and decodes verification tokens.
///
/// Both keys are process-wide configuration loaded once at startup; rotating
/// either invalidates all outstanding tokens, which is acceptable for
/// minutes-to-an-hour lifetimes.
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cipher: ChaCha20Poly1305,
}

impl TokenCodec {
    #[must_use]
    pub fn new(signing_secret: &[u8], encryption_key: &[u8; 32]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(signing_secret),
            decoding: DecodingKey::from_secret(signing_secret),
            cipher: ChaCha20Poly1305::new(Key::from_slice(encryption_key)),
        }
    }

    /// Seal claims into an opaque, URL-safe token string.
    ///
    /// # Errors
    /// Returns an error if signing or encryption fails.
    pub fn encode(&self, claims: &Claims) -> Result<String> {
        let jwt = jsonwebtoken::encode(&Header::default(), claims, &self.encoding)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, jwt.as_bytes())
            .map_err(|e| anyhow::anyhow!("Encryption failure: {e}"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    /// Open a token, returning its claims when everything checks out.
    ///
    /// Total function: any decryption, signature, payload, or expiry failure
    /// yields `None`. Flow code has exactly one invalid-token branch.
    #[must_use]
    pub fn decode(&self, token: &str) -> Option<Claims> {
        let sealed = URL_SAFE_NO_PAD.decode(token.as_bytes()).ok()?;
        if sealed.len() <= NONCE_LEN {
            return None;
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let jwt = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .ok()?;
        let jwt = String::from_utf8(jwt).ok()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        jsonwebtoken::decode::<Claims>(&jwt, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn codec() -> TokenCodec {
        TokenCodec::new(b"test-signing-secret", &[42u8; 32])
    }

    fn future_exp() -> i64 {
        (Utc::now() + Duration::minutes(30)).timestamp()
    }

    #[test]
    fn round_trip_preserves_claims() {
        let codec = codec();
        let claims = Claims::for_otp("+919999999999", "000042", future_exp());

        let token = codec.encode(&claims).expect("encode");
        let decoded = codec.decode(&token);

        assert_eq!(decoded, Some(claims));
    }

    #[test]
    fn token_is_opaque_and_url_safe() {
        let codec = codec();
        let claims = Claims::for_email("alice@example.com", future_exp());

        let token = codec.encode(&claims).expect("encode");

        assert!(!token.contains("alice"));
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec();
        let past = (Utc::now() - Duration::hours(1)).timestamp();
        let claims = Claims::for_email("alice@example.com", past);

        let token = codec.encode(&claims).expect("encode");

        assert_eq!(codec.decode(&token), None);
    }

    #[test]
    fn flipping_any_byte_invalidates_token() {
        let codec = codec();
        let claims = Claims::for_otp("+14155552671", "123456", future_exp());
        let token = codec.encode(&claims).expect("encode");

        for index in 0..token.len() {
            let mut bytes = token.as_bytes().to_vec();
            bytes[index] ^= 0x01;
            let Ok(tampered) = String::from_utf8(bytes) else {
                continue;
            };
            assert_eq!(
                codec.decode(&tampered),
                None,
                "tampered byte {index} should invalidate the token"
            );
        }
    }

    #[test]
    fn garbage_and_truncated_input_are_invalid() {
        let codec = codec();
        assert_eq!(codec.decode(""), None);
        assert_eq!(codec.decode("not a token"), None);
        assert_eq!(codec.decode("AAAA"), None);
    }

    #[test]
    fn wrong_keys_are_invalid() {
        let claims = Claims::for_email("alice@example.com", future_exp());
        let token = codec().encode(&claims).expect("encode");

        let wrong_cipher = TokenCodec::new(b"test-signing-secret", &[7u8; 32]);
        assert_eq!(wrong_cipher.decode(&token), None);

        let wrong_secret = TokenCodec::new(b"other-signing-secret", &[42u8; 32]);
        assert_eq!(wrong_secret.decode(&token), None);
    }
}

//! Small helpers for auth validation and credential handling.

use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use regex::Regex;

pub(super) const MIN_PASSWORD_LENGTH: usize = 8;

/// Normalize an email for lookup/uniqueness checks.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimum length check; composition rules are left to the frontend.
pub(super) fn valid_password(password: &str) -> bool {
    password.len() >= MIN_PASSWORD_LENGTH
}

/// Normalize a phone number to E.164 before storage and lookup.
///
/// Accepts `+<digits>`, `00<digits>`, or a bare national number which gets
/// the default country code prefixed. Separators are stripped; anything that
/// does not reduce to a plausible E.164 number is rejected.
pub(crate) fn normalize_phone(raw: &str, default_country_code: &str) -> Option<String> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();

    let normalized = if let Some(rest) = compact.strip_prefix('+') {
        format!("+{rest}")
    } else if let Some(rest) = compact.strip_prefix("00") {
        format!("+{rest}")
    } else {
        format!("{default_country_code}{compact}")
    };

    let e164 = Regex::new(r"^\+[1-9][0-9]{7,14}$").ok()?;
    e164.is_match(&normalized).then_some(normalized)
}

/// Hash a password with Argon2id and a fresh random salt.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
    Ok(hash.to_string())
}

/// Constant-time verification against a stored Argon2 hash.
pub(super) fn verify_password(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Random strong password for OTP-gated registration. The account holder
/// never sees it; they log in via OTP or run a password reset later.
pub(super) fn generate_random_password() -> Result<String> {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate random password")?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn normalize_phone_accepts_e164_as_is() {
        assert_eq!(
            normalize_phone("+919999999999", "+91"),
            Some("+919999999999".to_string())
        );
        assert_eq!(
            normalize_phone("+14155552671", "+91"),
            Some("+14155552671".to_string())
        );
    }

    #[test]
    fn normalize_phone_prefixes_default_country_code() {
        assert_eq!(
            normalize_phone("9999999999", "+91"),
            Some("+919999999999".to_string())
        );
        assert_eq!(
            normalize_phone("99999 99999", "+91"),
            Some("+919999999999".to_string())
        );
    }

    #[test]
    fn normalize_phone_converts_international_prefix() {
        assert_eq!(
            normalize_phone("00919999999999", "+91"),
            Some("+919999999999".to_string())
        );
    }

    #[test]
    fn normalize_phone_rejects_garbage() {
        assert_eq!(normalize_phone("not-a-number", "+91"), None);
        assert_eq!(normalize_phone("+0123", "+91"), None);
        assert_eq!(normalize_phone("123", "+91"), None);
        assert_eq!(normalize_phone("", "+91"), None);
    }

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash));
        assert!(!verify_password("wrong password", &hash));
    }

    #[test]
    fn verify_password_rejects_malformed_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn random_password_is_long_and_unique() {
        let first = generate_random_password().expect("generate");
        let second = generate_random_password().expect("generate");
        assert!(first.len() >= 40);
        assert!(valid_password(&first));
        assert_ne!(first, second);
    }
}

//! # Enrols (Course Enrollment Identity & Verification API)
//!
//! `enrols` is the identity backend for a course-enrollment platform:
//! institutes publish courses, students build profiles and apply. This
//! service owns the account root and the verification flows layered on it.
//!
//! ## Accounts (Students, Institute Admins)
//!
//! Every account carries a kind tag (`STUDENT` or `INSTITUTE_ADMIN`) and owns
//! exactly one subtype profile row. Request handlers receive the richest
//! resolved view of the caller; a missing profile row degrades to the bare
//! account rather than failing.
//!
//! ## Verification (email links, SMS OTP)
//!
//! Password reset, email verification, OTP login, and phone verification all
//! ride on a single primitive: an opaque token whose claims are signed and
//! then encrypted, so clients can hold the token without reading the OTP or
//! address inside it. Decoding is fail-closed; expired, tampered, and
//! malformed tokens are indistinguishable to callers.
//!
//! ## Authorization
//!
//! Role gates (`Student`, `InstituteAdmin`, `EmailVerified`, `PhoneVerified`)
//! guard flow entry points. Superuser and staff accounts pass every gate.

pub mod api;
pub mod cli;
pub mod directory;
pub mod notify;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}

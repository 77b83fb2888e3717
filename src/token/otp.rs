//! One-time codes delivered over SMS.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const OTP_LENGTH: usize = 6;
pub const OTP_TTL_MINUTES: i64 = 30;

/// A short-lived numeric code bound to a phone number.
///
/// The code is embedded in a sealed token claim rather than persisted, so
/// redemption is a pure decode-and-compare. The struct exists for the
/// dispatch side: the SMS body carries the code, the token carries the claim.
#[derive(Clone, Debug)]
pub struct OneTimeCode {
    pub phone_number: String,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl OneTimeCode {
    #[must_use]
    pub fn generate(phone_number: &str) -> Self {
        let created_at = Utc::now();
        Self {
            phone_number: phone_number.to_string(),
            code: generate_code(),
            created_at,
            expires_at: created_at + Duration::minutes(OTP_TTL_MINUTES),
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Uniform random code in `[0, 10^6)`, zero-padded so "000042" is valid.
fn generate_code() -> String {
    let value: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{value:0width$}", width = OTP_LENGTH)
}

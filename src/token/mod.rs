//! Verification token primitives: the opaque claims codec and the OTP
//! generator the flows build on.

mod codec;
mod otp;

pub use codec::{Claims, TokenCodec};
pub use otp::{OneTimeCode, OTP_LENGTH, OTP_TTL_MINUTES};

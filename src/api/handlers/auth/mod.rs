//! Verification flows and the auth machinery they share.
//!
//! Each flow is a small state machine: Requested -> Dispatched -> Redeemed,
//! with expiry as the absorbing state. No flow state is persisted; a token's
//! validity says "dispatched", a stored flag says "redeemed".

pub mod login;
pub mod otp;
pub mod password;
pub mod permission;
pub mod principal;
pub mod register;
pub mod session;
pub mod state;
pub mod types;
pub mod verify_email;

mod utils;

pub use permission::{RoleGate, require_role};
pub use principal::require_auth;
pub use session::{SessionSigner, TokenPair};
pub use state::{AppState, AuthConfig};

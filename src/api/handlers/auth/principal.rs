//! Authenticated principal extraction and subtype resolution.
//!
//! Flow Overview: read the bearer access token, map it to an account, and
//! resolve the account to its richest identity view so downstream handlers
//! never re-query for subtype fields.

use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use tracing::error;

use crate::directory::{Identity, resolve};

use super::state::AppState;

/// Resolve the bearer credential into an identity, or 401 when absent or
/// invalid. Storage failures surface as 500.
pub async fn require_auth(headers: &HeaderMap, state: &AppState) -> Result<Identity, StatusCode> {
    let Some(token) = bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    let Some(account_id) = state.sessions().verify_access(token) else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    let account = match state.directory().find_account_by_id(account_id).await {
        Ok(Some(account)) => account,
        Ok(None) => return Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            error!("Failed to load account for bearer token: {err}");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    if !account.is_active {
        return Err(StatusCode::UNAUTHORIZED);
    }

    match resolve(state.directory(), account).await {
        Ok(identity) => Ok(identity),
        Err(err) => {
            error!("Failed to resolve identity: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme_prefix() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);

        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}

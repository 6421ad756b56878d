use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use subtle::ConstantTimeEq;

use crate::error::TabloError;
use crate::router::TabloState;

pub const CONSOLE_KEY_HEADER: &str = "x-console-key";

fn key_matches(candidate: &str, expected: &str) -> bool {
    bool::from(candidate.as_bytes().ct_eq(expected.as_bytes()))
}

/// Ensure the inbound request carries the console key.
/// Accepts either:
/// - Header: `x-console-key: ...`
/// - Header: `Authorization: Bearer ...`
/// - Query string: `?key=...`
pub fn ensure_authorized(
    headers: &HeaderMap,
    query: Option<&str>,
    expected: &str,
) -> Result<(), TabloError> {
    if let Some(hv) = headers
        .get(CONSOLE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        && key_matches(hv, expected)
    {
        return Ok(());
    }

    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            && key_matches(token.trim(), expected)
        {
            return Ok(());
        }
    }

    if let Some(qs) = query {
        for (k, v) in url::form_urlencoded::parse(qs.as_bytes()) {
            if k == "key" && key_matches(&v, expected) {
                return Ok(());
            }
        }
    }

    Err(TabloError::Unauthorized)
}

/// Route guard; a no-op when the console runs without a key.
#[derive(Debug, Clone, Copy)]
pub struct RequireConsoleKey;

impl FromRequestParts<TabloState> for RequireConsoleKey {
    type Rejection = TabloError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TabloState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(expected) = state.console_key.as_deref() {
            ensure_authorized(&parts.headers, parts.uri.query(), expected)?;
        }
        Ok(Self)
    }
}

//! Cookie-backed session handling.
//!
//! The session cookie holds the principal's profile fields, base64-encoded
//! and signed with the server key. Trust is anchored at login time; requests
//! only verify the signature, they never re-contact the identity provider.

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// The authenticated user for the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Build the signed session cookie for a principal.
pub fn session_cookie(principal: &Principal) -> Result<Cookie<'static>, AppError> {
    let json = serde_json::to_vec(principal)
        .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;
    Ok(base_cookie(SESSION_COOKIE, URL_SAFE_NO_PAD.encode(json)))
}

/// Short-lived cookie carrying the OAuth state nonce between /login and /auth.
pub fn oauth_state_cookie(state: &str) -> Cookie<'static> {
    base_cookie(OAUTH_STATE_COOKIE, state.to_string())
}

pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, "");
    cookie.set_path("/");
    cookie
}

fn base_cookie(name: &'static str, value: String) -> Cookie<'static> {
    let mut cookie = Cookie::new(name, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie
}

fn decode_principal(value: &str) -> Option<Principal> {
    let json = URL_SAFE_NO_PAD.decode(value).ok()?;
    serde_json::from_slice(&json).ok()
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|err| -> AppError { match err {} })?;

        // An unsigned or tampered cookie never makes it out of the jar.
        let cookie = jar.get(SESSION_COOKIE).ok_or_else(|| {
            AppError::Unauthenticated(
                "Not authenticated: session missing or expired.".to_string(),
            )
        })?;

        let principal = decode_principal(cookie.value()).ok_or_else(|| {
            AppError::Unauthenticated("Not authenticated: session user invalid.".to_string())
        })?;

        if principal.sub.is_empty() {
            return Err(AppError::Unauthenticated(
                "Not authenticated: session user invalid.".to_string(),
            ));
        }

        Ok(principal)
    }
}

impl OptionalFromRequestParts<AppState> for Principal {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(
            <Principal as FromRequestParts<AppState>>::from_request_parts(parts, state)
                .await
                .ok(),
        )
    }
}

use axum::extract::{Query, State};
use axum::response::Response;
use axum_extra::extract::cookie::SignedCookieJar;
use serde::Deserialize;

use crate::api::found;
use crate::api::session::{
    self, oauth_state_cookie, removal_cookie, session_cookie, Principal,
};
use crate::api::state::AppState;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
pub struct AuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// GET /login - redirect the browser to the identity provider's consent screen.
pub async fn login(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<(SignedCookieJar, Response), AppError> {
    if !state.oauth.is_configured() {
        return Err(AppError::Config(
            "OAuth identity provider is not configured.".to_string(),
        ));
    }

    let nonce = crate::oauth::OAuthClient::generate_state();
    let url = state
        .oauth
        .authorize_url(&nonce)
        .map_err(|e| AppError::Config(format!("Invalid OAuth configuration: {}", e)))?;

    Ok((jar.add(oauth_state_cookie(&nonce)), found(&url)))
}

/// GET /auth - provider callback. Exchanges the code, populates the session,
/// and redirects to the chat UI. Any failure yields 401 and no session.
pub async fn auth_callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(params): Query<AuthCallbackQuery>,
) -> Result<(SignedCookieJar, Response), AppError> {
    let code = params.code.as_deref().unwrap_or_default();
    if code.is_empty() {
        return Err(login_failed("callback missing authorization code"));
    }

    let expected_state = jar
        .get(session::OAUTH_STATE_COOKIE)
        .map(|c| c.value().to_string());
    if expected_state.as_deref() != params.state.as_deref() || expected_state.is_none() {
        return Err(login_failed("state mismatch on OAuth callback"));
    }

    let userinfo = match state.oauth.exchange(code).await {
        Ok(info) => info,
        Err(e) => return Err(login_failed(&format!("token exchange failed: {}", e))),
    };

    let principal = Principal {
        sub: userinfo.sub,
        email: userinfo.email,
        name: userinfo.name,
        picture: userinfo.picture,
    };

    tracing::info!(sub = %principal.sub, "login succeeded");
    let jar = jar
        .remove(removal_cookie(session::OAUTH_STATE_COOKIE))
        .add(session_cookie(&principal)?);
    Ok((jar, found("/send.html")))
}

/// GET /logout - clear the session and return to the home page.
pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Response) {
    (jar.remove(removal_cookie(session::SESSION_COOKIE)), found("/"))
}

fn login_failed(cause: &str) -> AppError {
    tracing::error!(cause = %cause, "login failed");
    AppError::Unauthenticated("Could not log in.".to_string())
}

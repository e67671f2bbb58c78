use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sqlx::{Pool, Sqlite};

use crate::config::Config;
use crate::db::BlobStore;
use crate::oauth::OAuthClient;

/// Everything a handler needs, constructed once at startup and passed in
/// explicitly. No process-wide singletons.
#[derive(Clone)]
pub struct AppState {
    pub db: Pool<Sqlite>,
    pub oauth: Arc<OAuthClient>,
    pub blobs: Arc<BlobStore>,
    pub config: Arc<Config>,
    pub cookie_key: Key,
}

impl AppState {
    pub fn new(
        db: Pool<Sqlite>,
        oauth: OAuthClient,
        blobs: BlobStore,
        config: Arc<Config>,
    ) -> Self {
        let cookie_key = Key::derive_from(config.session_secret.as_bytes());
        Self {
            db,
            oauth: Arc::new(oauth),
            blobs: Arc::new(blobs),
            config,
            cookie_key,
        }
    }
}

// Lets SignedCookieJar pull its signing key out of the shared state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

use crate::error::AppError;

/// Minimum length for the session cookie signing secret. Shorter keys make
/// the signed cookie forgeable in practice, so startup refuses them.
const MIN_SESSION_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub google_client_id: String,
    pub google_client_secret: String,
    pub oauth_redirect_uri: String,
    pub upload_dir: String,
    pub public_base_url: String,
    pub static_dir: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Config {
            server_host: std::env::var("SERVER_HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            server_port: std::env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://phone_relay.db".to_string()),
            session_secret: std::env::var("SESSION_SECRET_KEY")
                .unwrap_or_else(|_| "change-this-session-secret-key-please".to_string()),
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default(),
            google_client_secret: std::env::var("GOOGLE_CLIENT_SECRET").unwrap_or_default(),
            oauth_redirect_uri: std::env::var("OAUTH_REDIRECT_URI")
                .unwrap_or_else(|_| "http://localhost:8000/auth".to_string()),
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./static/uploads".to_string()),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/static/uploads".to_string()),
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| "./static".to_string()),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .map_err(|e| AppError::Config(format!("Invalid REQUEST_TIMEOUT_SECS: {}", e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Eager validation so a bad environment fails at startup, not at first use.
    fn validate(&self) -> Result<(), AppError> {
        if self.session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AppError::Config(format!(
                "SESSION_SECRET_KEY must be at least {} bytes",
                MIN_SESSION_SECRET_LEN
            )));
        }
        if self.public_base_url.is_empty() {
            return Err(AppError::Config("PUBLIC_BASE_URL must not be empty".to_string()));
        }
        Ok(())
    }

    /// The OAuth client id/secret may legitimately be unset during local
    /// testing; /login reports a configuration error instead.
    pub fn oauth_configured(&self) -> bool {
        !self.google_client_id.is_empty() && !self.google_client_secret.is_empty()
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

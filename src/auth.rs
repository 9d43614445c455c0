//! OAuth2 refresh-token authentication for the AdWords API.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::config::Config;
use crate::error::AuthError;

/// OAuth2 token response.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[allow(dead_code)]
    token_type: String,
    expires_in: i64,
}

/// Cached token with expiration tracking.
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Check if token is expired (with buffer).
    fn is_expired(&self, buffer: Duration) -> bool {
        Utc::now() + buffer >= self.expires_at
    }
}

/// OAuth2 client that trades the configured refresh token for access tokens.
#[derive(Clone)]
pub struct OAuth2Client {
    config: Config,
    http_client: Client,
    token_cache: Arc<RwLock<Option<CachedToken>>>,
}

impl OAuth2Client {
    /// Create a new OAuth2 client.
    pub fn new(config: Config) -> Result<Self, AuthError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| AuthError::HttpClientInit(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            token_cache: Arc::new(RwLock::new(None)),
        })
    }

    /// Get a valid access token, refreshing if necessary.
    pub fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.cached_token() {
            return Ok(token);
        }

        self.fetch_token()
    }

    fn cached_token(&self) -> Option<String> {
        let cache = self.token_cache.read().ok()?;
        cache
            .as_ref()
            .filter(|cached| !cached.is_expired(self.config.token_buffer()))
            .map(|cached| cached.access_token.clone())
    }

    /// Fetch a new access token from the OAuth2 token endpoint.
    fn fetch_token(&self) -> Result<String, AuthError> {
        let token_url = self.config.token_url();

        let credentials = format!("{}:{}", self.config.client_id, self.config.client_secret);
        let auth_header = format!("Basic {}", BASE64.encode(credentials.as_bytes()));
        let body = format!(
            "grant_type=refresh_token&refresh_token={}",
            urlencoding::encode(&self.config.refresh_token)
        );

        debug!(url = %token_url, "Refreshing access token");

        let response = self
            .http_client
            .post(token_url)
            .header("Authorization", &auth_header)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            debug!(%status, %body, "Token request failed");
            return Err(AuthError::TokenRequestFailed { status, body });
        }

        let token_response: TokenResponse = response.json().map_err(|e| {
            AuthError::TokenParse(format!("Failed to parse token response: {}", e))
        })?;

        let expires_at = Utc::now() + Duration::seconds(token_response.expires_in);
        debug!(
            expires_at = %expires_at.format("%Y-%m-%d %H:%M:%S UTC"),
            "Access token acquired"
        );

        if let Ok(mut cache) = self.token_cache.write() {
            *cache = Some(CachedToken {
                access_token: token_response.access_token.clone(),
                expires_at,
            });
        }

        Ok(token_response.access_token)
    }
}

impl std::fmt::Debug for OAuth2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth2Client")
            .field("client_id", &self.config.client_id)
            .field("token_url", &self.config.token_url())
            .finish()
    }
}

use std::path::PathBuf;

use anyhow::Result;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use reqwest::{Client, StatusCode};
use profile_shared::{
    api::{AuthResponse, LoginRequest, RefreshRequest},
    UserProfile,
};

use super::auth::AuthTokens;

/// JWT payload claims we need for expiry checking
#[derive(serde::Deserialize)]
struct JwtClaims {
    exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Access forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Server error: {0}")]
    Server(String),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    token_path: PathBuf,
    tokens: Option<AuthTokens>,
}

impl ApiClient {
    pub fn new(base_url: &str, token_path: PathBuf) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token_path,
            tokens: None,
        }
    }

    /// Load tokens from disk
    pub fn load_tokens(&mut self) -> Result<bool> {
        self.tokens = AuthTokens::load(&self.token_path)?;
        Ok(self.tokens.is_some())
    }

    /// Check if authenticated
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_some()
    }

    /// Get current user ID
    pub fn user_id(&self) -> Option<&str> {
        self.tokens.as_ref().map(|t| t.user_id.as_str())
    }

    /// Build URL for endpoint
    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    /// Add auth header if authenticated
    fn auth_header(&self) -> Option<String> {
        self.tokens
            .as_ref()
            .map(|t| format!("Bearer {}", t.access_token))
    }

    /// Decode JWT payload and extract expiration time
    fn decode_token_exp(token: &str) -> Option<i64> {
        // JWT format: header.payload.signature
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }

        let payload = URL_SAFE_NO_PAD.decode(parts[1]).ok()?;
        let claims: JwtClaims = serde_json::from_slice(&payload).ok()?;

        Some(claims.exp)
    }

    /// Check if the access token is expiring soon (within 60 seconds)
    fn is_token_expiring_soon(&self) -> bool {
        let Some(tokens) = &self.tokens else {
            return true; // No token = treat as expired
        };

        let Some(exp) = Self::decode_token_exp(&tokens.access_token) else {
            return false; // Can't decode = don't refresh proactively
        };

        let now = chrono::Utc::now().timestamp();
        exp < now + 60
    }

    /// Ensure we have a valid token, refreshing if needed
    /// Returns true if we have a valid token, false if refresh failed
    pub async fn ensure_valid_token(&mut self) -> bool {
        if !self.is_authenticated() {
            return false;
        }

        if self.is_token_expiring_soon() {
            if let Err(e) = self.refresh().await {
                tracing::warn!("Token refresh failed: {}", e);
                return false;
            }
        }

        true
    }

    /// Make an authenticated GET request, auto-refreshing token if needed
    async fn authed_get(&mut self, path: &str) -> Result<reqwest::Response, ApiError> {
        if !self.ensure_valid_token().await {
            return Err(ApiError::Unauthorized);
        }
        let auth = self.auth_header().ok_or(ApiError::Unauthorized)?;
        self.client
            .get(self.url(path))
            .header("Authorization", auth)
            .send()
            .await
            .map_err(ApiError::Network)
    }

    /// Handle API response
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();

        match status {
            StatusCode::OK | StatusCode::CREATED => {
                let body = response.text().await?;
                Ok(serde_json::from_str(&body)?)
            }
            StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
            StatusCode::FORBIDDEN => Err(ApiError::Forbidden),
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::Validation(text))
            }
            _ => {
                let text = response.text().await.unwrap_or_default();
                Err(ApiError::Server(format!("{}: {}", status, text)))
            }
        }
    }

    fn store_tokens(&mut self, auth: AuthResponse) -> Result<(), ApiError> {
        let tokens = AuthTokens {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
            user_id: auth.user_id,
        };
        tokens.save(&self.token_path).map_err(ApiError::Other)?;
        self.tokens = Some(tokens);
        Ok(())
    }

    // ============ Auth ============

    pub async fn login(&mut self, email: &str, password: &str) -> Result<(), ApiError> {
        let req = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/auth/login"))
            .json(&req)
            .send()
            .await?;

        let auth: AuthResponse = self.handle_response(response).await?;
        tracing::info!(user_id = %auth.user_id, "Logged in");

        self.store_tokens(auth)
    }

    /// Best-effort server logout, then forget local tokens
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        if let Some(ref auth) = self.auth_header() {
            let sent = self
                .client
                .post(self.url("/auth/logout"))
                .header("Authorization", auth)
                .send()
                .await;
            if let Err(e) = sent {
                tracing::debug!("Logout request failed: {}", e);
            }
        }

        self.tokens = None;
        AuthTokens::delete(&self.token_path).map_err(ApiError::Other)?;
        Ok(())
    }

    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        let refresh_token = self
            .tokens
            .as_ref()
            .map(|t| t.refresh_token.clone())
            .ok_or(ApiError::Unauthorized)?;

        let req = RefreshRequest { refresh_token };

        let response = self
            .client
            .post(self.url("/auth/refresh"))
            .json(&req)
            .send()
            .await?;

        let auth: AuthResponse = self.handle_response(response).await?;
        self.store_tokens(auth)
    }

    // ============ Profile ============

    pub async fn fetch_profile(&mut self) -> Result<UserProfile, ApiError> {
        let response = self.authed_get("/user/profile").await?;
        self.handle_response(response).await
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use profile_shared::UserProfile;
use tokio::sync::Mutex;

use super::client::{ApiClient, ApiError};
use crate::nav::{Navigator, Route};

/// Source of the current user's profile
#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignOutOptions {
    /// When false the caller owns post-sign-out navigation
    pub redirect: bool,
}

/// Session lifecycle tied to sign-in/sign-out
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn sign_out(&self, options: SignOutOptions) -> Result<(), ApiError>;
}

/// Exposes the shared [`ApiClient`] as profile source and session service
#[derive(Clone)]
pub struct ApiAdapter {
    client: Arc<Mutex<ApiClient>>,
    navigator: Arc<dyn Navigator>,
}

impl ApiAdapter {
    pub fn new(client: Arc<Mutex<ApiClient>>, navigator: Arc<dyn Navigator>) -> Self {
        Self { client, navigator }
    }
}

#[async_trait]
impl ProfileSource for ApiAdapter {
    async fn fetch_profile(&self) -> Result<UserProfile, ApiError> {
        self.client.lock().await.fetch_profile().await
    }
}

#[async_trait]
impl SessionService for ApiAdapter {
    async fn sign_out(&self, options: SignOutOptions) -> Result<(), ApiError> {
        self.client.lock().await.logout().await?;
        tracing::info!("Signed out");

        if options.redirect {
            self.navigator.navigate(Route::Login);
        }
        Ok(())
    }
}

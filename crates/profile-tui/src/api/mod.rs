mod auth;
mod client;
mod mirror;
mod service;

pub use auth::AuthTokens;
pub use client::{ApiClient, ApiError};
pub use mirror::{FileMirror, NoopMirror, ProfileMirror};
pub use service::{ApiAdapter, ProfileSource, SessionService, SignOutOptions};

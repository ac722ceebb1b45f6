//! Terminal client for the user profile page.

pub mod api;
pub mod app;
pub mod avatar;
pub mod config;
pub mod nav;
pub mod profile;
pub mod toast;
pub mod ui;

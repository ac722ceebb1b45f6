use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

const APP_DIR: &str = "profile-tui";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: String,
    pub mirror_enabled: bool,
    pub auth_file: PathBuf,
    pub mirror_file: PathBuf,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join(APP_DIR);
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(|| config_dir.clone())
            .join(APP_DIR);

        Ok(Self {
            server_url: env::var("PROFILE_SERVER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            mirror_enabled: parse_switch(env::var("PROFILE_MIRROR").ok().as_deref())?,
            auth_file: config_dir.join("auth.json"),
            mirror_file: config_dir.join("user.json"),
            log_file: env::var("PROFILE_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| cache_dir.join("profile-tui.log")),
        })
    }
}

/// `on`/`off` style switch, defaulting to on
fn parse_switch(value: Option<&str>) -> Result<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("on") | Some("1") | Some("true") => Ok(true),
        Some("off") | Some("0") | Some("false") => Ok(false),
        Some(other) => anyhow::bail!("PROFILE_MIRROR must be on or off, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switch_values() {
        assert!(parse_switch(None).unwrap());
        assert!(parse_switch(Some("ON")).unwrap());
        assert!(!parse_switch(Some("off")).unwrap());
        assert!(!parse_switch(Some(" 0 ")).unwrap());
        assert!(parse_switch(Some("maybe")).is_err());
    }
}

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
}

impl AuthTokens {
    /// Load tokens from disk
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(path)
            .context("Could not read auth file")?;

        let tokens: Self = serde_json::from_str(&contents)
            .context("Could not parse auth file")?;

        Ok(Some(tokens))
    }

    /// Save tokens to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .context("Could not create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self)
            .context("Could not serialize tokens")?;

        fs::write(path, contents)
            .context("Could not write auth file")?;

        Ok(())
    }

    /// Delete stored tokens
    pub fn delete(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .context("Could not delete auth file")?;
        }

        Ok(())
    }
}

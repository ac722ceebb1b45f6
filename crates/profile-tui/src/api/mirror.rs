use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use profile_shared::UserProfile;

/// Write-only copy of the last known profile. Never read back by the client.
pub trait ProfileMirror: Send + Sync {
    fn store(&self, profile: &UserProfile) -> Result<()>;
}

/// Mirrors the profile as pretty JSON into a file
pub struct FileMirror {
    path: PathBuf,
}

impl FileMirror {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ProfileMirror for FileMirror {
    fn store(&self, profile: &UserProfile) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .context("Could not create mirror directory")?;
        }

        let contents = serde_json::to_string_pretty(profile)
            .context("Could not serialize profile")?;

        fs::write(&self.path, contents)
            .context("Could not write profile mirror")?;

        Ok(())
    }
}

/// Mirror that drops every write
pub struct NoopMirror;

impl ProfileMirror for NoopMirror {
    fn store(&self, _profile: &UserProfile) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            user_id: "u1".into(),
            first_name: "Ana".into(),
            last_name: "Diaz".into(),
            email: "ana@x.com".into(),
            phone: None,
            location: None,
            bio: None,
            avatar: Some("https://cdn.example/a.png".into()),
            created_at: "2023-03-15T00:00:00Z".into(),
        }
    }

    #[test]
    fn file_mirror_writes_serialized_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profile-tui").join("user.json");

        FileMirror::new(path.clone()).store(&profile()).unwrap();

        let written: UserProfile =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, profile());
    }

    #[test]
    fn noop_mirror_accepts_writes() {
        assert!(NoopMirror.store(&profile()).is_ok());
    }
}

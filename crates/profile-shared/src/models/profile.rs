use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user's profile as returned by `GET /api/user/profile`.
///
/// Required fields have no serde default, so a payload missing any of them
/// fails to decode as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: String,
}

impl UserProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn phone(&self) -> Option<&str> {
        non_empty(&self.phone)
    }

    pub fn location(&self) -> Option<&str> {
        non_empty(&self.location)
    }

    pub fn bio(&self) -> Option<&str> {
        non_empty(&self.bio)
    }

    pub fn avatar(&self) -> Option<&str> {
        non_empty(&self.avatar)
    }

    /// Copy of this profile with only the avatar replaced
    pub fn with_avatar(&self, url: impl Into<String>) -> Self {
        Self {
            avatar: Some(url.into()),
            ..self.clone()
        }
    }

    /// Parse `created_at` as an RFC 3339 timestamp, an ISO 8601 timestamp
    /// without offset (read as UTC) or a bare `YYYY-MM-DD` date
    pub fn joined_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at.trim();

        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }

        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
            return Some(ts.and_utc());
        }

        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

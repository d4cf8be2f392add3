use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's profile row. `id` is the owning user's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for a profile, keyed on `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpsert {
    pub id: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl ProfileUpsert {
    /// Builds the payload from form input. Blank fields become `None`.
    pub fn from_form(user_id: &str, full_name: &str, avatar_url: &str) -> Self {
        Self {
            id: user_id.to_string(),
            full_name: non_blank(full_name),
            avatar_url: non_blank(avatar_url),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// What the header and profile card show for the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayIdentity {
    pub display_name: String,
    pub initials: String,
    pub avatar_url: Option<String>,
}

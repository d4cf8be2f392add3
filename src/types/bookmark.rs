use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::ValidationError;

/// A saved bookmark as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a bookmark. Only obtainable through [`NewBookmark::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBookmark {
    user_id: String,
    title: String,
    url: String,
}

impl NewBookmark {
    /// Trims the form input and checks that both fields are present and that
    /// the URL parses as an absolute URL.
    pub fn validate(user_id: &str, title: &str, url: &str) -> Result<Self, ValidationError> {
        let title = title.trim();
        let url = url.trim();
        if title.is_empty() || url.is_empty() {
            return Err(ValidationError::MissingField);
        }
        url::Url::parse(url).map_err(|_| ValidationError::InvalidUrl(url.to_string()))?;

        Ok(Self {
            user_id: user_id.to_string(),
            title: title.to_string(),
            url: url.to_string(),
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

use serde::{Deserialize, Serialize};

use super::errors::SettingsError;

/// Application settings persisted as JSON in the platform config directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Public base URL of the app; overrides forwarded headers when set.
    pub site_url: Option<String>,
    pub rate_limit_per_second: u32,
    /// Buffered events per subscriber before a slow reader starts lagging.
    pub change_feed_capacity: usize,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            site_url: None,
            rate_limit_per_second: 200,
            change_feed_capacity: 256,
            log_filter: "info".to_string(),
        }
    }
}

impl AppSettings {
    /// Range checks that serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.rate_limit_per_second == 0 {
            return Err(SettingsError::InvalidValue(
                "rate_limit_per_second must be at least 1".to_string(),
            ));
        }
        if self.change_feed_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "change_feed_capacity must be at least 1".to_string(),
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(SettingsError::InvalidValue("log_filter must not be blank".to_string()));
        }
        if let Some(site_url) = &self.site_url {
            let parsed = url::Url::parse(site_url)
                .map_err(|e| SettingsError::InvalidValue(format!("site_url: {}", e)))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(SettingsError::InvalidValue(format!(
                    "site_url must be http or https, got {}",
                    parsed.scheme()
                )));
            }
        }
        Ok(())
    }
}

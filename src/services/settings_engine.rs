// Linkshelf Settings Engine
// `AppSettings` persisted as one pretty-printed JSON file.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

const SETTINGS_FILE: &str = "settings.json";

pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// `path_override` replaces `<config dir>/settings.json`; tests point it
    /// at a temp directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override.unwrap_or_else(|| {
            platform::get_config_dir()
                .join(SETTINGS_FILE)
                .to_string_lossy()
                .into_owned()
        });

        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }
}

fn read_settings(path: &Path) -> Result<AppSettings, SettingsError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| SettingsError::IoError(format!("cannot read {}: {}", path.display(), e)))?;
    let settings: AppSettings = serde_json::from_str(&raw)
        .map_err(|e| SettingsError::SerializationError(format!("{}: {}", path.display(), e)))?;
    settings.validate()?;
    Ok(settings)
}

fn write_settings(path: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|e| SettingsError::IoError(format!("cannot create {}: {}", dir.display(), e)))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
    fs::write(path, json)
        .map_err(|e| SettingsError::IoError(format!("cannot write {}: {}", path.display(), e)))
}

impl SettingsEngineTrait for SettingsEngine {
    /// Reads the file, or falls back to defaults when there is none yet.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = Path::new(&self.config_path);
        self.settings = if path.exists() {
            read_settings(path)?
        } else {
            debug!(path = %self.config_path, "no settings file, using defaults");
            AppSettings::default()
        };
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        write_settings(Path::new(&self.config_path), &self.settings)
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Sets one top-level field (`site_url`, `rate_limit_per_second`,
    /// `change_feed_capacity`, `log_filter`) and saves. Dotted keys are
    /// rejected since every field is a scalar. A mistyped or out-of-range
    /// value leaves both memory and disk untouched.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.is_empty() || key.contains('.') {
            return Err(SettingsError::InvalidKey(format!("'{}' is not a settings field", key)));
        }

        let mut fields = match serde_json::to_value(&self.settings) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(SettingsError::SerializationError("settings are not an object".to_string())),
            Err(e) => return Err(SettingsError::SerializationError(e.to_string())),
        };
        match fields.get_mut(key) {
            Some(slot) => *slot = value,
            None => return Err(SettingsError::InvalidKey(format!("'{}' is not a settings field", key))),
        }

        let updated: AppSettings = serde_json::from_value(Value::Object(fields))
            .map_err(|e| SettingsError::InvalidValue(format!("{}: {}", key, e)))?;
        updated.validate()?;

        write_settings(Path::new(&self.config_path), &updated)?;
        self.settings = updated;
        info!(key, "setting updated");
        Ok(())
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}

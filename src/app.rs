//! App Core for Linkshelf.
//!
//! Holds the backend, the settings engine and the dashboard session of the
//! signed-in user.

use std::sync::Arc;

use tracing::{info, warn};

use crate::managers::session_manager::DashboardSession;
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::site_url::UrlSources;
use crate::services::sqlite_backend::SqliteBackend;
use crate::types::errors::{ActionError, BackendError};
use crate::types::identity::AuthUser;

pub type Session = DashboardSession<Arc<SqliteBackend>>;

pub struct App {
    pub backend: Arc<SqliteBackend>,
    pub settings_engine: SettingsEngine,
    session: Option<Session>,
}

impl App {
    /// Creates an App with settings from the platform config directory.
    pub fn new(db_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        Self::with_settings(db_path, None)
    }

    /// Creates an App, reading settings from `settings_path` when given.
    pub fn with_settings(
        db_path: &str,
        settings_path: Option<String>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings_engine = SettingsEngine::new(settings_path);
        let settings = settings_engine.load()?;

        let backend = Arc::new(SqliteBackend::open(db_path, settings.change_feed_capacity)?);
        info!(db = db_path, "backend opened");

        Ok(Self {
            backend,
            settings_engine,
            session: None,
        })
    }

    /// Signs in and opens a dashboard session for the user, replacing any
    /// previous session.
    pub fn sign_in(&mut self, email: &str) -> Result<AuthUser, Box<dyn std::error::Error>> {
        let user = self.backend.sign_in(email)?;
        match self.session.as_mut() {
            Some(_) => {
                self.refresh_session()?;
            }
            None => {
                self.session = Some(DashboardSession::open(Arc::clone(&self.backend))?);
            }
        }
        Ok(user)
    }

    pub fn sign_out(&mut self) -> Result<(), BackendError> {
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.backend.sign_out()
    }

    pub fn session(&self) -> Result<&Session, ActionError> {
        self.session.as_ref().ok_or(ActionError::SessionExpired)
    }

    pub fn session_mut(&mut self) -> Result<&mut Session, ActionError> {
        self.session.as_mut().ok_or(ActionError::SessionExpired)
    }

    /// Re-checks the session scope. Any failure drops the session, so a
    /// half-entered scope is never served.
    pub fn refresh_session(&mut self) -> Result<bool, ActionError> {
        let result = self.session_mut()?.refresh_scope();
        if let Err(err) = &result {
            warn!(error = %err, "dropping dashboard session");
            if let Some(session) = self.session.take() {
                session.close();
            }
        }
        result
    }

    pub fn url_sources(&self) -> UrlSources {
        UrlSources::from_env(self.settings_engine.get_settings().site_url.as_deref())
    }

    /// Shutdown sequence: release the session's subscriptions.
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.close();
        }
    }
}

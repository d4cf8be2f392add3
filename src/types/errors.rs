use thiserror::Error;

// === ValidationError ===

/// Errors detected locally before any backend call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Title or URL was blank after trimming.
    #[error("Both title and URL are required.")]
    MissingField,
    /// The URL could not be parsed as an absolute URL.
    #[error("Please enter a valid URL (e.g., https://example.com).")]
    InvalidUrl(String),
}

// === BackendError ===

/// Errors reported by the backend collaborator for a rejected write or read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// No authenticated user is attached to the backend session.
    #[error("Not authenticated")]
    NotAuthenticated,
    /// Sign-in was attempted with an unusable identifier.
    #[error("Invalid login credentials: {0}")]
    InvalidCredentials(String),
    /// The row belongs to another owner.
    #[error("{0}")]
    PermissionDenied(String),
    /// The backing table does not exist.
    #[error("relation \"{0}\" does not exist")]
    MissingTable(String),
    /// Any other storage failure.
    #[error("{0}")]
    Database(String),
}

impl BackendError {
    /// Maps a SQLite error, recognising "no such table" as a missing relation.
    pub fn from_sqlite(err: rusqlite::Error) -> Self {
        let msg = err.to_string();
        match msg.strip_prefix("no such table: ") {
            Some(table) => BackendError::MissingTable(table.trim().to_string()),
            None => BackendError::Database(msg),
        }
    }
}

// === ActionError ===

/// Errors surfaced to the view that triggered an action.
///
/// The `Display` output is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Bookmark insert rejected by the backend.
    #[error("{0}")]
    InsertRejected(BackendError),
    /// Bookmark delete rejected by the backend.
    #[error("Failed to delete: {0}")]
    DeleteRejected(BackendError),
    /// Profile upsert rejected by the backend.
    #[error("{}", profile_failure(.0))]
    ProfileRejected(BackendError),
    /// Initial data could not be loaded for the session scope.
    #[error("Failed to load data: {0}")]
    LoadFailed(BackendError),
    /// No authenticated user at action time.
    #[error("Your session has expired. Please sign in again.")]
    SessionExpired,
}

impl ActionError {
    /// Returns the backend error behind this failure, if any.
    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            ActionError::InsertRejected(e)
            | ActionError::DeleteRejected(e)
            | ActionError::ProfileRejected(e)
            | ActionError::LoadFailed(e) => Some(e),
            ActionError::Validation(_) | ActionError::SessionExpired => None,
        }
    }
}

fn profile_failure(err: &BackendError) -> String {
    match err {
        BackendError::MissingTable(_) => {
            "Profiles table is missing. Run the profile migration before saving.".to_string()
        }
        other => format!("Failed to update profile: {}", other),
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

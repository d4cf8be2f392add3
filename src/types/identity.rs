use serde::{Deserialize, Serialize};

/// The authenticated user attached to the current backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
}

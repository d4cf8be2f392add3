// Linkshelf state managers
// Managers hold per-view state: the reconciled bookmark list, the profile, and the session tying them to a scope.

pub mod bookmark_manager;
pub mod profile_manager;
pub mod session_manager;

//! The backend collaborator consumed by view sessions.
//!
//! Covers identity lookup, row reads and writes on the `bookmarks` and
//! `profiles` tables, and change-feed subscriptions. Implementations enforce
//! ownership; the session layer never checks it.

use std::sync::Arc;

use crate::services::change_feed::Subscription;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::change::ChangeFilter;
use crate::types::errors::BackendError;
use crate::types::identity::AuthUser;
use crate::types::profile::{Profile, ProfileUpsert};

pub trait Backend: Send + Sync {
    /// The user attached to the current session, or `None` when signed out.
    fn current_user(&self) -> Option<AuthUser>;
    /// Bookmarks owned by `user_id`, newest first.
    fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, BackendError>;
    /// Stores a bookmark and returns it with server-assigned id and timestamp.
    fn insert_bookmark(&self, new: &NewBookmark) -> Result<Bookmark, BackendError>;
    /// Deletes a bookmark of the current user. Unknown ids are not an error.
    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError>;
    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError>;
    /// Creates the profile if absent, otherwise updates it (conflict key `id`).
    fn upsert_profile(&self, upsert: &ProfileUpsert) -> Result<Profile, BackendError>;
    fn subscribe(&self, filter: ChangeFilter) -> Subscription;
}

impl<B: Backend + ?Sized> Backend for Arc<B> {
    fn current_user(&self) -> Option<AuthUser> {
        (**self).current_user()
    }

    fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, BackendError> {
        (**self).list_bookmarks(user_id)
    }

    fn insert_bookmark(&self, new: &NewBookmark) -> Result<Bookmark, BackendError> {
        (**self).insert_bookmark(new)
    }

    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError> {
        (**self).delete_bookmark(id)
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        (**self).get_profile(user_id)
    }

    fn upsert_profile(&self, upsert: &ProfileUpsert) -> Result<Profile, BackendError> {
        (**self).upsert_profile(upsert)
    }

    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        (**self).subscribe(filter)
    }
}

//! Dashboard session for Linkshelf.
//!
//! A [`DashboardSession`] is the state behind one open view: the scope (the
//! signed-in user), the reconciled bookmark list and profile, and the change
//! feed subscriptions for that scope. Subscriptions are acquired when the
//! scope is entered and released when it is left, when the scope key changes,
//! or when the session is closed or dropped.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::managers::bookmark_manager::{BookmarkCollection, BookmarkReconcilerTrait};
use crate::managers::profile_manager::ProfileState;
use crate::services::backend::Backend;
use crate::services::change_feed::Subscription;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::change::{ChangeEvent, ChangeFilter, EventFilter, Table};
use crate::types::errors::{ActionError, BackendError};
use crate::types::identity::AuthUser;
use crate::types::profile::{DisplayIdentity, Profile, ProfileUpsert};

/// Outcome of draining the session's subscriptions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PumpSummary {
    /// Events received, whether or not they changed anything.
    pub received: usize,
    pub bookmarks_changed: bool,
    pub profile_changed: bool,
    /// State was reloaded from the backend because events were dropped.
    pub resynced: bool,
}

pub struct DashboardSession<B: Backend> {
    backend: B,
    user: AuthUser,
    bookmarks: BookmarkCollection,
    profile: ProfileState,
    subscriptions: Vec<Subscription>,
    /// Set when a subscription lagged and the reload has not succeeded yet.
    stale: bool,
}

impl<B: Backend> DashboardSession<B> {
    /// Enters the scope of the currently signed-in user: subscribes to its
    /// change feeds, then loads the initial bookmarks and profile.
    pub fn open(backend: B) -> Result<Self, ActionError> {
        let user = backend.current_user().ok_or(ActionError::SessionExpired)?;
        let (subscriptions, bookmarks, profile) = enter_scope(&backend, &user)?;
        info!(user = %user.id, bookmarks = bookmarks.len(), "dashboard session opened");

        Ok(Self {
            backend,
            user,
            bookmarks,
            profile,
            subscriptions,
            stale: false,
        })
    }

    pub fn user(&self) -> &AuthUser {
        &self.user
    }

    pub fn bookmarks(&self) -> &BookmarkCollection {
        &self.bookmarks
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.profile.get()
    }

    pub fn display(&self) -> DisplayIdentity {
        self.profile.display(&self.user.email)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Number of change-feed subscriptions this session currently holds.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Validates and stores a bookmark, then shows it at the top of the list.
    /// On any error the list is left untouched.
    pub fn add_bookmark(&mut self, title: &str, url: &str) -> Result<Bookmark, ActionError> {
        let new = NewBookmark::validate(&self.user.id, title, url)?;
        self.ensure_session()?;

        let bookmark = self
            .backend
            .insert_bookmark(&new)
            .map_err(|e| session_or(e, ActionError::InsertRejected))?;
        self.bookmarks.apply_local_insert(bookmark.clone());
        debug!(bookmark = %bookmark.id, "bookmark added");
        Ok(bookmark)
    }

    /// Deletes a bookmark and removes it from the list. On any error the
    /// list is left untouched.
    pub fn delete_bookmark(&mut self, id: &str) -> Result<(), ActionError> {
        self.ensure_session()?;

        self.backend
            .delete_bookmark(id)
            .map_err(|e| session_or(e, ActionError::DeleteRejected))?;
        self.bookmarks.apply_local_delete(id);
        debug!(bookmark = %id, "bookmark deleted");
        Ok(())
    }

    /// Creates or updates the user's profile from form input.
    pub fn save_profile(&mut self, full_name: &str, avatar_url: &str) -> Result<Profile, ActionError> {
        self.ensure_session()?;

        let upsert = ProfileUpsert::from_form(&self.user.id, full_name, avatar_url);
        let profile = self
            .backend
            .upsert_profile(&upsert)
            .map_err(|e| session_or(e, ActionError::ProfileRejected))?;
        self.profile.apply_local_upsert(profile.clone());
        debug!(user = %self.user.id, "profile saved");
        Ok(profile)
    }

    /// Drains every subscription and applies the events in feed (seq)
    /// order. If any subscription dropped events, the bookmarks and profile
    /// are reloaded from the backend afterwards; a failed reload is retried
    /// on the next pump.
    pub fn pump_events(&mut self) -> PumpSummary {
        let mut events: Vec<ChangeEvent> = Vec::new();
        for subscription in &mut self.subscriptions {
            while let Some(event) = subscription.try_next() {
                events.push(event);
            }
            self.stale |= subscription.take_lagged();
        }
        events.sort_by_key(|event| event.seq);

        let mut summary = PumpSummary {
            received: events.len(),
            ..PumpSummary::default()
        };
        for event in &events {
            match event.table {
                Table::Bookmarks => summary.bookmarks_changed |= self.bookmarks.apply_remote(event),
                Table::Profiles => summary.profile_changed |= self.profile.apply_remote(event),
            }
        }
        if self.stale {
            self.resync(&mut summary);
        }
        if summary.received > 0 || summary.resynced {
            debug!(
                received = summary.received,
                bookmarks_changed = summary.bookmarks_changed,
                profile_changed = summary.profile_changed,
                resynced = summary.resynced,
                "applied change events"
            );
        }
        summary
    }

    /// Replaces the local state with a fresh load of the current scope.
    fn resync(&mut self, summary: &mut PumpSummary) {
        match load_scope(&self.backend, &self.user) {
            Ok((bookmarks, profile)) => {
                summary.bookmarks_changed |= bookmarks.to_vec() != self.bookmarks.to_vec();
                summary.profile_changed |= profile != self.profile;
                summary.resynced = true;
                self.bookmarks = bookmarks;
                self.profile = profile;
                self.stale = false;
                info!(user = %self.user.id, "session state reloaded after lagged change feed");
            }
            Err(err) => warn!(user = %self.user.id, error = %err, "reload after lag failed"),
        }
    }

    /// Re-reads the signed-in user. When it changed, the old scope's
    /// subscriptions and state are dropped and the new scope is entered.
    /// Returns whether the scope changed. On error the session holds no
    /// data and no subscriptions.
    pub fn refresh_scope(&mut self) -> Result<bool, ActionError> {
        let current = match self.backend.current_user() {
            Some(user) => user,
            None => {
                self.release();
                self.bookmarks = BookmarkCollection::new();
                self.profile = ProfileState::default();
                return Err(ActionError::SessionExpired);
            }
        };
        if current.id == self.user.id {
            self.user.email = current.email;
            return Ok(false);
        }

        info!(from = %self.user.id, to = %current.id, "session scope changed");
        self.release();
        // Nothing of the previous user survives a switch, even a failed one.
        self.user = current;
        self.bookmarks = BookmarkCollection::new();
        self.profile = ProfileState::default();
        self.stale = false;

        let (subscriptions, bookmarks, profile) = enter_scope(&self.backend, &self.user)?;
        self.subscriptions = subscriptions;
        self.bookmarks = bookmarks;
        self.profile = profile;
        Ok(true)
    }

    /// Leaves the scope and releases the subscriptions.
    pub fn close(mut self) {
        self.release();
        info!(user = %self.user.id, "dashboard session closed");
    }

    fn release(&mut self) {
        if !self.subscriptions.is_empty() {
            debug!(count = self.subscriptions.len(), "releasing subscriptions");
        }
        self.subscriptions.clear();
    }

    fn ensure_session(&self) -> Result<(), ActionError> {
        match self.backend.current_user() {
            Some(user) if user.id == self.user.id => Ok(()),
            Some(user) => {
                warn!(expected = %self.user.id, actual = %user.id, "action attempted on a stale scope");
                Err(ActionError::SessionExpired)
            }
            None => Err(ActionError::SessionExpired),
        }
    }
}

fn session_or(err: BackendError, wrap: fn(BackendError) -> ActionError) -> ActionError {
    match err {
        BackendError::NotAuthenticated => ActionError::SessionExpired,
        other => wrap(other),
    }
}

fn scope_filters(user_id: &str) -> [ChangeFilter; 3] {
    [
        ChangeFilter::new(Table::Bookmarks, EventFilter::Insert).owned_by(user_id),
        ChangeFilter::new(Table::Bookmarks, EventFilter::Delete).owned_by(user_id),
        ChangeFilter::new(Table::Profiles, EventFilter::Any).owned_by(user_id),
    ]
}

/// Subscribes before loading so that writes landing in between are seen
/// at least once; the idempotent apply operations absorb the overlap.
fn enter_scope<B: Backend>(
    backend: &B,
    user: &AuthUser,
) -> Result<(Vec<Subscription>, BookmarkCollection, ProfileState), ActionError> {
    let subscriptions: Vec<Subscription> = scope_filters(&user.id)
        .into_iter()
        .map(|filter| backend.subscribe(filter))
        .collect();
    let (bookmarks, profile) = load_scope(backend, user)?;
    Ok((subscriptions, bookmarks, profile))
}

fn load_scope<B: Backend>(
    backend: &B,
    user: &AuthUser,
) -> Result<(BookmarkCollection, ProfileState), ActionError> {
    let bookmarks = backend
        .list_bookmarks(&user.id)
        .map_err(|e| session_or(e, ActionError::LoadFailed))?;
    let profile = backend
        .get_profile(&user.id)
        .map_err(|e| session_or(e, ActionError::LoadFailed))?;
    Ok((BookmarkCollection::from_initial(bookmarks), ProfileState::new(profile)))
}

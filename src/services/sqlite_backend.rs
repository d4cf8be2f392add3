//! Local stand-in for the managed backend, backed by SQLite via `rusqlite`.
//!
//! Holds one signed-in user at a time (shared by every session opened on it,
//! like a browser cookie shared by tabs), checks row ownership on every write
//! and publishes a [`ChangeEvent`] after each successful mutation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::Database;
use crate::services::backend::Backend;
use crate::services::change_feed::{ChangeFeed, Subscription};
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::change::{ChangeEvent, ChangeFilter, ChangeKind, Table};
use crate::types::errors::BackendError;
use crate::types::identity::AuthUser;
use crate::types::profile::{Profile, ProfileUpsert};

pub struct SqliteBackend {
    db: Mutex<Database>,
    session: Mutex<Option<AuthUser>>,
    feed: ChangeFeed,
}

impl SqliteBackend {
    /// Opens (or creates) the database file and attaches a change feed with
    /// the given per-subscriber capacity.
    pub fn open<P: AsRef<Path>>(path: P, feed_capacity: usize) -> Result<Self, BackendError> {
        let db = Database::open(path).map_err(BackendError::from_sqlite)?;
        Ok(Self::from_database(db, feed_capacity))
    }

    pub fn open_in_memory() -> Result<Self, BackendError> {
        let db = Database::open_in_memory().map_err(BackendError::from_sqlite)?;
        Ok(Self::from_database(db, 256))
    }

    pub fn from_database(db: Database, feed_capacity: usize) -> Self {
        Self {
            db: Mutex::new(db),
            session: Mutex::new(None),
            feed: ChangeFeed::new(feed_capacity),
        }
    }

    pub fn change_feed(&self) -> &ChangeFeed {
        &self.feed
    }

    /// Signs in as `email`, creating the user on first use.
    pub fn sign_in(&self, email: &str) -> Result<AuthUser, BackendError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(BackendError::InvalidCredentials(email));
        }

        let db = self.lock_db()?;
        let conn = db.connection();
        let existing: Option<String> = conn
            .query_row("SELECT id FROM users WHERE email = ?1", params![email], |row| {
                row.get(0)
            })
            .optional()
            .map_err(BackendError::from_sqlite)?;

        let id = match existing {
            Some(id) => id,
            None => {
                let id = Uuid::new_v4().to_string();
                conn.execute(
                    "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3)",
                    params![id, email, Utc::now()],
                )
                .map_err(BackendError::from_sqlite)?;
                info!(user = %id, "created user");
                id
            }
        };
        drop(db);

        let user = AuthUser { id, email };
        *self.lock_session()? = Some(user.clone());
        info!(user = %user.id, "signed in");
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<(), BackendError> {
        if let Some(user) = self.lock_session()?.take() {
            info!(user = %user.id, "signed out");
        }
        Ok(())
    }

    /// Removes the profile row of `user_id`. Only the owner may do this.
    pub fn delete_profile(&self, user_id: &str) -> Result<(), BackendError> {
        let user = self.require_user()?;
        if user.id != user_id {
            return Err(rls_violation(Table::Profiles));
        }

        let affected = self
            .lock_db()?
            .connection()
            .execute("DELETE FROM profiles WHERE id = ?1", params![user_id])
            .map_err(BackendError::from_sqlite)?;
        if affected > 0 {
            self.feed.publish(ChangeEvent::profile_deleted(user_id));
        }
        Ok(())
    }

    fn lock_db(&self) -> Result<MutexGuard<'_, Database>, BackendError> {
        self.db
            .lock()
            .map_err(|_| BackendError::Database("database lock poisoned".to_string()))
    }

    fn lock_session(&self) -> Result<MutexGuard<'_, Option<AuthUser>>, BackendError> {
        self.session
            .lock()
            .map_err(|_| BackendError::Database("session lock poisoned".to_string()))
    }

    fn require_user(&self) -> Result<AuthUser, BackendError> {
        self.current_user().ok_or(BackendError::NotAuthenticated)
    }

    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            user_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn row_to_profile(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        Ok(Profile {
            id: row.get(0)?,
            full_name: row.get(1)?,
            avatar_url: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    fn select_profile(db: &Database, user_id: &str) -> Result<Option<Profile>, BackendError> {
        db.connection()
            .query_row(
                "SELECT id, full_name, avatar_url, created_at, updated_at FROM profiles WHERE id = ?1",
                params![user_id],
                Self::row_to_profile,
            )
            .optional()
            .map_err(BackendError::from_sqlite)
    }
}

fn rls_violation(table: Table) -> BackendError {
    BackendError::PermissionDenied(format!(
        "new row violates row-level security policy for table \"{}\"",
        table.as_str()
    ))
}

impl Backend for SqliteBackend {
    fn current_user(&self) -> Option<AuthUser> {
        self.session.lock().ok().and_then(|s| s.clone())
    }

    fn list_bookmarks(&self, user_id: &str) -> Result<Vec<Bookmark>, BackendError> {
        let user = self.require_user()?;
        if user.id != user_id {
            // Rows of other owners are invisible, not forbidden.
            return Ok(Vec::new());
        }

        let db = self.lock_db()?;
        let mut stmt = db
            .connection()
            .prepare(
                "SELECT id, user_id, title, url, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC",
            )
            .map_err(BackendError::from_sqlite)?;
        let rows = stmt
            .query_map(params![user_id], Self::row_to_bookmark)
            .map_err(BackendError::from_sqlite)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(BackendError::from_sqlite)?);
        }
        Ok(results)
    }

    fn insert_bookmark(&self, new: &NewBookmark) -> Result<Bookmark, BackendError> {
        let user = self.require_user()?;
        if user.id != new.user_id() {
            return Err(rls_violation(Table::Bookmarks));
        }

        let bookmark = Bookmark {
            id: Uuid::new_v4().to_string(),
            user_id: user.id,
            title: new.title().to_string(),
            url: new.url().to_string(),
            created_at: Utc::now(),
        };
        self.lock_db()?
            .connection()
            .execute(
                "INSERT INTO bookmarks (id, user_id, title, url, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    bookmark.id,
                    bookmark.user_id,
                    bookmark.title,
                    bookmark.url,
                    bookmark.created_at
                ],
            )
            .map_err(BackendError::from_sqlite)?;
        debug!(bookmark = %bookmark.id, "inserted bookmark");

        self.feed.publish(ChangeEvent::bookmark_inserted(bookmark.clone()));
        Ok(bookmark)
    }

    fn delete_bookmark(&self, id: &str) -> Result<(), BackendError> {
        let user = self.require_user()?;
        let affected = self
            .lock_db()?
            .connection()
            .execute(
                "DELETE FROM bookmarks WHERE id = ?1 AND user_id = ?2",
                params![id, user.id],
            )
            .map_err(BackendError::from_sqlite)?;

        if affected > 0 {
            debug!(bookmark = %id, "deleted bookmark");
            self.feed.publish(ChangeEvent::bookmark_deleted(&user.id, id));
        }
        Ok(())
    }

    fn get_profile(&self, user_id: &str) -> Result<Option<Profile>, BackendError> {
        let user = self.require_user()?;
        if user.id != user_id {
            return Ok(None);
        }
        let db = self.lock_db()?;
        Self::select_profile(&db, user_id)
    }

    fn upsert_profile(&self, upsert: &ProfileUpsert) -> Result<Profile, BackendError> {
        let user = self.require_user()?;
        if user.id != upsert.id {
            return Err(rls_violation(Table::Profiles));
        }

        let db = self.lock_db()?;
        let existed = Self::select_profile(&db, &upsert.id)?.is_some();
        db.connection()
            .execute(
                "INSERT INTO profiles (id, full_name, avatar_url, created_at, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?4) \
                 ON CONFLICT(id) DO UPDATE SET \
                     full_name = excluded.full_name, \
                     avatar_url = excluded.avatar_url, \
                     updated_at = excluded.updated_at",
                params![upsert.id, upsert.full_name, upsert.avatar_url, Utc::now()],
            )
            .map_err(BackendError::from_sqlite)?;
        let profile = Self::select_profile(&db, &upsert.id)?
            .ok_or_else(|| BackendError::Database("upserted profile not found".to_string()))?;
        drop(db);

        let kind = if existed {
            ChangeKind::Update
        } else {
            ChangeKind::Insert
        };
        self.feed.publish(ChangeEvent::profile_written(kind, profile.clone()));
        Ok(profile)
    }

    fn subscribe(&self, filter: ChangeFilter) -> Subscription {
        self.feed.subscribe(filter)
    }
}

use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;
use super::profile::Profile;

/// Tables that publish change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Bookmarks,
    Profiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Bookmarks => "bookmarks",
            Table::Profiles => "profiles",
        }
    }
}

/// Kind of row change carried by a [`ChangeEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// New row image attached to insert and update events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowImage {
    Bookmark(Bookmark),
    Profile(Profile),
}

/// A push notification describing one row change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Position in the feed, assigned on publish. Zero until published.
    #[serde(default)]
    pub seq: u64,
    pub table: Table,
    pub kind: ChangeKind,
    /// Owner of the affected row (`user_id` for bookmarks, `id` for profiles).
    pub owner_id: String,
    /// Row after the change; absent for deletes.
    pub new: Option<RowImage>,
    /// Primary key of the row before the change; present for deletes.
    pub old_id: Option<String>,
}

impl ChangeEvent {
    pub fn bookmark_inserted(bookmark: Bookmark) -> Self {
        Self {
            seq: 0,
            table: Table::Bookmarks,
            kind: ChangeKind::Insert,
            owner_id: bookmark.user_id.clone(),
            new: Some(RowImage::Bookmark(bookmark)),
            old_id: None,
        }
    }

    pub fn bookmark_deleted(owner_id: &str, id: &str) -> Self {
        Self {
            seq: 0,
            table: Table::Bookmarks,
            kind: ChangeKind::Delete,
            owner_id: owner_id.to_string(),
            new: None,
            old_id: Some(id.to_string()),
        }
    }

    pub fn profile_written(kind: ChangeKind, profile: Profile) -> Self {
        Self {
            seq: 0,
            table: Table::Profiles,
            kind,
            owner_id: profile.id.clone(),
            new: Some(RowImage::Profile(profile)),
            old_id: None,
        }
    }

    pub fn profile_deleted(id: &str) -> Self {
        Self {
            seq: 0,
            table: Table::Profiles,
            kind: ChangeKind::Delete,
            owner_id: id.to_string(),
            new: None,
            old_id: Some(id.to_string()),
        }
    }
}

/// Event-type filter of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    Insert,
    Update,
    Delete,
    Any,
}

impl EventFilter {
    pub fn accepts(&self, kind: ChangeKind) -> bool {
        matches!(
            (self, kind),
            (EventFilter::Any, _)
                | (EventFilter::Insert, ChangeKind::Insert)
                | (EventFilter::Update, ChangeKind::Update)
                | (EventFilter::Delete, ChangeKind::Delete)
        )
    }
}

/// Selects which change events a subscription receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeFilter {
    pub table: Table,
    pub event: EventFilter,
    pub owner_id: Option<String>,
}

impl ChangeFilter {
    pub fn new(table: Table, event: EventFilter) -> Self {
        Self {
            table,
            event,
            owner_id: None,
        }
    }

    /// Restricts the filter to rows owned by `owner_id`.
    pub fn owned_by(mut self, owner_id: &str) -> Self {
        self.owner_id = Some(owner_id.to_string());
        self
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        self.table == event.table
            && self.event.accepts(event.kind)
            && self
                .owner_id
                .as_deref()
                .map_or(true, |owner| owner == event.owner_id)
    }
}

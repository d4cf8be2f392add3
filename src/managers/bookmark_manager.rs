//! Bookmark collection reconciler.
//!
//! Keeps one newest-first sequence of bookmarks consistent under two
//! independent mutation sources: direct action responses (local) and pushed
//! change events (remote). Both sources go through the same idempotent,
//! id-keyed operations, so either arrival order converges to the same state.

use std::collections::{HashMap, VecDeque};

use crate::types::bookmark::Bookmark;
use crate::types::change::{ChangeEvent, ChangeKind, RowImage, Table};

/// Trait defining the reconciliation operations on a bookmark sequence.
///
/// Every operation returns `true` when the sequence changed.
pub trait BookmarkReconcilerTrait {
    fn apply_local_insert(&mut self, bookmark: Bookmark) -> bool;
    fn apply_remote_insert(&mut self, bookmark: Bookmark) -> bool;
    fn apply_local_delete(&mut self, id: &str) -> bool;
    fn apply_remote_delete(&mut self, id: &str) -> bool;
    fn apply_remote(&mut self, event: &ChangeEvent) -> bool;
}

/// Id-keyed bookmark records plus their display order (newest first).
#[derive(Debug, Clone, Default)]
pub struct BookmarkCollection {
    records: HashMap<String, Bookmark>,
    order: VecDeque<String>,
}

impl BookmarkCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the collection from server-provided data that is already
    /// newest first. Later duplicates of an id are dropped.
    pub fn from_initial(bookmarks: Vec<Bookmark>) -> Self {
        let mut collection = Self::new();
        for bookmark in bookmarks {
            if collection.records.contains_key(&bookmark.id) {
                continue;
            }
            collection.order.push_back(bookmark.id.clone());
            collection.records.insert(bookmark.id.clone(), bookmark);
        }
        collection
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Bookmark> {
        self.records.get(id)
    }

    /// Iterates in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Bookmark> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn to_vec(&self) -> Vec<Bookmark> {
        self.iter().cloned().collect()
    }

    fn insert_front(&mut self, bookmark: Bookmark) -> bool {
        if self.records.contains_key(&bookmark.id) {
            return false;
        }
        self.order.push_front(bookmark.id.clone());
        self.records.insert(bookmark.id.clone(), bookmark);
        true
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.records.remove(id).is_none() {
            return false;
        }
        self.order.retain(|existing| existing != id);
        true
    }
}

impl BookmarkReconcilerTrait for BookmarkCollection {
    fn apply_local_insert(&mut self, bookmark: Bookmark) -> bool {
        self.insert_front(bookmark)
    }

    fn apply_remote_insert(&mut self, bookmark: Bookmark) -> bool {
        self.insert_front(bookmark)
    }

    fn apply_local_delete(&mut self, id: &str) -> bool {
        self.remove(id)
    }

    fn apply_remote_delete(&mut self, id: &str) -> bool {
        self.remove(id)
    }

    /// Applies a change event from the `bookmarks` table. Updates and
    /// events for other tables are ignored.
    fn apply_remote(&mut self, event: &ChangeEvent) -> bool {
        if event.table != Table::Bookmarks {
            return false;
        }
        match (event.kind, &event.new, &event.old_id) {
            (ChangeKind::Insert, Some(RowImage::Bookmark(bookmark)), _) => {
                self.apply_remote_insert(bookmark.clone())
            }
            (ChangeKind::Delete, _, Some(id)) => self.apply_remote_delete(id),
            _ => false,
        }
    }
}

//! Profile reconciler and display-name fallback.

use crate::types::change::{ChangeEvent, ChangeKind, RowImage, Table};
use crate::types::profile::{DisplayIdentity, Profile};

const DEFAULT_DISPLAY_NAME: &str = "User";

/// Holds at most one profile. Last applied write wins; fields are never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileState {
    profile: Option<Profile>,
}

impl ProfileState {
    pub fn new(initial: Option<Profile>) -> Self {
        Self { profile: initial }
    }

    pub fn get(&self) -> Option<&Profile> {
        self.profile.as_ref()
    }

    /// Result of the user's own save action.
    pub fn apply_local_upsert(&mut self, profile: Profile) {
        self.profile = Some(profile);
    }

    /// Delete clears the profile; insert and update replace it with `record`.
    /// An insert or update without a record leaves the state alone.
    pub fn apply_remote_event(&mut self, kind: ChangeKind, record: Option<Profile>) -> bool {
        match (kind, record) {
            (ChangeKind::Delete, _) => self.profile.take().is_some(),
            (_, Some(profile)) => {
                self.profile = Some(profile);
                true
            }
            (_, None) => false,
        }
    }

    /// Applies a change event from the `profiles` table.
    pub fn apply_remote(&mut self, event: &ChangeEvent) -> bool {
        if event.table != Table::Profiles {
            return false;
        }
        let record = match &event.new {
            Some(RowImage::Profile(profile)) => Some(profile.clone()),
            _ => None,
        };
        self.apply_remote_event(event.kind, record)
    }

    pub fn display(&self, email: &str) -> DisplayIdentity {
        resolve_display(self.profile.as_ref(), email)
    }
}

/// Resolves the name, initials and avatar shown for a user.
///
/// The name is the trimmed `full_name` when non-empty, else "User". Initials
/// come from the first letter of each word of the full name (max 2), else
/// from the first two characters of `email`. Always 1-2 characters.
pub fn resolve_display(profile: Option<&Profile>, email: &str) -> DisplayIdentity {
    let full_name = profile
        .and_then(|p| p.full_name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let initials = match full_name {
        Some(name) => take_upper(name.split_whitespace().filter_map(|word| word.chars().next())),
        None => take_upper(email.trim().chars()),
    };

    DisplayIdentity {
        display_name: full_name.unwrap_or(DEFAULT_DISPLAY_NAME).to_string(),
        initials: if initials.is_empty() {
            DEFAULT_DISPLAY_NAME[..1].to_string()
        } else {
            initials
        },
        avatar_url: profile
            .and_then(|p| p.avatar_url.as_deref())
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string),
    }
}

fn take_upper(chars: impl Iterator<Item = char>) -> String {
    chars.flat_map(char::to_uppercase).take(2).collect()
}

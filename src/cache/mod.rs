//! Session catalog
//!
//! Local copy of the session list used to populate the picker, with keyed
//! patch operations for when the backend confirms or renames a session.

mod reconciliation;

use std::collections::HashSet;

use tracing::debug;

use crate::models::{is_placeholder_title, normalize_title, SessionEntry, SessionId};

/// Ordered list of known sessions, most recent first.
///
/// Ids are unique. Every mutation goes through one of the methods below so
/// no caller can leave the list half-updated.
#[derive(Debug, Clone, Default)]
pub struct SessionCatalog {
    pub(crate) entries: Vec<SessionEntry>,
}

impl SessionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole catalog from a bulk fetch.
    ///
    /// Titles are normalized. If the backend lists an id twice, the first
    /// occurrence wins.
    pub fn replace_all(&mut self, entries: Vec<SessionEntry>) {
        let mut seen = HashSet::new();
        self.entries = entries
            .into_iter()
            .filter(|entry| seen.insert(entry.id.clone()))
            .map(|mut entry| {
                entry.title = normalize_title(&entry.title);
                entry
            })
            .collect();
        debug!("Session catalog replaced ({} entries)", self.entries.len());
    }

    /// Put a locally minted entry at the front.
    ///
    /// If the id is already known the existing entry moves to the front
    /// instead; its title is only replaced when it is still a placeholder.
    pub fn upsert_new(&mut self, mut entry: SessionEntry) {
        entry.title = normalize_title(&entry.title);

        if let Some(pos) = self.position(&entry.id) {
            let mut existing = self.entries.remove(pos);
            if is_placeholder_title(&existing.title) && !entry.title.is_empty() {
                existing.title = entry.title;
            }
            self.entries.insert(0, existing);
        } else {
            self.entries.insert(0, entry);
        }
    }

    /// Drop an entry. Returns it if it was present.
    pub fn remove(&mut self, id: &SessionId) -> Option<SessionEntry> {
        let pos = self.position(id)?;
        Some(self.entries.remove(pos))
    }

    pub fn get(&self, id: &SessionId) -> Option<&SessionEntry> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.position(id).is_some()
    }

    pub fn entries(&self) -> &[SessionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn position(&self, id: &SessionId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }
}

//! Session id reconciliation and title patching for SessionCatalog

use tracing::{debug, info};

use crate::models::{is_placeholder_title, normalize_title, SessionId};

use super::SessionCatalog;

impl SessionCatalog {
    /// Rewrite a locally assumed id to the one the backend confirmed.
    ///
    /// The entry keeps its position. If the catalog already holds an entry
    /// for `new_id` (say a refresh raced the confirmation) the two are
    /// merged into `old_id`'s slot and the other copy is removed, so the id
    /// stays unique. Returns false when `old_id` is unknown.
    pub fn reconcile_id(&mut self, old_id: &SessionId, new_id: &SessionId) -> bool {
        if old_id == new_id {
            return self.contains(old_id);
        }

        let Some(old_pos) = self.position(old_id) else {
            debug!("Nothing to reconcile for unknown session {}", old_id);
            return false;
        };

        match self.position(new_id) {
            None => {
                self.entries[old_pos].id = new_id.clone();
            }
            Some(new_pos) => {
                let confirmed = self.entries[new_pos].clone();
                let slot = &mut self.entries[old_pos];
                slot.id = new_id.clone();
                if !is_placeholder_title(&confirmed.title) {
                    slot.title = confirmed.title;
                }
                slot.created_at = slot.created_at.min(confirmed.created_at);
                self.entries.remove(new_pos);
            }
        }

        info!("Reconciled session {} -> {}", old_id, new_id);
        true
    }

    /// Set a title, but only over a placeholder.
    ///
    /// A title the backend or user already assigned is never clobbered by
    /// a generic one. Returns true if the entry changed.
    pub fn patch_title_if_default(&mut self, id: &SessionId, title: &str) -> bool {
        let title = normalize_title(title);
        if title.is_empty() {
            return false;
        }

        let Some(pos) = self.position(id) else {
            return false;
        };

        let entry = &mut self.entries[pos];
        if !is_placeholder_title(&entry.title) || entry.title == title {
            return false;
        }

        debug!("Session {} titled {:?}", id, title);
        entry.title = title;
        true
    }
}

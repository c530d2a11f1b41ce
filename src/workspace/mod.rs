//! Side-by-side draft comparison.
//!
//! A [`ComparisonWorkspace`] tracks which drafts are open next to each other.
//! The open set is never stored directly: it is derived on every read from the
//! current draft list and the user's manual selection, so it cannot go stale
//! when drafts appear or disappear underneath it.

use std::collections::HashSet;

use uuid::Uuid;

use crate::models::Draft;

/// How many drafts can be open at once.
pub const MAX_OPEN_DRAFTS: usize = 3;

#[derive(Debug, Clone, Default)]
pub struct ComparisonWorkspace {
    drafts: Vec<Draft>,
    /// Ids the user opened, oldest first. May reference drafts that are gone.
    manual_open: Vec<Uuid>,
    hidden: HashSet<Uuid>,
}

impl ComparisonWorkspace {
    pub fn new(drafts: Vec<Draft>) -> Self {
        Self {
            drafts,
            ..Self::default()
        }
    }

    /// Replace the supplied drafts. The manual selection and hidden set are kept.
    pub fn set_drafts(&mut self, drafts: Vec<Draft>) {
        self.drafts = drafts;
    }

    /// Drafts that have not been hidden, in their supplied order.
    pub fn visible_drafts(&self) -> Vec<&Draft> {
        self.drafts
            .iter()
            .filter(|d| !self.hidden.contains(&d.id))
            .collect()
    }

    /// Ids of the open drafts.
    ///
    /// The manual selection, minus anything no longer visible. If that leaves
    /// nothing, the first [`MAX_OPEN_DRAFTS`] visible drafts.
    pub fn open_ids(&self) -> Vec<Uuid> {
        let visible = self.visible_drafts();

        let valid: Vec<Uuid> = self
            .manual_open
            .iter()
            .copied()
            .filter(|id| visible.iter().any(|d| d.id == *id))
            .collect();

        if !valid.is_empty() {
            return valid;
        }

        visible
            .iter()
            .take(MAX_OPEN_DRAFTS)
            .map(|d| d.id)
            .collect()
    }

    /// The open drafts, in draft-list order.
    pub fn open_drafts(&self) -> Vec<&Draft> {
        let open = self.open_ids();
        self.visible_drafts()
            .into_iter()
            .filter(|d| open.contains(&d.id))
            .collect()
    }

    pub fn is_open(&self, id: Uuid) -> bool {
        self.open_ids().contains(&id)
    }

    pub fn is_hidden(&self, id: Uuid) -> bool {
        self.hidden.contains(&id)
    }

    /// Open `id` if closed, close it if open.
    ///
    /// Opening when [`MAX_OPEN_DRAFTS`] are already open evicts the one that was
    /// opened earliest.
    pub fn toggle(&mut self, id: Uuid) {
        if !self.is_visible(id) {
            return;
        }

        let mut open = self.open_ids();
        if let Some(pos) = open.iter().position(|o| *o == id) {
            open.remove(pos);
        } else {
            if open.len() >= MAX_OPEN_DRAFTS {
                open.remove(0);
            }
            open.push(id);
        }
        self.manual_open = open;
    }

    /// Close `id` if it is open.
    pub fn close(&mut self, id: Uuid) {
        let mut open = self.open_ids();
        if let Some(pos) = open.iter().position(|o| *o == id) {
            open.remove(pos);
            self.manual_open = open;
        }
    }

    /// Hide `id` for the lifetime of this workspace.
    pub fn hide(&mut self, id: Uuid) {
        if self.drafts.iter().any(|d| d.id == id) {
            self.hidden.insert(id);
        }
    }

    fn is_visible(&self, id: Uuid) -> bool {
        !self.hidden.contains(&id) && self.drafts.iter().any(|d| d.id == id)
    }
}

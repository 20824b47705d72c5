//! Multi-select set used for bulk actions.
//!
//! # Design
//! - Pure bookkeeping: no events or logging here; the workflow layers those on.
//! - Stored in a `BTreeSet` so snapshots come out in a stable order.

use std::collections::BTreeSet;

use bulkflow_events::ItemId;

/// Set of selected item ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<ItemId>,
}

impl Selection {
    /// Create an empty selection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `id` if absent, remove it if present.
    pub fn toggle(&mut self, id: ItemId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
        }
    }

    /// Replace the selection with every visible id.
    pub fn select_all(&mut self, visible: &[ItemId]) {
        self.ids = visible.iter().cloned().collect();
    }

    /// Select every visible id, or clear when all of them are already selected.
    pub fn toggle_all(&mut self, visible: &[ItemId]) {
        if self.is_all_selected(visible) {
            self.clear();
        } else {
            self.select_all(visible);
        }
    }

    /// Empty the selection.
    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Remove the given ids, ignoring ones that are not selected.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    /// Drop ids that are no longer visible and return them.
    pub fn retain_visible(&mut self, visible: &[ItemId]) -> Vec<ItemId> {
        let visible: BTreeSet<&ItemId> = visible.iter().collect();
        let stale: Vec<ItemId> = self
            .ids
            .iter()
            .filter(|id| !visible.contains(id))
            .cloned()
            .collect();
        self.ids.retain(|id| visible.contains(id));
        stale
    }

    /// Whether `id` is selected.
    #[must_use]
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.ids.contains(id)
    }

    /// Number of selected ids.
    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    /// Whether nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Whether every visible id is selected. An empty list is never "all selected".
    #[must_use]
    pub fn is_all_selected(&self, visible: &[ItemId]) -> bool {
        !visible.is_empty() && visible.iter().all(|id| self.ids.contains(id))
    }

    /// Ordered copy of the selected ids.
    #[must_use]
    pub fn snapshot(&self) -> Vec<ItemId> {
        self.ids.iter().cloned().collect()
    }

    /// Iterate the selected ids in order.
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[u64]) -> Vec<ItemId> {
        values.iter().copied().map(ItemId::from).collect()
    }

    #[test]
    fn toggle_selection_adds_and_removes() {
        let mut selection = Selection::new();
        selection.toggle(ItemId::from(1_u64));
        assert!(selection.is_selected(&ItemId::from(1_u64)));
        selection.toggle(ItemId::from(1_u64));
        assert!(selection.is_empty());
    }

    #[test]
    fn odd_toggle_counts_stay_selected() {
        let mut selection = Selection::new();
        let sequence = [1_u64, 2, 1, 3, 2, 2, 1, 1];
        for id in sequence {
            selection.toggle(ItemId::from(id));
        }
        for id in [1_u64, 2, 3] {
            let toggles = sequence.iter().filter(|value| **value == id).count();
            assert_eq!(selection.is_selected(&ItemId::from(id)), toggles % 2 == 1);
        }
    }

    #[test]
    fn select_all_then_all_selected() {
        let visible = ids(&[1, 2, 3]);
        let mut selection = Selection::new();
        selection.toggle(ItemId::from(9_u64));
        selection.select_all(&visible);
        assert!(selection.is_all_selected(&visible));
        assert!(!selection.is_selected(&ItemId::from(9_u64)));
        assert!(!selection.is_all_selected(&[]));
    }

    #[test]
    fn toggle_all_clears_when_full() {
        let visible = ids(&[1, 2]);
        let mut selection = Selection::new();
        selection.toggle_all(&visible);
        assert_eq!(selection.count(), 2);
        selection.toggle_all(&visible);
        assert!(selection.is_empty());
    }

    #[test]
    fn retain_visible_drops_stale_ids() {
        let mut selection = Selection::new();
        selection.select_all(&ids(&[1, 2, 3, 4]));
        let stale = selection.retain_visible(&ids(&[2, 4, 6]));
        assert_eq!(stale, ids(&[1, 3]));
        assert_eq!(selection.snapshot(), ids(&[2, 4]));
    }

    #[test]
    fn remove_all_skips_unselected_ids() {
        let mut selection = Selection::new();
        selection.select_all(&ids(&[1, 2, 3]));
        selection.remove_all(&ids(&[2, 5]));
        assert_eq!(selection.snapshot(), ids(&[1, 3]));
    }
}

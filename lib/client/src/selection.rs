use std::collections::HashSet;

/// How the client's row selection is being tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// A concrete set of selected row ids.
    Explicit,
    /// Every row in the dataset is selected, minus a tracked exception set.
    AllWithExceptions,
}

/// Tracks which rows of a large, server-paginated listing are logically
/// selected, without the client ever holding every id.
///
/// Starts in [`SelectionMode::Explicit`] with nothing selected. "Select
/// all across the dataset" flips to [`SelectionMode::AllWithExceptions`],
/// where only the *deselected* ids are tracked; the rest of the dataset
/// is implicitly selected no matter which page is visible.
#[derive(Debug, Clone)]
pub struct SelectionState {
    collection_id: Option<String>,
    mode: SelectionMode,
    explicit: HashSet<i64>,
    deselected: HashSet<i64>,
    server_total: u64,
    visible: Vec<i64>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionState {
    pub fn new() -> Self {
        Self {
            collection_id: None,
            mode: SelectionMode::Explicit,
            explicit: HashSet::new(),
            deselected: HashSet::new(),
            server_total: 0,
            visible: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn server_total(&self) -> u64 {
        self.server_total
    }

    /// The rows of the currently visible page.
    pub fn visible(&self) -> &[i64] {
        &self.visible
    }

    /// Reset to explicit-empty. Invariant: `deselected` is only populated
    /// while in all-with-exceptions mode, so both sets clear together.
    pub fn clear(&mut self) {
        self.mode = SelectionMode::Explicit;
        self.explicit.clear();
        self.deselected.clear();
    }

    /// Show a page of the listing.
    ///
    /// Changing the viewed collection clears the whole selection.
    /// Changing pages within a collection clears the explicit set (an
    /// explicit selection does not survive navigation) but leaves an
    /// all-with-exceptions selection intact — exceptions are tracked
    /// independently of which page is visible.
    pub fn show_page(&mut self, collection_id: &str, visible: Vec<i64>, server_total: u64) {
        if self.collection_id.as_deref() != Some(collection_id) {
            self.collection_id = Some(collection_id.to_string());
            self.clear();
        } else if self.mode == SelectionMode::Explicit && visible != self.visible {
            self.explicit.clear();
        }
        self.visible = visible;
        self.server_total = server_total;
    }

    /// Whether a row is logically selected.
    pub fn is_selected(&self, id: i64) -> bool {
        match self.mode {
            SelectionMode::Explicit => self.explicit.contains(&id),
            SelectionMode::AllWithExceptions => !self.deselected.contains(&id),
        }
    }

    /// Toggle one row.
    ///
    /// In all-with-exceptions mode, excluding the last still-selected
    /// visible row collapses the state back to explicit-empty — the
    /// client-side approximation of "the logical selection is now empty".
    pub fn toggle(&mut self, id: i64) {
        match self.mode {
            SelectionMode::Explicit => {
                if !self.explicit.remove(&id) {
                    self.explicit.insert(id);
                }
            }
            SelectionMode::AllWithExceptions => {
                if self.deselected.remove(&id) {
                    return;
                }
                self.deselected.insert(id);
                let all_visible_excluded = !self.visible.is_empty()
                    && self.visible.iter().all(|v| self.deselected.contains(v));
                if all_visible_excluded {
                    self.clear();
                }
            }
        }
    }

    /// Whether the "select all across the dataset" action should be
    /// offered: every row of the current page is individually selected
    /// and the server-reported total exceeds the page.
    pub fn can_select_all_pages(&self) -> bool {
        self.mode == SelectionMode::Explicit
            && !self.visible.is_empty()
            && self.visible.iter().all(|v| self.explicit.contains(v))
            && self.server_total > self.visible.len() as u64
    }

    /// Select everything across the dataset. No-op unless currently
    /// offered (see [`can_select_all_pages`]).
    ///
    /// [`can_select_all_pages`]: SelectionState::can_select_all_pages
    pub fn select_all_pages(&mut self) -> bool {
        if !self.can_select_all_pages() {
            return false;
        }
        self.mode = SelectionMode::AllWithExceptions;
        self.explicit.clear();
        self.deselected.clear();
        true
    }

    /// How many rows are logically selected.
    pub fn effective_count(&self) -> u64 {
        match self.mode {
            SelectionMode::Explicit => self.explicit.len() as u64,
            SelectionMode::AllWithExceptions => {
                self.server_total.saturating_sub(self.deselected.len() as u64)
            }
        }
    }

    /// The explicitly selected ids, sorted, for a small synchronous add.
    /// Empty in all-with-exceptions mode — that intent is expressed as a
    /// bulk transfer instead of an id list.
    pub fn explicit_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self.explicit.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: std::ops::Range<i64>) -> Vec<i64> {
        n.collect()
    }

    #[test]
    fn starts_explicit_and_empty() {
        let s = SelectionState::new();
        assert_eq!(s.mode(), SelectionMode::Explicit);
        assert_eq!(s.effective_count(), 0);
        assert!(!s.is_selected(1));
    }

    #[test]
    fn explicit_toggle_adds_and_removes() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 100);

        s.toggle(3);
        s.toggle(7);
        assert!(s.is_selected(3));
        assert_eq!(s.effective_count(), 2);
        assert_eq!(s.explicit_ids(), vec![3, 7]);

        s.toggle(3);
        assert!(!s.is_selected(3));
        assert_eq!(s.effective_count(), 1);
    }

    #[test]
    fn select_all_pages_needs_full_page_and_more_rows() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 100);
        assert!(!s.can_select_all_pages());

        for id in 1..11 {
            s.toggle(id);
        }
        assert!(s.can_select_all_pages());

        // Not offered when the page is the whole dataset.
        let mut small = SelectionState::new();
        small.show_page("col", page(1..11), 10);
        for id in 1..11 {
            small.toggle(id);
        }
        assert!(!small.can_select_all_pages());
        assert!(!small.select_all_pages());
    }

    #[test]
    fn all_with_exceptions_counts_against_server_total() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 10_000);
        for id in 1..11 {
            s.toggle(id);
        }
        assert!(s.select_all_pages());
        assert_eq!(s.mode(), SelectionMode::AllWithExceptions);
        assert_eq!(s.effective_count(), 10_000);
        // A row from a page the client never saw is selected.
        assert!(s.is_selected(9_999));

        // Exclude two rows, re-include one.
        s.toggle(4);
        s.toggle(5);
        assert_eq!(s.effective_count(), 9_998);
        s.toggle(4);
        assert_eq!(s.effective_count(), 9_999);
        assert!(s.is_selected(4));
        assert!(!s.is_selected(5));
    }

    #[test]
    fn exceptions_survive_page_navigation() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 100);
        for id in 1..11 {
            s.toggle(id);
        }
        s.select_all_pages();
        s.toggle(2);

        s.show_page("col", page(11..21), 100);
        assert_eq!(s.mode(), SelectionMode::AllWithExceptions);
        assert_eq!(s.effective_count(), 99);
        assert!(!s.is_selected(2));
        assert!(s.is_selected(15));
    }

    #[test]
    fn explicit_selection_does_not_survive_page_navigation() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 100);
        s.toggle(1);
        s.toggle(2);

        s.show_page("col", page(11..21), 100);
        assert_eq!(s.mode(), SelectionMode::Explicit);
        assert_eq!(s.effective_count(), 0);
    }

    #[test]
    fn changing_collection_clears_everything() {
        let mut s = SelectionState::new();
        s.show_page("col-a", page(1..11), 100);
        for id in 1..11 {
            s.toggle(id);
        }
        s.select_all_pages();
        s.toggle(3);

        s.show_page("col-b", page(1..11), 50);
        assert_eq!(s.mode(), SelectionMode::Explicit);
        assert_eq!(s.effective_count(), 0);
        // The old exception set is gone, not lurking.
        s.toggle(3);
        assert!(s.is_selected(3));
    }

    #[test]
    fn excluding_every_visible_row_collapses_to_explicit_empty() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..11), 10_000);
        for id in 1..11 {
            s.toggle(id);
        }
        s.select_all_pages();

        for id in 1..10 {
            s.toggle(id);
            assert_eq!(s.mode(), SelectionMode::AllWithExceptions);
        }
        // Deselecting the last visible row empties the logical selection.
        s.toggle(10);
        assert_eq!(s.mode(), SelectionMode::Explicit);
        assert_eq!(s.effective_count(), 0);
        assert_eq!(s.explicit_ids(), Vec::<i64>::new());
    }

    #[test]
    fn count_invariant_holds_across_random_toggles() {
        let mut s = SelectionState::new();
        s.show_page("col", page(1..21), 500);
        for id in 1..21 {
            s.toggle(id);
        }
        s.select_all_pages();

        let mut excluded: HashSet<i64> = HashSet::new();
        for id in [3, 17, 3, 9, 17, 11, 9, 9] {
            s.toggle(id);
            if !excluded.remove(&id) {
                excluded.insert(id);
            }
            assert_eq!(s.effective_count(), 500 - excluded.len() as u64);
        }
    }
}

use std::collections::HashSet;

use crate::model::Photo;

/// Multi-select state over the visible sequence.
///
/// Membership is by id and survives cache eviction: an id can stay selected
/// after its record left the window. Exiting multi-select mode always clears
/// the set; entering never does.
#[derive(Debug, Default)]
pub struct SelectionManager {
    selected: HashSet<i64>,
    multi_select: bool,
}

impl SelectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle(&mut self, id: i64) {
        if !self.selected.insert(id) {
            self.selected.remove(&id);
        }
    }

    /// Replace the selection with exactly the currently visible ids, not the
    /// whole cache.
    pub fn select_all(&mut self, visible: &[Photo]) {
        self.selected = visible.iter().map(|p| p.id).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.multi_select = false;
    }

    pub fn set_multi_select(&mut self, on: bool) {
        if !on {
            self.selected.clear();
        }
        self.multi_select = on;
    }

    pub fn is_multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selected.contains(&id)
    }

    pub fn ids(&self) -> &HashSet<i64> {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

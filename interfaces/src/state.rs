use parking_lot::RwLock;
use std::collections::HashMap;

use crate::defs::MediaSegment;
use crate::defs::SelectionStore;
use crate::defs::SelectionTag;

/// Selection store kept in memory for the lifetime of the process.
///
/// Tags are offered in the order they were registered; the first one is the
/// default target for a manual submission.
pub struct InMemorySelection {
    tags: Vec<SelectionTag>,
    selected: RwLock<HashMap<String, Vec<MediaSegment>>>,
}

impl InMemorySelection {
    pub fn new(tags: Vec<SelectionTag>) -> Self {
        Self {
            tags,
            selected: RwLock::new(HashMap::new()),
        }
    }

    pub fn selected(&self, tag: &SelectionTag) -> Vec<MediaSegment> {
        self.selected.read().get(&tag.name).cloned().unwrap_or_default()
    }

    pub fn total_selected(&self) -> usize {
        self.selected.read().values().map(Vec::len).sum()
    }
}

impl Default for InMemorySelection {
    fn default() -> Self {
        Self::new(vec![SelectionTag::new("submitted", "#4caf50")])
    }
}

impl SelectionStore for InMemorySelection {
    fn available_tags(&self) -> Vec<SelectionTag> {
        self.tags.clone()
    }

    fn add(&self, tag: &SelectionTag, segment: &MediaSegment) {
        self.selected
            .write()
            .entry(tag.name.clone())
            .or_default()
            .push(segment.clone());
    }
}

use std::collections::HashMap;

use crate::{NodeId, TagId, TagSet};

/// Node → [`TagSet`] map. The VFS core calls [`clear`](TagStorage::clear)
/// whenever a node is destroyed so storage never leaks stale entries.
#[derive(Debug, Default)]
pub struct TagStorage {
    by_node: HashMap<NodeId, TagSet>,
}

impl TagStorage {
    pub fn new() -> Self {
        TagStorage::default()
    }

    pub fn add_tag(&mut self, node: NodeId, tag: TagId) {
        self.by_node.entry(node).or_default().insert(tag);
    }

    pub fn remove_tag(&mut self, node: NodeId, tag: TagId) {
        if let Some(set) = self.by_node.get_mut(&node) {
            set.erase(tag);
        }
    }

    pub fn clear(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }

    pub fn tags_of(&self, node: NodeId) -> TagSet {
        self.by_node.get(&node).cloned().unwrap_or_default()
    }

    pub fn has_tag(&self, node: NodeId, tag: TagId) -> bool {
        self.by_node.get(&node).is_some_and(|s| s.contains(tag))
    }

    pub fn find_by_tag(&self, tag: TagId) -> Vec<NodeId> {
        self.by_node
            .iter()
            .filter(|(_, set)| set.contains(tag))
            .map(|(&node, _)| node)
            .collect()
    }

    pub fn find_by_tags(&self, tags: &TagSet, match_all: bool) -> Vec<NodeId> {
        self.by_node
            .iter()
            .filter(|(_, set)| {
                if match_all {
                    tags.is_subset_of(set)
                } else {
                    !set.intersection(tags).is_empty()
                }
            })
            .map(|(&node, _)| node)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_removes_entry_on_destroy() {
        let mut storage = TagStorage::new();
        storage.add_tag(1, 7);
        assert!(storage.has_tag(1, 7));
        storage.clear(1);
        assert!(!storage.has_tag(1, 7));
        assert!(storage.tags_of(1).is_empty());
    }

    #[test]
    fn find_by_tags_match_all_vs_any() {
        let mut storage = TagStorage::new();
        storage.add_tag(1, 1);
        storage.add_tag(1, 2);
        storage.add_tag(2, 1);
        let query: TagSet = [1, 2].into_iter().collect();
        let mut all = storage.find_by_tags(&query, true);
        all.sort();
        assert_eq!(all, vec![1]);
        let mut any = storage.find_by_tags(&query, false);
        any.sort();
        assert_eq!(any, vec![1, 2]);
    }
}

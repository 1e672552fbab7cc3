use indexmap::IndexMap;

use crate::{TagId, TAG_INVALID};

/// Bidirectional tag name ↔ id table. Registration is idempotent and ids are
/// never reused, even after a tag falls out of use.
#[derive(Debug, Default)]
pub struct TagRegistry {
    name_to_id: IndexMap<String, TagId>,
    id_to_name: IndexMap<TagId, String>,
    next_id: TagId,
}

impl TagRegistry {
    pub fn new() -> Self {
        TagRegistry {
            name_to_id: IndexMap::new(),
            id_to_name: IndexMap::new(),
            next_id: 1,
        }
    }

    pub fn register(&mut self, name: &str) -> TagId {
        if let Some(&id) = self.name_to_id.get(name) {
            return id;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.name_to_id.insert(name.to_owned(), id);
        self.id_to_name.insert(id, name.to_owned());
        id
    }

    pub fn id_of(&self, name: &str) -> TagId {
        self.name_to_id.get(name).copied().unwrap_or(TAG_INVALID)
    }

    pub fn name_of(&self, id: TagId) -> Option<&str> {
        self.id_to_name.get(&id).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.name_to_id.contains_key(name)
    }

    pub fn all_names(&self) -> impl Iterator<Item = &str> {
        self.name_to_id.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.name_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_to_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_is_idempotent() {
        let mut reg = TagRegistry::new();
        let a = reg.register("doc");
        let b = reg.register("doc");
        assert_eq!(a, b);
        assert_ne!(a, TAG_INVALID);
    }

    #[test]
    fn ids_never_reused() {
        let mut reg = TagRegistry::new();
        let a = reg.register("x");
        let b = reg.register("y");
        assert_ne!(a, b);
        assert_eq!(reg.name_of(a), Some("x"));
    }
}

//! Mock group store for testing.

use crate::application::ports::GroupStore;
use crate::domain::event::{Group, GroupId};
use ahash::RandomState;
use dashmap::DashMap;

/// In-memory group store double.
///
/// Starts empty; lookups for unknown identifiers return `None`, mirroring
/// a group that was deleted after the similarity service indexed it.
#[derive(Debug, Default)]
pub struct MockGroupStore {
    groups: DashMap<GroupId, Group, RandomState>,
}

impl MockGroupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            groups: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Add a group.
    pub fn insert(&self, group: Group) {
        self.groups.insert(group.id, group);
    }

    /// Remove a group.
    pub fn remove(&self, id: GroupId) {
        self.groups.remove(&id);
    }
}

impl GroupStore for MockGroupStore {
    fn find_by_id(&self, id: GroupId) -> Option<Group> {
        self.groups.get(&id).map(|group| *group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let store = MockGroupStore::new();
        assert_eq!(store.find_by_id(GroupId(5)), None);

        store.insert(Group::new(GroupId(5)));
        assert_eq!(store.find_by_id(GroupId(5)), Some(Group::new(GroupId(5))));

        store.remove(GroupId(5));
        assert_eq!(store.find_by_id(GroupId(5)), None);
    }
}

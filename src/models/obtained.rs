//! The set of item IDs a player has already obtained.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ItemId;

/// Items already unlocked in a player's collection log.
///
/// Supplied per request and never stored by the estimator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObtainedSet(HashSet<ItemId>);

impl ObtainedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.0.contains(&item_id)
    }

    /// Returns true if the item was not already present.
    pub fn insert(&mut self, item_id: ItemId) -> bool {
        self.0.insert(item_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.0.iter()
    }

    /// IDs in ascending order, for stable output.
    pub fn sorted(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.0.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl FromIterator<ItemId> for ObtainedSet {
    fn from_iter<I: IntoIterator<Item = ItemId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<ItemId> for ObtainedSet {
    fn extend<I: IntoIterator<Item = ItemId>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl<const N: usize> From<[ItemId; N]> for ObtainedSet {
    fn from(ids: [ItemId; N]) -> Self {
        ids.into_iter().collect()
    }
}

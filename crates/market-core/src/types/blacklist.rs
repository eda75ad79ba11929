//! Item exclusion lists applied during planning.

use crate::types::{ItemId, LocationId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A compiled exclusion structure: a global item set plus per-destination
/// sets. Built once before planning; queried per candidate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Blacklist {
    pub global_items: HashSet<ItemId>,
    pub by_destination: HashMap<LocationId, HashSet<ItemId>>,
}

impl Blacklist {
    pub fn is_empty(&self) -> bool {
        self.global_items.is_empty() && self.by_destination.values().all(|s| s.is_empty())
    }

    /// True if the item is excluded globally or for this destination.
    pub fn contains(&self, destination: LocationId, item: ItemId) -> bool {
        if self.global_items.contains(&item) {
            return true;
        }
        self.by_destination
            .get(&destination)
            .map(|set| set.contains(&item))
            .unwrap_or(false)
    }

    /// Compile loose entry lists into the lookup structure.
    pub fn compile(
        global: impl IntoIterator<Item = ItemId>,
        per_destination: impl IntoIterator<Item = (LocationId, ItemId)>,
    ) -> Self {
        let mut by_destination: HashMap<LocationId, HashSet<ItemId>> = HashMap::new();
        for (destination, item) in per_destination {
            by_destination.entry(destination).or_default().insert(item);
        }
        Self {
            global_items: global.into_iter().collect(),
            by_destination,
        }
    }
}

//! Region selection set for mask-based cutouts.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::segmentation::RegionId;

/// Regions the user has picked on the overlay. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct SelectionSet(BTreeSet<RegionId>);

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `region`. Returns whether it is selected afterwards.
    pub fn toggle(&mut self, region: RegionId) -> bool {
        if self.0.remove(&region) {
            false
        } else {
            self.0.insert(region);
            true
        }
    }

    /// Empty the set unconditionally.
    pub fn deselect_all(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, region: RegionId) -> bool {
        self.0.contains(&region)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Selected regions in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_toggle_twice_is_round_trip() {
        let mut set = SelectionSet::new();
        assert!(set.toggle(RegionId(2)));
        assert!(set.contains(RegionId(2)));
        assert!(!set.toggle(RegionId(2)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_toggle_sequence_keeps_odd_counts() {
        let clicks = [0, 3, 1, 3, 0, 0, 2, 1, 1, 2];
        let mut set = SelectionSet::new();
        let mut counts: HashMap<usize, u32> = HashMap::new();
        for &c in &clicks {
            set.toggle(RegionId(c));
            *counts.entry(c).or_default() += 1;
        }

        let mut expected: Vec<RegionId> = counts
            .into_iter()
            .filter(|(_, n)| n % 2 == 1)
            .map(|(c, _)| RegionId(c))
            .collect();
        expected.sort();
        assert_eq!(set.iter().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn test_deselect_all_is_idempotent() {
        let mut set = SelectionSet::new();
        set.deselect_all();
        assert!(set.is_empty());

        set.toggle(RegionId(0));
        set.toggle(RegionId(5));
        set.deselect_all();
        assert!(set.is_empty());
        set.deselect_all();
        assert_eq!(set.len(), 0);
    }
}

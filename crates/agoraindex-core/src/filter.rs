//! Subscription filter set — which (address, selectors) pairs we watch.
//!
//! The set is additive for the life of a session: entries are merged in,
//! never removed. Adding a previously-absent address flags the set as
//! needing reapplication, and the index loop re-issues the subscription
//! with the enlarged filter on the next cycle.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use agoraindex_codec::{Address, Felt};

/// One watched address with its selector set, as handed to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFilter {
    pub address: Address,
    pub selectors: Vec<Felt>,
}

/// Snapshot of the filter set at subscription time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub entries: Vec<AddressFilter>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The live, growable filter set.
#[derive(Debug, Default)]
pub struct FilterSet {
    entries: BTreeMap<Address, BTreeSet<Felt>>,
    pending_reapply: bool,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `(address, selectors)` into the set.
    ///
    /// Returns `true` when the address was previously absent, in which case
    /// the active subscription must be re-issued to see its events.
    pub fn add(&mut self, address: Address, selectors: impl IntoIterator<Item = Felt>) -> bool {
        let is_new = !self.entries.contains_key(&address);
        self.entries.entry(address).or_default().extend(selectors);
        if is_new {
            self.pending_reapply = true;
        }
        is_new
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.entries.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the active subscription needs to be torn down and re-issued
    /// with the enlarged filter.
    pub fn should_reapply(&self) -> bool {
        self.pending_reapply
    }

    /// Snapshot the current set and clear the reapply flag; called when a
    /// subscription is (re)issued with this spec.
    pub fn apply(&mut self) -> FilterSpec {
        self.pending_reapply = false;
        FilterSpec {
            entries: self
                .entries
                .iter()
                .map(|(address, selectors)| AddressFilter {
                    address: *address,
                    selectors: selectors.iter().copied().collect(),
                })
                .collect(),
        }
    }
}

/// Shared handle so factory-expansion handlers can grow the set while the
/// index loop consults it between batches.
pub type SharedFilterSet = Arc<Mutex<FilterSet>>;

/// Construct a shared filter set from static configuration.
pub fn shared(entries: impl IntoIterator<Item = (Address, Vec<Felt>)>) -> SharedFilterSet {
    let mut set = FilterSet::new();
    for (address, selectors) in entries {
        set.add(address, selectors);
    }
    // the initial subscription applies the configured set
    Arc::new(Mutex::new(set))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Felt::from_u64(n).to_address()
    }

    #[test]
    fn add_new_address_requests_reapply() {
        let mut set = FilterSet::new();
        assert!(set.add(addr(1), vec![Felt::from_u64(10)]));
        assert!(set.should_reapply());

        let spec = set.apply();
        assert!(!set.should_reapply());
        assert_eq!(spec.entries.len(), 1);
        assert_eq!(spec.entries[0].selectors, vec![Felt::from_u64(10)]);
    }

    #[test]
    fn re_adding_known_address_is_a_noop() {
        let mut set = FilterSet::new();
        set.add(addr(1), vec![Felt::from_u64(10)]);
        set.apply();

        assert!(!set.add(addr(1), vec![Felt::from_u64(10)]));
        assert!(!set.should_reapply());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn selectors_merge_without_duplicates() {
        let mut set = FilterSet::new();
        set.add(addr(1), vec![Felt::from_u64(10), Felt::from_u64(11)]);
        set.add(addr(1), vec![Felt::from_u64(11), Felt::from_u64(12)]);

        let spec = set.apply();
        assert_eq!(spec.entries[0].selectors.len(), 3);
    }

    #[test]
    fn entries_are_never_removed() {
        let mut set = FilterSet::new();
        set.add(addr(1), vec![]);
        set.add(addr(2), vec![]);
        set.apply();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&addr(1)));
    }
}

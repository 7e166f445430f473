//! Diff calculation for new-listing notifications.
//!
//! Computes `fresh − known` over listing identities. The result keeps the
//! order of the fresh snapshot so notifications follow the site's own
//! ranking.

use std::collections::HashSet;

use crate::models::ListingIdentity;

/// Diff result with the bookkeeping the cycle log needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// New identities, in snapshot order
    pub added: Vec<ListingIdentity>,
    /// Snapshot entries already in the ledger
    pub already_known: usize,
    /// Repeats of an identity within the same snapshot
    pub duplicates: usize,
}

impl DiffResult {
    /// Check if there is anything to process.
    pub fn has_changes(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Calculate the diff between a fresh snapshot and the known set.
pub fn calculate_diff(fresh: &[ListingIdentity], known: &HashSet<ListingIdentity>) -> DiffResult {
    let mut result = DiffResult::default();
    let mut emitted: HashSet<&ListingIdentity> = HashSet::with_capacity(fresh.len());

    for identity in fresh {
        if known.contains(identity) {
            result.already_known += 1;
        } else if emitted.insert(identity) {
            result.added.push(identity.clone());
        } else {
            result.duplicates += 1;
        }
    }
    result
}

/// New identities only.
pub fn diff(fresh: &[ListingIdentity], known: &HashSet<ListingIdentity>) -> Vec<ListingIdentity> {
    calculate_diff(fresh, known).added
}

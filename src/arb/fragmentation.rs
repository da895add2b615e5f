//! Fragmentation index: which venues trade a given mint against a
//! recognized quote.

use crate::constants::is_recognized_quote;
use crate::types::{Address, Venue};
use std::collections::{HashMap, HashSet};

/// Canonically ordered `(mint_a, mint_b)`, restricted to pairs where at
/// least one side is a recognized quote mint.
pub fn canonical_pair(mint_a: Address, mint_b: Address) -> Option<(Address, Address)> {
    if !is_recognized_quote(&mint_a) && !is_recognized_quote(&mint_b) {
        return None;
    }
    if mint_a.as_bytes() <= mint_b.as_bytes() {
        Some((mint_a, mint_b))
    } else {
        Some((mint_b, mint_a))
    }
}

/// Maps a canonical mint pair to the set of `ACTIVE` pools trading it,
/// partitioned by venue.
#[derive(Default)]
pub struct FragmentationIndex {
    by_pair: HashMap<(Address, Address), HashMap<Venue, HashSet<Address>>>,
    pool_pair: HashMap<Address, (Address, Address)>,
}

impl FragmentationIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a pool into the index. No-op if the pair is not quote-recognized.
    pub fn upsert(&mut self, pool: Address, venue: Venue, mint_a: Address, mint_b: Address) {
        let Some(pair) = canonical_pair(mint_a, mint_b) else { return };
        self.remove(&pool);
        self.by_pair.entry(pair).or_default().entry(venue).or_default().insert(pool);
        self.pool_pair.insert(pool, pair);
    }

    /// Removes a pool from the index on lifecycle eviction or deactivation —
    /// membership tracks `ACTIVE` state exactly, nothing else.
    pub fn remove(&mut self, pool: &Address) {
        if let Some(pair) = self.pool_pair.remove(pool) {
            if let Some(venues) = self.by_pair.get_mut(&pair) {
                for pools in venues.values_mut() {
                    pools.remove(pool);
                }
                venues.retain(|_, pools| !pools.is_empty());
                if venues.is_empty() {
                    self.by_pair.remove(&pair);
                }
            }
        }
    }

    pub fn contains(&self, pool: &Address) -> bool {
        self.pool_pair.contains_key(pool)
    }

    /// `true` if the mint pair is fragmented across at least two venues.
    pub fn is_fragmented(&self, mint_a: Address, mint_b: Address) -> bool {
        let Some(pair) = canonical_pair(mint_a, mint_b) else { return false };
        self.by_pair.get(&pair).map(|v| v.len() >= 2).unwrap_or(false)
    }

    /// All `(venue, pool)` entries for a mint pair, for cross-venue scanning.
    pub fn pools_for(&self, mint_a: Address, mint_b: Address) -> Vec<(Venue, Address)> {
        let Some(pair) = canonical_pair(mint_a, mint_b) else { return Vec::new() };
        self.by_pair
            .get(&pair)
            .map(|venues| venues.iter().flat_map(|(v, pools)| pools.iter().map(move |p| (*v, *p))).collect())
            .unwrap_or_default()
    }

    pub fn pair_count(&self) -> usize {
        self.by_pair.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WRAPPED_NATIVE_MINT;

    #[test]
    fn pool_only_tracked_when_quote_side_is_recognized() {
        let mut idx = FragmentationIndex::new();
        let unrelated_a = Address::new([1; 32]);
        let unrelated_b = Address::new([2; 32]);
        idx.upsert(Address::new([9; 32]), Venue::CpAmm, unrelated_a, unrelated_b);
        assert_eq!(idx.pair_count(), 0);
    }

    #[test]
    fn fragmentation_requires_two_distinct_venues() {
        let mut idx = FragmentationIndex::new();
        let mint = Address::new([7; 32]);
        let quote = *WRAPPED_NATIVE_MINT;
        idx.upsert(Address::new([1; 32]), Venue::CpAmm, mint, quote);
        assert!(!idx.is_fragmented(mint, quote));

        idx.upsert(Address::new([2; 32]), Venue::ClAmm, mint, quote);
        assert!(idx.is_fragmented(mint, quote));
    }

    #[test]
    fn removing_last_pool_in_a_venue_shrinks_the_index() {
        let mut idx = FragmentationIndex::new();
        let mint = Address::new([7; 32]);
        let quote = *WRAPPED_NATIVE_MINT;
        let pool = Address::new([1; 32]);
        idx.upsert(pool, Venue::CpAmm, mint, quote);
        idx.upsert(Address::new([2; 32]), Venue::ClAmm, mint, quote);
        idx.remove(&pool);
        assert!(!idx.is_fragmented(mint, quote));
        assert!(!idx.contains(&pool));
    }
}

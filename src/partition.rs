// 🗂️ Holder Partition - Classify holders for the audit
// Splits the holder export into untouched holders, siphon sources and
// siphon destinations, and draws the spot-check samples.

use crate::loader::{HolderAddress, Siphon};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Charset for invented addresses, as the deployer tooling writes them
const HEX_CHARS: &[u8] = b"1234567890abcdef";

/// Hex characters after the `0x` prefix
const ADDRESS_HEX_LEN: usize = 40;

// ============================================================================
// HOLDER PARTITION
// ============================================================================

/// The three disjoint-by-construction holder classes for one audit run.
///
/// Sorted sets make iteration order (and therefore oracle call order)
/// deterministic across runs on identical inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolderPartition {
    /// Holders untouched by any siphon, in export order
    pub normal: Vec<HolderAddress>,

    /// Legacy addresses siphons drain from
    pub sources: BTreeSet<HolderAddress>,

    /// New-contract addresses siphons pay into
    pub destinations: BTreeSet<HolderAddress>,
}

impl HolderPartition {
    /// Classify every exported holder against the siphon list.
    ///
    /// Siphon addresses that never appear in the export are fine; they
    /// simply land in `sources`/`destinations` without shrinking `normal`.
    pub fn compute(holders: &[HolderAddress], siphons: &[Siphon]) -> Self {
        let sources: BTreeSet<HolderAddress> =
            siphons.iter().map(|s| s.from_addr.clone()).collect();
        let destinations: BTreeSet<HolderAddress> =
            siphons.iter().map(|s| s.to_addr.clone()).collect();

        let normal = holders
            .iter()
            .filter(|addr| !sources.contains(*addr) && !destinations.contains(*addr))
            .cloned()
            .collect();

        HolderPartition {
            normal,
            sources,
            destinations,
        }
    }

    pub fn normal_count(&self) -> usize {
        self.normal.len()
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// Draw `n` untouched holders with replacement for spot-checking.
    /// Empty `normal` yields an empty sample.
    pub fn sample_normal_holders<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<HolderAddress> {
        (0..n)
            .filter_map(|_| self.normal.choose(rng).cloned())
            .collect()
    }
}

// ============================================================================
// RANDOM ADDRESSES
// ============================================================================

/// Invent a syntactically valid address: `0x` plus 40 lowercase hex chars.
/// With 16^40 possibilities a collision with a real holder is negligible.
pub fn random_address<R: Rng>(rng: &mut R) -> HolderAddress {
    let mut addr = String::with_capacity(2 + ADDRESS_HEX_LEN);
    addr.push_str("0x");

    for _ in 0..ADDRESS_HEX_LEN {
        let c = HEX_CHARS[rng.gen_range(0..HEX_CHARS.len())] as char;
        addr.push(c);
    }

    addr
}

/// A batch of invented addresses for the zero-balance spot check
pub fn random_addresses<R: Rng>(rng: &mut R, n: usize) -> Vec<HolderAddress> {
    (0..n).map(|_| random_address(rng)).collect()
}

// ============================================================================
// TESTS
// ============================================================================

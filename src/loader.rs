// 📂 Loader - Static audit inputs
// Three files feed one audit run: the holder export, the siphon list and
// the expected post-migration balances. Any malformed line aborts the run.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// An account address on the ledger, kept exactly as read
pub type HolderAddress = String;

// ============================================================================
// SIPHON RECORD
// ============================================================================

/// One redistribution edge: `from_addr` on the legacy contract drains into
/// `to_addr` on the replacement contract.
///
/// The weight column is shared with the siphon deployer; no enabled check
/// consumes it, but a non-numeric weight still fails the load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Siphon {
    pub from_addr: HolderAddress,
    pub to_addr: HolderAddress,
    pub weight: f64,
}

impl Siphon {
    /// Parse one `<from> <weight> <to>` line
    pub fn parse(line: &str) -> Result<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();

        let [from, weight, to] = tokens.as_slice() else {
            bail!(
                "Expected 3 whitespace-separated fields, got {}: {:?}",
                tokens.len(),
                line
            );
        };

        let weight: f64 = weight
            .parse()
            .with_context(|| format!("Non-numeric siphon weight: {:?}", weight))?;

        Ok(Siphon {
            from_addr: (*from).to_string(),
            to_addr: (*to).to_string(),
            weight,
        })
    }
}

// ============================================================================
// HOLDER EXPORT (CSV)
// ============================================================================

/// Read holder addresses from an Etherscan-style CSV export.
///
/// Header row is skipped by the reader; only the first column is consumed.
/// Order is preserved and duplicate rows are kept as-is.
pub fn load_holders_from<R: Read>(reader: R) -> Result<Vec<HolderAddress>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut holders = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Bad CSV record at row {}", index + 2))?;

        let Some(addr) = record.get(0) else {
            bail!("Empty CSV record at row {}", index + 2);
        };

        holders.push(addr.to_string());
    }

    Ok(holders)
}

pub fn load_holders<P: AsRef<Path>>(path: P) -> Result<Vec<HolderAddress>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open holders file: {:?}", path.as_ref()))?;

    load_holders_from(file)
}

// ============================================================================
// SIPHON LIST (TEXT)
// ============================================================================

/// Read the siphon list, one `<from> <weight> <to>` edge per line.
/// Blank lines are skipped; anything else malformed is fatal.
pub fn load_siphons_from<R: Read>(reader: R) -> Result<Vec<Siphon>> {
    let mut siphons = Vec::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read siphon list line {}", index + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let siphon = Siphon::parse(&line)
            .with_context(|| format!("Bad siphon list line {}", index + 1))?;
        siphons.push(siphon);
    }

    Ok(siphons)
}

pub fn load_siphons<P: AsRef<Path>>(path: P) -> Result<Vec<Siphon>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open siphon list: {:?}", path.as_ref()))?;

    load_siphons_from(file)
}

// ============================================================================
// EXPECTED RESULTS (TEXT)
// ============================================================================

/// Read expected post-migration balances, one `<address> <balance>` pair
/// per line. Balances are whole tokens; the tolerance check scales them to
/// smallest-denomination units.
pub fn load_expected_results_from<R: Read>(reader: R) -> Result<BTreeMap<HolderAddress, f64>> {
    let mut expected = BTreeMap::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line =
            line.with_context(|| format!("Failed to read expected results line {}", index + 1))?;

        if line.trim().is_empty() {
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();

        let [addr, balance] = tokens.as_slice() else {
            bail!(
                "Bad expected results line {}: expected 2 fields, got {}",
                index + 1,
                tokens.len()
            );
        };

        let balance: f64 = balance.parse().with_context(|| {
            format!("Non-numeric expected balance on line {}: {:?}", index + 1, balance)
        })?;

        expected.insert(addr.to_string(), balance);
    }

    Ok(expected)
}

pub fn load_expected_results<P: AsRef<Path>>(path: P) -> Result<BTreeMap<HolderAddress, f64>> {
    let file = File::open(path.as_ref())
        .with_context(|| format!("Failed to open expected results: {:?}", path.as_ref()))?;

    load_expected_results_from(file)
}

// ============================================================================
// TESTS
// ============================================================================

// ⚖️ Balance Checks - The audit assertions
// Each check walks its address list sequentially, one oracle call at a
// time, and collects every violation instead of stopping at the first.
// Oracle errors are still immediately fatal.

use crate::loader::HolderAddress;
use crate::oracle::BalanceOracle;
use crate::report::ProgressDots;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

/// Smallest-denomination units per milli-token (10^15); the expected
/// results file carries whole tokens at 18 decimals
const WEI_PER_MILLITOKEN: i128 = 1_000_000_000_000_000;

// ============================================================================
// CHECK KINDS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckKind {
    SiphonSourcesZeroed,
    UnchangedSample,
    RandomZero,
    ExpectedResults,
}

impl CheckKind {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::SiphonSourcesZeroed => "siphon sources zeroed",
            CheckKind::UnchangedSample => "unchanged holder sample",
            CheckKind::RandomZero => "random addresses zero",
            CheckKind::ExpectedResults => "expected siphon results",
        }
    }
}

// ============================================================================
// VIOLATION
// ============================================================================

/// One failed balance assertion, carrying enough to act on: which check,
/// which address, what was expected and what the chain reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub check: CheckKind,
    pub address: HolderAddress,
    pub expected: String,
    pub actual: u128,
}

impl Violation {
    pub fn summary(&self) -> String {
        format!(
            "[{}] {}: expected {}, got {}",
            self.check.name(),
            self.address,
            self.expected,
            self.actual
        )
    }
}

/// Outcome of one executed check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckRun {
    pub check: CheckKind,
    pub addresses_checked: usize,
    pub violations: Vec<Violation>,
}

impl CheckRun {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

// ============================================================================
// CHECKS
// ============================================================================

/// Every siphon source must hold nothing on the replacement contract: the
/// migration moved those balances to new addresses, so anything left
/// behind means the siphon did not fire.
pub fn check_siphon_sources_zeroed<W: Write>(
    sources: &BTreeSet<HolderAddress>,
    new_contract: &str,
    oracle: &dyn BalanceOracle,
    progress: &mut ProgressDots<W>,
) -> Result<CheckRun> {
    let mut violations = Vec::new();

    for addr in sources {
        let actual = oracle
            .balance(new_contract, addr)
            .with_context(|| format!("Zero check failed to query {}", addr))?;
        progress.tick()?;

        if actual != 0 {
            violations.push(Violation {
                check: CheckKind::SiphonSourcesZeroed,
                address: addr.clone(),
                expected: "0".to_string(),
                actual,
            });
        }
    }

    Ok(CheckRun {
        check: CheckKind::SiphonSourcesZeroed,
        addresses_checked: sources.len(),
        violations,
    })
}

/// Sampled untouched holders must report the same balance on both
/// contracts.
pub fn check_unchanged_sample<W: Write>(
    sample: &[HolderAddress],
    old_contract: &str,
    new_contract: &str,
    oracle: &dyn BalanceOracle,
    progress: &mut ProgressDots<W>,
) -> Result<CheckRun> {
    let mut violations = Vec::new();

    for addr in sample {
        let old = oracle
            .balance(old_contract, addr)
            .with_context(|| format!("Unchanged check failed to query {} (legacy)", addr))?;
        let new = oracle
            .balance(new_contract, addr)
            .with_context(|| format!("Unchanged check failed to query {} (replacement)", addr))?;
        progress.tick()?;

        if old != new {
            violations.push(Violation {
                check: CheckKind::UnchangedSample,
                address: addr.clone(),
                expected: format!("{} (legacy-contract balance)", old),
                actual: new,
            });
        }
    }

    Ok(CheckRun {
        check: CheckKind::UnchangedSample,
        addresses_checked: sample.len(),
        violations,
    })
}

/// Freshly invented addresses must hold nothing on the replacement
/// contract.
pub fn check_random_zero<W: Write>(
    addresses: &[HolderAddress],
    new_contract: &str,
    oracle: &dyn BalanceOracle,
    progress: &mut ProgressDots<W>,
) -> Result<CheckRun> {
    let mut violations = Vec::new();

    for addr in addresses {
        let actual = oracle
            .balance(new_contract, addr)
            .with_context(|| format!("Random zero check failed to query {}", addr))?;
        progress.tick()?;

        if actual != 0 {
            violations.push(Violation {
                check: CheckKind::RandomZero,
                address: addr.clone(),
                expected: "0".to_string(),
                actual,
            });
        }
    }

    Ok(CheckRun {
        check: CheckKind::RandomZero,
        addresses_checked: addresses.len(),
        violations,
    })
}

/// Tolerance band around an expected whole-token balance, in
/// smallest-denomination units.
///
/// The expected value is truncated to milli-token precision and widened by
/// one milli-token on each side; the actual balance must fall strictly
/// inside. Integer scaling sidesteps float comparison at 18 decimals.
pub fn tolerance_band(expected_tokens: f64) -> (i128, i128) {
    let lower = (expected_tokens * 1e3 - 1.0).trunc() as i128 * WEI_PER_MILLITOKEN;
    let upper = (expected_tokens * 1e3 + 1.0).trunc() as i128 * WEI_PER_MILLITOKEN;
    (lower, upper)
}

/// Siphon destinations must land within tolerance of the pre-computed
/// expected results.
pub fn check_expected_results<W: Write>(
    expected: &BTreeMap<HolderAddress, f64>,
    new_contract: &str,
    oracle: &dyn BalanceOracle,
    progress: &mut ProgressDots<W>,
) -> Result<CheckRun> {
    let mut violations = Vec::new();

    for (addr, expected_tokens) in expected {
        let actual = oracle
            .balance(new_contract, addr)
            .with_context(|| format!("Expected results check failed to query {}", addr))?;
        progress.tick()?;

        let (lower, upper) = tolerance_band(*expected_tokens);
        let actual_signed = actual as i128;

        if actual_signed <= lower || actual_signed >= upper {
            violations.push(Violation {
                check: CheckKind::ExpectedResults,
                address: addr.clone(),
                expected: format!("within ({}, {})", lower, upper),
                actual,
            });
        }
    }

    Ok(CheckRun {
        check: CheckKind::ExpectedResults,
        addresses_checked: expected.len(),
        violations,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::ScriptedOracle;

    const OLD: &str = "0xold";
    const NEW: &str = "0xnew";

    fn sources(addrs: &[&str]) -> BTreeSet<HolderAddress> {
        addrs.iter().map(|a| a.to_string()).collect()
    }

    #[test]
    fn test_siphon_sources_zeroed_passes() {
        let oracle = ScriptedOracle::new().with_balance(NEW, "0xa", 0);
        let mut progress = ProgressDots::sink();

        let run =
            check_siphon_sources_zeroed(&sources(&["0xa"]), NEW, &oracle, &mut progress).unwrap();

        assert!(run.passed());
        assert_eq!(run.addresses_checked, 1);

        println!("✅ Zeroed sources pass test PASSED");
    }

    #[test]
    fn test_siphon_sources_zeroed_flags_leftover_balance() {
        let oracle = ScriptedOracle::new()
            .with_balance(NEW, "0xa", 5)
            .with_balance(NEW, "0xb", 0);
        let mut progress = ProgressDots::sink();

        let run = check_siphon_sources_zeroed(&sources(&["0xa", "0xb"]), NEW, &oracle, &mut progress)
            .unwrap();

        assert!(!run.passed());
        assert_eq!(run.addresses_checked, 2);
        assert_eq!(run.violations.len(), 1);

        // The violation names the failing address and both balances
        let violation = &run.violations[0];
        assert_eq!(violation.address, "0xa");
        assert_eq!(violation.actual, 5);
        assert!(violation.summary().contains("0xa"));
        assert!(violation.summary().contains("expected 0"));

        println!("✅ Leftover balance violation test PASSED");
    }

    #[test]
    fn test_check_collects_all_violations() {
        // Both sources are dirty; the run reports both, not just the first
        let oracle = ScriptedOracle::new()
            .with_balance(NEW, "0xa", 1)
            .with_balance(NEW, "0xb", 2);
        let mut progress = ProgressDots::sink();

        let run = check_siphon_sources_zeroed(&sources(&["0xa", "0xb"]), NEW, &oracle, &mut progress)
            .unwrap();

        assert_eq!(run.violations.len(), 2);
    }

    #[test]
    fn test_unchanged_sample() {
        let oracle = ScriptedOracle::new()
            .with_balance(OLD, "0xa", 100)
            .with_balance(NEW, "0xa", 100)
            .with_balance(OLD, "0xb", 100)
            .with_balance(NEW, "0xb", 90);
        let mut progress = ProgressDots::sink();

        let sample = vec!["0xa".to_string(), "0xb".to_string()];
        let run = check_unchanged_sample(&sample, OLD, NEW, &oracle, &mut progress).unwrap();

        assert_eq!(run.violations.len(), 1);
        assert_eq!(run.violations[0].address, "0xb");
        assert_eq!(run.violations[0].actual, 90);
    }

    #[test]
    fn test_random_zero() {
        let oracle = ScriptedOracle::new().with_balance(NEW, "0xbad", 7);
        let mut progress = ProgressDots::sink();

        let addrs = vec!["0xfresh".to_string(), "0xbad".to_string()];
        let run = check_random_zero(&addrs, NEW, &oracle, &mut progress).unwrap();

        assert_eq!(run.addresses_checked, 2);
        assert_eq!(run.violations.len(), 1);
        assert_eq!(run.violations[0].address, "0xbad");
    }

    #[test]
    fn test_tolerance_band() {
        // 1500 tokens -> (1_499_999, 1_500_001) milli-tokens scaled by 1e15
        let (lower, upper) = tolerance_band(1500.0);

        assert_eq!(lower, 1_499_999 * WEI_PER_MILLITOKEN);
        assert_eq!(upper, 1_500_001 * WEI_PER_MILLITOKEN);
    }

    #[test]
    fn test_expected_results_band_is_strict() {
        let expected: BTreeMap<HolderAddress, f64> = [("0xa".to_string(), 1500.0)].into();
        let (lower, upper) = tolerance_band(1500.0);

        // Exactly on either bound fails; one unit inside passes
        for (balance, ok) in [
            (lower as u128, false),
            (lower as u128 + 1, true),
            (1500 * 10u128.pow(18), true),
            (upper as u128 - 1, true),
            (upper as u128, false),
        ] {
            let oracle = ScriptedOracle::new().with_balance(NEW, "0xa", balance);
            let mut progress = ProgressDots::sink();

            let run = check_expected_results(&expected, NEW, &oracle, &mut progress).unwrap();
            assert_eq!(run.passed(), ok, "balance {} should pass={}", balance, ok);
        }

        println!("✅ Tolerance band strictness test PASSED");
    }

    #[test]
    fn test_checks_emit_one_dot_per_address() {
        let oracle = ScriptedOracle::new();
        let mut buf = Vec::new();
        let mut progress = ProgressDots::new(&mut buf);

        check_siphon_sources_zeroed(&sources(&["0xa", "0xb", "0xc"]), NEW, &oracle, &mut progress)
            .unwrap();

        assert_eq!(buf, b"...");
    }
}

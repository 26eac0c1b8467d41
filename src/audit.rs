// 🔍 Audit Engine - One linear pass over the migration
// Load the three inputs once into an immutable context, run the enabled
// checks in a fixed order, then total up both sides of the siphon.

use crate::checks::{
    check_expected_results, check_random_zero, check_siphon_sources_zeroed,
    check_unchanged_sample, CheckRun,
};
use crate::config::AuditConfig;
use crate::loader::{
    load_expected_results, load_holders, load_siphons, HolderAddress, Siphon,
};
use crate::oracle::BalanceOracle;
use crate::partition::{random_addresses, HolderPartition};
use crate::report::{AuditReport, BalanceTotals, ProgressDots};
use anyhow::{Context, Result};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::io::Write;

// ============================================================================
// AUDIT CONTEXT
// ============================================================================

/// Everything one audit run reads from disk, loaded once and never
/// mutated. Checks receive this instead of reaching for globals.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub holders: Vec<HolderAddress>,
    pub siphons: Vec<Siphon>,
    pub expected: BTreeMap<HolderAddress, f64>,
    pub partition: HolderPartition,
}

impl AuditContext {
    pub fn new(
        holders: Vec<HolderAddress>,
        siphons: Vec<Siphon>,
        expected: BTreeMap<HolderAddress, f64>,
    ) -> Self {
        let partition = HolderPartition::compute(&holders, &siphons);

        AuditContext {
            holders,
            siphons,
            expected,
            partition,
        }
    }
}

// ============================================================================
// AUDIT ENGINE
// ============================================================================

pub struct AuditEngine {
    pub config: AuditConfig,
}

impl AuditEngine {
    pub fn new(config: AuditConfig) -> Self {
        AuditEngine { config }
    }

    /// Load and partition the three input files
    pub fn load_context(&self) -> Result<AuditContext> {
        let holders = load_holders(&self.config.holders_file)
            .context("Failed to load holder export")?;
        let siphons =
            load_siphons(&self.config.siphons_file).context("Failed to load siphon list")?;
        let expected = load_expected_results(&self.config.expected_file)
            .context("Failed to load expected results")?;

        Ok(AuditContext::new(holders, siphons, expected))
    }

    /// Run every enabled check in a fixed order, then compute the
    /// aggregate totals. Strictly sequential: one oracle call at a time.
    pub fn run<W: Write>(
        &self,
        ctx: &AuditContext,
        oracle: &dyn BalanceOracle,
        progress: &mut ProgressDots<W>,
    ) -> Result<AuditReport> {
        let mut rng = match self.config.sample_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut checks: Vec<CheckRun> = Vec::new();

        if self.config.checks.unchanged_sample {
            let sample = ctx
                .partition
                .sample_normal_holders(&mut rng, self.config.normal_sample_size);

            progress.section("Checking equality of some random holder balances")?;
            checks.push(check_unchanged_sample(
                &sample,
                &self.config.old_contract,
                &self.config.new_contract,
                oracle,
                progress,
            )?);
            progress.finish()?;
        }

        if self.config.checks.random_zero {
            let invented = random_addresses(&mut rng, self.config.random_address_count);

            progress.section("Checking some zero balances, for good measure")?;
            checks.push(check_random_zero(
                &invented,
                &self.config.new_contract,
                oracle,
                progress,
            )?);
            progress.finish()?;
        }

        if self.config.checks.siphon_sources_zeroed {
            progress.section("Checking zeroing of siphon sources")?;
            checks.push(check_siphon_sources_zeroed(
                &ctx.partition.sources,
                &self.config.new_contract,
                oracle,
                progress,
            )?);
            progress.finish()?;
        }

        if self.config.checks.expected_results {
            progress.section("Checking expected resulting balances on siphoned addresses")?;
            checks.push(check_expected_results(
                &ctx.expected,
                &self.config.new_contract,
                oracle,
                progress,
            )?);
            progress.finish()?;
        }

        progress.line("Computing change in sum of balances, this can take a while...")?;
        let totals = self.compute_totals(ctx, oracle)?;

        Ok(AuditReport {
            normal_holders: ctx.partition.normal_count(),
            siphon_sources: ctx.partition.source_count(),
            siphon_destinations: ctx.partition.destination_count(),
            checks,
            totals,
            audited_at: Utc::now(),
        })
    }

    /// Old side: siphon sources plus the extra legacy holder, on the old
    /// contract. New side: siphon destinations on the new contract.
    fn compute_totals(&self, ctx: &AuditContext, oracle: &dyn BalanceOracle) -> Result<BalanceTotals> {
        let mut old_total: u128 = 0;
        for addr in &ctx.partition.sources {
            old_total += oracle
                .balance(&self.config.old_contract, addr)
                .with_context(|| format!("Old-side total failed to query {}", addr))?;
        }
        old_total += oracle
            .balance(&self.config.old_contract, &self.config.extra_legacy_holder)
            .context("Old-side total failed to query the extra legacy holder")?;

        let mut new_total: u128 = 0;
        for addr in &ctx.partition.destinations {
            new_total += oracle
                .balance(&self.config.new_contract, addr)
                .with_context(|| format!("New-side total failed to query {}", addr))?;
        }

        Ok(BalanceTotals {
            old_total,
            new_total,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::CheckKind;
    use crate::oracle::ScriptedOracle;

    fn test_config() -> AuditConfig {
        AuditConfig {
            old_contract: "0xold".to_string(),
            new_contract: "0xnew".to_string(),
            extra_legacy_holder: "0xextra".to_string(),
            sample_seed: Some(1),
            ..AuditConfig::default()
        }
    }

    fn test_context() -> AuditContext {
        // Holders [A, B, C], one siphon A -> X
        AuditContext::new(
            vec!["0xa".to_string(), "0xb".to_string(), "0xc".to_string()],
            vec![Siphon {
                from_addr: "0xa".to_string(),
                to_addr: "0xx".to_string(),
                weight: 1.0,
            }],
            BTreeMap::new(),
        )
    }

    #[test]
    fn test_engine_clean_migration() {
        // Source zeroed on the new contract; totals line up with a
        // difference of 10: old side 100 + 50 extra, new side 140
        let oracle = ScriptedOracle::new()
            .with_balance("0xnew", "0xa", 0)
            .with_balance("0xold", "0xa", 100)
            .with_balance("0xold", "0xextra", 50)
            .with_balance("0xnew", "0xx", 140);

        let engine = AuditEngine::new(test_config());
        let mut progress = ProgressDots::sink();

        let report = engine.run(&test_context(), &oracle, &mut progress).unwrap();

        assert!(report.passed());
        assert_eq!(report.normal_holders, 2);
        assert_eq!(report.siphon_sources, 1);
        assert_eq!(report.siphon_destinations, 1);
        assert_eq!(report.totals.old_total, 150);
        assert_eq!(report.totals.new_total, 140);
        assert_eq!(report.totals.difference(), 10);

        println!("✅ Clean migration test PASSED");
    }

    #[test]
    fn test_engine_flags_unzeroed_source() {
        let oracle = ScriptedOracle::new().with_balance("0xnew", "0xa", 5);

        let engine = AuditEngine::new(test_config());
        let mut progress = ProgressDots::sink();

        let report = engine.run(&test_context(), &oracle, &mut progress).unwrap();

        assert!(!report.passed());
        let violations = report.violations();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].check, CheckKind::SiphonSourcesZeroed);
        assert_eq!(violations[0].address, "0xa");
        assert_eq!(violations[0].actual, 5);
    }

    #[test]
    fn test_engine_runs_only_enabled_checks() {
        let mut config = test_config();
        config.checks.siphon_sources_zeroed = false;
        config.checks.random_zero = true;

        let oracle = ScriptedOracle::new();
        let engine = AuditEngine::new(config);
        let mut progress = ProgressDots::sink();

        let report = engine.run(&test_context(), &oracle, &mut progress).unwrap();

        assert_eq!(report.checks.len(), 1);
        assert_eq!(report.checks[0].check, CheckKind::RandomZero);
        assert_eq!(report.checks[0].addresses_checked, 5);
    }

    #[test]
    fn test_engine_all_checks_enabled() {
        let mut config = test_config();
        config.checks.unchanged_sample = true;
        config.checks.random_zero = true;
        config.checks.expected_results = true;
        config.normal_sample_size = 10;

        let mut ctx = test_context();
        ctx.expected.insert("0xx".to_string(), 140e-18); // 140 wei as tokens

        // Untouched holders hold the same on both contracts
        let oracle = ScriptedOracle::new()
            .with_balance("0xold", "0xb", 7)
            .with_balance("0xnew", "0xb", 7)
            .with_balance("0xold", "0xc", 9)
            .with_balance("0xnew", "0xc", 9)
            .with_balance("0xold", "0xa", 100)
            .with_balance("0xnew", "0xx", 140);

        let engine = AuditEngine::new(config);
        let mut progress = ProgressDots::sink();

        let report = engine.run(&ctx, &oracle, &mut progress).unwrap();

        // Fixed order: unchanged, random zero, source zeroing, expected
        let kinds: Vec<CheckKind> = report.checks.iter().map(|run| run.check).collect();
        assert_eq!(
            kinds,
            vec![
                CheckKind::UnchangedSample,
                CheckKind::RandomZero,
                CheckKind::SiphonSourcesZeroed,
                CheckKind::ExpectedResults,
            ]
        );

        println!("✅ All checks enabled test PASSED");
    }

    #[test]
    fn test_engine_progress_output() {
        let oracle = ScriptedOracle::new();
        let engine = AuditEngine::new(test_config());

        let mut buf = Vec::new();
        let mut progress = ProgressDots::new(&mut buf);
        engine.run(&test_context(), &oracle, &mut progress).unwrap();

        let output = String::from_utf8(buf).unwrap();
        assert!(output.starts_with("Checking zeroing of siphon sources."));
        assert!(output.contains("Computing change in sum of balances"));
    }

    #[test]
    fn test_engine_sampling_reproducible_with_seed() {
        let mut config = test_config();
        config.checks.siphon_sources_zeroed = false;
        config.checks.unchanged_sample = true;

        // A violation on every sampled holder exposes the sample content
        let oracle = ScriptedOracle::new()
            .with_balance("0xold", "0xb", 1)
            .with_balance("0xold", "0xc", 2);

        let engine = AuditEngine::new(config);
        let ctx = test_context();

        let first = engine
            .run(&ctx, &oracle, &mut ProgressDots::sink())
            .unwrap();
        let second = engine
            .run(&ctx, &oracle, &mut ProgressDots::sink())
            .unwrap();

        let addrs = |report: &AuditReport| -> Vec<HolderAddress> {
            report
                .violations()
                .iter()
                .map(|v| v.address.clone())
                .collect()
        };

        assert_eq!(addrs(&first), addrs(&second));
    }
}

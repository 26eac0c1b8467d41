// 📊 Audit Report - Progress streaming and aggregates
// A human watches this run against a slow RPC tool: progress must stream
// one flushed dot per processed address, and the final report carries the
// counts, totals and every violation found.

use crate::checks::{CheckRun, Violation};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

// ============================================================================
// PROGRESS DOTS
// ============================================================================

/// Streams check progress to the wrapped writer, flushing after every
/// write so a slow external call never leaves the line stale.
pub struct ProgressDots<W: Write> {
    out: W,
}

impl ProgressDots<io::Stdout> {
    pub fn stdout() -> Self {
        ProgressDots { out: io::stdout() }
    }
}

impl ProgressDots<io::Sink> {
    /// Discards all progress output (tests, scripted runs)
    pub fn sink() -> Self {
        ProgressDots { out: io::sink() }
    }
}

impl<W: Write> ProgressDots<W> {
    pub fn new(out: W) -> Self {
        ProgressDots { out }
    }

    /// Start a check section: label without a trailing newline, dots follow
    pub fn section(&mut self, label: &str) -> Result<()> {
        write!(self.out, "{}", label)?;
        self.out.flush()?;
        Ok(())
    }

    /// One processed address
    pub fn tick(&mut self) -> Result<()> {
        write!(self.out, ".")?;
        self.out.flush()?;
        Ok(())
    }

    /// End the current dotted line
    pub fn finish(&mut self) -> Result<()> {
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    /// A full standalone line
    pub fn line(&mut self, message: &str) -> Result<()> {
        writeln!(self.out, "{}", message)?;
        self.out.flush()?;
        Ok(())
    }
}

// ============================================================================
// BALANCE TOTALS
// ============================================================================

/// Aggregate movement across the migration: everything the siphon sources
/// (plus the extra legacy holder) held on the old contract against
/// everything the destinations hold on the new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceTotals {
    pub old_total: u128,
    pub new_total: u128,
}

impl BalanceTotals {
    /// Signed old-minus-new difference; 0 means the migration conserved
    /// the siphoned supply exactly
    pub fn difference(&self) -> i128 {
        self.old_total as i128 - self.new_total as i128
    }
}

// ============================================================================
// AUDIT REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    /// Holders untouched by any siphon
    pub normal_holders: usize,

    /// Legacy addresses with reduced balances
    pub siphon_sources: usize,

    /// New addresses with increased balances
    pub siphon_destinations: usize,

    /// One entry per enabled check, in execution order
    pub checks: Vec<CheckRun>,

    pub totals: BalanceTotals,

    pub audited_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|run| run.passed())
    }

    /// Every violation across all checks, in execution order
    pub fn violations(&self) -> Vec<&Violation> {
        self.checks
            .iter()
            .flat_map(|run| run.violations.iter())
            .collect()
    }

    pub fn summary(&self) -> String {
        let checked: usize = self.checks.iter().map(|run| run.addresses_checked).sum();

        format!(
            "Audit: {} checks over {} addresses, {} violation(s); old total {}, new total {}, difference {}",
            self.checks.len(),
            checked,
            self.violations().len(),
            self.totals.old_total,
            self.totals.new_total,
            self.totals.difference()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

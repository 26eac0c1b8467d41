// Siphon Audit - Core Library
// Verifies a one-time token migration: balances move off the legacy
// contract onto the replacement contract per the pre-computed siphon list.

pub mod audit;
pub mod checks;
pub mod config;
pub mod loader;
pub mod oracle;
pub mod partition;
pub mod report;

// Re-export commonly used types
pub use audit::{AuditContext, AuditEngine};
pub use checks::{
    check_expected_results, check_random_zero, check_siphon_sources_zeroed,
    check_unchanged_sample, tolerance_band, CheckKind, CheckRun, Violation,
};
pub use config::{AuditConfig, CheckToggles, EXTRA_LEGACY_HOLDER, NEW_TOKEN, OLD_TOKEN};
pub use loader::{
    load_expected_results, load_holders, load_siphons, HolderAddress, Siphon,
};
pub use oracle::{BalanceOracle, CommandOracle, ScriptedOracle};
pub use partition::{random_address, random_addresses, HolderPartition};
pub use report::{AuditReport, BalanceTotals, ProgressDots};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 🔮 Balance Oracle - External balance lookups
// One narrow seam between the audit and the chain: a blocking
// `(contract, holder) -> integer balance` query.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::process::Command;

// ============================================================================
// ORACLE TRAIT
// ============================================================================

/// Balance lookup in smallest-denomination units.
///
/// Implementations are synchronous and called strictly one at a time; the
/// query tool behind the real implementation is a thin, rate-limited RPC
/// client and must not be hammered.
pub trait BalanceOracle {
    fn balance(&self, contract: &str, holder: &str) -> Result<u128>;
}

// ============================================================================
// COMMAND ORACLE
// ============================================================================

/// Shells out to a blockchain query tool, one invocation per lookup:
///
/// `<command> call <contract> balanceOf(address)(uint) <holder>`
///
/// stdout is trimmed and parsed as the integer balance. Any spawn failure,
/// non-zero exit or unparseable output is fatal; there is no retry and no
/// timeout, so a hung tool hangs the audit.
pub struct CommandOracle {
    command: String,
}

impl CommandOracle {
    pub fn new(command: &str) -> Self {
        CommandOracle {
            command: command.to_string(),
        }
    }
}

impl BalanceOracle for CommandOracle {
    fn balance(&self, contract: &str, holder: &str) -> Result<u128> {
        let output = Command::new(&self.command)
            .args(["call", contract, "balanceOf(address)(uint)", holder])
            .output()
            .with_context(|| format!("Failed to run balance query tool {:?}", self.command))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Balance query failed (exit {}) for {} on {}: {}",
                output.status.code().unwrap_or(-1),
                holder,
                contract,
                stderr.trim()
            );
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let balance = stdout.trim().parse::<u128>().with_context(|| {
            format!(
                "Unparseable balance for {} on {}: {:?}",
                holder,
                contract,
                stdout.trim()
            )
        })?;

        Ok(balance)
    }
}

// ============================================================================
// SCRIPTED ORACLE
// ============================================================================

/// In-memory oracle with scripted responses, for tests and dry runs.
///
/// Unknown `(contract, holder)` pairs return 0, matching what the chain
/// reports for an address a contract has never touched.
#[derive(Debug, Default, Clone)]
pub struct ScriptedOracle {
    balances: HashMap<(String, String), u128>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        ScriptedOracle::default()
    }

    pub fn with_balance(mut self, contract: &str, holder: &str, amount: u128) -> Self {
        self.set_balance(contract, holder, amount);
        self
    }

    pub fn set_balance(&mut self, contract: &str, holder: &str, amount: u128) {
        self.balances
            .insert((contract.to_string(), holder.to_string()), amount);
    }
}

impl BalanceOracle for ScriptedOracle {
    fn balance(&self, contract: &str, holder: &str) -> Result<u128> {
        Ok(self
            .balances
            .get(&(contract.to_string(), holder.to_string()))
            .copied()
            .unwrap_or(0))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_oracle_returns_scripted_balance() {
        let oracle = ScriptedOracle::new()
            .with_balance("0xold", "0xa", 100)
            .with_balance("0xnew", "0xa", 0);

        assert_eq!(oracle.balance("0xold", "0xa").unwrap(), 100);
        assert_eq!(oracle.balance("0xnew", "0xa").unwrap(), 0);
    }

    #[test]
    fn test_scripted_oracle_unknown_pair_is_zero() {
        let oracle = ScriptedOracle::new();

        assert_eq!(oracle.balance("0xnew", "0xnever-seen").unwrap(), 0);
    }

    #[test]
    fn test_command_oracle_missing_tool() {
        let oracle = CommandOracle::new("definitely-not-a-real-query-tool");

        let err = oracle.balance("0xold", "0xa").unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to run balance query tool"));

        println!("✅ Missing tool test PASSED");
    }

    #[test]
    fn test_command_oracle_unparseable_output() {
        // `echo` succeeds but prints the call args back, which is not a number
        let oracle = CommandOracle::new("echo");

        let err = oracle.balance("0xold", "0xa").unwrap_err();
        assert!(format!("{:#}", err).contains("Unparseable balance"));
        assert!(format!("{:#}", err).contains("0xa"));

        println!("✅ Unparseable output test PASSED");
    }

    #[test]
    fn test_command_oracle_failing_tool() {
        // `false` exits non-zero with no output
        let oracle = CommandOracle::new("false");

        let err = oracle.balance("0xold", "0xa").unwrap_err();
        assert!(err.to_string().contains("Balance query failed"));
    }
}

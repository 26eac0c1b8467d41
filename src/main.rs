use anyhow::{bail, Context, Result};
use std::env;
use std::fs;
use std::path::Path;

use siphon_audit::{AuditConfig, AuditEngine, CommandOracle, ProgressDots};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<String> = None;
    let mut json_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--json" => {
                i += 1;
                let path = args.get(i).context("--json requires a file path")?;
                json_path = Some(path.clone());
            }
            "--help" | "-h" => {
                print_usage();
                return Ok(());
            }
            other if config_path.is_none() => config_path = Some(other.to_string()),
            other => bail!("Unexpected argument: {}", other),
        }
        i += 1;
    }

    let config = match &config_path {
        Some(path) => AuditConfig::from_file(path)?,
        None => AuditConfig::default(),
    };

    run_audit(config, json_path.as_deref())
}

fn print_usage() {
    println!("Usage: siphon-audit [CONFIG.json] [--json REPORT.json]");
    println!();
    println!("Verifies a token migration against the siphon list: loads the");
    println!("holder export, siphon list and expected results named in the");
    println!("config (or the defaults), queries balances one address at a");
    println!("time, and prints the aggregate movement.");
}

fn run_audit(config: AuditConfig, json_path: Option<&str>) -> Result<()> {
    println!("🔍 Token migration balance audit");
    println!("   legacy contract:      {}", config.old_contract);
    println!("   replacement contract: {}", config.new_contract);

    // 1. Load and partition inputs
    println!("\n📂 Loading audit inputs...");
    let engine = AuditEngine::new(config);
    let ctx = engine.load_context()?;

    println!(
        "Addresses with unchanged balances: {}",
        ctx.partition.normal_count()
    );
    println!(
        "Old addresses with reduced balances: {}",
        ctx.partition.source_count()
    );
    println!(
        "New addresses with increased balances: {}",
        ctx.partition.destination_count()
    );
    println!();

    // 2. Run the enabled checks against the chain, one call at a time
    let oracle = CommandOracle::new(&engine.config.oracle_command);
    let mut progress = ProgressDots::stdout();
    let report = engine.run(&ctx, &oracle, &mut progress)?;

    // 3. Aggregate movement
    println!(
        "Old balance from siphoned addresses: {}",
        report.totals.old_total
    );
    println!(
        "New balance in siphoned addresses: {}",
        report.totals.new_total
    );
    println!("Difference: {}", report.totals.difference());

    if let Some(path) = json_path {
        fs::write(Path::new(path), serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path))?;
        println!("✓ Wrote JSON report to {}", path);
    }

    // 4. Verdict
    if report.passed() {
        println!("\n✅ Audit passed: {}", report.summary());
        Ok(())
    } else {
        eprintln!("\n❌ Audit failed: {}", report.summary());
        for violation in report.violations() {
            eprintln!("   {}", violation.summary());
        }
        std::process::exit(1);
    }
}

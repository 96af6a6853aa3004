use super::config::{resolve_config_path, VaultConfig};
use super::logging;
use sigvault::clock::SystemClock;
use sigvault::ledger::MockLedger;
use sigvault::randomness::OsRandomness;
use sigvault::Vault;
use std::sync::Arc;

/// Validate a configuration file by building a vault from it
///
/// Parses the file, converts `[vault]` into init arguments and applies the
/// initialization rules. Nothing is persisted.
pub fn execute(config: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);
    let config = VaultConfig::load(&config_path)?;
    logging::init(&config.logging)?;

    let vault = build(&config)?;

    println!("Configuration OK: {}", config_path.display());
    println!("  Signers:   {}", vault.signer_count());
    println!("  Threshold: {}", vault.threshold());
    println!("  Account:   {}", vault.account());
    println!("  Fee:       {}", config.transfer_fee());
    Ok(())
}

/// Build the vault a configuration describes, with OS randomness and an
/// in-memory ledger credited with the configured balance.
pub fn build(
    config: &VaultConfig,
) -> Result<Vault<OsRandomness, MockLedger>, Box<dyn std::error::Error>> {
    let args = config.init_args()?;
    let ledger = MockLedger::new(args.account, config.transfer_fee());
    ledger.deposit(args.account, config.initial_balance());
    Ok(Vault::new(
        args,
        OsRandomness::new(),
        ledger,
        Arc::new(SystemClock),
    )?)
}

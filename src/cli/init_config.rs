use super::config::{resolve_config_path, ConfigError, VaultConfig};

/// Write a commented default configuration file
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn execute(config: Option<String>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = resolve_config_path(config);

    if config_path.exists() && !force {
        return Err(ConfigError::AlreadyExists(config_path).into());
    }

    VaultConfig::create_default(&config_path)?;
    println!("Created: {}", config_path.display());
    println!("Edit [vault] before running `sigvault check-config`.");
    Ok(())
}

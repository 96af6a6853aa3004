//! Sigvault configuration file handling
//!
//! Provides default configuration generation and loading for the operator CLI.
//! Configuration files are TOML and live under the user data directory unless
//! a path is given explicitly.
//!
//! ## Initial vs Governed Settings
//!
//! `[vault]` holds the INITIAL signer set and threshold only. Once a vault
//! exists (e.g. restored from a state snapshot) both are changed through
//! proposals, never by editing this file.

use serde::{Deserialize, Serialize};
use sigvault::ledger::{AccountId, AccountIdError, Tokens};
use sigvault::membership::{Principal, PrincipalError};
use sigvault::InitArgs;
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default ledger transfer fee (0.0001 ICP)
const DEFAULT_TRANSFER_FEE_E8S: u64 = 10_000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to write config file '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file '{0}' already exists (use --force to overwrite)")]
    AlreadyExists(PathBuf),

    #[error("Invalid signer '{value}': {source}")]
    InvalidSigner {
        value: String,
        source: PrincipalError,
    },

    #[error("Invalid vault account '{value}': {source}")]
    InvalidAccount {
        value: String,
        source: AccountIdError,
    },
}

/// Sigvault operator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Initial vault setup
    pub vault: VaultSection,

    /// In-memory ledger parameters
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial signers, threshold and controlled account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultSection {
    pub signers: Vec<String>,
    pub threshold: u32,
    /// Hex-encoded 32-byte ledger account
    pub account: String,
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Transfer fee in e8s
    #[serde(default = "default_transfer_fee")]
    pub transfer_fee: u64,

    /// Balance credited to the vault account at startup, in e8s
    #[serde(default)]
    pub initial_balance: u64,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_transfer_fee() -> u64 {
    DEFAULT_TRANSFER_FEE_E8S
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            transfer_fee: DEFAULT_TRANSFER_FEE_E8S,
            initial_balance: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl VaultConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse the initial setup into vault init arguments
    ///
    /// Only the textual forms are checked here; threshold rules are enforced
    /// when the vault is built.
    pub fn init_args(&self) -> Result<InitArgs, ConfigError> {
        let signers = self
            .vault
            .signers
            .iter()
            .map(|value| {
                Principal::new(value).map_err(|source| ConfigError::InvalidSigner {
                    value: value.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let account: AccountId =
            self.vault
                .account
                .parse()
                .map_err(|source| ConfigError::InvalidAccount {
                    value: self.vault.account.clone(),
                    source,
                })?;

        Ok(InitArgs {
            signers,
            threshold: self.vault.threshold,
            account,
        })
    }

    pub fn transfer_fee(&self) -> Tokens {
        Tokens::from_e8s(self.ledger.transfer_fee)
    }

    pub fn initial_balance(&self) -> Tokens {
        Tokens::from_e8s(self.ledger.initial_balance)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml() -> String {
        format!(
            r#"# Sigvault Configuration
#
# [vault] describes the INITIAL setup only. After the vault is running, the
# signer set and threshold change through proposals, not through this file.

[vault]
# Principals allowed to propose and vote
signers = ["alice", "bob", "carol"]

# Adopting votes needed to pass a proposal (1 <= threshold <= signers)
threshold = 2

# Ledger account controlled by the vault (64 hex chars)
account = "{account}"

[ledger]
# Transfer fee in e8s (1 ICP = 100000000 e8s)
transfer_fee = {fee}

# Balance credited to the vault account at startup, in e8s
initial_balance = 100000000

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG takes priority when set
level = "{level}"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/sigvault/sigvault.log"
"#,
            account = "11".repeat(32),
            fee = DEFAULT_TRANSFER_FEE_E8S,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml())
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let to_write_error = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(to_write_error)?;
    }
    fs::write(path, contents).map_err(to_write_error)
}

/// Get the default config file path
///
/// - Config: ~/.local/share/sigvault/config.toml
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sigvault")
        .join("config.toml")
}

/// Resolve `--config`, falling back to the default location
pub fn resolve_config_path(config: Option<String>) -> PathBuf {
    config.map(PathBuf::from).unwrap_or_else(default_config_path)
}

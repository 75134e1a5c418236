//! Configuration management for TallyChain

use crate::error::LedgerError;
use serde::Deserialize;
use std::fs;

/// Default configuration file read by the binaries.
pub const DEFAULT_CONFIG_PATH: &str = "tallychain.toml";

/// Hex digits in a SHA-256 fingerprint; difficulty cannot exceed this.
const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub mining: MiningConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Required count of leading zero hex digits in a mined block's hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Payout credited to whoever mines a block.
    #[serde(default = "default_mining_reward")]
    pub mining_reward: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            mining_reward: default_mining_reward(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MiningConfig {
    /// Abandon a nonce search after this many attempts. Unset means the
    /// search runs until it terminates.
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

fn default_difficulty() -> usize {
    2
}

fn default_mining_reward() -> u64 {
    100
}

/// Loads configuration from `path`, falling back to defaults when the file
/// is absent or empty.
pub fn load_config(path: &str) -> Result<Config, LedgerError> {
    let config_str = fs::read_to_string(path).unwrap_or_default();
    let config: Config = if config_str.is_empty() {
        Config::default()
    } else {
        toml::from_str(&config_str)
            .map_err(|e| LedgerError::ConfigError(format!("Failed to parse {}: {}", path, e)))?
    };

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), LedgerError> {
    if config.ledger.difficulty > MAX_DIFFICULTY {
        return Err(LedgerError::ConfigError(format!(
            "ledger.difficulty must be at most {}, got {}",
            MAX_DIFFICULTY, config.ledger.difficulty
        )));
    }
    if config.mining.max_attempts == Some(0) {
        return Err(LedgerError::ConfigError(
            "mining.max_attempts must be greater than zero when set".to_string(),
        ));
    }
    Ok(())
}

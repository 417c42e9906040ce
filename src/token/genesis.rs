//! Genesis configuration
//!
//! Supplies are given in whole tokens and scaled by `10^decimals` when the
//! ledger is built.

use super::error::TokenError;
use super::units::unit_scale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const DEFAULT_NAME: &str = "EVM Token";
pub const DEFAULT_SYMBOL: &str = "EVMT";
pub const DEFAULT_DECIMALS: u8 = 18;
/// Whole tokens credited to the deployer at genesis
pub const DEFAULT_INITIAL_SUPPLY: u128 = 1_000_000;
/// Whole-token supply cap
pub const DEFAULT_MAX_SUPPLY: u128 = 10_000_000;

/// Parameters for a new ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Whole tokens minted to the deployer
    pub initial_supply: u128,
    /// Whole-token cap on total supply
    pub max_supply: u128,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            symbol: DEFAULT_SYMBOL.to_string(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
            max_supply: DEFAULT_MAX_SUPPLY,
        }
    }
}

impl GenesisConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn raw_initial_supply(&self) -> Result<u128, TokenError> {
        self.to_raw(self.initial_supply, "initial supply")
    }

    pub fn raw_max_supply(&self) -> Result<u128, TokenError> {
        self.to_raw(self.max_supply, "max supply")
    }

    fn to_raw(&self, whole: u128, what: &str) -> Result<u128, TokenError> {
        unit_scale(self.decimals)
            .and_then(|scale| whole.checked_mul(scale))
            .ok_or_else(|| TokenError::InvalidSupply(format!("{} overflows raw units", what)))
    }

    /// Check supply bounds; metadata fields are validated by `TokenMetadata`
    pub fn validate_supply(&self) -> Result<(u128, u128), TokenError> {
        let max = self.raw_max_supply()?;
        let initial = self.raw_initial_supply()?;

        if max == 0 {
            return Err(TokenError::InvalidSupply(
                "max supply must be greater than 0".to_string(),
            ));
        }
        if initial > max {
            return Err(TokenError::InvalidSupply(format!(
                "initial supply {} exceeds max supply {}",
                self.initial_supply, self.max_supply
            )));
        }

        Ok((initial, max))
    }
}

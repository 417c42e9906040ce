//! Immutable token metadata

use super::error::TokenError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upper bound on decimal places
pub const MAX_DECIMALS: u8 = 18;

/// Display name, symbol and precision, fixed at genesis
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenMetadata {
    /// Token name (e.g., "EVM Token")
    pub name: String,
    /// Token symbol (e.g., "EVMT")
    pub symbol: String,
    /// Decimal places; one whole token is 10^decimals raw units
    pub decimals: u8,
    /// When the ledger was created
    pub created_at: DateTime<Utc>,
}

impl TokenMetadata {
    /// Create new token metadata with validation
    pub fn new(name: &str, symbol: &str, decimals: u8) -> Result<Self, TokenError> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > 50 {
            return Err(TokenError::InvalidName);
        }

        let symbol = symbol.trim();
        if symbol.is_empty() || symbol.chars().count() > 10 {
            return Err(TokenError::InvalidSymbol);
        }

        if decimals > MAX_DECIMALS {
            return Err(TokenError::InvalidDecimals);
        }

        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
            decimals,
            created_at: Utc::now(),
        })
    }
}

//! Fixed-width account addresses
//!
//! An [`Address`] is 20 opaque bytes, rendered as `0x` followed by 40
//! lowercase hex digits. The all-zero address is the null address and is
//! never a valid transfer, mint or approval target.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Address width in bytes
pub const ADDRESS_LENGTH: usize = 20;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length: expected {ADDRESS_LENGTH} bytes, got {0}")]
    InvalidLength(usize),
    #[error("Invalid hex in address: {0}")]
    InvalidHex(String),
}

/// A 20-byte account identifier
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The null address
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice, which must be exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != ADDRESS_LENGTH {
            return Err(AddressError::InvalidLength(bytes.len()));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        out.copy_from_slice(bytes);
        Ok(Self(out))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Shortened form for log lines, e.g. `0x1234…cdef`
    pub fn short(&self) -> String {
        let hex = hex::encode(self.0);
        format!("0x{}…{}", &hex[..4], &hex[hex.len() - 4..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts 40 hex digits with or without a `0x` prefix, in any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let bytes = hex::decode(digits).map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

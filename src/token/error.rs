use super::address::Address;
use thiserror::Error;

/// Ledger errors
///
/// Every variant is a local, recoverable rejection. A failed operation
/// leaves the ledger exactly as it was.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller {0} is not the owner")]
    NotOwner(Address),
    #[error("Caller {0} is not a minter")]
    NotMinter(Address),
    #[error("Invalid address: the null address is not allowed here")]
    InvalidAddress,
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u128, need: u128 },
    #[error("Insufficient allowance: have {have}, need {need}")]
    InsufficientAllowance { have: u128, need: u128 },
    #[error("Minting {requested} would exceed max supply ({remaining} remaining)")]
    SupplyExceeded { requested: u128, remaining: u128 },
    #[error("Ledger is paused")]
    Paused,
    #[error("Ledger is already paused")]
    AlreadyPaused,
    #[error("Ledger is not paused")]
    NotPaused,
    #[error("Allowance would overflow")]
    AllowanceOverflow,
    #[error("Invalid name: must be 1-50 characters")]
    InvalidName,
    #[error("Invalid symbol: must be 1-10 characters")]
    InvalidSymbol,
    #[error("Invalid decimals: must be 0-18")]
    InvalidDecimals,
    #[error("Invalid supply: {0}")]
    InvalidSupply(String),
    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

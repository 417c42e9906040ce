//! Token Ledger: a capped, pausable fungible token in Rust
//!
//! This crate provides a single-token ledger featuring:
//! - Balances, allowances and delegated transfers (ERC-20 style)
//! - Owner and minter roles with a hard supply cap
//! - A pause switch for value transfers
//! - secp256k1 account keys and signed calls
//! - JSON persistence with backups and invariant checks on load
//!
//! # Example
//!
//! ```rust
//! use token_ledger::token::{GenesisConfig, TokenLedger};
//! use token_ledger::wallet::Wallet;
//!
//! // The deployer owns the ledger and receives the initial supply
//! let owner = Wallet::new(Some("owner"));
//! let mut ledger = TokenLedger::new(&GenesisConfig::default(), owner.address()).unwrap();
//!
//! // Move one whole token to a second account
//! let alice = Wallet::new(Some("alice"));
//! let one = 10u128.pow(ledger.decimals() as u32);
//! ledger.transfer(&owner.address(), alice.address(), one).unwrap();
//!
//! assert_eq!(ledger.balance_of(&alice.address()), one);
//! ```

pub mod cli;
pub mod crypto;
pub mod storage;
pub mod token;
pub mod wallet;

// Re-export commonly used types
pub use crypto::KeyPair;
pub use storage::{Storage, StorageConfig};
pub use token::{
    Address, GenesisConfig, LedgerCall, LedgerEvent, SharedLedger, TokenError, TokenLedger,
};
pub use wallet::{SignedCall, Wallet, WalletManager};

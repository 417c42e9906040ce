//! Wallet module for account keys and call signing

pub mod wallet;

pub use wallet::{SignedCall, Wallet, WalletError, WalletInfo, WalletManager};

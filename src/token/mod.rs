//! Capped, pausable fungible token
//!
//! One [`TokenLedger`] holds balances, allowances, the owner and minter
//! roles, the supply cap and the pause switch. Operations take the
//! authenticated caller explicitly and either apply completely or return a
//! [`TokenError`] with the ledger untouched.
//!
//! # Example
//!
//! ```ignore
//! use token_ledger::token::{Address, GenesisConfig, TokenLedger};
//!
//! let owner: Address = "0x1111111111111111111111111111111111111111".parse()?;
//! let mut ledger = TokenLedger::new(&GenesisConfig::default(), owner)?;
//!
//! let recipient: Address = "0x2222222222222222222222222222222222222222".parse()?;
//! ledger.transfer(&owner, recipient, 1_000)?;
//! assert_eq!(ledger.balance_of(&recipient), 1_000);
//! ```

pub mod access;
pub mod address;
pub mod call;
pub mod error;
pub mod events;
pub mod genesis;
pub mod ledger;
pub mod metadata;
pub mod shared;
pub mod supply;
pub mod units;

pub use access::AccessControl;
pub use address::{Address, AddressError, ADDRESS_LENGTH};
pub use call::LedgerCall;
pub use error::TokenError;
pub use events::{EventRecord, LedgerEvent};
pub use genesis::GenesisConfig;
pub use ledger::{TokenLedger, HISTORY_LIMIT};
pub use metadata::TokenMetadata;
pub use shared::{ServiceError, SharedLedger};
pub use supply::SupplyPolicy;
pub use units::{format_units, parse_units, UnitsError};

//! Results of successful ledger mutations

use super::address::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a mutation applied
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: u128,
    },
    /// Delegated transfer; `remaining_allowance` is what `spender` may still move
    TransferFrom {
        spender: Address,
        from: Address,
        to: Address,
        amount: u128,
        remaining_allowance: u128,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: u128,
    },
    Mint {
        minter: Address,
        to: Address,
        amount: u128,
        total_supply: u128,
    },
    /// Self-burn when `burner == from`, otherwise burn through an allowance
    Burn {
        burner: Address,
        from: Address,
        amount: u128,
        total_supply: u128,
        remaining_allowance: Option<u128>,
    },
    OwnershipTransferred {
        previous_owner: Address,
        new_owner: Address,
    },
    /// `changed` is false when the call was a no-op
    MinterUpdated {
        account: Address,
        enabled: bool,
        changed: bool,
    },
    PauseChanged {
        paused: bool,
        by: Address,
    },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Transfer { from, to, amount } => {
                write!(f, "transfer {} from {} to {}", amount, from, to)
            }
            LedgerEvent::TransferFrom {
                spender,
                from,
                to,
                amount,
                remaining_allowance,
            } => write!(
                f,
                "transfer {} from {} to {} by {} (allowance left {})",
                amount, from, to, spender, remaining_allowance
            ),
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
            } => write!(f, "allowance {} -> {} set to {}", owner, spender, amount),
            LedgerEvent::Mint {
                to,
                amount,
                total_supply,
                ..
            } => write!(f, "mint {} to {} (supply {})", amount, to, total_supply),
            LedgerEvent::Burn {
                from,
                amount,
                total_supply,
                ..
            } => write!(f, "burn {} from {} (supply {})", amount, from, total_supply),
            LedgerEvent::OwnershipTransferred {
                previous_owner,
                new_owner,
            } => write!(f, "ownership {} -> {}", previous_owner, new_owner),
            LedgerEvent::MinterUpdated {
                account,
                enabled,
                changed,
            } => {
                let action = if *enabled { "added" } else { "removed" };
                if *changed {
                    write!(f, "minter {} {}", account, action)
                } else {
                    write!(f, "minter {} unchanged", account)
                }
            }
            LedgerEvent::PauseChanged { paused, by } => {
                let state = if *paused { "paused" } else { "unpaused" };
                write!(f, "{} by {}", state, by)
            }
        }
    }
}

/// A history entry
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventRecord {
    /// Position among all successful mutations since genesis, from 1
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: LedgerEvent,
}

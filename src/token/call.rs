//! Serializable form of every mutating ledger operation

use super::address::Address;
use super::error::TokenError;
use super::events::LedgerEvent;
use super::ledger::TokenLedger;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A mutation to apply on behalf of a caller. Amounts are raw units.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LedgerCall {
    Transfer { to: Address, amount: u128 },
    Approve { spender: Address, amount: u128 },
    IncreaseAllowance { spender: Address, amount: u128 },
    DecreaseAllowance { spender: Address, amount: u128 },
    TransferFrom { from: Address, to: Address, amount: u128 },
    Mint { to: Address, amount: u128 },
    Burn { amount: u128 },
    BurnFrom { owner: Address, amount: u128 },
    TransferOwnership { new_owner: Address },
    AddMinter { account: Address },
    RemoveMinter { account: Address },
    Pause,
    Unpause,
}

impl LedgerCall {
    /// Short operation name, as used in logs
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::Transfer { .. } => "transfer",
            LedgerCall::Approve { .. } => "approve",
            LedgerCall::IncreaseAllowance { .. } => "increase_allowance",
            LedgerCall::DecreaseAllowance { .. } => "decrease_allowance",
            LedgerCall::TransferFrom { .. } => "transfer_from",
            LedgerCall::Mint { .. } => "mint",
            LedgerCall::Burn { .. } => "burn",
            LedgerCall::BurnFrom { .. } => "burn_from",
            LedgerCall::TransferOwnership { .. } => "transfer_ownership",
            LedgerCall::AddMinter { .. } => "add_minter",
            LedgerCall::RemoveMinter { .. } => "remove_minter",
            LedgerCall::Pause => "pause",
            LedgerCall::Unpause => "unpause",
        }
    }
}

impl fmt::Display for LedgerCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TokenLedger {
    /// Dispatch a call to the matching operation
    pub fn execute(
        &mut self,
        caller: &Address,
        call: &LedgerCall,
    ) -> Result<LedgerEvent, TokenError> {
        match *call {
            LedgerCall::Transfer { to, amount } => self.transfer(caller, to, amount),
            LedgerCall::Approve { spender, amount } => self.approve(caller, spender, amount),
            LedgerCall::IncreaseAllowance { spender, amount } => {
                self.increase_allowance(caller, spender, amount)
            }
            LedgerCall::DecreaseAllowance { spender, amount } => {
                self.decrease_allowance(caller, spender, amount)
            }
            LedgerCall::TransferFrom { from, to, amount } => {
                self.transfer_from(caller, from, to, amount)
            }
            LedgerCall::Mint { to, amount } => self.mint(caller, to, amount),
            LedgerCall::Burn { amount } => self.burn(caller, amount),
            LedgerCall::BurnFrom { owner, amount } => self.burn_from(caller, owner, amount),
            LedgerCall::TransferOwnership { new_owner } => {
                self.transfer_ownership(caller, new_owner)
            }
            LedgerCall::AddMinter { account } => self.add_minter(caller, account),
            LedgerCall::RemoveMinter { account } => self.remove_minter(caller, account),
            LedgerCall::Pause => self.pause(caller),
            LedgerCall::Unpause => self.unpause(caller),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::genesis::GenesisConfig;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn test_execute_dispatches() {
        let mut ledger = TokenLedger::new(&GenesisConfig::default(), addr(1)).unwrap();

        let calls = [
            LedgerCall::Transfer {
                to: addr(2),
                amount: 500,
            },
            LedgerCall::Approve {
                spender: addr(3),
                amount: 200,
            },
            LedgerCall::Pause,
            LedgerCall::Burn { amount: 100 },
            LedgerCall::Unpause,
        ];
        for call in &calls {
            ledger.execute(&addr(1), call).unwrap();
        }

        let event = ledger
            .execute(
                &addr(3),
                &LedgerCall::TransferFrom {
                    from: addr(1),
                    to: addr(3),
                    amount: 150,
                },
            )
            .unwrap();
        assert!(matches!(
            event,
            LedgerEvent::TransferFrom {
                remaining_allowance: 50,
                ..
            }
        ));
        assert_eq!(ledger.balance_of(&addr(2)), 500);
        assert_eq!(ledger.balance_of(&addr(3)), 150);
        assert_eq!(ledger.sequence(), 6);
    }

    #[test]
    fn test_execute_reports_errors() {
        let mut ledger = TokenLedger::new(&GenesisConfig::default(), addr(1)).unwrap();
        let result = ledger.execute(
            &addr(2),
            &LedgerCall::Mint {
                to: addr(2),
                amount: 1,
            },
        );
        assert_eq!(result, Err(TokenError::NotMinter(addr(2))));
    }

    #[test]
    fn test_call_json_shape() {
        let call = LedgerCall::BurnFrom {
            owner: addr(0xab),
            amount: 10u128.pow(24),
        };
        let json = serde_json::to_string(&call).unwrap();
        assert!(json.starts_with("{\"burn_from\":"));
        assert!(json.contains("1000000000000000000000000"));

        let parsed: LedgerCall = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, call);

        let pause: LedgerCall = serde_json::from_str("\"pause\"").unwrap();
        assert_eq!(pause, LedgerCall::Pause);
        assert_eq!(pause.to_string(), "pause");
    }
}

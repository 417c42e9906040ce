//! The token ledger
//!
//! Balances, allowances, roles, supply cap and the pause switch live in one
//! owned [`TokenLedger`]. Every mutating operation takes the authenticated
//! caller explicitly, validates everything up front and only then writes, so
//! a rejected call leaves the ledger untouched.
//!
//! Checks run in a fixed order and the first failure is returned:
//! authorization, pause state, address validity, allowance, balance, supply
//! cap.

use super::access::AccessControl;
use super::address::Address;
use super::error::TokenError;
use super::events::{EventRecord, LedgerEvent};
use super::genesis::GenesisConfig;
use super::metadata::TokenMetadata;
use super::supply::SupplyPolicy;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

/// Number of history records retained
pub const HISTORY_LIMIT: usize = 100;

/// A capped, pausable fungible-token ledger
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TokenLedger {
    metadata: TokenMetadata,
    access: AccessControl,
    supply: SupplyPolicy,
    /// Balances: address -> raw units
    balances: HashMap<Address, u128>,
    /// Allowances: owner -> (spender -> raw units)
    allowances: HashMap<Address, HashMap<Address, u128>>,
    paused: bool,
    /// Recent successful mutations (last `HISTORY_LIMIT`)
    #[serde(default)]
    history: VecDeque<EventRecord>,
    /// Successful mutations since genesis
    #[serde(default)]
    sequence: u64,
}

impl TokenLedger {
    /// Genesis: `deployer` becomes owner and minter and receives the initial supply
    pub fn new(config: &GenesisConfig, deployer: Address) -> Result<Self, TokenError> {
        let metadata = TokenMetadata::new(&config.name, &config.symbol, config.decimals)?;
        let (initial, max) = config.validate_supply()?;
        let access = AccessControl::new(deployer)?;
        let supply = SupplyPolicy::new(max, initial)?;

        let mut balances = HashMap::new();
        if initial > 0 {
            balances.insert(deployer, initial);
        }

        log::info!(
            "Ledger created: {} ({}) owner {} initial {} max {}",
            metadata.name,
            metadata.symbol,
            deployer,
            initial,
            max
        );

        Ok(Self {
            metadata,
            access,
            supply,
            balances,
            allowances: HashMap::new(),
            paused: false,
            history: VecDeque::new(),
            sequence: 0,
        })
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    pub fn total_supply(&self) -> u128 {
        self.supply.total_supply()
    }

    pub fn max_supply(&self) -> u128 {
        self.supply.max_supply()
    }

    /// Room left under the cap
    pub fn remaining_supply(&self) -> u128 {
        self.supply.remaining()
    }

    pub fn balance_of(&self, account: &Address) -> u128 {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> u128 {
        self.allowances
            .get(owner)
            .and_then(|spenders| spenders.get(spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn owner(&self) -> Address {
        self.access.owner()
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.access.is_minter(account)
    }

    pub fn minters(&self) -> Vec<Address> {
        self.access.minters().copied().collect()
    }

    /// Accounts with a non-zero balance, in address order
    pub fn holders(&self) -> Vec<(Address, u128)> {
        let mut holders: Vec<(Address, u128)> = self
            .balances
            .iter()
            .filter(|(_, &balance)| balance > 0)
            .map(|(account, &balance)| (*account, balance))
            .collect();
        holders.sort_by_key(|(account, _)| *account);
        holders
    }

    pub fn holder_count(&self) -> usize {
        self.balances.values().filter(|&&b| b > 0).count()
    }

    /// Recent mutations, oldest first
    pub fn history(&self) -> impl Iterator<Item = &EventRecord> {
        self.history.iter()
    }

    /// Number of successful mutations since genesis
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Recompute the ledger-wide invariants.
    ///
    /// Mutations preserve these by construction; this exists for state that
    /// arrives from outside, such as a loaded snapshot.
    pub fn verify_invariants(&self) -> Result<(), TokenError> {
        let sum = self
            .balances
            .values()
            .try_fold(0u128, |acc, &b| acc.checked_add(b))
            .ok_or_else(|| TokenError::InvariantViolation("balance sum overflows".to_string()))?;

        if sum != self.total_supply() {
            return Err(TokenError::InvariantViolation(format!(
                "sum of balances {} != total supply {}",
                sum,
                self.total_supply()
            )));
        }
        if self.total_supply() > self.max_supply() {
            return Err(TokenError::InvariantViolation(format!(
                "total supply {} exceeds max supply {}",
                self.total_supply(),
                self.max_supply()
            )));
        }
        if self.owner().is_zero() {
            return Err(TokenError::InvariantViolation(
                "owner is the null address".to_string(),
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Value movement
    // =========================================================================

    /// Move `amount` from the caller to `to`
    pub fn transfer(
        &mut self,
        caller: &Address,
        to: Address,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.ensure_not_paused()?;
        ensure_not_null(&to)?;
        self.move_balance(*caller, to, amount)?;

        log::debug!("Transfer {} {} -> {}", amount, caller.short(), to.short());
        Ok(self.record(LedgerEvent::Transfer {
            from: *caller,
            to,
            amount,
        }))
    }

    /// Move `amount` from `from` to `to` using the caller's allowance
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: Address,
        to: Address,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.ensure_not_paused()?;
        ensure_not_null(&to)?;
        let remaining = self.check_allowance(&from, caller, amount)?;
        self.move_balance(from, to, amount)?;
        self.set_allowance(from, *caller, remaining);

        log::debug!(
            "TransferFrom {} {} -> {} by {}",
            amount,
            from.short(),
            to.short(),
            caller.short()
        );
        Ok(self.record(LedgerEvent::TransferFrom {
            spender: *caller,
            from,
            to,
            amount,
            remaining_allowance: remaining,
        }))
    }

    // =========================================================================
    // Allowances (not gated by pause)
    // =========================================================================

    /// Set the allowance of `spender` over the caller's balance, replacing
    /// any previous value
    pub fn approve(
        &mut self,
        caller: &Address,
        spender: Address,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ensure_not_null(&spender)?;
        self.set_allowance(*caller, spender, amount);

        log::debug!(
            "Approve {} -> {} for {}",
            caller.short(),
            spender.short(),
            amount
        );
        Ok(self.record(LedgerEvent::Approval {
            owner: *caller,
            spender,
            amount,
        }))
    }

    pub fn increase_allowance(
        &mut self,
        caller: &Address,
        spender: Address,
        added: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ensure_not_null(&spender)?;
        let amount = self
            .allowance(caller, &spender)
            .checked_add(added)
            .ok_or(TokenError::AllowanceOverflow)?;
        self.set_allowance(*caller, spender, amount);

        Ok(self.record(LedgerEvent::Approval {
            owner: *caller,
            spender,
            amount,
        }))
    }

    pub fn decrease_allowance(
        &mut self,
        caller: &Address,
        spender: Address,
        subtracted: u128,
    ) -> Result<LedgerEvent, TokenError> {
        ensure_not_null(&spender)?;
        let amount = self.check_allowance(caller, &spender, subtracted)?;
        self.set_allowance(*caller, spender, amount);

        Ok(self.record(LedgerEvent::Approval {
            owner: *caller,
            spender,
            amount,
        }))
    }

    // =========================================================================
    // Supply
    // =========================================================================

    /// Create `amount` new units for `to`. Minters only; not gated by pause.
    pub fn mint(
        &mut self,
        caller: &Address,
        to: Address,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        self.access.ensure_minter(caller)?;
        ensure_not_null(&to)?;
        let new_total = self.supply.check_mint(amount)?;

        // Cannot overflow: every balance is bounded by total supply
        let new_balance = self.balance_of(&to) + amount;
        self.balances.insert(to, new_balance);
        self.supply.set_total(new_total);

        log::info!(
            "Minted {} to {} by {} (supply {})",
            amount,
            to,
            caller,
            new_total
        );
        Ok(self.record(LedgerEvent::Mint {
            minter: *caller,
            to,
            amount,
            total_supply: new_total,
        }))
    }

    /// Destroy `amount` of the caller's own balance
    pub fn burn(&mut self, caller: &Address, amount: u128) -> Result<LedgerEvent, TokenError> {
        let new_total = self.burn_balance(*caller, amount)?;

        log::info!("Burned {} from {} (supply {})", amount, caller, new_total);
        Ok(self.record(LedgerEvent::Burn {
            burner: *caller,
            from: *caller,
            amount,
            total_supply: new_total,
            remaining_allowance: None,
        }))
    }

    /// Destroy `amount` of `owner`'s balance using the caller's allowance
    pub fn burn_from(
        &mut self,
        caller: &Address,
        owner: Address,
        amount: u128,
    ) -> Result<LedgerEvent, TokenError> {
        let remaining = self.check_allowance(&owner, caller, amount)?;
        let new_total = self.burn_balance(owner, amount)?;
        self.set_allowance(owner, *caller, remaining);

        log::info!(
            "Burned {} from {} by {} (supply {})",
            amount,
            owner,
            caller,
            new_total
        );
        Ok(self.record(LedgerEvent::Burn {
            burner: *caller,
            from: owner,
            amount,
            total_supply: new_total,
            remaining_allowance: Some(remaining),
        }))
    }

    // =========================================================================
    // Administration (owner only, available while paused)
    // =========================================================================

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<LedgerEvent, TokenError> {
        let previous_owner = self.access.transfer_ownership(caller, new_owner)?;

        log::info!("Ownership transferred {} -> {}", previous_owner, new_owner);
        Ok(self.record(LedgerEvent::OwnershipTransferred {
            previous_owner,
            new_owner,
        }))
    }

    pub fn add_minter(
        &mut self,
        caller: &Address,
        account: Address,
    ) -> Result<LedgerEvent, TokenError> {
        let changed = self.access.add_minter(caller, account)?;

        log::info!("Minter added: {} (changed: {})", account, changed);
        Ok(self.record(LedgerEvent::MinterUpdated {
            account,
            enabled: true,
            changed,
        }))
    }

    pub fn remove_minter(
        &mut self,
        caller: &Address,
        account: Address,
    ) -> Result<LedgerEvent, TokenError> {
        let changed = self.access.remove_minter(caller, &account)?;

        log::info!("Minter removed: {} (changed: {})", account, changed);
        Ok(self.record(LedgerEvent::MinterUpdated {
            account,
            enabled: false,
            changed,
        }))
    }

    pub fn pause(&mut self, caller: &Address) -> Result<LedgerEvent, TokenError> {
        self.access.ensure_owner(caller)?;
        if self.paused {
            return Err(TokenError::AlreadyPaused);
        }
        self.paused = true;

        log::info!("Ledger paused by {}", caller);
        Ok(self.record(LedgerEvent::PauseChanged {
            paused: true,
            by: *caller,
        }))
    }

    pub fn unpause(&mut self, caller: &Address) -> Result<LedgerEvent, TokenError> {
        self.access.ensure_owner(caller)?;
        if !self.paused {
            return Err(TokenError::NotPaused);
        }
        self.paused = false;

        log::info!("Ledger unpaused by {}", caller);
        Ok(self.record(LedgerEvent::PauseChanged {
            paused: false,
            by: *caller,
        }))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_not_paused(&self) -> Result<(), TokenError> {
        if self.paused {
            return Err(TokenError::Paused);
        }
        Ok(())
    }

    /// Allowance left after spending `amount`
    fn check_allowance(
        &self,
        owner: &Address,
        spender: &Address,
        amount: u128,
    ) -> Result<u128, TokenError> {
        let have = self.allowance(owner, spender);
        have.checked_sub(amount)
            .ok_or(TokenError::InsufficientAllowance { have, need: amount })
    }

    fn check_balance(&self, account: &Address, amount: u128) -> Result<u128, TokenError> {
        let have = self.balance_of(account);
        have.checked_sub(amount)
            .ok_or(TokenError::InsufficientBalance { have, need: amount })
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: u128) {
        self.allowances
            .entry(owner)
            .or_default()
            .insert(spender, amount);
    }

    /// Debit `from` and credit `to`; nothing is written unless both succeed
    fn move_balance(&mut self, from: Address, to: Address, amount: u128) -> Result<(), TokenError> {
        let new_from = self.check_balance(&from, amount)?;
        if from == to {
            return Ok(());
        }
        let new_to = self.balance_of(&to) + amount;

        self.balances.insert(from, new_from);
        self.balances.insert(to, new_to);
        Ok(())
    }

    /// Debit `from` and shrink total supply; returns the new total
    fn burn_balance(&mut self, from: Address, amount: u128) -> Result<u128, TokenError> {
        let new_balance = self.check_balance(&from, amount)?;
        let new_total = self.supply.check_burn(amount)?;

        self.balances.insert(from, new_balance);
        self.supply.set_total(new_total);
        Ok(new_total)
    }

    fn record(&mut self, event: LedgerEvent) -> LedgerEvent {
        self.sequence += 1;
        self.history.push_back(EventRecord {
            sequence: self.sequence,
            timestamp: Utc::now(),
            event: event.clone(),
        });
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
        event
    }
}

fn ensure_not_null(address: &Address) -> Result<(), TokenError> {
    if address.is_zero() {
        return Err(TokenError::InvalidAddress);
    }
    Ok(())
}

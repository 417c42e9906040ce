//! Owner and minter roles
//!
//! One owner, never null, replaced by a one-step transfer. The owner manages
//! the minter set; membership changes are idempotent.

use super::address::Address;
use super::error::TokenError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessControl {
    owner: Address,
    minters: BTreeSet<Address>,
}

impl AccessControl {
    /// Genesis roles: the deployer is owner and the first minter
    pub fn new(deployer: Address) -> Result<Self, TokenError> {
        if deployer.is_zero() {
            return Err(TokenError::InvalidAddress);
        }

        let mut minters = BTreeSet::new();
        minters.insert(deployer);
        Ok(Self {
            owner: deployer,
            minters,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_minter(&self, account: &Address) -> bool {
        self.minters.contains(account)
    }

    /// Minters in address order
    pub fn minters(&self) -> impl Iterator<Item = &Address> {
        self.minters.iter()
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<(), TokenError> {
        if *caller != self.owner {
            return Err(TokenError::NotOwner(*caller));
        }
        Ok(())
    }

    pub fn ensure_minter(&self, caller: &Address) -> Result<(), TokenError> {
        if !self.is_minter(caller) {
            return Err(TokenError::NotMinter(*caller));
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`, returning the previous owner.
    ///
    /// Minter membership is untouched: the previous owner stays a minter if
    /// it was one and the new owner is not added automatically.
    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
    ) -> Result<Address, TokenError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(TokenError::InvalidAddress);
        }

        let previous = std::mem::replace(&mut self.owner, new_owner);
        Ok(previous)
    }

    /// Returns whether membership changed
    pub fn add_minter(&mut self, caller: &Address, account: Address) -> Result<bool, TokenError> {
        self.ensure_owner(caller)?;
        Ok(self.minters.insert(account))
    }

    /// Returns whether membership changed
    pub fn remove_minter(
        &mut self,
        caller: &Address,
        account: &Address,
    ) -> Result<bool, TokenError> {
        self.ensure_owner(caller)?;
        Ok(self.minters.remove(account))
    }
}

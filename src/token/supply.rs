use super::error::TokenError;
use serde::{Deserialize, Serialize};

/// Total supply bounded by an immutable cap
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SupplyPolicy {
    max_supply: u128,
    total_supply: u128,
}

impl SupplyPolicy {
    pub fn new(max_supply: u128, initial_supply: u128) -> Result<Self, TokenError> {
        if initial_supply > max_supply {
            return Err(TokenError::InvalidSupply(format!(
                "initial supply {} exceeds max supply {}",
                initial_supply, max_supply
            )));
        }
        Ok(Self {
            max_supply,
            total_supply: initial_supply,
        })
    }

    pub fn max_supply(&self) -> u128 {
        self.max_supply
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn remaining(&self) -> u128 {
        self.max_supply.saturating_sub(self.total_supply)
    }

    /// New total after minting `amount`, without applying it.
    ///
    /// Landing exactly on the cap is allowed.
    pub fn check_mint(&self, amount: u128) -> Result<u128, TokenError> {
        match self.total_supply.checked_add(amount) {
            Some(new_total) if new_total <= self.max_supply => Ok(new_total),
            _ => Err(TokenError::SupplyExceeded {
                requested: amount,
                remaining: self.remaining(),
            }),
        }
    }

    /// New total after burning `amount`, without applying it
    pub fn check_burn(&self, amount: u128) -> Result<u128, TokenError> {
        self.total_supply.checked_sub(amount).ok_or_else(|| {
            TokenError::InvariantViolation(format!(
                "burn of {} exceeds total supply {}",
                amount, self.total_supply
            ))
        })
    }

    /// Commit a total produced by `check_mint` / `check_burn`
    pub(crate) fn set_total(&mut self, new_total: u128) {
        debug_assert!(new_total <= self.max_supply);
        self.total_supply = new_total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_boundary() {
        let policy = SupplyPolicy::new(100, 40).unwrap();
        assert_eq!(policy.remaining(), 60);

        assert_eq!(policy.check_mint(60).unwrap(), 100);
        assert_eq!(
            policy.check_mint(61),
            Err(TokenError::SupplyExceeded {
                requested: 61,
                remaining: 60
            })
        );
    }

    #[test]
    fn test_mint_overflow_is_supply_exceeded() {
        let policy = SupplyPolicy::new(u128::MAX, 1).unwrap();
        assert!(matches!(
            policy.check_mint(u128::MAX),
            Err(TokenError::SupplyExceeded { .. })
        ));
    }

    #[test]
    fn test_burn() {
        let mut policy = SupplyPolicy::new(100, 40).unwrap();
        let total = policy.check_burn(15).unwrap();
        policy.set_total(total);
        assert_eq!(policy.total_supply(), 25);
        assert_eq!(policy.remaining(), 75);
        assert!(policy.check_burn(26).is_err());
    }

    #[test]
    fn test_initial_above_cap_rejected() {
        assert!(matches!(
            SupplyPolicy::new(10, 11),
            Err(TokenError::InvalidSupply(_))
        ));
    }
}

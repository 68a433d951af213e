use crate::error::{LedgerError, Result};
use crate::id::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fixed-point fractional amount, scaled by `10^decimals`
pub type Amount = u128;

/// Per-owner fractional balances. The sum of all balances never changes after genesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceTable {
    balances: BTreeMap<Address, Amount>,
    total_supply: Amount,
}

impl BalanceTable {
    /// Start with the whole supply held by `holder`
    pub fn genesis(holder: Address, total_supply: Amount) -> Self {
        let mut balances = BTreeMap::new();
        balances.insert(holder, total_supply);
        Self {
            balances,
            total_supply,
        }
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn debit(&mut self, owner: &Address, amount: Amount) -> Result<Amount> {
        let available = self.balance_of(owner);
        let remaining = available
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientBalance {
                available,
                requested: amount,
            })?;
        self.balances.insert(*owner, remaining);
        Ok(remaining)
    }

    pub fn credit(&mut self, owner: &Address, amount: Amount) -> Result<Amount> {
        let current = self.balance_of(owner);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| LedgerError::InvalidParameter("balance overflow".into()))?;
        self.balances.insert(*owner, updated);
        Ok(updated)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn sum(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
    }
}

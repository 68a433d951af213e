use crate::balances::Amount;
use crate::id::Address;
use crate::record::UnitId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Fractional allowances, per-unit approvals and operator grants
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApprovalBook {
    allowances: BTreeMap<(Address, Address), Amount>,
    unit_approvals: BTreeMap<UnitId, Address>,
    operators: BTreeSet<(Address, Address)>,
}

impl ApprovalBook {
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    pub fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount == 0 {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }

    pub fn approved(&self, id: UnitId) -> Option<Address> {
        self.unit_approvals.get(&id).copied()
    }

    pub fn approve_unit(&mut self, id: UnitId, spender: Address) {
        if spender.is_null() {
            self.unit_approvals.remove(&id);
        } else {
            self.unit_approvals.insert(id, spender);
        }
    }

    pub fn clear_unit(&mut self, id: UnitId) {
        self.unit_approvals.remove(&id);
    }

    pub fn is_operator(&self, owner: &Address, operator: &Address) -> bool {
        self.operators.contains(&(*owner, *operator))
    }

    pub fn set_operator(&mut self, owner: Address, operator: Address, approved: bool) {
        if approved {
            self.operators.insert((owner, operator));
        } else {
            self.operators.remove(&(owner, operator));
        }
    }

    /// Whether `caller` may move a unit held by `owner`
    pub fn may_move_unit(&self, caller: &Address, owner: &Address, id: UnitId) -> bool {
        caller == owner || self.is_operator(owner, caller) || self.approved(id) == Some(*caller)
    }
}

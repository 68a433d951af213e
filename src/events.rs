use crate::balances::Amount;
use crate::id::Address;
use crate::record::UnitId;
use serde::{Deserialize, Serialize};

/// State changes reported to indexers.
///
/// Mints carry `from: Address::NULL`, burns carry `to: Address::NULL`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    UnitTransfer {
        from: Address,
        to: Address,
        id: UnitId,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    UnitApproval {
        owner: Address,
        spender: Address,
        id: UnitId,
    },
    ApprovalForAll {
        owner: Address,
        operator: Address,
        approved: bool,
    },
    ExemptionChanged {
        account: Address,
        exempt: bool,
    },
    LifecycleSuspended {
        suspended: bool,
    },
    AdminChanged {
        previous: Address,
        admin: Address,
    },
}

impl LedgerEvent {
    pub fn is_mint(&self) -> bool {
        matches!(self, LedgerEvent::UnitTransfer { from, .. } if from.is_null())
    }

    pub fn is_burn(&self) -> bool {
        matches!(self, LedgerEvent::UnitTransfer { to, .. } if to.is_null())
    }
}

/// Receives committed events
pub trait EventSink {
    fn publish(&mut self, event: &LedgerEvent) -> crate::error::Result<()>;
}

impl EventSink for Vec<LedgerEvent> {
    fn publish(&mut self, event: &LedgerEvent) -> crate::error::Result<()> {
        self.push(event.clone());
        Ok(())
    }
}

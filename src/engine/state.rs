use crate::approvals::ApprovalBook;
use crate::balances::{Amount, BalanceTable};
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::id::Address;
use crate::pool::RetiredPool;
use crate::positions::PositionTable;
use crate::receiver::ReceiverRegistry;
use crate::record::{RecordTable, UnitId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Everything a ledger mutation may touch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerState {
    pub(crate) balances: BalanceTable,
    pub(crate) approvals: ApprovalBook,
    pub(crate) records: RecordTable,
    pub(crate) positions: PositionTable,
    pub(crate) pool: RetiredPool,
    /// Highest unit id ever freshly minted
    pub(crate) minted: UnitId,
    pub(crate) exempt: BTreeSet<Address>,
    pub(crate) suspended: bool,
    pub(crate) admin: Address,
}

impl LedgerState {
    /// Genesis state: `holder` owns the whole supply as an exempt participant
    pub fn genesis(config: &LedgerConfig, admin: Address, holder: Address) -> Self {
        let mut exempt = BTreeSet::new();
        exempt.insert(holder);
        Self {
            balances: BalanceTable::genesis(holder, config.total_supply()),
            approvals: ApprovalBook::default(),
            records: RecordTable::new(),
            positions: PositionTable::new(),
            pool: RetiredPool::with_capacity(config.pool_capacity()),
            minted: 0,
            exempt,
            suspended: false,
            admin,
        }
    }
}

/// A mutation in progress.
///
/// Runs against a working copy of the state; the ledger swaps the copy in and
/// publishes `events` only when the whole operation succeeds.
pub(crate) struct Tx<'a> {
    pub(crate) state: &'a mut LedgerState,
    pub(crate) config: &'a LedgerConfig,
    pub(crate) receivers: &'a mut ReceiverRegistry,
    pub(crate) events: Vec<LedgerEvent>,
}

impl<'a> Tx<'a> {
    pub(crate) fn new(
        state: &'a mut LedgerState,
        config: &'a LedgerConfig,
        receivers: &'a mut ReceiverRegistry,
    ) -> Self {
        Self {
            state,
            config,
            receivers,
            events: Vec::new(),
        }
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    pub(crate) fn unit_size(&self) -> Amount {
        self.config.unit_size()
    }

    pub(crate) fn is_exempt(&self, account: &Address) -> bool {
        self.state.exempt.contains(account)
    }

    /// Units an owner's balance entitles it to
    pub(crate) fn target_units(&self, owner: &Address) -> usize {
        (self.state.balances.balance_of(owner) / self.unit_size()) as usize
    }

    pub(crate) fn held_units(&self, owner: &Address) -> usize {
        self.state.positions.len(owner)
    }

    pub(crate) fn require_admin(&self, caller: &Address) -> Result<()> {
        if *caller != self.state.admin {
            return Err(LedgerError::Unauthorized(format!(
                "{caller} is not the ledger admin"
            )));
        }
        Ok(())
    }
}

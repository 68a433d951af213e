//! The ledger engine.
//!
//! [`Ledger`] owns the balance table, the per-unit ownership records, the
//! per-owner position tables and the retired-unit pool, and is the only thing
//! that mutates them. Every public mutation runs as one transaction against a
//! working copy of the state: on success the copy replaces the live state and
//! the operation's events are published, on failure both are discarded.

mod admin;
mod dispatch;
mod fractional;
mod state;
mod units;


pub use dispatch::UnitOrAmount;
pub use state::LedgerState;

use crate::balances::Amount;
use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::events::{EventSink, LedgerEvent};
use crate::id::Address;
use crate::receiver::{ReceiverRegistry, UnitReceiver};
use crate::record::UnitId;
use crate::snapshot::LedgerSnapshot;
use anyhow::ensure;
use log::{info, warn};
use state::Tx;
use std::collections::BTreeSet;

#[derive(Debug)]
pub struct Ledger {
    config: LedgerConfig,
    state: LedgerState,
    receivers: ReceiverRegistry,
    /// Committed events not yet handed to a sink
    events: Vec<LedgerEvent>,
}

impl Ledger {
    /// Create a ledger whose whole supply starts with `genesis_holder`.
    /// The genesis holder is exempt, so no units exist until value leaves it.
    pub fn new(config: LedgerConfig, admin: Address, genesis_holder: Address) -> Result<Self> {
        config.validate()?;
        if admin.is_null() {
            return Err(LedgerError::InvalidParameter(
                "admin must not be null".into(),
            ));
        }
        if genesis_holder.is_null() {
            return Err(LedgerError::InvalidRecipient(
                "genesis holder must not be null".into(),
            ));
        }
        let state = LedgerState::genesis(&config, admin, genesis_holder);
        info!(
            "created ledger {} ({}) with {} native units held by {}",
            config.name, config.symbol, config.native_units, genesis_holder
        );
        let genesis = LedgerEvent::Transfer {
            from: Address::NULL,
            to: genesis_holder,
            amount: config.total_supply(),
        };
        Ok(Self {
            config,
            state,
            receivers: ReceiverRegistry::default(),
            events: vec![genesis],
        })
    }

    /// Rebuild a ledger from a verified snapshot. Receivers must be registered again.
    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Result<Self> {
        let (config, state) = snapshot.into_parts()?;
        config.validate()?;
        if state.pool.capacity() != config.pool_capacity() {
            return Err(LedgerError::Config(format!(
                "snapshot pool capacity {} does not match configured {}",
                state.pool.capacity(),
                config.pool_capacity()
            )));
        }
        let ledger = Self {
            config,
            state,
            receivers: ReceiverRegistry::default(),
            events: Vec::new(),
        };
        ledger.check_invariants()?;
        info!(
            "restored ledger {} at mint counter {}",
            ledger.config.name, ledger.state.minted
        );
        Ok(ledger)
    }

    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        LedgerSnapshot::capture(&self.config, &self.state)
    }

    /// Run `op` as one all-or-nothing transaction
    fn transact<T>(
        &mut self,
        operation: &str,
        op: impl FnOnce(&mut Tx<'_>) -> Result<T>,
    ) -> Result<T> {
        let mut working = self.state.clone();
        let mut tx = Tx::new(&mut working, &self.config, &mut self.receivers);
        match op(&mut tx) {
            Ok(value) => {
                let events = tx.events;
                self.state = working;
                self.events.extend(events);
                Ok(value)
            }
            Err(err) => {
                warn!("{operation} rolled back: {err}");
                Err(err)
            }
        }
    }

    // ---- Fractional and unit transfers ----

    /// Move `amount` of `caller`'s balance to `to`
    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> Result<bool> {
        self.transact("transfer", |tx| tx.transfer_amount(caller, to, amount))?;
        Ok(true)
    }

    /// Move a unit id or an amount from `from` to `to` on `caller`'s authority.
    ///
    /// `value` names a unit when it is at most the mint counter and an amount
    /// otherwise. A small amount can therefore be mistaken for a unit id; use
    /// [`Ledger::transfer_unit_from`] or [`Ledger::transfer_amount_from`] when
    /// the meaning must be explicit.
    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<()> {
        self.transact("transfer_from", |tx| tx.transfer_from(caller, from, to, value))
    }

    pub fn transfer_unit_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: UnitId,
    ) -> Result<()> {
        self.transact("transfer_unit_from", |tx| {
            tx.transfer_unit_from(caller, from, to, id)
        })
    }

    pub fn transfer_amount_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        self.transact("transfer_amount_from", |tx| {
            tx.transfer_amount_from(caller, from, to, amount)
        })
    }

    pub fn safe_transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<()> {
        self.safe_transfer_from_with_data(caller, from, to, value, &[])
    }

    /// Like [`Ledger::transfer_from`], but a programmable recipient must
    /// acknowledge receipt or the whole transfer is rolled back
    pub fn safe_transfer_from_with_data(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
        data: &[u8],
    ) -> Result<()> {
        self.transact("safe_transfer_from", |tx| {
            tx.transfer_from(caller, from, to, value)?;
            tx.acknowledge(caller, from, to, value, data)
        })
    }

    // ---- Approvals ----

    /// Approve `spender` for a unit id or set its allowance, read the same way as `transfer_from`
    pub fn approve(&mut self, caller: Address, spender: Address, value: u128) -> Result<bool> {
        self.transact("approve", |tx| tx.approve(caller, spender, value))?;
        Ok(true)
    }

    pub fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        self.transact("set_approval_for_all", |tx| {
            tx.set_approval_for_all(caller, operator, approved)
        })
    }

    // ---- Administration ----

    pub fn set_exempt(&mut self, caller: Address, account: Address, exempt: bool) -> Result<()> {
        self.transact("set_exempt", |tx| tx.set_exempt(caller, account, exempt))
    }

    /// While suspended, fractional transfers only move balances
    pub fn set_unit_lifecycle_suspended(&mut self, caller: Address, suspended: bool) -> Result<()> {
        self.transact("set_unit_lifecycle_suspended", |tx| {
            tx.set_unit_lifecycle_suspended(caller, suspended)
        })
    }

    pub fn transfer_admin(&mut self, caller: Address, admin: Address) -> Result<()> {
        self.transact("transfer_admin", |tx| tx.transfer_admin(caller, admin))
    }

    pub fn register_receiver(&mut self, address: Address, receiver: Box<dyn UnitReceiver>) {
        self.receivers.register(address, receiver);
    }

    pub fn unregister_receiver(&mut self, address: &Address) -> Option<Box<dyn UnitReceiver>> {
        self.receivers.unregister(address)
    }

    // ---- Events ----

    /// Committed events not yet drained
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Hand committed events to `sink` in order. Events the sink rejects stay buffered.
    pub fn drain_events(&mut self, sink: &mut dyn EventSink) -> Result<usize> {
        let mut published = 0;
        let result = self.events.iter().try_for_each(|event| -> Result<()> {
            sink.publish(event)?;
            published += 1;
            Ok(())
        });
        self.events.drain(..published);
        result.map(|()| published)
    }

    // ---- Queries ----

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.config.decimals
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn unit_size(&self) -> Amount {
        self.config.unit_size()
    }

    pub fn total_supply(&self) -> Amount {
        self.state.balances.total_supply()
    }

    pub fn native_units(&self) -> u32 {
        self.config.native_units
    }

    /// Highest unit id ever freshly minted
    pub fn minted(&self) -> UnitId {
        self.state.minted
    }

    pub fn balance_of(&self, owner: &Address) -> Amount {
        self.state.balances.balance_of(owner)
    }

    pub fn unit_balance_of(&self, owner: &Address) -> usize {
        self.state.positions.len(owner)
    }

    /// Units held by `owner` in position order
    pub fn units_of(&self, owner: &Address) -> Vec<UnitId> {
        self.state.positions.units(owner)
    }

    pub fn owner_of(&self, id: UnitId) -> Result<Address> {
        self.state.records.owner(id).ok_or(LedgerError::NotFound(id))
    }

    pub fn get_approved(&self, id: UnitId) -> Result<Option<Address>> {
        self.owner_of(id)?;
        Ok(self.state.approvals.approved(id))
    }

    pub fn is_approved_for_all(&self, owner: &Address, operator: &Address) -> bool {
        self.state.approvals.is_operator(owner, operator)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.state.approvals.allowance(owner, spender)
    }

    pub fn is_exempt(&self, account: &Address) -> bool {
        self.state.exempt.contains(account)
    }

    pub fn is_unit_lifecycle_suspended(&self) -> bool {
        self.state.suspended
    }

    pub fn admin(&self) -> Address {
        self.state.admin
    }

    /// Retired unit ids from the front of the pool to the back
    pub fn retired_units(&self) -> Vec<UnitId> {
        self.state.pool.iter().collect()
    }

    pub fn state_digest(&self) -> Result<[u8; 32]> {
        crate::snapshot::state_digest(&self.state)
    }

    /// Verify the cross-table invariants of the current state
    pub fn check_invariants(&self) -> anyhow::Result<()> {
        let state = &self.state;
        let unit = self.unit_size();

        ensure!(
            state.balances.sum() == Some(state.balances.total_supply()),
            "balances do not sum to the total supply"
        );

        if !state.suspended {
            for (owner, balance) in state.balances.iter() {
                if state.exempt.contains(owner) {
                    continue;
                }
                let held = state.positions.len(owner);
                ensure!(
                    held as Amount == balance / unit,
                    "{owner} holds {held} units for balance {balance}"
                );
            }
        }
        for account in &state.exempt {
            ensure!(
                state.positions.is_empty(account),
                "exempt account {account} holds units"
            );
        }

        let mut seen = BTreeSet::new();
        for (owner, units) in state.positions.owners() {
            for (position, id) in units.iter().enumerate() {
                ensure!(seen.insert(*id), "unit {id} appears twice in position tables");
                ensure!(
                    state.records.owner(*id) == Some(*owner),
                    "unit {id} is listed under {owner} but recorded elsewhere"
                );
                ensure!(
                    state.records.position(*id) == position as u64,
                    "unit {id} is recorded at the wrong position"
                );
            }
        }
        let owned = state.records.owned().count();
        ensure!(
            owned == seen.len(),
            "{owned} units are recorded as owned but {} are listed",
            seen.len()
        );

        for id in state.pool.iter() {
            ensure!(id >= 1 && id <= state.minted, "pooled unit {id} was never minted");
            ensure!(
                state.records.owner(id).is_none(),
                "pooled unit {id} still has an owner"
            );
            ensure!(seen.insert(id), "unit {id} is both owned and pooled, or pooled twice");
        }
        ensure!(
            seen.len() == state.minted as usize,
            "{} units are owned or pooled but {} were minted",
            seen.len(),
            state.minted
        );
        Ok(())
    }
}

use super::state::Tx;
use crate::balances::Amount;
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::id::Address;
use crate::receiver::RECEIVER_ACK;
use crate::record::UnitId;
use log::warn;

/// How a dual-meaning value is read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitOrAmount {
    Unit(UnitId),
    Amount(Amount),
}

impl UnitOrAmount {
    /// Values up to the mint counter name units; anything larger is an amount
    pub fn classify(value: u128, minted: UnitId) -> Self {
        if value <= minted as u128 {
            UnitOrAmount::Unit(value as UnitId)
        } else {
            UnitOrAmount::Amount(value)
        }
    }
}

impl Tx<'_> {
    /// Move one specific unit together with one unit's worth of balance
    pub(crate) fn transfer_unit_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        id: UnitId,
    ) -> Result<()> {
        let owner = self
            .state
            .records
            .owner(id)
            .ok_or(LedgerError::NotFound(id))?;
        if owner != from {
            return Err(LedgerError::InvalidSender(
                format!("{from} does not own unit {id}"),
            ));
        }
        if to.is_null() {
            return Err(LedgerError::InvalidRecipient(
                "null address cannot receive".into(),
            ));
        }
        if !self.state.approvals.may_move_unit(&caller, &from, id) {
            return Err(LedgerError::Unauthorized(format!(
                "{caller} may not move unit {id}"
            )));
        }
        if self.is_exempt(&to) {
            return Err(LedgerError::InvalidRecipient(format!(
                "{to} is exempt and cannot hold units"
            )));
        }

        let unit = self.unit_size();
        self.state.balances.debit(&from, unit)?;
        self.state.balances.credit(&to, unit)?;
        self.transfer_unit(from, to, id)?;
        self.emit(LedgerEvent::Transfer {
            from,
            to,
            amount: unit,
        });
        Ok(())
    }

    /// Single entry point reading `value` as a unit id or an amount
    pub(crate) fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
    ) -> Result<()> {
        match UnitOrAmount::classify(value, self.state.minted) {
            UnitOrAmount::Unit(id) => self.transfer_unit_from(caller, from, to, id),
            UnitOrAmount::Amount(amount) => self.transfer_amount_from(caller, from, to, amount),
        }
    }

    pub(crate) fn approve(&mut self, caller: Address, spender: Address, value: u128) -> Result<()> {
        match UnitOrAmount::classify(value, self.state.minted) {
            UnitOrAmount::Unit(id) if id > 0 => {
                let owner = self
                    .state
                    .records
                    .owner(id)
                    .ok_or(LedgerError::NotFound(id))?;
                if caller != owner && !self.state.approvals.is_operator(&owner, &caller) {
                    return Err(LedgerError::Unauthorized(format!(
                        "{caller} may not approve unit {id}"
                    )));
                }
                self.state.approvals.approve_unit(id, spender);
                self.emit(LedgerEvent::UnitApproval { owner, spender, id });
            }
            _ => {
                self.state.approvals.set_allowance(caller, spender, value);
                self.emit(LedgerEvent::Approval {
                    owner: caller,
                    spender,
                    amount: value,
                });
            }
        }
        Ok(())
    }

    pub(crate) fn set_approval_for_all(
        &mut self,
        caller: Address,
        operator: Address,
        approved: bool,
    ) -> Result<()> {
        if operator.is_null() {
            return Err(LedgerError::InvalidParameter(
                "operator must not be null".into(),
            ));
        }
        self.state.approvals.set_operator(caller, operator, approved);
        self.emit(LedgerEvent::ApprovalForAll {
            owner: caller,
            operator,
            approved,
        });
        Ok(())
    }

    /// Ask a programmable recipient to acknowledge what it just received
    pub(crate) fn acknowledge(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        value: u128,
        data: &[u8],
    ) -> Result<()> {
        if !self.receivers.is_programmable(&to) {
            return Ok(());
        }
        let Some(receiver) = self.receivers.get_mut(&to) else {
            warn!("safe transfer to {to} rejected: program address without a receiver");
            return Err(LedgerError::UnsafeRecipient(format!(
                "{to} has no receiver hook"
            )));
        };
        match receiver.on_unit_received(&caller, &from, value, data) {
            Ok(ack) if ack == RECEIVER_ACK => Ok(()),
            Ok(ack) => {
                warn!("safe transfer to {to} rejected: unexpected acknowledgement {ack:?}");
                Err(LedgerError::UnsafeRecipient(format!(
                    "{to} returned an invalid acknowledgement"
                )))
            }
            Err(err) => {
                warn!("safe transfer to {to} rejected: {err:#}");
                Err(LedgerError::UnsafeRecipient(format!("{to}: {err:#}")))
            }
        }
    }
}

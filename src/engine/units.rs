use super::state::Tx;
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::id::Address;
use crate::record::UnitId;
use log::debug;

impl Tx<'_> {
    /// Next id to mint: fresh while below the native ceiling, recycled afterwards
    fn next_unit_id(&mut self) -> Result<UnitId> {
        if self.state.minted < self.config.native_units {
            self.state.minted += 1;
            return Ok(self.state.minted);
        }
        self.state.pool.pop_back()
    }

    /// Append `id` to `owner`'s table and point its record there
    fn assign(&mut self, owner: Address, id: UnitId) -> Result<()> {
        let position = self.state.positions.append(owner, id)?;
        self.state.records.set_owner(id, owner)?;
        self.state.records.set_position(id, position)?;
        Ok(())
    }

    /// Move one unit between holders.
    ///
    /// A null `from` mints an unowned id; a null `to` retires the unit into the
    /// pool. Otherwise `from` must be the current owner. The unit leaves
    /// `from`'s table by swap-remove, so taking the last unit is a plain pop.
    pub(crate) fn transfer_unit(&mut self, from: Address, to: Address, id: UnitId) -> Result<()> {
        if from.is_null() {
            if self.state.records.owner(id).is_some() {
                return Err(LedgerError::AlreadyExists(id));
            }
        } else {
            if self.state.records.owner(id) != Some(from) {
                return Err(LedgerError::InvalidSender(format!(
                    "{from} does not own unit {id}"
                )));
            }
            let position = self.state.records.position(id);
            let removal = self.state.positions.remove_at(&from, position)?;
            if let Some((moved, new_position)) = removal.relocated {
                self.state.records.set_position(moved, new_position)?;
            }
            self.state.approvals.clear_unit(id);
        }

        if to.is_null() {
            self.state.records.set_owner(id, Address::NULL)?;
            self.state.pool.push_front(id)?;
        } else {
            self.assign(to, id)?;
        }

        self.emit(LedgerEvent::UnitTransfer { from, to, id });
        Ok(())
    }

    /// Move `from`'s most recently acquired unit to `to`
    pub(crate) fn move_last_unit(&mut self, from: Address, to: Address) -> Result<UnitId> {
        let last = self
            .state
            .positions
            .last_unit(&from)
            .ok_or_else(|| LedgerError::InvalidParameter(format!("{from} holds no units")))?;
        self.transfer_unit(from, to, last.id)?;
        Ok(last.id)
    }

    pub(crate) fn mint(&mut self, to: Address, count: usize) -> Result<()> {
        if to.is_null() {
            return Err(LedgerError::InvalidRecipient(
                "cannot mint to the null address".into(),
            ));
        }
        for _ in 0..count {
            let id = self.next_unit_id()?;
            self.transfer_unit(Address::NULL, to, id)?;
            debug!("minted unit {id} to {to}");
        }
        Ok(())
    }

    /// Retire `count` units from `from`, highest position first
    pub(crate) fn burn(&mut self, from: Address, count: usize) -> Result<()> {
        if count == 0 {
            return Err(LedgerError::InvalidParameter(
                "burn count must be positive".into(),
            ));
        }
        if self.state.positions.is_empty(&from) {
            return Err(LedgerError::InvalidParameter(
                format!("{from} holds no units"),
            ));
        }
        for _ in 0..count {
            let id = self.move_last_unit(from, Address::NULL)?;
            debug!("retired unit {id} from {from}");
        }
        Ok(())
    }
}

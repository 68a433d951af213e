use super::state::Tx;
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::id::Address;
use log::info;
use std::collections::BTreeSet;

impl Tx<'_> {
    /// Flip exemption and bring `account`'s units in line with its new status.
    /// Becoming exempt retires every unit it holds; leaving exemption mints its
    /// entitlement, or leaves that to the resync on resume while suspended.
    pub(crate) fn set_exempt(
        &mut self,
        caller: Address,
        account: Address,
        exempt: bool,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        if account.is_null() {
            return Err(LedgerError::InvalidParameter(
                "cannot change exemption of the null address".into(),
            ));
        }
        if self.is_exempt(&account) == exempt {
            return Ok(());
        }

        if exempt {
            self.state.exempt.insert(account);
            let held = self.held_units(&account);
            if held > 0 {
                self.burn(account, held)?;
            }
        } else {
            self.state.exempt.remove(&account);
            if !self.state.suspended {
                self.sync_units(&[account])?;
            }
        }

        info!("exemption of {account} set to {exempt}");
        self.emit(LedgerEvent::ExemptionChanged { account, exempt });
        Ok(())
    }

    /// Resuming brings every non-exempt account back to its entitlement
    pub(crate) fn set_unit_lifecycle_suspended(
        &mut self,
        caller: Address,
        suspended: bool,
    ) -> Result<()> {
        self.require_admin(&caller)?;
        let resuming = self.state.suspended && !suspended;
        self.state.suspended = suspended;
        info!("unit lifecycle suspended: {suspended}");
        self.emit(LedgerEvent::LifecycleSuspended { suspended });

        if resuming {
            let accounts: BTreeSet<Address> = self
                .state
                .balances
                .iter()
                .map(|(owner, _)| *owner)
                .chain(self.state.positions.owners().map(|(owner, _)| *owner))
                .collect();
            let accounts: Vec<Address> = accounts.into_iter().collect();
            self.sync_units(&accounts)?;
            info!("resynced units of {} accounts", accounts.len());
        }
        Ok(())
    }

    pub(crate) fn transfer_admin(&mut self, caller: Address, admin: Address) -> Result<()> {
        self.require_admin(&caller)?;
        if admin.is_null() {
            return Err(LedgerError::InvalidRecipient(
                "admin must not be null".into(),
            ));
        }
        let previous = std::mem::replace(&mut self.state.admin, admin);
        info!("ledger admin changed from {previous} to {admin}");
        self.emit(LedgerEvent::AdminChanged { previous, admin });
        Ok(())
    }
}

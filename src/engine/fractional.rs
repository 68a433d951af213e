use super::state::Tx;
use crate::balances::Amount;
use crate::error::{LedgerError, Result};
use crate::events::LedgerEvent;
use crate::id::Address;
use log::debug;

impl Tx<'_> {
    /// Move a fractional amount and keep both parties' units in line with their balances
    pub(crate) fn transfer_amount(
        &mut self,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        if from.is_null() {
            return Err(LedgerError::InvalidSender(
                "null address cannot send".into(),
            ));
        }
        if to.is_null() {
            return Err(LedgerError::InvalidRecipient(
                "null address cannot receive".into(),
            ));
        }

        self.state.balances.debit(&from, amount)?;
        self.state.balances.credit(&to, amount)?;
        self.emit(LedgerEvent::Transfer { from, to, amount });

        if from == to || self.state.suspended {
            return Ok(());
        }
        self.reconcile_units(from, to, amount)
    }

    /// Unit side effects of a fractional transfer that has already moved balances.
    ///
    /// Whole units travel directly from sender to receiver, most recently
    /// acquired first. Each tracked party is then brought to its entitlement.
    /// All burns run before any mint, so ids freed by one side are available
    /// to the other even after a suspension left both sides out of line.
    fn reconcile_units(&mut self, from: Address, to: Address, amount: Amount) -> Result<()> {
        if !self.is_exempt(&from) && !self.is_exempt(&to) {
            let whole = amount / self.unit_size();
            let receiver_gap = self.target_units(&to).saturating_sub(self.held_units(&to));
            let moves = whole
                .min(self.held_units(&from) as Amount)
                .min(receiver_gap as Amount);
            for _ in 0..moves {
                let id = self.move_last_unit(from, to)?;
                debug!("moved unit {id} from {from} to {to}");
            }
        }

        self.sync_units(&[from, to])
    }

    /// Bring every non-exempt account in `accounts` to exactly its entitlement.
    /// Surplus units of all accounts are burned before any deficit is minted.
    pub(crate) fn sync_units(&mut self, accounts: &[Address]) -> Result<()> {
        for account in accounts {
            if self.is_exempt(account) {
                continue;
            }
            let excess = self.held_units(account).saturating_sub(self.target_units(account));
            if excess > 0 {
                self.burn(*account, excess)?;
            }
        }
        for account in accounts {
            if self.is_exempt(account) {
                continue;
            }
            let deficit = self.target_units(account).saturating_sub(self.held_units(account));
            if deficit > 0 {
                self.mint(*account, deficit)?;
            }
        }
        Ok(())
    }

    /// Spend `caller`'s allowance over `from`, then move the amount
    pub(crate) fn transfer_amount_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<()> {
        let allowed = self.state.approvals.allowance(&from, &caller);
        if allowed != Amount::MAX {
            if allowed < amount {
                return Err(LedgerError::NotAllowed {
                    allowed,
                    requested: amount,
                });
            }
            self.state
                .approvals
                .set_allowance(from, caller, allowed - amount);
        }
        self.transfer_amount(from, to, amount)
    }
}

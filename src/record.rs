use crate::error::{LedgerError, Result};
use crate::id::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies one discrete unit. Zero is never a valid unit.
pub type UnitId = u32;

/// Interned stand-in for an [`Address`] inside packed records. Zero is the null owner.
pub type OwnerHandle = u32;

const POSITION_BITS: u32 = 32;
const POSITION_MASK: u64 = (1 << POSITION_BITS) - 1;

/// Largest position an ownership record can hold
pub const MAX_POSITION: u64 = POSITION_MASK;

/// Owner and position of a unit packed into a single word.
///
/// The high 32 bits hold the owner handle, the low 32 bits the position of the
/// unit inside its owner's position table. Reading the record yields both
/// fields at once; each field can be rewritten without touching the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord(u64);

impl OwnershipRecord {
    pub fn owner(self) -> OwnerHandle {
        (self.0 >> POSITION_BITS) as OwnerHandle
    }

    pub fn position(self) -> u64 {
        self.0 & POSITION_MASK
    }

    pub fn with_owner(self, owner: OwnerHandle) -> Self {
        OwnershipRecord(((owner as u64) << POSITION_BITS) | (self.0 & POSITION_MASK))
    }

    pub fn with_position(self, position: u64) -> Result<Self> {
        if position > MAX_POSITION {
            return Err(LedgerError::PositionOverflow(position));
        }
        Ok(OwnershipRecord((self.0 & !POSITION_MASK) | position))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Maps addresses to the compact handles stored in ownership records
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRegistry {
    accounts: Vec<Address>,
    handles: BTreeMap<Address, OwnerHandle>,
}

impl Default for AccountRegistry {
    fn default() -> Self {
        Self {
            accounts: vec![Address::NULL],
            handles: BTreeMap::new(),
        }
    }
}

impl AccountRegistry {
    pub fn handle_of(&self, address: &Address) -> Option<OwnerHandle> {
        if address.is_null() {
            return Some(0);
        }
        self.handles.get(address).copied()
    }

    /// Get or assign the handle for an address
    pub fn intern(&mut self, address: Address) -> Result<OwnerHandle> {
        if let Some(handle) = self.handle_of(&address) {
            return Ok(handle);
        }
        let handle = OwnerHandle::try_from(self.accounts.len())
            .map_err(|_| LedgerError::InvalidParameter("account registry exhausted".into()))?;
        self.accounts.push(address);
        self.handles.insert(address, handle);
        Ok(handle)
    }

    pub fn address(&self, handle: OwnerHandle) -> Address {
        self.accounts
            .get(handle as usize)
            .copied()
            .unwrap_or(Address::NULL)
    }
}

/// Ownership records for every unit ever minted, indexed by unit id
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordTable {
    records: Vec<OwnershipRecord>,
    registry: AccountRegistry,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: UnitId) -> OwnershipRecord {
        self.records.get(id as usize).copied().unwrap_or_default()
    }

    /// Owner of a unit, or `None` if it is unminted or retired
    pub fn owner(&self, id: UnitId) -> Option<Address> {
        match self.get(id).owner() {
            0 => None,
            handle => Some(self.registry.address(handle)),
        }
    }

    pub fn position(&self, id: UnitId) -> u64 {
        self.get(id).position()
    }

    /// Rewrite the owner, keeping the position. `Address::NULL` clears ownership.
    pub fn set_owner(&mut self, id: UnitId, owner: Address) -> Result<()> {
        let handle = self.registry.intern(owner)?;
        let slot = self.slot_mut(id)?;
        *slot = slot.with_owner(handle);
        Ok(())
    }

    /// Rewrite the position, keeping the owner
    pub fn set_position(&mut self, id: UnitId, position: u64) -> Result<()> {
        let slot = self.slot_mut(id)?;
        *slot = slot.with_position(position)?;
        Ok(())
    }

    fn slot_mut(&mut self, id: UnitId) -> Result<&mut OwnershipRecord> {
        if id == 0 {
            return Err(LedgerError::InvalidParameter(
                "unit id 0 is reserved".into(),
            ));
        }
        let index = id as usize;
        if self.records.len() <= index {
            self.records.resize(index + 1, OwnershipRecord::default());
        }
        Ok(&mut self.records[index])
    }

    /// Iterate `(id, owner)` over every currently owned unit
    pub fn owned(&self) -> impl Iterator<Item = (UnitId, Address)> + '_ {
        self.records
            .iter()
            .enumerate()
            .skip(1)
            .filter(|(_, record)| record.owner() != 0)
            .map(|(id, record)| (id as UnitId, self.registry.address(record.owner())))
    }
}

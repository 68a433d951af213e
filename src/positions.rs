//! Per-owner unit lists packed several identifiers to a word.
//!
//! Each owner's units form a flat sequence. The sequence is stored as a list of
//! `u128` words, each holding [`SLOTS_PER_WORD`] unit ids of [`SLOT_BITS`]
//! bits. A zero slot is empty. Every word except the last one is full, so the
//! logical length is recoverable from the word count and the occupancy of the
//! final word.

use crate::error::{LedgerError, Result};
use crate::id::Address;
use crate::record::UnitId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SLOT_BITS: usize = 32;
pub const SLOTS_PER_WORD: usize = 128 / SLOT_BITS;
const SLOT_MASK: u128 = (1 << SLOT_BITS) - 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedWord(u128);

impl PackedWord {
    pub fn get(self, sub: usize) -> UnitId {
        ((self.0 >> (sub * SLOT_BITS)) & SLOT_MASK) as UnitId
    }

    pub fn set(&mut self, sub: usize, id: UnitId) {
        let shift = sub * SLOT_BITS;
        self.0 = (self.0 & !(SLOT_MASK << shift)) | ((id as u128) << shift);
    }

    /// Number of occupied slots, counted from the low end up to the first empty one
    pub fn occupied(self) -> usize {
        (0..SLOTS_PER_WORD)
            .take_while(|&sub| self.get(sub) != 0)
            .count()
    }
}

/// Location of a unit inside an owner's packed words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotRef {
    pub id: UnitId,
    pub word: usize,
    pub sub: usize,
}

impl SlotRef {
    pub fn position(&self) -> u64 {
        (self.word * SLOTS_PER_WORD + self.sub) as u64
    }
}

/// Outcome of a swap-remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Removal {
    /// The unit taken out of the table
    pub removed: UnitId,
    /// The unit that was moved into the vacated slot, with its new position
    pub relocated: Option<(UnitId, u64)>,
}

fn split(position: u64) -> (usize, usize) {
    let position = position as usize;
    (position / SLOTS_PER_WORD, position % SLOTS_PER_WORD)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PositionTable {
    tables: BTreeMap<Address, Vec<PackedWord>>,
}

impl PositionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest-position unit of `owner`, or `None` if the owner holds nothing
    pub fn last_unit(&self, owner: &Address) -> Option<SlotRef> {
        let words = self.tables.get(owner)?;
        let word = words.len().checked_sub(1)?;
        let packed = words[word];
        let sub = packed.occupied().checked_sub(1)?;
        Some(SlotRef {
            id: packed.get(sub),
            word,
            sub,
        })
    }

    pub fn len(&self, owner: &Address) -> usize {
        match self.tables.get(owner) {
            Some(words) => match words.last() {
                Some(last) => (words.len() - 1) * SLOTS_PER_WORD + last.occupied(),
                None => 0,
            },
            None => 0,
        }
    }

    pub fn is_empty(&self, owner: &Address) -> bool {
        self.len(owner) == 0
    }

    pub fn word_count(&self, owner: &Address) -> usize {
        self.tables.get(owner).map_or(0, Vec::len)
    }

    pub fn unit_at(&self, owner: &Address, position: u64) -> Option<UnitId> {
        let (word, sub) = split(position);
        let id = self.tables.get(owner)?.get(word)?.get(sub);
        (id != 0).then_some(id)
    }

    /// All units of `owner` in position order
    pub fn units(&self, owner: &Address) -> Vec<UnitId> {
        self.tables
            .get(owner)
            .map(|words| {
                words
                    .iter()
                    .flat_map(|word| (0..SLOTS_PER_WORD).map(move |sub| word.get(sub)))
                    .take_while(|&id| id != 0)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Append a unit and return the flat position it landed at
    pub fn append(&mut self, owner: Address, id: UnitId) -> Result<u64> {
        if id == 0 {
            return Err(LedgerError::InvalidParameter(
                "unit id 0 is reserved".into(),
            ));
        }
        let words = self.tables.entry(owner).or_default();
        let filled_words = words.len().saturating_sub(1);
        if let Some(last) = words.last_mut() {
            let sub = last.occupied();
            if sub < SLOTS_PER_WORD {
                last.set(sub, id);
                return Ok((filled_words * SLOTS_PER_WORD + sub) as u64);
            }
        }

        let mut word = PackedWord::default();
        word.set(0, id);
        words.push(word);
        Ok(((words.len() - 1) * SLOTS_PER_WORD) as u64)
    }

    /// Remove the highest-position unit. Pops the last word once it empties.
    pub fn remove_last(&mut self, owner: &Address) -> Option<UnitId> {
        let last = self.last_unit(owner)?;
        let words = self.tables.get_mut(owner)?;
        if last.sub == 0 {
            words.pop();
        } else {
            words[last.word].set(last.sub, 0);
        }
        Some(last.id)
    }

    /// Swap-remove the unit at `position`: the owner's last unit fills the hole.
    pub fn remove_at(&mut self, owner: &Address, position: u64) -> Result<Removal> {
        let last = self
            .last_unit(owner)
            .ok_or_else(|| LedgerError::InvalidParameter(format!("{owner} holds no units")))?;
        if position > last.position() {
            return Err(LedgerError::InvalidParameter(format!(
                "position {position} is past the end of {owner}'s units"
            )));
        }
        let removed = match self.unit_at(owner, position) {
            Some(id) => id,
            None => return Err(LedgerError::InvalidParameter(format!("empty slot {position}"))),
        };

        self.remove_last(owner);
        if position == last.position() {
            return Ok(Removal {
                removed,
                relocated: None,
            });
        }

        let (word, sub) = split(position);
        if let Some(words) = self.tables.get_mut(owner) {
            words[word].set(sub, last.id);
        }
        Ok(Removal {
            removed,
            relocated: Some((last.id, position)),
        })
    }

    /// Iterate `(owner, units)` for every owner that has ever held a unit
    pub fn owners(&self) -> impl Iterator<Item = (&Address, Vec<UnitId>)> + '_ {
        self.tables.keys().map(move |owner| (owner, self.units(owner)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::tests::user;

    fn filled(owner: Address, ids: &[UnitId]) -> PositionTable {
        let mut table = PositionTable::new();
        for &id in ids {
            table.append(owner, id).unwrap();
        }
        table
    }

    #[test]
    fn test_packed_word_slots() {
        let mut word = PackedWord::default();
        word.set(0, 7);
        word.set(1, u32::MAX);
        assert_eq!(word.get(0), 7);
        assert_eq!(word.get(1), u32::MAX);
        assert_eq!(word.occupied(), 2);

        word.set(1, 0);
        assert_eq!(word.get(0), 7);
        assert_eq!(word.occupied(), 1);
    }

    #[test]
    fn test_append_spills_into_new_words() {
        let owner = user(1);
        let mut table = PositionTable::new();
        for (expected, id) in (10..20).enumerate() {
            assert_eq!(table.append(owner, id).unwrap(), expected as u64);
        }
        assert_eq!(table.len(&owner), 10);
        assert_eq!(table.word_count(&owner), 10usize.div_ceil(SLOTS_PER_WORD));
        assert_eq!(table.units(&owner), (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn test_last_unit_and_remove_last() {
        let owner = user(1);
        let mut table = filled(owner, &[1, 2, 3, 4, 5]);

        let last = table.last_unit(&owner).unwrap();
        assert_eq!(last, SlotRef { id: 5, word: 1, sub: 0 });
        assert_eq!(last.position(), 4);

        // Removing the only unit of the last word pops the word
        assert_eq!(table.remove_last(&owner), Some(5));
        assert_eq!(table.word_count(&owner), 1);
        assert_eq!(table.remove_last(&owner), Some(4));
        assert_eq!(table.units(&owner), vec![1, 2, 3]);
    }

    #[test]
    fn test_empty_owner() {
        let owner = user(1);
        let mut table = PositionTable::new();
        assert_eq!(table.last_unit(&owner), None);
        assert_eq!(table.remove_last(&owner), None);
        assert!(table.is_empty(&owner));
        assert!(matches!(
            table.remove_at(&owner, 0),
            Err(LedgerError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_single_unit_leaves_no_trailing_word() {
        let owner = user(1);
        let mut table = filled(owner, &[9]);
        assert_eq!(table.remove_last(&owner), Some(9));
        assert_eq!(table.len(&owner), 0);
        assert_eq!(table.word_count(&owner), 0);
    }

    #[test]
    fn test_swap_remove_relocates_last() {
        let owner = user(1);
        let mut table = filled(owner, &[1, 2, 3, 4, 5, 6]);

        let removal = table.remove_at(&owner, 1).unwrap();
        assert_eq!(removal.removed, 2);
        assert_eq!(removal.relocated, Some((6, 1)));
        assert_eq!(table.units(&owner), vec![1, 6, 3, 4, 5]);

        // Removing the last position relocates nothing
        let removal = table.remove_at(&owner, 4).unwrap();
        assert_eq!(removal.removed, 5);
        assert_eq!(removal.relocated, None);
        assert_eq!(table.units(&owner), vec![1, 6, 3, 4]);
        assert_eq!(table.word_count(&owner), 1);
    }

    #[test]
    fn test_remove_at_past_end() {
        let owner = user(1);
        let mut table = filled(owner, &[1, 2]);
        assert!(table.remove_at(&owner, 2).is_err());
        assert_eq!(table.len(&owner), 2);
    }

    #[test]
    fn test_zero_id_rejected() {
        let mut table = PositionTable::new();
        assert!(table.append(user(1), 0).is_err());
    }
}

use crate::error::{LedgerError, Result};
use crate::record::UnitId;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Burned unit ids waiting to be minted again.
///
/// Burning pushes to the front and minting pops from the back, so the earliest
/// retired id is the first one reused.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetiredPool {
    queue: VecDeque<UnitId>,
    capacity: usize,
}

impl RetiredPool {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    fn ensure_room(&self) -> Result<()> {
        if self.queue.len() >= self.capacity {
            return Err(LedgerError::QueueFull(self.capacity));
        }
        Ok(())
    }

    pub fn push_front(&mut self, id: UnitId) -> Result<()> {
        self.ensure_room()?;
        self.queue.push_front(id);
        Ok(())
    }

    pub fn push_back(&mut self, id: UnitId) -> Result<()> {
        self.ensure_room()?;
        self.queue.push_back(id);
        Ok(())
    }

    pub fn pop_front(&mut self) -> Result<UnitId> {
        self.queue.pop_front().ok_or(LedgerError::QueueEmpty)
    }

    pub fn pop_back(&mut self) -> Result<UnitId> {
        self.queue.pop_back().ok_or(LedgerError::QueueEmpty)
    }

    pub fn front(&self) -> Option<UnitId> {
        self.queue.front().copied()
    }

    pub fn back(&self) -> Option<UnitId> {
        self.queue.back().copied()
    }

    pub fn get(&self, index: usize) -> Option<UnitId> {
        self.queue.get(index).copied()
    }

    pub fn contains(&self, id: UnitId) -> bool {
        self.queue.contains(&id)
    }

    /// Pool contents from front to back
    pub fn iter(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.queue.iter().copied()
    }
}

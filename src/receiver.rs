use crate::id::Address;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Acknowledgement a receiver must return to accept a safe transfer
pub const RECEIVER_ACK: [u8; 4] = *b"UNRC";

/// Hook run for programmable accounts receiving a unit through a safe transfer
pub trait UnitReceiver: Send {
    /// Called after the transfer has been applied.
    ///
    /// # Parameters
    /// * `operator` - The caller who initiated the transfer
    /// * `from` - The previous holder
    /// * `value` - The unit id or amount passed to the transfer
    /// * `data` - Opaque bytes forwarded from the caller
    ///
    /// # Returns
    /// [`RECEIVER_ACK`] to accept. Any other value or an error rolls the transfer back.
    fn on_unit_received(
        &mut self,
        operator: &Address,
        from: &Address,
        value: u128,
        data: &[u8],
    ) -> anyhow::Result<[u8; 4]>;
}

/// Registered receiver hooks keyed by address
#[derive(Default)]
pub struct ReceiverRegistry {
    receivers: HashMap<Address, Box<dyn UnitReceiver>>,
}

impl ReceiverRegistry {
    pub fn register(&mut self, address: Address, receiver: Box<dyn UnitReceiver>) {
        self.receivers.insert(address, receiver);
    }

    pub fn unregister(&mut self, address: &Address) -> Option<Box<dyn UnitReceiver>> {
        self.receivers.remove(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut (dyn UnitReceiver + 'static)> {
        self.receivers.get_mut(address).map(|receiver| receiver.as_mut())
    }

    /// Programmable accounts either have a hook or live off the ed25519 curve
    pub fn is_programmable(&self, address: &Address) -> bool {
        self.receivers.contains_key(address) || !address.is_on_curve()
    }
}

impl std::fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("receivers", &self.receivers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// One acknowledgement request seen by a [`MockReceiver`]: operator, from, value, data
pub type ReceivedUnit = (Address, Address, u128, Vec<u8>);

/// Receiver that records every acknowledgement request and answers with a fixed reply.
/// Clones share the same record, so a test can keep one clone and register another.
#[derive(Debug, Clone)]
pub struct MockReceiver {
    reply: Option<[u8; 4]>,
    received: Arc<Mutex<Vec<ReceivedUnit>>>,
}

impl MockReceiver {
    pub fn accepting() -> Self {
        Self::replying(RECEIVER_ACK)
    }

    pub fn replying(reply: [u8; 4]) -> Self {
        Self {
            reply: Some(reply),
            received: Arc::default(),
        }
    }

    /// A receiver whose hook fails
    pub fn failing() -> Self {
        Self {
            reply: None,
            received: Arc::default(),
        }
    }

    pub fn received(&self) -> Vec<ReceivedUnit> {
        self.received
            .lock()
            .map(|received| received.clone())
            .unwrap_or_default()
    }
}

impl UnitReceiver for MockReceiver {
    fn on_unit_received(
        &mut self,
        operator: &Address,
        from: &Address,
        value: u128,
        data: &[u8],
    ) -> anyhow::Result<[u8; 4]> {
        if let Ok(mut received) = self.received.lock() {
            received.push((*operator, *from, value, data.to_vec()));
        }
        self.reply
            .ok_or_else(|| anyhow::anyhow!("receiver rejected unit {value}"))
    }
}

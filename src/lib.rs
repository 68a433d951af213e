//! A ledger that holds one fixed supply both as fractional balances and as
//! individually identified whole units, and keeps the two in step as value
//! moves between holders.

pub mod approvals;
pub mod balances;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod id;
pub mod journal;
pub mod pool;
pub mod positions;
pub mod receiver;
pub mod record;
pub mod snapshot;

// Re-export the main types for convenience
pub use balances::Amount;
pub use config::LedgerConfig;
pub use engine::{Ledger, LedgerState, UnitOrAmount};
pub use error::{LedgerError, Result};
pub use events::{EventSink, LedgerEvent};
pub use id::Address;
pub use journal::FileEventJournal;
pub use receiver::{MockReceiver, UnitReceiver, RECEIVER_ACK};
pub use record::UnitId;
pub use snapshot::LedgerSnapshot;

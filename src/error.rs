use std::io;
use thiserror::Error;

use crate::record::UnitId;

/// Represents all possible errors that can occur when mutating or querying the ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The queried unit is not currently owned by anyone
    #[error("Not found: unit {0} has no owner")]
    NotFound(UnitId),

    /// A freshly chosen unit identifier is already owned
    #[error("Already exists: unit {0} is already owned")]
    AlreadyExists(UnitId),

    /// The recipient is the null address or may not receive units
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    /// The sender is the null address or does not own the unit being moved
    #[error("Invalid sender: {0}")]
    InvalidSender(String),

    /// A programmable recipient declined or failed the receipt acknowledgement
    #[error("Unsafe recipient: {0}")]
    UnsafeRecipient(String),

    /// A parameter is outside the range an operation accepts
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The caller lacks rights over a unit or an administrative action
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller's allowance does not cover the requested amount
    #[error("Not allowed: allowance {allowed} is below {requested}")]
    NotAllowed { allowed: u128, requested: u128 },

    /// The sender's balance does not cover the requested amount
    #[error("Insufficient balance: have {available}, need {requested}")]
    InsufficientBalance { available: u128, requested: u128 },

    /// A position index does not fit the packed position field
    #[error("Position overflow: {0} exceeds the position field")]
    PositionOverflow(u64),

    /// The retired-unit pool has nothing to pop
    #[error("Retired-unit pool is empty")]
    QueueEmpty,

    /// The retired-unit pool has reached its capacity
    #[error("Retired-unit pool is full (capacity {0})")]
    QueueFull(usize),

    /// Configuration is missing or inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors that occur when reading/writing snapshot or journal files
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Anyhow error wrapper for error context
    #[error(transparent)]
    Context(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

impl From<bincode::Error> for LedgerError {
    fn from(err: bincode::Error) -> Self {
        LedgerError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        LedgerError::Config(err.to_string())
    }
}

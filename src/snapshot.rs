use crate::config::LedgerConfig;
use crate::engine::LedgerState;
use crate::error::{LedgerError, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// blake3 digest of the bincode encoding of a ledger state
pub fn state_digest(state: &LedgerState) -> Result<[u8; 32]> {
    let encoded = bincode::serialize(state)?;
    Ok(*blake3::hash(&encoded).as_bytes())
}

/// Point-in-time copy of a ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    /// bincode-encoded [`LedgerState`]
    state: Vec<u8>,
    pub digest: [u8; 32],
    pub taken_at: DateTime<Utc>,
}

impl LedgerSnapshot {
    pub fn capture(config: &LedgerConfig, state: &LedgerState) -> Result<Self> {
        let encoded = bincode::serialize(state)?;
        Ok(Self {
            config: config.clone(),
            digest: *blake3::hash(&encoded).as_bytes(),
            state: encoded,
            taken_at: Utc::now(),
        })
    }

    pub fn verify(&self) -> Result<()> {
        if *blake3::hash(&self.state).as_bytes() != self.digest {
            return Err(LedgerError::Serialization(
                "snapshot digest does not match its state".into(),
            ));
        }
        Ok(())
    }

    /// Verify and decode the snapshot
    pub fn into_parts(self) -> Result<(LedgerConfig, LedgerState)> {
        self.verify()?;
        let state: LedgerState = bincode::deserialize(&self.state)?;
        Ok((self.config, state))
    }

    /// Write the snapshot as a length-prefixed bincode record
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(&(serialized.len() as u64).to_le_bytes())?;
        writer.write_all(&serialized)?;
        writer.flush()?;
        info!(
            "saved snapshot {} to {}",
            hex::encode(self.digest),
            path.display()
        );
        Ok(())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut len_buf = [0u8; 8];
        reader.read_exact(&mut len_buf)?;
        let len = u64::from_le_bytes(len_buf) as usize;

        let mut data = vec![0u8; len];
        reader.read_exact(&mut data)?;
        let snapshot: LedgerSnapshot = bincode::deserialize(&data)?;
        snapshot.verify()?;
        info!(
            "loaded snapshot {} taken at {}",
            hex::encode(snapshot.digest),
            snapshot.taken_at
        );
        Ok(snapshot)
    }

    /// Tamper with the encoded state. Test-only.
    #[cfg(test)]
    pub(crate) fn corrupt(&mut self) {
        if let Some(byte) = self.state.last_mut() {
            *byte ^= 0xff;
        }
    }
}

use curve25519_dalek::edwards::{CompressedEdwardsY, EdwardsPoint};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;

// Address identifies a ledger participant.
// It is a 32 byte long identifier, resembling a public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Default for Address {
    fn default() -> Self {
        Address::NULL
    }
}

impl Deref for Address {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl Address {
    /// The null address. Used as the counterparty of mint and burn events.
    pub const NULL: Address = Address([0; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Wrap an ed25519 public key
    pub fn from_public_key(point: &EdwardsPoint) -> Self {
        Address(point.compress().to_bytes())
    }

    pub fn derive(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"UNITS_Account");

        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Check whether the bytes decompress to a point on the ed25519 curve.
    /// Keypair-owned addresses always do; program addresses never do.
    pub fn is_on_curve(&self) -> bool {
        let Ok(compressed) = CompressedEdwardsY::from_slice(self.0.as_ref()) else {
            return false;
        };
        compressed.decompress().is_some()
    }

    /// Search for a bump that puts the derived address off the curve
    pub fn find_program_address(seeds: &[&[u8]]) -> Option<(Address, u8)> {
        (0..=u8::MAX).rev().find_map(|bump| {
            let candidate = Address(Address::derive(seeds, bump));
            (!candidate.is_on_curve()).then_some((candidate, bump))
        })
    }
}

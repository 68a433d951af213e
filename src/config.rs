use crate::balances::Amount;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Static parameters of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub name: String,
    pub symbol: String,
    /// Fractional digits; one unit equals `10^decimals` of balance
    pub decimals: u8,
    /// Number of whole units in the fixed supply, and the ceiling of fresh unit ids
    pub native_units: u32,
    /// Capacity of the retired-unit pool. Defaults to `native_units`.
    #[serde(default)]
    pub pool_capacity: Option<usize>,
}

impl LedgerConfig {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        decimals: u8,
        native_units: u32,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            native_units,
            pool_capacity: None,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LedgerError::Config("name must not be empty".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(LedgerError::Config("symbol must not be empty".into()));
        }
        if self.native_units == 0 {
            return Err(LedgerError::Config("native_units must be positive".into()));
        }
        // Every minted id may be retired at once
        if let Some(capacity) = self.pool_capacity {
            if capacity < self.native_units as usize {
                return Err(LedgerError::Config(format!(
                    "pool_capacity {capacity} is below native_units {}",
                    self.native_units
                )));
            }
        }
        self.checked_total_supply()
            .ok_or_else(|| LedgerError::Config("total supply does not fit in 128 bits".into()))?;
        Ok(())
    }

    fn checked_unit_size(&self) -> Option<Amount> {
        10u128.checked_pow(self.decimals as u32)
    }

    fn checked_total_supply(&self) -> Option<Amount> {
        self.checked_unit_size()?
            .checked_mul(self.native_units as Amount)
    }

    /// Balance equal to one whole unit. Only meaningful on a validated config.
    pub fn unit_size(&self) -> Amount {
        self.checked_unit_size().unwrap_or(Amount::MAX)
    }

    pub fn total_supply(&self) -> Amount {
        self.checked_total_supply().unwrap_or(Amount::MAX)
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool_capacity.unwrap_or(self.native_units as usize)
    }
}

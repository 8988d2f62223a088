//! Ledger configuration

use serde::{Deserialize, Serialize};

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::ledger::{Address, LedgerError};

/// Smallest proof range accepted without `max_proof_attempts`
///
/// A narrow range may hold no valid proof at all, and an unbounded search
/// over it would never return.
pub const MIN_UNBOUNDED_PROOF_RANGE: u64 = 9000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Coins issued to the miner of each sealed block
    pub mining_reward: f64,

    /// Proof carried by the genesis block
    pub genesis_proof: u64,

    /// First candidate proof the search may draw
    pub proof_range_start: u64,

    /// Last candidate proof the search may draw
    pub proof_range_end: u64,

    /// Give up sealing after this many rejected candidates; `None` never gives up
    pub max_proof_attempts: Option<u64>,

    /// Coins issued by the REPL's `add-person`
    pub person_grant: f64,

    /// Miner credited by the REPL's `mine-block`
    pub miner_name: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            mining_reward: default_mining_reward(),
            genesis_proof: default_genesis_proof(),
            proof_range_start: 1000,
            proof_range_end: 9999,
            max_proof_attempts: None,
            person_grant: default_person_grant(),
            miner_name: "miner".to_string(),
        }
    }
}

fn default_mining_reward() -> f64 {
    10.0
}

fn default_genesis_proof() -> u64 {
    100
}

fn default_person_grant() -> f64 {
    100.0
}

impl LedgerConfig {
    /// Loads a configuration from a JSON file
    ///
    /// Missing keys fall back to their defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {}", path.display(), e)))?;

        Self::from_json(&contents)
    }

    /// Parses and validates a JSON configuration
    pub fn from_json(contents: &str) -> Result<Self, LedgerError> {
        let config: LedgerConfig =
            serde_json::from_str(contents).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;

        Ok(config)
    }

    /// Checks that the values describe a usable ledger
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.proof_range_start > self.proof_range_end {
            return Err(LedgerError::Config(format!(
                "Proof range is empty: {}..={}",
                self.proof_range_start, self.proof_range_end
            )));
        }

        let width = (self.proof_range_end - self.proof_range_start).saturating_add(1);
        if self.max_proof_attempts.is_none() && width < MIN_UNBOUNDED_PROOF_RANGE {
            return Err(LedgerError::Config(format!(
                "Proof range {}..={} is narrower than {} values; set max_proof_attempts",
                self.proof_range_start, self.proof_range_end, MIN_UNBOUNDED_PROOF_RANGE
            )));
        }

        for (name, value) in [
            ("mining_reward", self.mining_reward),
            ("person_grant", self.person_grant),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LedgerError::Config(format!(
                    "{} must be a non-negative number: {}",
                    name, value
                )));
            }
        }

        Address::new(self.miner_name.clone())
            .map_err(|e| LedgerError::Config(format!("miner_name: {}", e)))?;

        Ok(())
    }

    pub fn proof_range(&self) -> RangeInclusive<u64> {
        self.proof_range_start..=self.proof_range_end
    }
}

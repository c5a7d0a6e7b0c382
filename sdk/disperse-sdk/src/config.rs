use serde::{Deserialize, Serialize};
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;

use crate::core::constants::{
    BALANCE_POLL_INTERVAL_MS, DEFAULT_BATCH_SIZE, DEFAULT_PROGRAM_ID, DEVNET_RPC_URL,
    FUNDING_RESERVE_LAMPORTS, NATIVE_FEE_RESERVE_LAMPORTS,
};
use crate::error::{DisperseError, Result};

/// Ledger finality requested when submitting and polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn to_commitment_config(self) -> CommitmentConfig {
        match self {
            Commitment::Processed => CommitmentConfig::processed(),
            Commitment::Confirmed => CommitmentConfig::confirmed(),
            Commitment::Finalized => CommitmentConfig::finalized(),
        }
    }
}

impl FromStr for Commitment {
    type Err = DisperseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "processed" => Ok(Commitment::Processed),
            "confirmed" => Ok(Commitment::Confirmed),
            "finalized" => Ok(Commitment::Finalized),
            other => Err(DisperseError::Other(format!(
                "Unknown commitment level: {}",
                other
            ))),
        }
    }
}

/// Settings shared by every component of a [`crate::DisperseClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisperseConfig {
    pub rpc_url: String,
    pub commitment: Commitment,
    #[serde(with = "pubkey_string")]
    pub program_id: Pubkey,
    pub batch_size: usize,
    pub funding_reserve_lamports: u64,
    pub native_fee_reserve_lamports: u64,
    pub balance_poll_interval_ms: u64,
    pub skip_preflight: bool,
}

impl Default for DisperseConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEVNET_RPC_URL.to_string(),
            commitment: Commitment::default(),
            program_id: DEFAULT_PROGRAM_ID,
            batch_size: DEFAULT_BATCH_SIZE,
            funding_reserve_lamports: FUNDING_RESERVE_LAMPORTS,
            native_fee_reserve_lamports: NATIVE_FEE_RESERVE_LAMPORTS,
            balance_poll_interval_ms: BALANCE_POLL_INTERVAL_MS,
            skip_preflight: true,
        }
    }
}

impl DisperseConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DisperseError::Other(format!("Invalid config: {}", e)))
    }

    /// Batch size clamped to what the program accepts in one call.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.clamp(1, DEFAULT_BATCH_SIZE)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_millis(self.balance_poll_interval_ms)
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        self.commitment.to_commitment_config()
    }
}

mod pubkey_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&pubkey.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let s = String::deserialize(deserializer)?;
        Pubkey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

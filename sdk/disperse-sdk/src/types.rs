use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use std::ops::Range;

use crate::error::DisperseError;

/// Outcome of one submitted batch
#[derive(Debug)]
pub struct BatchReport {
    /// Batch position (0-based)
    pub index: usize,

    /// Slice of the input recipient list covered by this batch
    pub range: Range<usize>,

    /// Confirmed signature, or why the batch did not land
    pub result: Result<Signature, DisperseError>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn signature(&self) -> Option<&Signature> {
        self.result.as_ref().ok()
    }
}

/// Everything one disperse call did on the ledger
#[derive(Debug, Default)]
pub struct DisperseReport {
    /// Intermediary that paid the batches; `None` if nothing was sent
    pub intermediary: Option<Pubkey>,

    /// Owner -> intermediary lamport funding
    pub funding_signature: Option<Signature>,

    /// Owner -> intermediary token deposit (token flow only)
    pub token_deposit_signature: Option<Signature>,

    /// One entry per batch, in batch order
    pub batches: Vec<BatchReport>,
}

impl DisperseReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &BatchReport> {
        self.batches.iter().filter(|b| b.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &BatchReport> {
        self.batches.iter().filter(|b| !b.is_success())
    }

    /// True when every batch landed. An empty report is complete.
    pub fn is_complete(&self) -> bool {
        self.batches.iter().all(BatchReport::is_success)
    }

    /// Number of recipients whose batch landed
    pub fn paid_recipients(&self) -> usize {
        self.succeeded().map(|b| b.range.len()).sum()
    }
}

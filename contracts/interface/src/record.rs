//! Recipient records and the transfer payload.
//!
//! Layout per record: `[0..32]` raw recipient key, `[32..40]` amount as u64 LE.
//! Records are concatenated without padding or length prefix.

use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::CodecError;

/// Encoded size of a single [`RecipientRecord`].
pub const RECORD_LEN: usize = 40;

/// One payout target. `amount` is in the smallest unit (lamports or token base units).
#[derive(BorshSerialize, BorshDeserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipientRecord {
    pub recipient: [u8; 32],
    pub amount: u64,
}

impl RecipientRecord {
    pub fn new(recipient: [u8; 32], amount: u64) -> Self {
        Self { recipient, amount }
    }

    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.extend_from_slice(&self.recipient);
        buffer.extend_from_slice(&self.amount.to_le_bytes());
    }

    /// Parse exactly one record. `bytes` must be [`RECORD_LEN`] long.
    pub fn read_from(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != RECORD_LEN {
            return Err(CodecError::MalformedPayload { len: bytes.len() });
        }
        borsh::from_slice(bytes).map_err(|_| CodecError::MalformedPayload { len: bytes.len() })
    }
}

/// The unit serialized as instruction data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferPayload {
    pub recipients: Vec<RecipientRecord>,
}

impl TransferPayload {
    pub fn new(recipients: Vec<RecipientRecord>) -> Self {
        Self { recipients }
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn encoded_len(&self) -> usize {
        self.recipients.len() * RECORD_LEN
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buffer);
        buffer
    }

    pub fn encode_into(&self, buffer: &mut Vec<u8>) {
        for record in &self.recipients {
            record.write_to(buffer);
        }
    }

    /// A trailing partial record is an error, never dropped.
    pub fn decode(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() % RECORD_LEN != 0 {
            return Err(CodecError::MalformedPayload { len: data.len() });
        }

        let recipients = data
            .chunks_exact(RECORD_LEN)
            .map(RecipientRecord::read_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { recipients })
    }
}

impl From<Vec<RecipientRecord>> for TransferPayload {
    fn from(recipients: Vec<RecipientRecord>) -> Self {
        Self::new(recipients)
    }
}

//! Codec Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// Payload length is not a whole number of recipient records
    #[error("Malformed payload: {len} bytes is not a multiple of 40")]
    MalformedPayload { len: usize },

    /// Instruction data shorter than a method discriminator
    #[error("Instruction data too short: {len} bytes")]
    InstructionTooShort { len: usize },

    #[error("Unknown instruction discriminator: {0:?}")]
    UnknownInstruction([u8; 8]),
}

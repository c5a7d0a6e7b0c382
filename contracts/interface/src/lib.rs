//! Disperse Program Interface
//!
//! Client-side mirror of the on-chain disperse program's wire contract: the
//! recipient record layout and the two multi-transfer instructions.

pub mod error;
pub mod instruction;
pub mod record;

pub use error::CodecError;
pub use instruction::{DisperseInstruction, InstructionDiscriminator};
pub use record::{RecipientRecord, TransferPayload, RECORD_LEN};

/// Maximum recipients per instruction; the program walks at most this many
/// remaining accounts per call.
pub const MAX_RECIPIENTS_PER_BATCH: usize = 20;

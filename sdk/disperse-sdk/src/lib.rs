pub mod advanced;
pub mod basic;
pub mod batch;
pub mod config;
pub mod core;
pub mod error;
pub mod input;
pub mod intermediary;
pub mod secret;
pub mod storage;
pub mod token;
pub mod types;
pub mod utils;

pub use crate::basic::client::DisperseClient;
pub use crate::config::{Commitment, DisperseConfig};
pub use crate::core::connection::{RpcConnection, SolConnection};
pub use crate::core::signer::{KeypairOwner, OwnerSigner};
pub use crate::error::{DisperseError, Result};
pub use crate::input::parse_recipients;
pub use crate::intermediary::IntermediaryManager;
pub use crate::secret::{EncryptedBlob, SecretMaterial, SeedCipher, ZeroIvAesCbc};
pub use crate::storage::{FileStore, KeyValueStore, MemoryStore};
pub use crate::token::TokenAccountResolver;
pub use crate::types::{BatchReport, DisperseReport};
pub use crate::utils::total_amount;

pub mod interface {
    pub use disperse_interface::{
        DisperseInstruction, InstructionDiscriminator, RecipientRecord, TransferPayload,
        MAX_RECIPIENTS_PER_BATCH, RECORD_LEN,
    };
}

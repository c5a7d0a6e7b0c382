use disperse_interface::CodecError;
use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

/// SDK-specific error types for disperse operations
#[derive(Debug, Error)]
pub enum DisperseError {
    /// Connection or RPC error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Instruction payload does not match the program's record layout
    #[error("Malformed payload: {0}")]
    MalformedPayload(#[from] CodecError),

    /// Stored intermediary blob could not be decrypted with the derived secret.
    /// Recoverable: the caller regenerates the intermediary identity.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Source account cannot cover the requested transfer
    #[error("Insufficient funds in {account}: required {required}, available {available}")]
    InsufficientFunds {
        account: Pubkey,
        required: u64,
        available: u64,
    },

    /// Associated token account lookup or creation failed
    #[error("Failed to resolve token account for {owner}: {reason}")]
    RecipientResolutionFailed { owner: Pubkey, reason: String },

    /// Ledger rejected or never confirmed the transaction
    #[error("Transaction submission failed: {0}")]
    TransactionSubmissionFailed(String),

    /// Owner wallet refused or failed to sign
    #[error("Signing error: {0}")]
    Signing(String),

    /// Local persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Batch of {len} recipients exceeds the limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Amount overflow while summing recipient amounts")]
    AmountOverflow,

    /// Recipient input line could not be parsed (1-based line number)
    #[error("Invalid input on line {line}: {reason}")]
    InvalidInput { line: usize, reason: String },

    #[error("Invalid keypair: {0}")]
    InvalidKeypair(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DisperseError {
    /// Whether the failure means "no recoverable intermediary" rather than a hard error.
    pub fn is_unrecoverable_identity(&self) -> bool {
        matches!(
            self,
            DisperseError::DecryptionFailed(_) | DisperseError::InvalidKeypair(_)
        )
    }
}

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, DisperseError>;

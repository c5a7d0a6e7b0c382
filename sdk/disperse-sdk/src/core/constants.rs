use solana_sdk::pubkey;
use solana_sdk::pubkey::Pubkey;

// Default Program ID for Devnet/Testnet
pub const DEFAULT_PROGRAM_ID: Pubkey = pubkey!("Disperse11111111111111111111111111111111111");

pub const DEVNET_RPC_URL: &str = "https://api.devnet.solana.com";

/// Recipients per on-chain call.
pub const DEFAULT_BATCH_SIZE: usize = disperse_interface::MAX_RECIPIENTS_PER_BATCH;

/// Lamports sent to the intermediary to cover program fees and rent (0.0012 SOL).
pub const FUNDING_RESERVE_LAMPORTS: u64 = 1_200_000;

/// Added on top of the lamport total for native disperses (0.001 SOL).
pub const NATIVE_FEE_RESERVE_LAMPORTS: u64 = 1_000_000;

pub const BALANCE_POLL_INTERVAL_MS: u64 = 1_000;

/// Storage slot holding the encrypted intermediary seed.
pub const INTERMEDIARY_STORAGE_KEY: &str = "to";

pub const LAMPORTS_DECIMALS: u8 = 9;

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::sync::Arc;

use crate::core::connection::SolConnection;

/// The user's primary wallet as seen by the SDK.
/// This allows the SDK to work with:
/// 1. Local Keypairs (Backend/CLI)
/// 2. Wallet Adapters (Frontend - only simple, interactive transactions)
///
/// The SDK never asks for the owner's private key.
#[async_trait]
pub trait OwnerSigner: Send + Sync {
    fn pubkey(&self) -> Pubkey;

    /// Sign an arbitrary message.
    /// Must be deterministic for a given message, since the signature seeds
    /// the intermediary's storage key.
    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String>;

    /// Sign `tx` as fee payer and submit it. The transaction's recent
    /// blockhash is already set by the caller.
    ///
    /// Should return only once the transaction is confirmed at the
    /// connection's commitment level. Callers that need an effect to be
    /// visible still check for it on the ledger.
    async fn send_transaction(&self, tx: Transaction) -> Result<Signature, String>;
}

/// [`OwnerSigner`] backed by a local keypair and a connection.
pub struct KeypairOwner<C> {
    keypair: Keypair,
    connection: Arc<C>,
}

impl<C: SolConnection> KeypairOwner<C> {
    pub fn new(keypair: Keypair, connection: Arc<C>) -> Self {
        Self {
            keypair,
            connection,
        }
    }

    pub fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

#[async_trait]
impl<C: SolConnection> OwnerSigner for KeypairOwner<C> {
    fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<Signature, String> {
        Ok(self.keypair.sign_message(message))
    }

    async fn send_transaction(&self, mut tx: Transaction) -> Result<Signature, String> {
        let blockhash = tx.message.recent_blockhash;
        tx.try_partial_sign(&[&self.keypair], blockhash)
            .map_err(|e| e.to_string())?;
        self.connection
            .send_transaction(&tx)
            .await
            .map_err(|e| e.to_string())
    }
}

//! Intermediary account lifecycle.
//!
//! The intermediary is a client-held keypair that relays funds for one owner.
//! Its secret key is kept encrypted in a [`KeyValueStore`] under a key derived
//! from the owner's signature, so the same owner gets the same intermediary in
//! every session.
//!
//! If the stored blob cannot be decrypted (different owner, different wallet,
//! corrupted entry) a new intermediary is generated and overwrites the slot.
//! Funds still held by the previous intermediary are not recovered by this flow.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{keypair_from_seed, Keypair, Signature, Signer};
use solana_sdk::system_instruction;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DisperseConfig;
use crate::core::connection::SolConnection;
use crate::core::constants::INTERMEDIARY_STORAGE_KEY;
use crate::core::signer::OwnerSigner;
use crate::error::{DisperseError, Result};
use crate::secret::{self, derive_secret, EncryptedBlob, SecretMaterial, SeedCipher, ZeroIvAesCbc};
use crate::storage::KeyValueStore;
use crate::utils;

pub struct IntermediaryManager<C, S> {
    connection: Arc<C>,
    store: Arc<S>,
    cipher: Box<dyn SeedCipher>,
    storage_key: String,
    funding_reserve: u64,
    poll_interval: Duration,
    // Serialises load -> decide -> store so one process never mints two identities.
    lock: Mutex<()>,
}

impl<C: SolConnection, S: KeyValueStore> IntermediaryManager<C, S> {
    pub fn new(connection: Arc<C>, store: Arc<S>, config: &DisperseConfig) -> Self {
        Self {
            connection,
            store,
            cipher: Box::new(ZeroIvAesCbc),
            storage_key: INTERMEDIARY_STORAGE_KEY.to_string(),
            funding_reserve: config.funding_reserve_lamports,
            poll_interval: config.balance_poll_interval(),
            lock: Mutex::new(()),
        }
    }

    pub fn with_cipher(mut self, cipher: impl SeedCipher + 'static) -> Self {
        self.cipher = Box::new(cipher);
        self
    }

    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// Load the owner's intermediary, or create and persist a new one.
    pub async fn get_or_create(&self, owner: &dyn OwnerSigner) -> Result<Keypair> {
        let _guard = self.lock.lock().await;

        let owner_text = owner.pubkey().to_string();
        let secret = derive_secret(&owner_text, owner).await?;

        if let Some(stored) = self.store.load(&self.storage_key)? {
            match self.recover(&secret, &stored) {
                Ok(keypair) => {
                    info!(
                        owner = %owner_text,
                        intermediary = %keypair.pubkey(),
                        "recovered intermediary"
                    );
                    return Ok(keypair);
                },
                Err(e) if e.is_unrecoverable_identity() => {
                    warn!(
                        owner = %owner_text,
                        error = %e,
                        "stored intermediary unreadable, generating a new one"
                    );
                },
                Err(e) => return Err(e),
            }
        }

        let keypair = Keypair::new();
        let blob = self.cipher.encrypt(&secret, &encode_keypair(&keypair))?;
        self.store
            .store(&self.storage_key, &blob.to_storage_string())?;
        info!(owner = %owner_text, intermediary = %keypair.pubkey(), "created intermediary");

        Ok(keypair)
    }

    fn recover(&self, secret: &SecretMaterial, stored: &str) -> Result<Keypair> {
        let blob = EncryptedBlob::from_storage_string(stored)?;
        let plaintext = self.cipher.decrypt(secret, &blob)?;
        decode_keypair(&plaintext)
    }

    /// Transfer lamports from the owner to the intermediary and wait until the
    /// intermediary's balance is visible. Defaults to the fixed funding reserve.
    ///
    /// The wait has no upper bound; wrap the call in a timeout when driving it
    /// unattended.
    pub async fn fund_intermediary(
        &self,
        owner: &dyn OwnerSigner,
        intermediary: &Pubkey,
        lamports: Option<u64>,
    ) -> Result<Signature> {
        let amount = lamports.unwrap_or(self.funding_reserve);
        let owner_pubkey = owner.pubkey();

        let available = self
            .connection
            .get_balance(&owner_pubkey)
            .await
            .map_err(|e| DisperseError::Connection(e.to_string()))?;
        if available < amount {
            return Err(DisperseError::InsufficientFunds {
                account: owner_pubkey,
                required: amount,
                available,
            });
        }

        let before = self
            .connection
            .get_balance(intermediary)
            .await
            .map_err(|e| DisperseError::Connection(e.to_string()))?;
        let target = before.checked_add(amount).ok_or(DisperseError::AmountOverflow)?;

        let ix = system_instruction::transfer(&owner_pubkey, intermediary, amount);
        let tx = utils::build_transaction(self.connection.as_ref(), &[ix], &owner_pubkey).await?;
        let signature = owner
            .send_transaction(tx)
            .await
            .map_err(DisperseError::TransactionSubmissionFailed)?;
        info!(%intermediary, amount, %signature, "funded intermediary");

        self.wait_for_balance(intermediary, target).await?;
        Ok(signature)
    }

    /// Poll until `pubkey` holds at least `at_least` lamports (and more than zero).
    pub async fn wait_for_balance(&self, pubkey: &Pubkey, at_least: u64) -> Result<u64> {
        let at_least = at_least.max(1);
        loop {
            let balance = self
                .connection
                .get_balance(pubkey)
                .await
                .map_err(|e| DisperseError::Connection(e.to_string()))?;
            debug!(%pubkey, balance, "polled balance");
            if balance >= at_least {
                return Ok(balance);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Secret key bytes as comma-separated decimals, the persisted plaintext form.
pub fn encode_keypair(keypair: &Keypair) -> String {
    secret::join_decimal(&keypair.to_bytes())
}

/// Accepts a 64-byte secret key or a 32-byte seed.
pub fn decode_keypair(text: &str) -> Result<Keypair> {
    let bytes = secret::split_decimal(text)
        .ok_or_else(|| DisperseError::InvalidKeypair("Not a list of byte values".to_string()))?;
    match bytes.len() {
        64 => Keypair::from_bytes(&bytes).map_err(|e| DisperseError::InvalidKeypair(e.to_string())),
        32 => keypair_from_seed(&bytes).map_err(|e| DisperseError::InvalidKeypair(e.to_string())),
        n => Err(DisperseError::InvalidKeypair(format!(
            "Expected 32 or 64 bytes, got {}",
            n
        ))),
    }
}

//! Associated token account resolution.
//!
//! Thin wrapper over the associated-token-account program: derive the address,
//! and create the account (paid by `payer`) when it does not exist yet.

use futures::future::try_join_all;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use spl_associated_token_account::get_associated_token_address_with_program_id;
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;
use spl_token::solana_program::program_pack::Pack;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::connection::SolConnection;
use crate::error::{DisperseError, Result};
use crate::utils;

pub struct TokenAccountResolver<C> {
    connection: Arc<C>,
    token_program: Pubkey,
}

impl<C: SolConnection> TokenAccountResolver<C> {
    pub fn new(connection: Arc<C>) -> Self {
        Self {
            connection,
            token_program: spl_token::id(),
        }
    }

    pub fn token_program(&self) -> Pubkey {
        self.token_program
    }

    pub fn associated_address(&self, owner: &Pubkey, mint: &Pubkey) -> Pubkey {
        get_associated_token_address_with_program_id(owner, mint, &self.token_program)
    }

    /// Lamports the payer must put into each token account it creates.
    pub async fn account_rent(&self) -> Result<u64> {
        self.connection
            .get_minimum_balance_for_rent_exemption(spl_token::state::Account::LEN)
            .await
            .map_err(|e| DisperseError::Connection(e.to_string()))
    }

    /// Distinct owners in `owners` whose token account for `mint` does not
    /// exist yet, in first-seen order.
    pub async fn missing_owners(&self, owners: &[Pubkey], mint: &Pubkey) -> Result<Vec<Pubkey>> {
        let mut seen = HashSet::new();
        let unique: Vec<Pubkey> = owners.iter().copied().filter(|o| seen.insert(*o)).collect();

        let accounts = try_join_all(unique.iter().map(|owner| {
            let address = self.associated_address(owner, mint);
            async move { self.connection.get_account(&address).await }
        }))
        .await
        .map_err(|e| DisperseError::Connection(e.to_string()))?;

        Ok(unique
            .into_iter()
            .zip(accounts)
            .filter(|(_, account)| account.is_none())
            .map(|(owner, _)| owner)
            .collect())
    }

    /// Get-or-create the associated token account of `owner` for `mint`.
    /// Idempotent: repeated calls return the same address.
    pub async fn resolve(&self, owner: &Pubkey, mint: &Pubkey, payer: &Keypair) -> Result<Pubkey> {
        let address = self.associated_address(owner, mint);

        let existing = self
            .connection
            .get_account(&address)
            .await
            .map_err(|e| resolution_failed(owner, e.to_string()))?;
        if existing.is_some() {
            debug!(%owner, %address, "token account exists");
            return Ok(address);
        }

        let ix = create_associated_token_account_idempotent(
            &payer.pubkey(),
            owner,
            mint,
            &self.token_program,
        );
        let signature = utils::send_signed(self.connection.as_ref(), &[ix], payer)
            .await
            .map_err(|e| resolution_failed(owner, e.to_string()))?;
        info!(%owner, %address, %signature, "created token account");

        Ok(address)
    }

    /// Resolve several owners concurrently. Output order matches `owners`;
    /// any failure fails the whole call.
    pub async fn resolve_all(
        &self,
        owners: &[Pubkey],
        mint: &Pubkey,
        payer: &Keypair,
    ) -> Result<Vec<Pubkey>> {
        try_join_all(owners.iter().map(|owner| self.resolve(owner, mint, payer))).await
    }
}

fn resolution_failed(owner: &Pubkey, reason: String) -> DisperseError {
    DisperseError::RecipientResolutionFailed {
        owner: *owner,
        reason,
    }
}

use disperse_interface::RecipientRecord;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use std::sync::Arc;
use tracing::{info, warn};

use crate::advanced::builders::DisperseBuilder;
use crate::batch::{self, Batch};
use crate::config::DisperseConfig;
use crate::core::connection::{RpcConnection, SolConnection};
use crate::core::signer::OwnerSigner;
use crate::error::{DisperseError, Result};
use crate::intermediary::IntermediaryManager;
use crate::storage::KeyValueStore;
use crate::token::TokenAccountResolver;
use crate::types::{BatchReport, DisperseReport};
use crate::utils;

/// Entry point for dispersing lamports or SPL tokens to many recipients.
///
/// Funds move owner -> intermediary -> recipients. The owner signs one funding
/// transfer (plus one token deposit for SPL); every batch after that is paid
/// for and signed by the intermediary.
pub struct DisperseClient<C, S> {
    connection: Arc<C>,
    config: DisperseConfig,
    intermediary: IntermediaryManager<C, S>,
    tokens: TokenAccountResolver<C>,
}

impl<S: KeyValueStore> DisperseClient<RpcConnection, S> {
    /// Client over an RPC endpoint described by `config`.
    pub fn from_config(config: DisperseConfig, store: Arc<S>) -> Self {
        let connection = RpcConnection::new(config.rpc_url.clone(), config.commitment_config())
            .with_skip_preflight(config.skip_preflight);
        Self::new(Arc::new(connection), store, config)
    }
}

impl<C: SolConnection, S: KeyValueStore> DisperseClient<C, S> {
    pub fn new(connection: Arc<C>, store: Arc<S>, config: DisperseConfig) -> Self {
        let intermediary = IntermediaryManager::new(connection.clone(), store, &config);
        let tokens = TokenAccountResolver::new(connection.clone());
        Self {
            connection,
            config,
            intermediary,
            tokens,
        }
    }

    pub fn config(&self) -> &DisperseConfig {
        &self.config
    }

    pub fn connection(&self) -> &Arc<C> {
        &self.connection
    }

    pub fn intermediary_manager(&self) -> &IntermediaryManager<C, S> {
        &self.intermediary
    }

    pub fn token_resolver(&self) -> &TokenAccountResolver<C> {
        &self.tokens
    }

    /// The owner's intermediary, created on first use.
    pub async fn intermediary(&self, owner: &dyn OwnerSigner) -> Result<Keypair> {
        self.intermediary.get_or_create(owner).await
    }

    /// Pay each recipient `amount` lamports.
    ///
    /// The intermediary is funded once with the total plus a fee reserve, then
    /// batches are submitted in order. A failed batch is recorded in the
    /// report and the remaining batches still run.
    pub async fn disperse_native(
        &self,
        owner: &dyn OwnerSigner,
        recipients: &[RecipientRecord],
    ) -> Result<DisperseReport> {
        if recipients.is_empty() {
            info!("no recipients, nothing to disperse");
            return Ok(DisperseReport::default());
        }

        let total = utils::total_amount(recipients)?;
        let funding = total
            .checked_add(self.config.native_fee_reserve_lamports)
            .ok_or(DisperseError::AmountOverflow)?;

        let intermediary = self.intermediary.get_or_create(owner).await?;
        let funding_signature = self
            .intermediary
            .fund_intermediary(owner, &intermediary.pubkey(), Some(funding))
            .await?;

        let mut report = DisperseReport {
            intermediary: Some(intermediary.pubkey()),
            funding_signature: Some(funding_signature),
            ..Default::default()
        };

        info!(
            recipients = recipients.len(),
            total,
            batches = batch::batch_count(recipients.len(), self.config.effective_batch_size()),
            "dispersing lamports"
        );

        for batch in batch::partition(recipients, self.config.effective_batch_size()) {
            let result = self.submit_native_batch(&intermediary, batch.items).await;
            report.batches.push(record_outcome(&batch, result));
        }

        Ok(report)
    }

    /// Pay each recipient `amount` base units of `mint`.
    ///
    /// Recipient records carry wallet addresses; their associated token
    /// accounts are resolved (and created if missing) batch by batch. The
    /// intermediary is funded with the reserve plus rent for every token
    /// account that does not exist yet.
    pub async fn disperse_token(
        &self,
        owner: &dyn OwnerSigner,
        mint: &Pubkey,
        recipients: &[RecipientRecord],
    ) -> Result<DisperseReport> {
        if recipients.is_empty() {
            info!(%mint, "no recipients, nothing to disperse");
            return Ok(DisperseReport::default());
        }

        let total = utils::total_amount(recipients)?;
        let owner_pubkey = owner.pubkey();

        let intermediary = self.intermediary.get_or_create(owner).await?;

        // The intermediary pays rent for every token account it creates below.
        let mut owners = vec![owner_pubkey, intermediary.pubkey()];
        owners.extend(recipients.iter().map(utils::record_pubkey));
        let missing = self.tokens.missing_owners(&owners, mint).await?;
        let rent = if missing.is_empty() {
            0
        } else {
            self.tokens.account_rent().await?
        };
        let funding = (missing.len() as u64)
            .checked_mul(rent)
            .and_then(|r| r.checked_add(self.config.funding_reserve_lamports))
            .ok_or(DisperseError::AmountOverflow)?;
        info!(%mint, accounts_to_create = missing.len(), rent, funding, "funding intermediary");

        let funding_signature = self
            .intermediary
            .fund_intermediary(owner, &intermediary.pubkey(), Some(funding))
            .await?;

        let owner_token_account = self.tokens.resolve(&owner_pubkey, mint, &intermediary).await?;
        let intermediary_token_account = self
            .tokens
            .resolve(&intermediary.pubkey(), mint, &intermediary)
            .await?;

        let deposit = spl_token::instruction::transfer(
            &self.tokens.token_program(),
            &owner_token_account,
            &intermediary_token_account,
            &owner_pubkey,
            &[],
            total,
        )
        .map_err(|e| DisperseError::Other(format!("Failed to build token transfer: {}", e)))?;
        let tx =
            utils::build_transaction(self.connection.as_ref(), &[deposit], &owner_pubkey).await?;
        let token_deposit_signature = owner
            .send_transaction(tx)
            .await
            .map_err(DisperseError::TransactionSubmissionFailed)?;
        info!(
            %mint,
            total,
            signature = %token_deposit_signature,
            "deposited tokens with intermediary"
        );

        let mut report = DisperseReport {
            intermediary: Some(intermediary.pubkey()),
            funding_signature: Some(funding_signature),
            token_deposit_signature: Some(token_deposit_signature),
            ..Default::default()
        };

        for batch in batch::partition(recipients, self.config.effective_batch_size()) {
            let result = self
                .submit_token_batch(&intermediary, &intermediary_token_account, mint, batch.items)
                .await;
            report.batches.push(record_outcome(&batch, result));
        }

        Ok(report)
    }

    async fn submit_native_batch(
        &self,
        intermediary: &Keypair,
        records: &[RecipientRecord],
    ) -> Result<Signature> {
        let ix = DisperseBuilder::new()
            .with_program_id(self.config.program_id)
            .with_payer(intermediary.pubkey())
            .with_recipients(records)
            .build_lamports()?;
        utils::send_signed(self.connection.as_ref(), &[ix], intermediary).await
    }

    async fn submit_token_batch(
        &self,
        intermediary: &Keypair,
        source_token_account: &Pubkey,
        mint: &Pubkey,
        records: &[RecipientRecord],
    ) -> Result<Signature> {
        let owners: Vec<Pubkey> = records.iter().map(utils::record_pubkey).collect();
        let token_accounts = self.tokens.resolve_all(&owners, mint, intermediary).await?;

        // Same order as `records`: the program pairs them by position.
        let mut builder = DisperseBuilder::new()
            .with_program_id(self.config.program_id)
            .with_payer(intermediary.pubkey());
        for (token_account, record) in token_accounts.iter().zip(records) {
            builder = builder.add_recipient(*token_account, record.amount);
        }

        let ix =
            builder.build_spl_tokens(&self.tokens.token_program(), source_token_account, mint)?;
        utils::send_signed(self.connection.as_ref(), &[ix], intermediary).await
    }
}

fn record_outcome(batch: &Batch<'_, RecipientRecord>, result: Result<Signature>) -> BatchReport {
    match &result {
        Ok(signature) => info!(
            batch = batch.index,
            recipients = batch.len(),
            %signature,
            "batch confirmed"
        ),
        Err(e) => warn!(
            batch = batch.index,
            range = ?batch.range,
            error = %e,
            "batch failed"
        ),
    }
    BatchReport {
        index: batch.index,
        range: batch.range.clone(),
        result,
    }
}

use disperse_interface::{
    DisperseInstruction, RecipientRecord, TransferPayload, MAX_RECIPIENTS_PER_BATCH,
};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_program;

use crate::error::{DisperseError, Result};
use crate::utils::record_pubkey;

/// Named accounts preceding the remaining accounts in both instructions.
pub const FIXED_ACCOUNTS_LEN: usize = 1;

/// Remaining accounts of a lamport transfer:
/// `[payer (signer, writable), system program (writable), recipient₁..ₙ (writable)]`.
pub fn lamport_remaining_accounts(
    payer: &Pubkey,
    recipients: &[RecipientRecord],
) -> Vec<AccountMeta> {
    let mut accounts = Vec::with_capacity(2 + recipients.len());
    accounts.push(AccountMeta::new(*payer, true));
    accounts.push(AccountMeta::new(system_program::id(), false));
    accounts.extend(
        recipients
            .iter()
            .map(|r| AccountMeta::new(record_pubkey(r), false)),
    );
    accounts
}

/// Remaining accounts of a token transfer:
/// `[payer (signer, writable), source token account, mint, destination₁..ₙ]`,
/// all writable. `recipients` already carry destination token account addresses.
pub fn token_remaining_accounts(
    payer: &Pubkey,
    source_token_account: &Pubkey,
    mint: &Pubkey,
    recipients: &[RecipientRecord],
) -> Vec<AccountMeta> {
    let mut accounts = Vec::with_capacity(3 + recipients.len());
    accounts.push(AccountMeta::new(*payer, true));
    accounts.push(AccountMeta::new(*source_token_account, false));
    accounts.push(AccountMeta::new(*mint, false));
    accounts.extend(
        recipients
            .iter()
            .map(|r| AccountMeta::new(record_pubkey(r), false)),
    );
    accounts
}

pub fn transfer_lamports(
    program_id: &Pubkey,
    payer: &Pubkey,
    recipients: &[RecipientRecord],
) -> Result<Instruction> {
    check_batch_len(recipients)?;

    let instruction =
        DisperseInstruction::TransferLamports(TransferPayload::new(recipients.to_vec()));

    let mut accounts = vec![AccountMeta::new_readonly(system_program::id(), false)];
    accounts.extend(lamport_remaining_accounts(payer, recipients));

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction.pack(),
    })
}

pub fn transfer_spl_tokens(
    program_id: &Pubkey,
    token_program: &Pubkey,
    payer: &Pubkey,
    source_token_account: &Pubkey,
    mint: &Pubkey,
    recipients: &[RecipientRecord],
) -> Result<Instruction> {
    check_batch_len(recipients)?;

    let instruction =
        DisperseInstruction::TransferSplTokens(TransferPayload::new(recipients.to_vec()));

    let mut accounts = vec![AccountMeta::new_readonly(*token_program, false)];
    accounts.extend(token_remaining_accounts(
        payer,
        source_token_account,
        mint,
        recipients,
    ));

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: instruction.pack(),
    })
}

/// The remaining-account section of a disperse instruction.
pub fn remaining_accounts(ix: &Instruction) -> &[AccountMeta] {
    ix.accounts.get(FIXED_ACCOUNTS_LEN..).unwrap_or(&[])
}

fn check_batch_len(recipients: &[RecipientRecord]) -> Result<()> {
    if recipients.len() > MAX_RECIPIENTS_PER_BATCH {
        return Err(DisperseError::BatchTooLarge {
            len: recipients.len(),
            max: MAX_RECIPIENTS_PER_BATCH,
        });
    }
    Ok(())
}

use disperse_interface::RecipientRecord;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;

use crate::core::connection::SolConnection;
use crate::error::{DisperseError, Result};

//=============================================================================
// Transaction Helpers
//=============================================================================

pub async fn latest_blockhash<C: SolConnection + ?Sized>(connection: &C) -> Result<Hash> {
    connection
        .get_latest_blockhash()
        .await
        .map_err(|e| DisperseError::Connection(e.to_string()))
}

/// Unsigned transaction with `payer` as fee payer and a fresh blockhash.
pub async fn build_transaction<C: SolConnection + ?Sized>(
    connection: &C,
    instructions: &[Instruction],
    payer: &Pubkey,
) -> Result<Transaction> {
    let blockhash = latest_blockhash(connection).await?;
    let mut tx = Transaction::new_with_payer(instructions, Some(payer));
    tx.message.recent_blockhash = blockhash;
    Ok(tx)
}

/// Build, sign with `payer` alone and submit.
pub async fn send_signed<C: SolConnection + ?Sized>(
    connection: &C,
    instructions: &[Instruction],
    payer: &Keypair,
) -> Result<Signature> {
    let mut tx = build_transaction(connection, instructions, &payer.pubkey()).await?;
    let blockhash = tx.message.recent_blockhash;
    tx.try_sign(&[payer], blockhash)
        .map_err(|e| DisperseError::Signing(e.to_string()))?;

    connection
        .send_transaction(&tx)
        .await
        .map_err(|e| DisperseError::TransactionSubmissionFailed(e.to_string()))
}

//=============================================================================
// Record Helpers
//=============================================================================

pub fn record_pubkey(record: &RecipientRecord) -> Pubkey {
    Pubkey::new_from_array(record.recipient)
}

pub fn record_for(recipient: &Pubkey, amount: u64) -> RecipientRecord {
    RecipientRecord::new(recipient.to_bytes(), amount)
}

/// Sum of all amounts, failing on u64 overflow.
pub fn total_amount(records: &[RecipientRecord]) -> Result<u64> {
    records.iter().try_fold(0u64, |acc, r| {
        acc.checked_add(r.amount).ok_or(DisperseError::AmountOverflow)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_amount() {
        let records = vec![
            RecipientRecord::new([1u8; 32], 5),
            RecipientRecord::new([2u8; 32], 7),
        ];
        assert_eq!(total_amount(&records).unwrap(), 12);
        assert_eq!(total_amount(&[]).unwrap(), 0);

        let overflowing = vec![
            RecipientRecord::new([1u8; 32], u64::MAX),
            RecipientRecord::new([2u8; 32], 1),
        ];
        assert!(matches!(
            total_amount(&overflowing),
            Err(DisperseError::AmountOverflow)
        ));
    }

    #[test]
    fn test_record_pubkey_round_trip() {
        let key = Pubkey::new_unique();
        assert_eq!(record_pubkey(&record_for(&key, 1)), key);
    }
}

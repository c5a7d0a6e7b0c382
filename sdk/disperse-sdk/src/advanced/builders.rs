use disperse_interface::RecipientRecord;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;

use crate::advanced::instructions;
use crate::core::constants::DEFAULT_PROGRAM_ID;
use crate::error::{DisperseError, Result};
use crate::utils;

/// Builder for a single disperse call.
///
/// Records are kept in insertion order, which is also the order of the
/// destination accounts in the built instruction.
pub struct DisperseBuilder {
    program_id: Pubkey,
    payer: Option<Pubkey>,
    recipients: Vec<RecipientRecord>,
}

impl DisperseBuilder {
    pub fn new() -> Self {
        Self {
            program_id: DEFAULT_PROGRAM_ID,
            payer: None,
            recipients: Vec::new(),
        }
    }

    pub fn with_program_id(mut self, program_id: Pubkey) -> Self {
        self.program_id = program_id;
        self
    }

    pub fn with_payer(mut self, payer: Pubkey) -> Self {
        self.payer = Some(payer);
        self
    }

    pub fn add_recipient(mut self, recipient: Pubkey, amount: u64) -> Self {
        self.recipients.push(utils::record_for(&recipient, amount));
        self
    }

    pub fn with_recipients(mut self, recipients: &[RecipientRecord]) -> Self {
        self.recipients.extend_from_slice(recipients);
        self
    }

    pub fn recipients(&self) -> &[RecipientRecord] {
        &self.recipients
    }

    pub fn build_lamports(&self) -> Result<Instruction> {
        let payer = self.payer()?;
        instructions::transfer_lamports(&self.program_id, &payer, &self.recipients)
    }

    /// `recipients` must already hold destination token account addresses.
    pub fn build_spl_tokens(
        &self,
        token_program: &Pubkey,
        source_token_account: &Pubkey,
        mint: &Pubkey,
    ) -> Result<Instruction> {
        let payer = self.payer()?;
        instructions::transfer_spl_tokens(
            &self.program_id,
            token_program,
            &payer,
            source_token_account,
            mint,
            &self.recipients,
        )
    }

    fn payer(&self) -> Result<Pubkey> {
        self.payer
            .ok_or_else(|| DisperseError::Other("Payer required".to_string()))
    }
}

impl Default for DisperseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

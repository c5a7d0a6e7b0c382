#![allow(dead_code)]

use async_trait::async_trait;
use disperse_interface::DisperseInstruction;
use disperse_sdk::core::connection::SolConnection;
use disperse_sdk::{DisperseConfig, KeypairOwner};
use solana_sdk::{
    account::Account,
    hash::Hash,
    pubkey::Pubkey,
    rent::Rent,
    signature::{Keypair, Signature},
    system_program,
    transaction::Transaction,
};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::{Arc, Mutex};

type BoxError = Box<dyn Error + Send + Sync>;

const SYSTEM_TRANSFER: u32 = 2;
const TOKEN_ACCOUNT_LEN: usize = 165;

/// Rent-exempt minimum of a token account (2_039_280 lamports).
pub fn token_account_rent() -> u64 {
    Rent::default().minimum_balance(TOKEN_ACCOUNT_LEN)
}

/// In-memory ledger: tracks lamports, created token accounts and token
/// credits, and executes the disperse program's transfers by position.
pub struct MockLedger {
    pub program_id: Pubkey,
    state: Mutex<LedgerState>,
}

#[derive(Default, Clone)]
struct LedgerState {
    balances: HashMap<Pubkey, u64>,
    token_accounts: HashSet<Pubkey>,
    token_credits: HashMap<Pubkey, u64>,
    confirmed: Vec<Transaction>,
    program_calls: usize,
    fail_program_calls: HashSet<usize>,
    reject_token_owners: HashSet<Pubkey>,
}

impl MockLedger {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn airdrop(&self, pubkey: &Pubkey, lamports: u64) {
        *self.state.lock().unwrap().balances.entry(*pubkey).or_default() += lamports;
    }

    pub fn balance(&self, pubkey: &Pubkey) -> u64 {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(pubkey)
            .copied()
            .unwrap_or(0)
    }

    pub fn token_credit(&self, token_account: &Pubkey) -> u64 {
        self.state
            .lock()
            .unwrap()
            .token_credits
            .get(token_account)
            .copied()
            .unwrap_or(0)
    }

    pub fn has_token_account(&self, address: &Pubkey) -> bool {
        self.state.lock().unwrap().token_accounts.contains(address)
    }

    /// Reject the `n`th (0-based) transaction that calls the disperse program.
    pub fn fail_program_call(&self, n: usize) {
        self.state.lock().unwrap().fail_program_calls.insert(n);
    }

    /// Create the token account of `wallet` for `mint` out of band.
    pub fn create_token_account(&self, wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
        let address = spl_associated_token_account::get_associated_token_address(wallet, mint);
        self.state.lock().unwrap().token_accounts.insert(address);
        address
    }

    /// Refuse to create token accounts owned by `wallet`.
    pub fn reject_token_account_for(&self, wallet: &Pubkey) {
        self.state.lock().unwrap().reject_token_owners.insert(*wallet);
    }

    pub fn confirmed(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().confirmed.clone()
    }

    /// Decoded disperse instructions with their full account lists, in
    /// confirmation order.
    pub fn program_calls(&self) -> Vec<(DisperseInstruction, Vec<Pubkey>, Vec<bool>)> {
        self.confirmed()
            .iter()
            .flat_map(|tx| {
                let keys = tx.message.account_keys.clone();
                let signers = tx.message.header.num_required_signatures as usize;
                tx.message
                    .instructions
                    .iter()
                    .filter(|ix| keys[ix.program_id_index as usize] == self.program_id)
                    .map(|ix| {
                        let accounts: Vec<Pubkey> =
                            ix.accounts.iter().map(|i| keys[*i as usize]).collect();
                        let is_signer: Vec<bool> =
                            ix.accounts.iter().map(|i| (*i as usize) < signers).collect();
                        (DisperseInstruction::unpack(&ix.data).unwrap(), accounts, is_signer)
                    })
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    fn apply(&self, state: &mut LedgerState, tx: &Transaction) -> Result<(), BoxError> {
        let keys = &tx.message.account_keys;
        let mut calls_program = false;

        for ix in &tx.message.instructions {
            let program = keys[ix.program_id_index as usize];
            let accounts: Vec<Pubkey> = ix.accounts.iter().map(|i| keys[*i as usize]).collect();

            if program == system_program::id() {
                let kind = u32::from_le_bytes(ix.data[0..4].try_into()?);
                if kind != SYSTEM_TRANSFER {
                    return Err("unsupported system instruction".into());
                }
                let lamports = u64::from_le_bytes(ix.data[4..12].try_into()?);
                debit(state, &accounts[0], lamports)?;
                *state.balances.entry(accounts[1]).or_default() += lamports;
            } else if program == spl_associated_token_account::id() {
                // [funder, associated account, wallet, mint, system, token program]
                if state.reject_token_owners.contains(&accounts[2]) {
                    return Err(format!("cannot create token account for {}", accounts[2]).into());
                }
                // Idempotent create: only a new account costs the funder rent.
                if state.token_accounts.insert(accounts[1]) {
                    let rent = token_account_rent();
                    debit(state, &accounts[0], rent)?;
                    *state.balances.entry(accounts[1]).or_default() += rent;
                }
            } else if program == spl_token::id() {
                // Owner deposit: [source, destination, authority]; amount after the tag byte.
                let amount = u64::from_le_bytes(ix.data[1..9].try_into()?);
                *state.token_credits.entry(accounts[1]).or_default() += amount;
            } else if program == self.program_id {
                calls_program = true;
                self.execute_disperse(state, &ix.data, &accounts)?;
            } else {
                return Err(format!("unknown program {}", program).into());
            }
        }

        if calls_program {
            let call = state.program_calls;
            state.program_calls += 1;
            if state.fail_program_calls.contains(&call) {
                return Err(format!("program call {} rejected", call).into());
            }
        }
        Ok(())
    }

    fn execute_disperse(
        &self,
        state: &mut LedgerState,
        data: &[u8],
        accounts: &[Pubkey],
    ) -> Result<(), BoxError> {
        match DisperseInstruction::unpack(data)? {
            DisperseInstruction::TransferLamports(payload) => {
                let payer = accounts[1];
                for (i, record) in payload.recipients.iter().enumerate() {
                    let recipient = Pubkey::new_from_array(record.recipient);
                    if accounts.get(3 + i) != Some(&recipient) {
                        return Err(format!("record {} does not match its account", i).into());
                    }
                    debit(state, &payer, record.amount)?;
                    *state.balances.entry(recipient).or_default() += record.amount;
                }
            },
            DisperseInstruction::TransferSplTokens(payload) => {
                let source = accounts[2];
                for (i, record) in payload.recipients.iter().enumerate() {
                    let destination = Pubkey::new_from_array(record.recipient);
                    if accounts.get(4 + i) != Some(&destination) {
                        return Err(format!("record {} does not match its account", i).into());
                    }
                    if !state.token_accounts.contains(&destination) {
                        return Err(format!("token account {} missing", destination).into());
                    }
                    let held = state.token_credits.entry(source).or_default();
                    *held = held
                        .checked_sub(record.amount)
                        .ok_or("insufficient token balance")?;
                    *state.token_credits.entry(destination).or_default() += record.amount;
                }
            },
        }
        Ok(())
    }
}

fn debit(state: &mut LedgerState, account: &Pubkey, lamports: u64) -> Result<(), BoxError> {
    let balance = state.balances.entry(*account).or_default();
    *balance = balance
        .checked_sub(lamports)
        .ok_or_else(|| format!("insufficient lamports in {}", account))?;
    Ok(())
}

#[async_trait]
impl SolConnection for MockLedger {
    async fn send_transaction(&self, tx: &Transaction) -> Result<Signature, BoxError> {
        tx.verify()?;
        let signature = *tx.signatures.first().ok_or("No signature")?;

        let mut state = self.state.lock().unwrap();
        // Apply against a scratch copy so a rejected transaction changes nothing.
        let mut scratch = state.clone();
        let outcome = self.apply(&mut scratch, tx);
        // A rejected call still consumes its program-call slot.
        state.program_calls = scratch.program_calls;
        outcome?;

        scratch.confirmed.push(tx.clone());
        *state = scratch;
        Ok(signature)
    }

    async fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>, BoxError> {
        let state = self.state.lock().unwrap();
        if state.token_accounts.contains(pubkey) {
            return Ok(Some(Account {
                lamports: token_account_rent(),
                data: vec![0; 165],
                owner: spl_token::id(),
                executable: false,
                rent_epoch: 0,
            }));
        }
        Ok(None)
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, BoxError> {
        Ok(self.balance(pubkey))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, BoxError> {
        Ok(Hash::new_unique())
    }

    async fn get_minimum_balance_for_rent_exemption(
        &self,
        data_len: usize,
    ) -> Result<u64, BoxError> {
        Ok(Rent::default().minimum_balance(data_len))
    }
}

pub fn test_config(program_id: Pubkey) -> DisperseConfig {
    DisperseConfig {
        program_id,
        balance_poll_interval_ms: 5,
        ..DisperseConfig::default()
    }
}

pub struct TestContext {
    pub ledger: Arc<MockLedger>,
    pub owner: KeypairOwner<MockLedger>,
    pub config: DisperseConfig,
}

pub fn setup_test_context(owner_lamports: u64) -> TestContext {
    let program_id = Pubkey::new_unique();
    let ledger = Arc::new(MockLedger::new(program_id));
    let keypair = Keypair::new();
    ledger.airdrop(&solana_sdk::signature::Signer::pubkey(&keypair), owner_lamports);
    TestContext {
        owner: KeypairOwner::new(keypair, ledger.clone()),
        ledger,
        config: test_config(program_id),
    }
}

use anyhow::{anyhow, Context, Result};
use disperse_sdk::{
    Commitment, DisperseClient, DisperseConfig, FileStore, KeypairOwner, RpcConnection,
};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::read_keypair_file;
use std::str::FromStr;
use std::sync::Arc;

use crate::Cli;

pub struct CliContext {
    pub client: DisperseClient<RpcConnection, FileStore>,
    pub owner: KeypairOwner<RpcConnection>,
}

impl CliContext {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = load_config(cli)?;

        let keypair_path = shellexpand::tilde(&cli.keypair).into_owned();
        let keypair = read_keypair_file(&keypair_path)
            .map_err(|e| anyhow!("Failed to read keypair {}: {}", keypair_path, e))?;

        let store = FileStore::new(shellexpand::tilde(&cli.store).into_owned());
        let client = DisperseClient::from_config(config, Arc::new(store));
        let owner = KeypairOwner::new(keypair, client.connection().clone());

        Ok(Self { client, owner })
    }
}

/// Config file (if any), then flag and environment overrides.
pub fn load_config(cli: &Cli) -> Result<DisperseConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            DisperseConfig::from_json(&json)?
        },
        None => DisperseConfig::default(),
    };

    if let Some(rpc_url) = &cli.rpc_url {
        config.rpc_url = rpc_url.clone();
    }
    if let Some(program_id) = &cli.program_id {
        config.program_id = Pubkey::from_str(program_id)
            .with_context(|| format!("Invalid program id {}", program_id))?;
    }
    if let Some(commitment) = &cli.commitment {
        config.commitment = Commitment::from_str(commitment)?;
    }
    if let Some(batch_size) = cli.batch_size {
        config.batch_size = batch_size;
    }

    Ok(config)
}

mod commands;
mod context;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::context::CliContext;

#[derive(Debug, Parser)]
#[command(author, version, about = "Disperse SOL or SPL tokens to many recipients")]
pub struct Cli {
    /// JSON file with client settings; flags below override it
    #[arg(long, env = "DISPERSE_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "DISPERSE_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Owner wallet keypair file
    #[arg(long, env = "DISPERSE_KEYPAIR", default_value = "~/.config/solana/id.json")]
    pub keypair: String,

    #[arg(long, env = "DISPERSE_PROGRAM_ID")]
    pub program_id: Option<String>,

    /// processed, confirmed or finalized
    #[arg(long, env = "DISPERSE_COMMITMENT")]
    pub commitment: Option<String>,

    /// Where the encrypted intermediary key is kept
    #[arg(long, env = "DISPERSE_STORE", default_value = "~/.config/disperse/store.json")]
    pub store: String,

    /// Recipients per transaction (at most 20)
    #[arg(long, env = "DISPERSE_BATCH_SIZE")]
    pub batch_size: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the owner's intermediary address
    Intermediary,

    /// Disperse SOL; amounts are in SOL
    Native {
        /// One `<address> <amount>` per line
        #[arg(long)]
        file: PathBuf,
    },

    /// Disperse an SPL token; amounts are in display units
    Token {
        #[arg(long)]
        mint: String,

        /// Mint decimals; read from the mint account when omitted
        #[arg(long)]
        decimals: Option<u8>,

        #[arg(long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match run(Cli::parse()).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        },
    }
}

/// `Ok(false)` when some batch did not land.
async fn run(cli: Cli) -> Result<bool> {
    let ctx = CliContext::new(&cli)?;
    match cli.command {
        Command::Intermediary => commands::intermediary(&ctx).await,
        Command::Native { file } => commands::native(&ctx, &file).await,
        Command::Token {
            mint,
            decimals,
            file,
        } => commands::token(&ctx, &mint, decimals, &file).await,
    }
}

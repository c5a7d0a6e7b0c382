use anyhow::{anyhow, Context, Result};
use disperse_sdk::core::constants::LAMPORTS_DECIMALS;
use disperse_sdk::{parse_recipients, DisperseReport, SolConnection};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signer;
use spl_token::solana_program::program_pack::Pack;
use spl_token::state::Mint;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

use crate::context::CliContext;

pub async fn intermediary(ctx: &CliContext) -> Result<bool> {
    let keypair = ctx.client.intermediary(&ctx.owner).await?;
    println!("{}", keypair.pubkey());
    Ok(true)
}

pub async fn native(ctx: &CliContext, file: &Path) -> Result<bool> {
    let text = read_recipients(file)?;
    let recipients = parse_recipients(&text, LAMPORTS_DECIMALS)?;
    info!(recipients = recipients.len(), "loaded recipients");

    let report = ctx.client.disperse_native(&ctx.owner, &recipients).await?;
    print_report(&report);
    Ok(report.is_complete())
}

pub async fn token(
    ctx: &CliContext,
    mint: &str,
    decimals: Option<u8>,
    file: &Path,
) -> Result<bool> {
    let mint = Pubkey::from_str(mint).with_context(|| format!("Invalid mint {}", mint))?;
    let decimals = match decimals {
        Some(decimals) => decimals,
        None => mint_decimals(ctx, &mint).await?,
    };

    let text = read_recipients(file)?;
    let recipients = parse_recipients(&text, decimals)?;
    info!(recipients = recipients.len(), %mint, decimals, "loaded recipients");

    let report = ctx.client.disperse_token(&ctx.owner, &mint, &recipients).await?;
    print_report(&report);
    Ok(report.is_complete())
}

async fn mint_decimals(ctx: &CliContext, mint: &Pubkey) -> Result<u8> {
    let account = ctx
        .client
        .connection()
        .get_account(mint)
        .await
        .map_err(|e| anyhow!("Failed to fetch mint {}: {}", mint, e))?
        .ok_or_else(|| anyhow!("Mint {} not found", mint))?;
    let state = Mint::unpack(&account.data)
        .map_err(|e| anyhow!("{} is not a token mint: {}", mint, e))?;
    Ok(state.decimals)
}

fn read_recipients(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn print_report(report: &DisperseReport) {
    if report.batches.is_empty() {
        println!("No recipients.");
        return;
    }
    if let Some(intermediary) = report.intermediary {
        println!("Intermediary: {}", intermediary);
    }
    for batch in &report.batches {
        match &batch.result {
            Ok(signature) => println!(
                "✅ Batch {} (recipients {}..{}): {}",
                batch.index, batch.range.start, batch.range.end, signature
            ),
            Err(e) => println!(
                "❌ Batch {} (recipients {}..{}): {}",
                batch.index, batch.range.start, batch.range.end, e
            ),
        }
    }
    let failed = report.failed().count();
    if failed == 0 {
        println!("\n🎉 Paid {} recipients.", report.paid_recipients());
    } else {
        println!(
            "\nPaid {} recipients; {} batch(es) failed and can be resubmitted.",
            report.paid_recipients(),
            failed
        );
    }
}

//! # Issuance Subcommands
//!
//! - `mint`: public request by `--caller`, with a proof and attached value.
//! - `airdrop`: admin issues one unit to an identity.
//! - `airdrop-batch`: admin mints a contiguous run to one recipient.
//! - `airdrop-list`: admin airdrops to every address in a list file,
//!   skipping recipients already issued.
//! - `transfer`: owner moves one unit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use pass_core::{Address, Amount, Hash32, TokenId};
use pass_crypto::MerkleProof;

use crate::recipients;
use crate::whitelist::WhitelistFile;
use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Proof siblings, comma separated.
    #[arg(long, value_delimiter = ',', conflicts_with = "proofs_file")]
    pub proof: Vec<Hash32>,
    /// Output of `whitelist build`; the caller's proof is looked up in it.
    #[arg(long)]
    pub proofs_file: Option<PathBuf>,
    /// Native value attached to the request.
    #[arg(long, default_value = "0")]
    pub value: Amount,
}

#[derive(Args, Debug)]
pub struct AirdropArgs {
    pub identity: Address,
}

#[derive(Args, Debug)]
pub struct AirdropBatchArgs {
    pub recipient: Address,
    pub count: u64,
}

#[derive(Args, Debug)]
pub struct AirdropListArgs {
    /// Address list (header line, then one address per line).
    pub list: PathBuf,
    /// Fee-rate hint for the submitting side. Recorded in the log only.
    #[arg(long)]
    pub fee_hint: Option<String>,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    #[arg(long)]
    pub to: Address,
    #[arg(long)]
    pub id: TokenId,
}

pub fn run_mint(args: &MintArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    let identity = ws.caller(caller)?;
    let proof = match &args.proofs_file {
        Some(path) => WhitelistFile::read(path)?
            .proof_for(&identity)
            .cloned()
            .unwrap_or_default(),
        None => MerkleProof::new(args.proof.clone()),
    };
    let receipt = ws.engine.request_issuance(identity, &proof, args.value)?;
    match receipt.fee {
        Some(fee) => println!(
            "OK: issued unit {} to {} (paid {fee})",
            receipt.token_id, receipt.identity
        ),
        None => println!("OK: issued unit {} to {}", receipt.token_id, receipt.identity),
    }
    Ok(0)
}

pub fn run_airdrop(args: &AirdropArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    let token_id = ws.engine.airdrop(&ws.admin_ctx(caller)?, args.identity)?;
    println!("OK: airdropped unit {token_id} to {}", args.identity);
    Ok(0)
}

pub fn run_airdrop_batch(
    args: &AirdropBatchArgs,
    ws: &Workspace,
    caller: Option<Address>,
) -> Result<u8> {
    let receipt = ws
        .engine
        .airdrop_batch(&ws.admin_ctx(caller)?, args.recipient, args.count)?;
    println!(
        "OK: minted units {}..={} to {}",
        receipt.start_token_id.value(),
        receipt.end_token_id.value(),
        receipt.recipient
    );
    Ok(0)
}

/// Summary of one `airdrop-list` run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListOutcome {
    pub issued: usize,
    pub skipped: usize,
}

pub fn run_airdrop_list(
    args: &AirdropListArgs,
    ws: &Workspace,
    caller: Option<Address>,
) -> Result<u8> {
    let outcome = airdrop_list(args, ws, caller)?;
    println!(
        "OK: {} airdropped, {} already issued",
        outcome.issued, outcome.skipped
    );
    Ok(0)
}

/// Airdrop to every listed recipient not yet issued. Stops at the first
/// failure; rerunning resumes after the recipients already served.
pub fn airdrop_list(
    args: &AirdropListArgs,
    ws: &Workspace,
    caller: Option<Address>,
) -> Result<ListOutcome> {
    let ctx = ws.admin_ctx(caller)?;
    let list = recipients::read(&args.list)?;
    tracing::info!(
        recipients = list.len(),
        fee_hint = args.fee_hint.as_deref().unwrap_or("none"),
        "starting airdrop list"
    );

    let mut outcome = ListOutcome::default();
    for recipient in list {
        if ws.engine.has_issued(&recipient)? {
            tracing::info!(recipient = %recipient, "already issued, skipping");
            outcome.skipped += 1;
            continue;
        }
        let token_id = ws
            .engine
            .airdrop(&ctx, recipient)
            .with_context(|| format!("airdrop to {recipient} failed"))?;
        tracing::info!(recipient = %recipient, token_id = %token_id, "sent pass");
        outcome.issued += 1;
    }
    Ok(outcome)
}

pub fn run_transfer(args: &TransferArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    let from = ws.caller(caller)?;
    ws.engine.transfer(from, args.to, args.id)?;
    println!("OK: unit {} moved from {from} to {}", args.id, args.to);
    Ok(0)
}

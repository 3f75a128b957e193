//! # Token and Funds Subcommands
//!
//! `token` drives the local payment-token book that stands in for real
//! token contracts: seed balances, set allowances for the treasury, and
//! inspect balances. `withdraw` sends collected fees to the admin.

use anyhow::Result;
use clap::{Args, Subcommand};

use pass_core::{Address, Amount, Currency};
use pass_engine::TokenGateway;

use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct TokenArgs {
    #[command(subcommand)]
    pub command: TokenCommand,
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    /// Mint `amount` of `token` to `owner` in the local book.
    Credit {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        owner: Address,
        #[arg(long)]
        amount: Amount,
    },

    /// Set an allowance from `--caller` to `spender` (default: treasury).
    Approve {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        spender: Option<Address>,
        #[arg(long)]
        amount: Amount,
    },

    /// Print a balance, and the allowance granted to the treasury.
    Balance {
        #[arg(long)]
        token: Address,
        #[arg(long)]
        owner: Address,
    },
}

#[derive(Args, Debug)]
pub struct WithdrawArgs {
    /// `native` or the payment-token address.
    #[arg(long, default_value = "native")]
    pub currency: Currency,
    #[arg(long)]
    pub amount: Amount,
}

pub fn run_token(args: &TokenArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    match &args.command {
        TokenCommand::Credit {
            token,
            owner,
            amount,
        } => {
            ws.tokens.credit(*token, *owner, *amount)?;
            println!("OK: credited {amount} of {token} to {owner}");
        }
        TokenCommand::Approve {
            token,
            spender,
            amount,
        } => {
            let owner = ws.caller(caller)?;
            let spender = spender.unwrap_or(ws.engine.treasury());
            ws.tokens.approve(*token, owner, spender, *amount)?;
            println!("OK: {owner} approved {spender} for {amount} of {token}");
        }
        TokenCommand::Balance { token, owner } => {
            let balance = ws.tokens.balance_of(token, owner)?;
            let allowance = ws.tokens.allowance(token, owner, &ws.engine.treasury())?;
            println!("Token: {token}");
            println!("  Owner: {owner}");
            println!("  Balance: {balance}");
            println!("  Allowance to treasury: {allowance}");
        }
    }
    Ok(0)
}

pub fn run_withdraw(args: &WithdrawArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    let withdrawal = ws
        .engine
        .withdraw(&ws.admin_ctx(caller)?, args.currency, args.amount)?;
    println!(
        "OK: withdrew {} {} to {}",
        withdrawal.amount, withdrawal.currency, withdrawal.to
    );
    Ok(0)
}

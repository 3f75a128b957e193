//! # Query Subcommand
//!
//! Read-only views of the activity. `events` prints one JSON record per
//! line so it can be piped into other tools; everything else is plain text.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};

use pass_core::{Address, Currency, TokenId};

use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct QueryArgs {
    #[command(subcommand)]
    pub command: QueryCommand,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Phase, supply, and held funds.
    Status,

    /// Whether an identity has been issued.
    Issued { identity: Address },

    /// Owner of one unit.
    Owner { id: TokenId },

    /// Units held by an address.
    Balance { owner: Address },

    /// Collected fees not yet withdrawn.
    Held {
        #[arg(long, default_value = "native")]
        currency: Currency,
    },

    /// Event log records from `--from` on, as JSON lines.
    Events {
        #[arg(long, default_value_t = 0)]
        from: u64,
        #[arg(long)]
        limit: Option<usize>,
        /// Recompute each record's digest and fail on a mismatch.
        #[arg(long)]
        verify: bool,
    },
}

pub fn run_query(args: &QueryArgs, ws: &Workspace) -> Result<u8> {
    let engine = &ws.engine;
    match &args.command {
        QueryCommand::Status => {
            let activity = engine.activity()?;
            println!("Phase: {}", activity.phase());
            println!("Fee: {}", activity.fee());
            println!("Total supply: {}", engine.total_supply()?);
            println!("Next id: {}", engine.next_token_id()?.value());
            println!("Held native: {}", engine.held_balance(Currency::Native)?);
            if let Currency::Token(_) = activity.fee().currency {
                println!(
                    "Held {}: {}",
                    activity.fee().currency,
                    engine.held_balance(activity.fee().currency)?
                );
            }
        }
        QueryCommand::Issued { identity } => {
            println!("{}", engine.has_issued(identity)?);
        }
        QueryCommand::Owner { id } => match engine.owner_of(*id)? {
            Some(owner) => println!("{owner}"),
            None => bail!("unit {id} does not exist"),
        },
        QueryCommand::Balance { owner } => {
            println!("{}", engine.balance_of(owner)?);
        }
        QueryCommand::Held { currency } => {
            println!("{}", engine.held_balance(*currency)?);
        }
        QueryCommand::Events {
            from,
            limit,
            verify,
        } => {
            for record in engine.events_since(*from, *limit)? {
                if *verify && !record.verify_digest()? {
                    bail!("event {} failed digest verification", record.seq);
                }
                println!("{}", serde_json::to_string(&record)?);
            }
        }
    }
    Ok(0)
}

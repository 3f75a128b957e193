//! # Activity Subcommand
//!
//! Admin-only configuration of the issuance activity.
//!
//! - `init` sets fee terms and the allowlist root (Uninitialized → Restricted).
//! - `whitelist` replaces the allowlist root.
//! - `public on|off` toggles Open and Restricted issuance.
//! - `price` replaces the fee terms.
//! - `transfer-admin` hands the admin capability to another address.
//! - `show` prints the configuration and its change history.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use pass_core::{Address, Amount, Currency, Hash32};
use pass_state::PhaseTransitionRecord;

use crate::workspace::Workspace;

#[derive(Args, Debug)]
pub struct ActivityArgs {
    #[command(subcommand)]
    pub command: ActivityCommand,
}

#[derive(Subcommand, Debug)]
pub enum ActivityCommand {
    /// Set fee terms and the allowlist root. Only once.
    Init {
        /// `native` or the payment-token address.
        #[arg(long, default_value = "native")]
        currency: Currency,
        /// Fee per issuance in the currency's smallest unit. 0 for free.
        #[arg(long, default_value = "0")]
        fee: Amount,
        /// Allowlist root from `whitelist build`.
        #[arg(long)]
        root: Hash32,
    },

    /// Replace the allowlist root.
    Whitelist {
        #[arg(long)]
        root: Hash32,
    },

    /// Switch public (proof-free) issuance on or off.
    Public {
        #[arg(value_enum)]
        mode: PublicMode,
    },

    /// Replace the fee terms.
    Price {
        #[arg(long)]
        currency: Currency,
        #[arg(long)]
        fee: Amount,
    },

    /// Hand the admin capability to `new_admin`.
    TransferAdmin { new_admin: Address },

    /// Print configuration and change history.
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PublicMode {
    On,
    Off,
}

pub fn run_activity(args: &ActivityArgs, ws: &Workspace, caller: Option<Address>) -> Result<u8> {
    let record = match &args.command {
        ActivityCommand::Init {
            currency,
            fee,
            root,
        } => ws
            .engine
            .initialize_activity(&ws.admin_ctx(caller)?, *currency, *fee, *root)?,
        ActivityCommand::Whitelist { root } => {
            ws.engine.update_whitelist(&ws.admin_ctx(caller)?, *root)?
        }
        ActivityCommand::Public { mode } => ws
            .engine
            .set_public_mint(&ws.admin_ctx(caller)?, *mode == PublicMode::On)?,
        ActivityCommand::Price { currency, fee } => {
            ws.engine
                .change_price(&ws.admin_ctx(caller)?, *currency, *fee)?
        }
        ActivityCommand::TransferAdmin { new_admin } => {
            ws.engine
                .transfer_admin(&ws.admin_ctx(caller)?, *new_admin)?;
            println!("OK: admin is now {new_admin}");
            return Ok(0);
        }
        ActivityCommand::Show => return cmd_show(ws),
    };
    print_record(&record);
    Ok(0)
}

fn print_record(record: &PhaseTransitionRecord) {
    println!(
        "OK: activity {} -> {} at {}",
        record.from_phase, record.to_phase, record.timestamp
    );
}

fn cmd_show(ws: &Workspace) -> Result<u8> {
    let activity = ws.engine.activity()?;
    println!("Activity");
    println!("  Phase: {}", activity.phase());
    println!("  Fee: {}", activity.fee());
    println!("  Allowlist root: {}", activity.trusted_digest());
    println!("  Admin: {}", ws.engine.admin()?);
    println!("  Treasury: {}", ws.engine.treasury());
    let changes = ws.engine.activity_changes()?;
    println!("  Changes: {}", changes.len());
    for (i, t) in changes.iter().enumerate() {
        println!("    [{i}] {} -> {} at {}", t.from_phase, t.to_phase, t.timestamp);
    }
    Ok(0)
}

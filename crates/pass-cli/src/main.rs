//! # pass CLI entry point
//!
//! Parses command-line arguments, resolves settings, initializes tracing,
//! and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pass_cli::activity::{run_activity, ActivityArgs};
use pass_cli::config::{Overrides, Settings};
use pass_cli::issue::{
    run_airdrop, run_airdrop_batch, run_airdrop_list, run_mint, run_transfer, AirdropArgs,
    AirdropBatchArgs, AirdropListArgs, MintArgs, TransferArgs,
};
use pass_cli::query::{run_query, QueryArgs};
use pass_cli::token::{run_token, run_withdraw, TokenArgs, WithdrawArgs};
use pass_cli::whitelist::{run_whitelist, WhitelistArgs};
use pass_cli::workspace::Workspace;
use pass_core::Address;

/// Pass issuance engine CLI.
///
/// Administers an allowlist-gated, once-per-identity issuance activity
/// stored in a local data directory.
#[derive(Parser, Debug)]
#[command(name = "pass", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    /// Path to configuration file (default: ./pass.yaml if present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Admin address installed on first use; default caller for privileged
    /// commands.
    #[arg(long, global = true)]
    admin: Option<String>,

    /// Engine payment-token account.
    #[arg(long, global = true)]
    treasury: Option<String>,

    /// Identity issuing the command.
    #[arg(long, global = true)]
    caller: Option<Address>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Configure the activity (admin only).
    Activity(ActivityArgs),

    /// Request one unit as `--caller`.
    Mint(MintArgs),

    /// Issue one unit to an identity without proof or payment (admin only).
    Airdrop(AirdropArgs),

    /// Mint a contiguous run of units to one recipient (admin only).
    AirdropBatch(AirdropBatchArgs),

    /// Airdrop to every address in a list file (admin only).
    AirdropList(AirdropListArgs),

    /// Move one unit owned by `--caller`.
    Transfer(TransferArgs),

    /// Build allowlist trees and check proofs.
    Whitelist(WhitelistArgs),

    /// Local payment-token book.
    Token(TokenArgs),

    /// Withdraw collected fees to the admin.
    Withdraw(WithdrawArgs),

    /// Read-only queries.
    Query(QueryArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = Overrides {
        data_dir: cli.data_dir.clone(),
        admin: cli.admin.clone(),
        treasury: cli.treasury.clone(),
        log_json: cli.log_json,
    };
    let settings = Settings::load(cli.config.as_deref(), &overrides);

    let log_json = settings.as_ref().map(|s| s.log_json).unwrap_or(cli.log_json);
    init_tracing(cli.verbose, log_json);

    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::from(2);
        }
    };
    tracing::debug!(data_dir = %settings.data_dir.display(), "pass CLI starting");

    match dispatch(cli.command, cli.caller, &settings) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: u8, json: bool) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn dispatch(command: Commands, caller: Option<Address>, settings: &Settings) -> anyhow::Result<u8> {
    if let Commands::Whitelist(args) = &command {
        return run_whitelist(args);
    }

    let ws = Workspace::open(settings)?;
    match &command {
        Commands::Activity(args) => run_activity(args, &ws, caller),
        Commands::Mint(args) => run_mint(args, &ws, caller),
        Commands::Airdrop(args) => run_airdrop(args, &ws, caller),
        Commands::AirdropBatch(args) => run_airdrop_batch(args, &ws, caller),
        Commands::AirdropList(args) => run_airdrop_list(args, &ws, caller),
        Commands::Transfer(args) => run_transfer(args, &ws, caller),
        Commands::Token(args) => run_token(args, &ws, caller),
        Commands::Withdraw(args) => run_withdraw(args, &ws, caller),
        Commands::Query(args) => run_query(args, &ws),
        Commands::Whitelist(args) => run_whitelist(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    #[test]
    fn cli_parse_activity_init() {
        let root = format!("0x{}", "ab".repeat(32));
        let cli = Cli::try_parse_from([
            "pass", "activity", "init", "--currency", "native", "--fee", "1", "--root", &root,
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Activity(_)));
    }

    #[test]
    fn cli_parse_mint_with_proof_list() {
        let a = format!("0x{}", "01".repeat(32));
        let b = format!("0x{}", "02".repeat(32));
        let proof = format!("{a},{b}");
        let cli = Cli::try_parse_from([
            "pass", "--caller", ADDR, "mint", "--proof", &proof, "--value", "1",
        ])
        .unwrap();
        assert_eq!(cli.caller, Some(ADDR.parse().unwrap()));
        if let Commands::Mint(args) = cli.command {
            assert_eq!(args.proof.len(), 2);
            assert_eq!(args.value, pass_core::Amount::new(1));
        } else {
            panic!("expected mint");
        }
    }

    #[test]
    fn cli_parse_mint_proof_sources_conflict() {
        let a = format!("0x{}", "01".repeat(32));
        let result = Cli::try_parse_from([
            "pass", "mint", "--proof", &a, "--proofs-file", "wl.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parse_airdrop_batch() {
        let cli = Cli::try_parse_from(["pass", "airdrop-batch", ADDR, "100"]).unwrap();
        if let Commands::AirdropBatch(args) = cli.command {
            assert_eq!(args.count, 100);
        } else {
            panic!("expected airdrop-batch");
        }
    }

    #[test]
    fn cli_parse_airdrop_list_with_fee_hint() {
        let cli = Cli::try_parse_from([
            "pass", "airdrop-list", "recipients.csv", "--fee-hint", "40gwei",
        ])
        .unwrap();
        if let Commands::AirdropList(args) = cli.command {
            assert_eq!(args.list, PathBuf::from("recipients.csv"));
            assert_eq!(args.fee_hint.as_deref(), Some("40gwei"));
        } else {
            panic!("expected airdrop-list");
        }
    }

    #[test]
    fn cli_parse_public_mode() {
        assert!(Cli::try_parse_from(["pass", "activity", "public", "on"]).is_ok());
        assert!(Cli::try_parse_from(["pass", "activity", "public", "maybe"]).is_err());
    }

    #[test]
    fn cli_parse_rejects_bad_address() {
        assert!(Cli::try_parse_from(["pass", "airdrop", "0x1234"]).is_err());
    }

    #[test]
    fn cli_parse_verbose_levels() {
        let cli0 = Cli::try_parse_from(["pass", "query", "status"]).unwrap();
        assert_eq!(cli0.verbose, 0);
        let cli2 = Cli::try_parse_from(["pass", "-vv", "query", "status"]).unwrap();
        assert_eq!(cli2.verbose, 2);
    }

    #[test]
    fn cli_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pass", "query", "status", "--data-dir", "/tmp/p", "--log-json",
        ])
        .unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/p")));
        assert!(cli.log_json);
    }

    #[test]
    fn cli_parse_no_subcommand_errors() {
        assert!(Cli::try_parse_from(["pass"]).is_err());
    }
}

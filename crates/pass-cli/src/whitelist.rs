//! # Whitelist Subcommand
//!
//! Allowlist tooling that needs no activity state:
//!
//! - `build` reads an address list and writes the root plus one proof per
//!   member as JSON. The root is what `activity init` / `activity
//!   whitelist` take; the proofs go to the members.
//! - `verify` checks one address and proof against a root.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use pass_core::{Address, Hash32};
use pass_crypto::{verify_member, MerkleProof, MerkleTree};

use crate::recipients;

#[derive(Args, Debug)]
pub struct WhitelistArgs {
    #[command(subcommand)]
    pub command: WhitelistCommand,
}

#[derive(Subcommand, Debug)]
pub enum WhitelistCommand {
    /// Build the allowlist tree from an address list.
    Build {
        /// Address list (header line, then one address per line).
        list: PathBuf,
        /// Write the result here instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Check an address and proof against a root.
    Verify {
        #[arg(long)]
        address: Address,
        #[arg(long)]
        root: Hash32,
        /// Proof siblings, comma separated. Empty for a single-member list.
        #[arg(long, value_delimiter = ',')]
        proof: Vec<Hash32>,
    },
}

/// Output of `whitelist build`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistFile {
    pub root: Hash32,
    pub members: usize,
    pub proofs: BTreeMap<Address, MerkleProof>,
}

impl WhitelistFile {
    pub fn build(addresses: &[Address]) -> Result<Self> {
        let mut members = Vec::with_capacity(addresses.len());
        for a in addresses {
            if members.contains(a) {
                tracing::warn!(address = %a, "duplicate address in list, keeping first");
                continue;
            }
            members.push(*a);
        }
        let tree = MerkleTree::from_addresses(&members).context("address list is empty")?;
        let proofs = members
            .iter()
            .map(|a| Ok((*a, tree.proof_for(a)?)))
            .collect::<Result<BTreeMap<_, _>, pass_crypto::CryptoError>>()?;
        Ok(Self {
            root: tree.root(),
            members: members.len(),
            proofs,
        })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read whitelist file {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("failed to parse whitelist file {}", path.display()))
    }

    /// Proof for `address`, if it is a member.
    pub fn proof_for(&self, address: &Address) -> Option<&MerkleProof> {
        self.proofs.get(address)
    }
}

pub fn run_whitelist(args: &WhitelistArgs) -> Result<u8> {
    match &args.command {
        WhitelistCommand::Build { list, out } => {
            let addresses = recipients::read(list)?;
            let file = WhitelistFile::build(&addresses)?;
            let json = serde_json::to_string_pretty(&file)?;
            match out {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    println!("OK: {} members, root {}", file.members, file.root);
                }
                None => println!("{json}"),
            }
            Ok(0)
        }
        WhitelistCommand::Verify {
            address,
            root,
            proof,
        } => {
            let proof = MerkleProof::new(proof.clone());
            if !verify_member(address, &proof, root) {
                bail!("{address} is not a member of {root}");
            }
            println!("OK: {address} is a member of {root}");
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        let mut b = [0u8; 20];
        b[0] = 0x42;
        b[19] = n;
        Address::from_bytes(b)
    }

    #[test]
    fn every_member_gets_a_verifying_proof() {
        let list: Vec<Address> = (1..=5).map(addr).collect();
        let file = WhitelistFile::build(&list).unwrap();
        assert_eq!(file.members, 5);
        for a in &list {
            assert!(verify_member(a, file.proof_for(a).unwrap(), &file.root));
        }
        assert!(file.proof_for(&addr(9)).is_none());
    }

    #[test]
    fn duplicates_are_dropped() {
        let file = WhitelistFile::build(&[addr(1), addr(2), addr(1)]).unwrap();
        assert_eq!(file.members, 2);
        assert_eq!(
            file.root,
            MerkleTree::from_addresses(&[addr(1), addr(2)]).unwrap().root()
        );
    }

    #[test]
    fn empty_list_fails() {
        assert!(WhitelistFile::build(&[]).is_err());
    }

    #[test]
    fn file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wl.json");
        let file = WhitelistFile::build(&[addr(1), addr(2), addr(3)]).unwrap();
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();
        assert_eq!(WhitelistFile::read(&path).unwrap(), file);
    }
}

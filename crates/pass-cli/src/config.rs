//! # CLI Configuration
//!
//! Settings come from three layers, later ones winning:
//!
//! 1. `pass.yaml` (or the file given by `--config`).
//! 2. Environment: `PASS_DATA_DIR`, `PASS_ADMIN`, `PASS_TREASURY`.
//! 3. Command-line flags.
//!
//! ```yaml
//! data_dir: .pass
//! admin: "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
//! treasury: "0x5fbdb2315678afecb367f032d93f642f64180aa3"
//! log_json: false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use pass_core::{Address, ParseError};
use pass_crypto::keccak256;

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "pass.yaml";

const DEFAULT_DATA_DIR: &str = ".pass";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid address for {field}: {source}")]
    InvalidAddress {
        field: &'static str,
        source: ParseError,
    },
}

/// Contents of the YAML config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<PathBuf>,
    pub admin: Option<String>,
    pub treasury: Option<String>,
    pub log_json: Option<bool>,
}

impl FileConfig {
    /// Load `path`, or `pass.yaml` from the working directory if `path` is
    /// `None` and that file exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::Parse { path, source })
    }

    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data_dir: Option<PathBuf>,
    pub admin: Option<String>,
    pub treasury: Option<String>,
    pub log_json: bool,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Directory holding the sled database, token book included.
    pub data_dir: PathBuf,
    /// Admin address installed on first open, and the default caller for
    /// privileged commands.
    pub admin: Option<Address>,
    /// The engine's own payment-token account.
    pub treasury: Address,
    pub log_json: bool,
}

impl Settings {
    /// Resolve from the process environment.
    pub fn load(config: Option<&Path>, overrides: &Overrides) -> Result<Self, ConfigError> {
        let file = FileConfig::load(config)?;
        Self::resolve(file, |name| std::env::var(name).ok(), overrides)
    }

    /// Layer `file`, then `env`, then `overrides`.
    pub fn resolve(
        file: FileConfig,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self, ConfigError> {
        let data_dir = overrides
            .data_dir
            .clone()
            .or_else(|| env("PASS_DATA_DIR").map(PathBuf::from))
            .or(file.data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));

        let admin = overrides
            .admin
            .clone()
            .or_else(|| env("PASS_ADMIN"))
            .or(file.admin)
            .map(|s| parse_address("admin", &s))
            .transpose()?;

        let treasury = match overrides
            .treasury
            .clone()
            .or_else(|| env("PASS_TREASURY"))
            .or(file.treasury)
        {
            Some(s) => parse_address("treasury", &s)?,
            None => default_treasury(),
        };

        Ok(Self {
            data_dir,
            admin,
            treasury,
            log_json: overrides.log_json || file.log_json.unwrap_or(false),
        })
    }
}

fn parse_address(field: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidAddress { field, source })
}

/// Treasury used when none is configured: the low 20 bytes of
/// `keccak256("pass.treasury")`.
pub fn default_treasury() -> Address {
    let hash = keccak256(b"pass.treasury");
    let mut bytes = [0u8; 20];
    bytes.copy_from_slice(&hash.as_bytes()[12..]);
    Address::from_bytes(bytes)
}

//! Opened activity: sled store, local token book, and the engine over them.
//!
//! The token book shares the sled store with the engine, so a fee pull and
//! the issuance it pays for are written in one batch.

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use pass_core::Address;
use pass_engine::{AdminContext, IssuanceEngine, TokenBook};
use pass_store::{KvStore, SledStore};

use crate::config::Settings;

/// Subdirectory of the data directory holding the sled database.
pub const STATE_DIR: &str = "state";

pub struct Workspace {
    pub engine: IssuanceEngine,
    pub tokens: Arc<TokenBook>,
    settings: Settings,
}

impl Workspace {
    pub fn open(settings: &Settings) -> Result<Self> {
        let state_dir = settings.data_dir.join(STATE_DIR);
        std::fs::create_dir_all(&state_dir).with_context(|| {
            format!("failed to create data directory {}", state_dir.display())
        })?;
        let store: Arc<dyn KvStore> = Arc::new(
            SledStore::open(&state_dir)
                .with_context(|| format!("failed to open store in {}", state_dir.display()))?,
        );

        let tokens = Arc::new(TokenBook::shared(store.clone()));
        let deployer = settings.admin.unwrap_or(Address::ZERO);
        let engine = IssuanceEngine::open(store, tokens.clone(), settings.treasury, deployer)
            .context("failed to open activity (first use needs an admin: set `admin` in pass.yaml, PASS_ADMIN, or --admin)")?;

        tracing::debug!(
            data_dir = %settings.data_dir.display(),
            treasury = %settings.treasury,
            "workspace opened"
        );
        Ok(Self {
            engine,
            tokens,
            settings: settings.clone(),
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Capability for a privileged command: `--caller` if given, else the
    /// configured admin.
    pub fn admin_ctx(&self, caller: Option<Address>) -> Result<AdminContext> {
        match caller.or(self.settings.admin) {
            Some(c) => Ok(AdminContext::new(c)),
            None => bail!("privileged command needs --caller or a configured admin"),
        }
    }

    /// Identity acting in a holder command.
    pub fn caller(&self, caller: Option<Address>) -> Result<Address> {
        match caller {
            Some(c) => Ok(c),
            None => bail!("this command needs --caller"),
        }
    }
}

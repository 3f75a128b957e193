//! Admin capability.
//!
//! Every privileged engine method takes an [`AdminContext`] naming the
//! caller. The engine compares it with the admin address held in the store
//! on entry, before touching any other state. There is no process-wide
//! notion of "the current admin".

use serde::{Deserialize, Serialize};
use tracing::warn;

use pass_core::Address;
use pass_store::keys;

use crate::error::IssuanceError;
use crate::txn::Txn;

/// Caller identity presented to a privileged operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdminContext {
    caller: Address,
}

impl AdminContext {
    pub fn new(caller: Address) -> Self {
        Self { caller }
    }

    pub fn caller(&self) -> Address {
        self.caller
    }
}

/// The stored admin address.
pub(crate) fn current_admin(txn: &Txn<'_>) -> Result<Address, IssuanceError> {
    match txn.get(keys::ADMIN)? {
        Some(v) => Ok(keys::decode_address(keys::ADMIN, &v)?),
        None => Ok(Address::ZERO),
    }
}

/// Fail with `Unauthorized` unless `ctx` names the stored admin.
pub(crate) fn require_admin(
    txn: &Txn<'_>,
    ctx: &AdminContext,
    operation: &'static str,
) -> Result<Address, IssuanceError> {
    let admin = current_admin(txn)?;
    if admin.is_zero() || ctx.caller != admin {
        warn!(caller = %ctx.caller, operation, "privileged call rejected");
        return Err(IssuanceError::Unauthorized { caller: ctx.caller });
    }
    Ok(admin)
}

pub(crate) fn set_admin(txn: &mut Txn<'_>, admin: &Address) {
    txn.put(keys::ADMIN.to_vec(), admin.as_bytes().to_vec());
}

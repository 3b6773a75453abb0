//! Storage trait definitions.

use crate::domain::{AccountRecord, Amount};
use crate::error::Result;

/// Durable store of account ledgers, keyed by username.
pub trait LedgerStore: Send + Sync {
    /// Read the record and replay its ledger.
    ///
    /// Any unreadable entry fails the whole load; a partially summed balance
    /// is never returned.
    fn load(&self, username: &str) -> Result<AccountRecord>;

    /// Append one delta to an existing record.
    fn append(&self, username: &str, delta: &Amount) -> Result<()>;

    /// Write a fresh record with a zero balance. Fails if one already exists.
    fn create(&self, username: &str, password: &str) -> Result<()>;
}

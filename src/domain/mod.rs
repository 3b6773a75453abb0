//! Domain types for the balance checker
//!
//! - Amount: decimal ledger value with the wire/file text format
//! - AccountRecord: one persisted account (header fields plus ledger entries)
//! - Role: regular user or administrator

pub mod account;
pub mod amount;

pub use account::{AccountRecord, Role, validate_username};
pub use amount::Amount;

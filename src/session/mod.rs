//! Account sessions - per-connection authentication state over a ledger store.

mod account;

pub use account::{AccountSession, AuthOutcome};

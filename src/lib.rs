//! Balance checker - remote account balances over TCP
//!
//! A server keeps one append-only ledger file per user and serves a
//! line-based protocol; an interactive client renders the session as a
//! prompt menu.

pub mod client;
pub mod dispatch;
pub mod domain;
pub mod error;
pub mod id;
pub mod ipc;
pub mod session;
pub mod storage;

pub use error::{BalanceError, Result};

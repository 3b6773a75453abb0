//! Storage layer - per-user append-only ledger files.
//!
//! Every account lives in its own plain-text file under the users directory:
//!
//! ```text
//! line 1: username
//! line 2: password (cleartext)
//! line 3: admin flag ("true" | "false")
//! line 4+: one signed decimal delta per line
//! ```
//!
//! There is no locking. Two connections touching the same account may
//! interleave a replay with an append.

mod file;
mod traits;

pub use file::FileLedger;
pub use traits::LedgerStore;

//! Persisted account records.

use std::fmt;

use crate::domain::amount::Amount;
use crate::error::{BalanceError, Result};

/// Privilege level of an authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parse the admin flag line of a record: `true` (any case) is admin,
    /// anything else is a regular user.
    pub fn from_admin_flag(flag: &str) -> Self {
        if flag.trim().eq_ignore_ascii_case("true") {
            Role::Admin
        } else {
            Role::User
        }
    }

    pub fn admin_flag(&self) -> &'static str {
        match self {
            Role::Admin => "true",
            Role::User => "false",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One account as reconstructed from its ledger file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub username: String,
    pub password: String,
    pub role: Role,
    /// Ledger deltas in file order.
    pub entries: Vec<Amount>,
}

impl AccountRecord {
    /// A freshly created account: regular user with a single zero entry.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role: Role::User,
            entries: vec![Amount::zero()],
        }
    }

    /// Balance is never stored; it is the sum of all ledger entries.
    pub fn balance(&self) -> Amount {
        self.entries.iter().sum()
    }

    /// Clear-text comparison of the stored secret.
    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

/// Check that a username can be used as a file name under the users directory
/// and echoed on the wire without colliding with the protocol framing.
pub fn validate_username(username: &str) -> Result<()> {
    let invalid = username.is_empty()
        || username == "."
        || username == ".."
        || username
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '_') || c.is_whitespace() || c.is_control());
    if invalid {
        return Err(BalanceError::InvalidUsername(username.to_string()));
    }
    Ok(())
}

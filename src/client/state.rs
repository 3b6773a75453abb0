//! Client-side mirror of the server session.

use crate::domain::Amount;
use crate::error::Result;
use crate::ipc::messages::{Message, Tag};

/// What the client knows about its own session, rebuilt from response tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientState {
    logged_in: bool,
    admin: bool,
    username: String,
    balance: Amount,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn balance(&self) -> &Amount {
        &self.balance
    }

    /// Label shown next to the username in the prompt.
    pub fn level(&self) -> &'static str {
        if self.admin { "Administrator" } else { "Regular User" }
    }

    pub fn log_out(&mut self) {
        *self = Self::default();
    }

    /// Update from one session-related message. Other tags are ignored.
    ///
    /// A `balance` payload that is not a decimal resets the balance to zero
    /// and reports the error.
    pub fn apply(&mut self, message: &Message) -> Result<()> {
        match message.tag {
            Tag::Login => match message.payload.as_str() {
                "admin" => {
                    self.logged_in = true;
                    self.admin = true;
                }
                "user" => {
                    self.logged_in = true;
                    self.admin = false;
                }
                _ => self.log_out(),
            },
            Tag::Username if self.logged_in => self.username = message.payload.clone(),
            Tag::Logout => self.log_out(),
            Tag::Balance if self.logged_in => match message.payload.parse() {
                Ok(balance) => self.balance = balance,
                Err(e) => {
                    self.balance = Amount::zero();
                    return Err(e);
                }
            },
            _ => {}
        }
        Ok(())
    }
}

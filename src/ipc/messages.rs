//! Protocol message types for client ↔ server communication.
//!
//! Server → client traffic is a batch of tagged messages on one line.
//! Client → server traffic is a plain command line.

use std::fmt;
use std::str::FromStr;

use crate::error::BalanceError;

/// Semantic kind of one response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Free-form message for the user.
    Text,
    /// Name of the logged-in account, or `null`.
    Username,
    /// `admin`, `user` or `null` after a login attempt.
    Login,
    /// Session was logged out.
    Logout,
    /// Current balance of the caller.
    Balance,
    /// Raw help catalog.
    Help,
    /// Operation refused.
    ActionNotAllowed,
}

impl Tag {
    pub const ALL: [Tag; 7] = [
        Tag::Text,
        Tag::Username,
        Tag::Login,
        Tag::Logout,
        Tag::Balance,
        Tag::Help,
        Tag::ActionNotAllowed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Text => "text",
            Tag::Username => "username",
            Tag::Login => "login",
            Tag::Logout => "logout",
            Tag::Balance => "balance",
            Tag::Help => "help",
            Tag::ActionNotAllowed => "actionnotallowed",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tag {
    type Err = BalanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| BalanceError::UnknownTag(s.to_string()))
    }
}

/// One `(tag, payload)` pair of a response batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub tag: Tag,
    pub payload: String,
}

impl Message {
    pub fn new(tag: Tag, payload: impl Into<String>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// Free-form text for the user.
    pub fn text(payload: impl Into<String>) -> Self {
        Self::new(Tag::Text, payload)
    }

    /// A message whose payload carries no information.
    pub fn marker(tag: Tag) -> Self {
        Self::new(tag, "")
    }
}

/// Commands understood by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Help,
    Login,
    Balance,
    Withdraw,
    Logout,
    ChangeBalance,
    CheckBalance,
    CreateUser,
    Quit,
    Unknown,
}

impl Command {
    /// Look up a command by name, ignoring case. `exit` is an alias of `quit`.
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "help" => Command::Help,
            "login" => Command::Login,
            "balance" => Command::Balance,
            "withdraw" => Command::Withdraw,
            "logout" => Command::Logout,
            "changebalance" => Command::ChangeBalance,
            "checkbalance" => Command::CheckBalance,
            "createuser" => Command::CreateUser,
            "quit" | "exit" => Command::Quit,
            _ => Command::Unknown,
        }
    }

    /// Canonical name, also the key into the help catalog.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Help => "help",
            Command::Login => "login",
            Command::Balance => "balance",
            Command::Withdraw => "withdraw",
            Command::Logout => "logout",
            Command::ChangeBalance => "changebalance",
            Command::CheckBalance => "checkbalance",
            Command::CreateUser => "createuser",
            Command::Quit => "quit",
            Command::Unknown => "unknown",
        }
    }
}

/// A decoded request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Command name as typed, lower-cased.
    pub name: String,
    pub command: Command,
    /// Up to two arguments; the second holds the rest of the line verbatim.
    pub args: Vec<String>,
}

impl Request {
    pub fn new(name: impl Into<String>, args: Vec<String>) -> Self {
        let name = name.into().to_ascii_lowercase();
        let command = Command::from_name(&name);
        Self { name, command, args }
    }

    /// The request implied by the peer closing its side of the connection.
    pub fn quit() -> Self {
        Self::new("quit", Vec::new())
    }

    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn argc(&self) -> usize {
        self.args.len()
    }
}

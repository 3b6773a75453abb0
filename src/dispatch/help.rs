//! Help catalog sent to clients.
//!
//! Each catalog line starts with a visibility marker that the client uses to
//! filter the menu: `!` anonymous only, `*` logged in only, space for both.

use crate::ipc::messages::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Anonymous,
    Authenticated,
    Everyone,
}

impl Visibility {
    pub fn marker(&self) -> char {
        match self {
            Visibility::Anonymous => '!',
            Visibility::Authenticated => '*',
            Visibility::Everyone => ' ',
        }
    }

    pub fn from_marker(marker: char) -> Option<Self> {
        match marker {
            '!' => Some(Visibility::Anonymous),
            '*' => Some(Visibility::Authenticated),
            ' ' => Some(Visibility::Everyone),
            _ => None,
        }
    }

    pub fn visible_to(&self, logged_in: bool) -> bool {
        match self {
            Visibility::Everyone => true,
            Visibility::Anonymous => !logged_in,
            Visibility::Authenticated => logged_in,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HelpEntry {
    pub command: Command,
    pub visibility: Visibility,
    pub usage: &'static str,
}

const fn entry(command: Command, visibility: Visibility, usage: &'static str) -> HelpEntry {
    HelpEntry {
        command,
        visibility,
        usage,
    }
}

const COMMANDS: &[HelpEntry] = &[
    entry(
        Command::Help,
        Visibility::Everyone,
        "help [command] - this help message or command usage if [command] is defined",
    ),
    entry(
        Command::Login,
        Visibility::Anonymous,
        "login <login> <password> - login as user with specified <login>/<password> pair",
    ),
    entry(Command::Balance, Visibility::Authenticated, "balance - shows actual account balance"),
    entry(
        Command::Withdraw,
        Visibility::Authenticated,
        "withdraw <amount> - withdraw <amount> of money from your account",
    ),
    entry(Command::Logout, Visibility::Authenticated, "logout - log out from system"),
    entry(Command::Quit, Visibility::Everyone, "quit - close connection"),
];

const ADMIN_COMMANDS: &[HelpEntry] = &[
    entry(
        Command::ChangeBalance,
        Visibility::Authenticated,
        "changeBalance <username> <amount> - change balance of <username> by <amount>",
    ),
    entry(
        Command::CheckBalance,
        Visibility::Authenticated,
        "checkBalance <username> - check balance for given user",
    ),
    entry(
        Command::CreateUser,
        Visibility::Authenticated,
        "createUser <username> <password> - create new user with given username/password",
    ),
];

/// Full catalog for the help message; admin commands come first for admins.
pub fn full_help(is_admin: bool) -> String {
    let admin: &[HelpEntry] = if is_admin { ADMIN_COMMANDS } else { &[] };
    let lines: Vec<String> = admin
        .iter()
        .chain(COMMANDS)
        .map(|e| format!("{}{}", e.visibility.marker(), e.usage))
        .collect();
    format!("Available commands:\n{}", lines.join("\n"))
}

/// `Command usage: ...` for a command the caller can see, `None` otherwise.
pub fn usage(name: &str, logged_in: bool, is_admin: bool) -> Option<String> {
    let command = Command::from_name(name);
    let found = COMMANDS
        .iter()
        .find(|e| e.command == command)
        .or_else(|| {
            if is_admin {
                ADMIN_COMMANDS.iter().find(|e| e.command == command)
            } else {
                None
            }
        })?;
    if !found.visibility.visible_to(logged_in) {
        return None;
    }
    Some(format!("Command usage: {}", found.usage))
}

/// Menu lines for the given login state, markers stripped.
///
/// Lines without a known marker (such as the catalog header) are dropped.
pub fn filter_help(catalog: &str, logged_in: bool) -> Vec<String> {
    catalog
        .lines()
        .filter_map(|line| {
            let mut chars = line.chars();
            let visibility = Visibility::from_marker(chars.next()?)?;
            visibility.visible_to(logged_in).then(|| chars.as_str().to_string())
        })
        .collect()
}

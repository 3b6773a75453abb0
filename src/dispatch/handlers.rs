//! Command handlers.
//!
//! Each handler checks its own role and argument-count guards, then appends
//! zero or more messages to the outgoing batch. A failed guard answers with
//! the command's usage text (or the unknown-command message when the caller
//! cannot see that command).

use log::debug;

use super::help;
use crate::domain::Amount;
use crate::ipc::messages::{Command, Message, Request, Tag};
use crate::session::{AccountSession, AuthOutcome};

pub const UNKNOWN_COMMAND: &str = "Unknown command, type help to list all available commands.";
pub const INVALID_LOGIN: &str = "Invalid login and/or password";
pub const LOGGED_OUT: &str = "You are safely logged out";

/// What the dispatcher does after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Close,
}

pub type Handler = fn(&mut AccountSession, &Request, &mut Vec<Message>) -> Flow;

/// Map a command to the function that serves it.
pub fn handler_for(command: Command) -> Handler {
    match command {
        Command::Help => handle_help,
        Command::Login => handle_login,
        Command::Balance => handle_balance,
        Command::Withdraw => handle_withdraw,
        Command::Logout => handle_logout,
        Command::ChangeBalance => handle_change_balance,
        Command::CheckBalance => handle_check_balance,
        Command::CreateUser => handle_create_user,
        Command::Quit => handle_quit,
        Command::Unknown => handle_unknown,
    }
}

/// Help message with the catalog as the caller currently sees it.
pub fn full_help(session: &AccountSession) -> Message {
    Message::new(Tag::Help, help::full_help(session.is_admin()))
}

fn usage_or_unknown(session: &AccountSession, name: &str, out: &mut Vec<Message>) -> Flow {
    match help::usage(name, session.is_logged_in(), session.is_admin()) {
        Some(text) => out.push(Message::text(text)),
        None => out.push(Message::text(UNKNOWN_COMMAND)),
    }
    Flow::Continue
}

/// `balance` tag plus a readable line, or a refusal when the balance is unknown.
fn balance_block(balance: Option<&Amount>, out: &mut Vec<Message>) {
    match balance {
        Some(b) => {
            out.push(Message::new(Tag::Balance, b.to_string()));
            out.push(Message::text(format!("Your balance: {}", b)));
        }
        None => out.push(Message::marker(Tag::ActionNotAllowed)),
    }
}

/// Balance of another account as plain text, or a refusal.
fn value_block(balance: Option<Amount>, out: &mut Vec<Message>) {
    match balance {
        Some(b) => out.push(Message::text(b.to_string())),
        None => out.push(Message::marker(Tag::ActionNotAllowed)),
    }
}

fn handle_help(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    match request.arg(0) {
        Some(name) if request.argc() == 1 => usage_or_unknown(session, name, out),
        _ => {
            out.push(full_help(session));
            Flow::Continue
        }
    }
}

fn handle_login(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    let (Some(username), Some(password), 2) = (request.arg(0), request.arg(1), request.argc()) else {
        return usage_or_unknown(session, Command::Login.name(), out);
    };

    match session.authenticate(username, password) {
        AuthOutcome::Rejected => {
            out.push(Message::new(Tag::Login, "null"));
            out.push(Message::new(Tag::Username, "null"));
            out.push(Message::text(INVALID_LOGIN));
        }
        outcome => {
            let role = if outcome == AuthOutcome::Admin { "admin" } else { "user" };
            out.push(Message::new(Tag::Login, role));
            out.push(Message::new(Tag::Username, session.username().unwrap_or_default()));
            balance_block(session.balance(), out);
            out.push(full_help(session));
        }
    }
    Flow::Continue
}

fn handle_balance(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    if !session.is_logged_in() {
        return usage_or_unknown(session, request.command.name(), out);
    }
    let balance = session.reload_balance();
    balance_block(balance.as_ref(), out);
    Flow::Continue
}

fn handle_withdraw(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    let (true, Some(amount), 1) = (session.is_logged_in(), request.arg(0), request.argc()) else {
        return usage_or_unknown(session, request.command.name(), out);
    };

    match session.withdraw(amount) {
        Ok(balance) => balance_block(Some(&balance), out),
        Err(e) => {
            debug!("Withdraw of {:?} refused: {}", amount, e);
            out.push(Message::marker(Tag::ActionNotAllowed));
        }
    }
    Flow::Continue
}

fn handle_logout(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    if !session.is_logged_in() {
        return usage_or_unknown(session, request.command.name(), out);
    }
    session.logout();
    out.push(Message::marker(Tag::Logout));
    out.push(Message::text(LOGGED_OUT));
    Flow::Continue
}

fn handle_change_balance(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    let (true, Some(target), Some(amount), 2) =
        (session.is_admin(), request.arg(0), request.arg(1), request.argc())
    else {
        return usage_or_unknown(session, request.command.name(), out);
    };
    value_block(session.change_balance_of(target, amount), out);
    Flow::Continue
}

fn handle_check_balance(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    let (true, Some(target), 1) = (session.is_admin(), request.arg(0), request.argc()) else {
        return usage_or_unknown(session, request.command.name(), out);
    };
    value_block(session.check_balance_of(target), out);
    Flow::Continue
}

fn handle_create_user(session: &mut AccountSession, request: &Request, out: &mut Vec<Message>) -> Flow {
    let (true, Some(username), Some(password), 2) =
        (session.is_admin(), request.arg(0), request.arg(1), request.argc())
    else {
        return usage_or_unknown(session, request.command.name(), out);
    };
    let text = match session.create_account(username, password) {
        Ok(()) => "Success",
        Err(e) => {
            debug!("Creating {} failed: {}", username, e);
            "Failed"
        }
    };
    out.push(Message::text(text));
    Flow::Continue
}

fn handle_quit(_session: &mut AccountSession, _request: &Request, _out: &mut Vec<Message>) -> Flow {
    Flow::Close
}

fn handle_unknown(_session: &mut AccountSession, _request: &Request, out: &mut Vec<Message>) -> Flow {
    out.push(Message::text(UNKNOWN_COMMAND));
    Flow::Continue
}

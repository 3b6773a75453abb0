//! Prompt rendering for the interactive client.

use colored::*;

use super::state::ClientState;
use crate::dispatch::help::filter_help;

const SEPARATOR: &str = "-----------------------------------------";

pub const UNKNOWN_RESPONSE: &str = "Server response contains errors";
pub const NOT_ALLOWED: &str = "You are not allowed to perform this action";

/// Buffers server output between prompts and keeps the last help catalog.
#[derive(Debug, Clone, Default)]
pub struct ClientView {
    output: Vec<String>,
    help: String,
}

impl ClientView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a line for the next prompt.
    pub fn print(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
    }

    pub fn unknown_response(&mut self) {
        self.print(UNKNOWN_RESPONSE);
    }

    pub fn not_allowed(&mut self) {
        self.print(NOT_ALLOWED);
    }

    pub fn set_help(&mut self, catalog: impl Into<String>) {
        self.help = catalog.into();
    }

    /// Help lines visible in the given login state.
    pub fn help_lines(&self, logged_in: bool) -> Vec<String> {
        filter_help(&self.help, logged_in)
    }

    pub fn pending_output(&self) -> &[String] {
        &self.output
    }

    /// Build the menu shown before each input and clear the output buffer.
    pub fn render_prompt(&mut self, state: &ClientState) -> String {
        let separator = SEPARATOR.dimmed();
        let mut menu = Vec::new();

        menu.push(separator.to_string());
        if state.is_logged_in() {
            menu.push(format!("{} ({})", state.username().bold(), state.level().cyan()));
            menu.push(separator.to_string());
            menu.push(format!("Your balance: {} $", state.balance().to_string().green()));
        } else {
            menu.push("You are not logged in".yellow().to_string());
        }

        menu.push(separator.to_string());
        menu.extend(self.help_lines(state.is_logged_in()));
        menu.push(separator.to_string());

        let output = if self.output.is_empty() {
            "[Empty]".to_string()
        } else {
            self.output.join("\n")
        };
        menu.push(format!("Server output: {}", output));
        menu.push(separator.to_string());
        self.output.clear();

        format!("{}\n\n$ ", menu.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::help::full_help;
    use crate::ipc::messages::{Message, Tag};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_anonymous_prompt() {
        plain();
        let mut view = ClientView::new();
        view.set_help(full_help(false));
        let prompt = view.render_prompt(&ClientState::new());

        assert!(prompt.contains("You are not logged in"));
        assert!(prompt.contains("\nlogin <login> <password>"));
        assert!(!prompt.contains("withdraw"));
        assert!(prompt.contains("Server output: [Empty]"));
        assert!(prompt.ends_with("\n\n$ "));
    }

    #[test]
    fn test_logged_in_prompt() {
        plain();
        let mut state = ClientState::new();
        state.apply(&Message::new(Tag::Login, "user")).unwrap();
        state.apply(&Message::new(Tag::Username, "alice")).unwrap();
        state.apply(&Message::new(Tag::Balance, "12.5")).unwrap();

        let mut view = ClientView::new();
        view.set_help(full_help(false));
        view.print("Your balance: 12.5");
        let prompt = view.render_prompt(&state);

        assert!(prompt.contains("alice (Regular User)"));
        assert!(prompt.contains("Your balance: 12.5 $"));
        assert!(prompt.contains("withdraw <amount>"));
        assert!(!prompt.contains("login <login>"));
        assert!(prompt.contains("Server output: Your balance: 12.5"));
    }

    #[test]
    fn test_prompt_clears_output() {
        plain();
        let mut view = ClientView::new();
        view.not_allowed();
        view.unknown_response();
        assert_eq!(view.pending_output(), &[NOT_ALLOWED, UNKNOWN_RESPONSE]);

        let prompt = view.render_prompt(&ClientState::new());
        assert!(prompt.contains(NOT_ALLOWED));
        assert!(view.pending_output().is_empty());
    }

    #[test]
    fn test_no_help_before_catalog() {
        let view = ClientView::new();
        assert!(view.help_lines(false).is_empty());
    }
}

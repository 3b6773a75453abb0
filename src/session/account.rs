//! Per-connection account session.
//!
//! A session starts anonymous, becomes authenticated as a user or admin after
//! a successful login, and returns to anonymous on logout or failed login.
//! The cached balance is only meaningful while authenticated.

use std::sync::Arc;

use log::{debug, warn};

use crate::domain::{Amount, Role};
use crate::error::{BalanceError, Result};
use crate::storage::LedgerStore;

/// Result of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Admin,
    User,
    Rejected,
}

impl From<Role> for AuthOutcome {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => AuthOutcome::Admin,
            Role::User => AuthOutcome::User,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionState {
    Anonymous,
    Authenticated {
        username: String,
        role: Role,
        /// `None` when the ledger could not be replayed.
        balance: Option<Amount>,
    },
}

/// In-memory view of one client's identity and balance.
pub struct AccountSession {
    store: Arc<dyn LedgerStore>,
    state: SessionState,
}

impl std::fmt::Debug for AccountSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSession")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl AccountSession {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self {
            store,
            state: SessionState::Anonymous,
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn is_admin(&self) -> bool {
        self.role().is_some_and(|r| r.is_admin())
    }

    pub fn role(&self) -> Option<Role> {
        match &self.state {
            SessionState::Authenticated { role, .. } => Some(*role),
            SessionState::Anonymous => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Anonymous => None,
        }
    }

    /// Cached balance from the last replay of the ledger.
    pub fn balance(&self) -> Option<&Amount> {
        match &self.state {
            SessionState::Authenticated { balance, .. } => balance.as_ref(),
            SessionState::Anonymous => None,
        }
    }

    /// Log in against the stored record.
    ///
    /// An already authenticated session keeps its identity and reports it
    /// again without touching the store. A mismatch resets to anonymous.
    pub fn authenticate(&mut self, username: &str, password: &str) -> AuthOutcome {
        if let Some(role) = self.role() {
            return role.into();
        }

        match self.store.load(username) {
            Ok(record) if record.username == username && record.password_matches(password) => {
                let role = record.role;
                self.state = SessionState::Authenticated {
                    username: record.username.clone(),
                    role,
                    balance: Some(record.balance()),
                };
                debug!("Authenticated {} as {}", username, role);
                role.into()
            }
            Ok(_) => {
                debug!("Credential mismatch for {}", username);
                self.logout();
                AuthOutcome::Rejected
            }
            Err(e) => {
                debug!("Login for {} failed: {}", username, e);
                self.logout();
                AuthOutcome::Rejected
            }
        }
    }

    pub fn logout(&mut self) {
        self.state = SessionState::Anonymous;
    }

    /// Replay the logged-in user's ledger into the cached balance.
    ///
    /// A failed replay drops the session back to anonymous.
    pub fn reload_balance(&mut self) -> Option<Amount> {
        let username = self.username()?.to_string();
        match self.store.load(&username) {
            Ok(record) => {
                let fresh = record.balance();
                if let SessionState::Authenticated { balance, .. } = &mut self.state {
                    *balance = Some(fresh.clone());
                }
                Some(fresh)
            }
            Err(e) => {
                warn!("Reloading balance of {} failed, logging out: {}", username, e);
                self.logout();
                None
            }
        }
    }

    /// Take `amount_text` out of the caller's own account.
    ///
    /// Only strictly positive amounts up to the current balance are accepted.
    /// The returned balance is replayed from the store after the append.
    pub fn withdraw(&mut self, amount_text: &str) -> Result<Amount> {
        let username = self
            .username()
            .ok_or_else(|| BalanceError::NotAllowed("withdraw requires login".into()))?
            .to_string();
        let amount = Amount::parse(amount_text)?;
        let delta = -amount.clone();

        let balance = self
            .reload_balance()
            .ok_or_else(|| BalanceError::NotAllowed(format!("balance of {} unavailable", username)))?;

        if !delta.is_negative() {
            return Err(BalanceError::NotAllowed(format!("cannot withdraw {}", amount)));
        }
        if balance < amount {
            return Err(BalanceError::NotAllowed(format!(
                "insufficient funds: {} < {}",
                balance, amount
            )));
        }

        self.store.append(&username, &delta)?;
        self.reload_balance()
            .ok_or_else(|| BalanceError::NotAllowed(format!("balance of {} unavailable", username)))
    }

    /// Admin correction of another account: any sign is accepted.
    ///
    /// Returns the target's replayed balance, or `None` if the caller is not
    /// an admin, the amount does not parse, or the target cannot be loaded.
    pub fn change_balance_of(&self, target: &str, amount_text: &str) -> Option<Amount> {
        if !self.is_admin() {
            return None;
        }
        let amount = Amount::parse(amount_text).ok()?;
        self.store.load(target).ok()?;
        if let Err(e) = self.store.append(target, &amount) {
            warn!("Changing balance of {} failed: {}", target, e);
            return None;
        }
        self.store.load(target).ok().map(|r| r.balance())
    }

    /// Admin lookup of another account's balance.
    pub fn check_balance_of(&self, target: &str) -> Option<Amount> {
        if !self.is_admin() {
            return None;
        }
        self.store.load(target).ok().map(|r| r.balance())
    }

    /// Admin creation of a new regular account.
    pub fn create_account(&self, username: &str, password: &str) -> Result<()> {
        if !self.is_admin() {
            return Err(BalanceError::NotAllowed("createuser requires admin".into()));
        }
        self.store.create(username, password)
    }
}

//! Connection identifiers.
//!
//! The acceptor owns a single counter and hands each new connection its id
//! by value; nothing else is shared between connections.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one accepted connection, used to tag its log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn {}", self.0)
    }
}

/// Monotonic source of connection ids, starting at 1.
#[derive(Debug)]
pub struct ConnectionIds {
    next: AtomicU64,
}

impl ConnectionIds {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionIds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_start_at_one_and_increment() {
        let ids = ConnectionIds::new();
        assert_eq!(ids.next_id().value(), 1);
        assert_eq!(ids.next_id().value(), 2);
        assert_eq!(ids.next_id().value(), 3);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn 7");
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let ids = Arc::new(ConnectionIds::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ids = Arc::clone(&ids);
                std::thread::spawn(move || (0..100).map(|_| ids.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 800);
    }
}

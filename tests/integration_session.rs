//! End-to-end session tests
//!
//! Runs a real server on an ephemeral port against a temporary users
//! directory and drives it through the client connection.

use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;

use balance_checker::client;
use balance_checker::error::Result;
use balance_checker::ipc::{AccountServer, Batch, Message, ServerConnection, Tag};
use balance_checker::storage::{FileLedger, LedgerStore};
use tempfile::TempDir;

struct Harness {
    dir: TempDir,
    addr: SocketAddr,
}

impl Harness {
    async fn start() -> Result<Self> {
        let dir = TempDir::new()?;
        let ledger = FileLedger::open(dir.path())?;
        fs::write(dir.path().join("root"), "root\ntoor\ntrue\n0.0\n")?;

        let server = AccountServer::bind("127.0.0.1:0", Arc::new(ledger)).await?;
        let addr = server.local_addr()?;
        tokio::spawn(server.serve());
        Ok(Self { dir, addr })
    }

    /// Connect and consume the greeting.
    async fn connect(&self) -> Result<ServerConnection> {
        let mut conn = ServerConnection::connect("127.0.0.1", self.addr.port()).await?;
        let greeting = conn.recv_batch().await?.expect("greeting");
        assert_eq!(greeting.len(), 1);
        Ok(conn)
    }

    fn ledger(&self) -> FileLedger {
        FileLedger::open(self.dir.path()).unwrap()
    }
}

async fn request(conn: &mut ServerConnection, line: &str) -> Vec<Message> {
    conn.send_line(line).await.unwrap();
    let batch: Batch = conn.recv_batch().await.unwrap().expect("reply");
    batch.into_iter().map(|m| m.unwrap()).collect()
}

fn find<'a>(messages: &'a [Message], tag: Tag) -> Option<&'a str> {
    messages.iter().find(|m| m.tag == tag).map(|m| m.payload.as_str())
}

#[tokio::test]
async fn test_withdraw_scenario() -> Result<()> {
    let harness = Harness::start().await?;

    let mut admin = harness.connect().await?;
    let reply = request(&mut admin, "login root toor").await;
    assert_eq!(find(&reply, Tag::Login), Some("admin"));
    let reply = request(&mut admin, "createuser alice secret").await;
    assert_eq!(find(&reply, Tag::Text), Some("Success"));

    let mut alice = harness.connect().await?;
    let reply = request(&mut alice, "login alice secret").await;
    assert_eq!(find(&reply, Tag::Login), Some("user"));
    assert_eq!(find(&reply, Tag::Username), Some("alice"));
    assert_eq!(find(&reply, Tag::Balance), Some("0.0"));

    let reply = request(&mut alice, "withdraw 5").await;
    assert_eq!(reply, vec![Message::new(Tag::ActionNotAllowed, "actionnotallowed")]);

    let reply = request(&mut admin, "changebalance alice 20").await;
    assert_eq!(find(&reply, Tag::Text), Some("20.0"));

    let reply = request(&mut alice, "logout").await;
    assert_eq!(find(&reply, Tag::Logout), Some("logout"));
    let reply = request(&mut alice, "login alice secret").await;
    assert_eq!(find(&reply, Tag::Balance), Some("20.0"));

    let reply = request(&mut alice, "withdraw 5").await;
    assert_eq!(find(&reply, Tag::Balance), Some("15.0"));
    assert_eq!(find(&reply, Tag::Text), Some("Your balance: 15.0"));

    let record = harness.ledger().load("alice")?;
    assert_eq!(record.balance().to_string(), "15.0");
    assert_eq!(record.entries.len(), 3);
    Ok(())
}

#[tokio::test]
async fn test_wrong_password_stays_anonymous() -> Result<()> {
    let harness = Harness::start().await?;
    harness.ledger().create("alice", "secret")?;

    let mut conn = harness.connect().await?;
    let reply = request(&mut conn, "login alice wrong").await;
    assert_eq!(find(&reply, Tag::Login), Some("null"));
    assert_eq!(find(&reply, Tag::Text), Some("Invalid login and/or password"));

    let reply = request(&mut conn, "balance").await;
    assert_eq!(
        find(&reply, Tag::Text),
        Some("Unknown command, type help to list all available commands.")
    );
    Ok(())
}

#[tokio::test]
async fn test_corrupt_ledger_logs_user_out() -> Result<()> {
    let harness = Harness::start().await?;
    harness.ledger().create("alice", "secret")?;

    let mut conn = harness.connect().await?;
    request(&mut conn, "login alice secret").await;

    let path = harness.dir.path().join("alice");
    let mut content = fs::read_to_string(&path)?;
    content.push_str("not-a-number\n");
    fs::write(&path, content)?;

    let reply = request(&mut conn, "balance").await;
    assert_eq!(reply, vec![Message::new(Tag::ActionNotAllowed, "actionnotallowed")]);

    let reply = request(&mut conn, "withdraw 1").await;
    assert!(find(&reply, Tag::Text).unwrap().starts_with("Unknown command"));
    Ok(())
}

#[tokio::test]
async fn test_interactive_client_session() -> Result<()> {
    colored::control::set_override(false);
    let harness = Harness::start().await?;
    harness.ledger().create("alice", "secret")?;
    harness.ledger().append("alice", &"7.25".parse()?)?;

    let conn = ServerConnection::connect("127.0.0.1", harness.addr.port()).await?;
    let input: &[u8] = b"login alice secret\nwithdraw 100\nEXIT\n";
    let mut out = Vec::new();
    client::run(conn, input, &mut out).await?;

    let screen = String::from_utf8(out).unwrap();
    let prompts: Vec<&str> = screen.split("$ ").collect();
    assert_eq!(prompts.len(), 4);
    assert!(prompts[0].contains("You are not logged in"));
    assert!(prompts[1].contains("alice (Regular User)"));
    assert!(prompts[1].contains("Your balance: 7.25 $"));
    assert!(prompts[2].contains("You are not allowed to perform this action"));
    Ok(())
}

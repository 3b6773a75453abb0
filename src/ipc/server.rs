//! TCP acceptor for the account service.
//!
//! Accepts connections in a single loop and hands each one to its own
//! dispatcher task. There is no connection limit and no coordination between
//! tasks beyond the shared ledger store.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::dispatch::Dispatcher;
use crate::error::{BalanceError, Result};
use crate::id::ConnectionIds;
use crate::session::AccountSession;
use crate::storage::LedgerStore;

/// Port the service listens on when none is configured.
pub const DEFAULT_PORT: u16 = 6969;

/// Listening server for account sessions
pub struct AccountServer {
    listener: TcpListener,
    store: Arc<dyn LedgerStore>,
    ids: ConnectionIds,
}

impl std::fmt::Debug for AccountServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountServer")
            .field("local_addr", &self.listener.local_addr().ok())
            .finish_non_exhaustive()
    }
}

impl AccountServer {
    /// Bind the listening socket.
    pub async fn bind(address: impl ToSocketAddrs, store: Arc<dyn LedgerStore>) -> Result<Self> {
        let listener = TcpListener::bind(address)
            .await
            .map_err(|e| BalanceError::Protocol(format!("Failed to bind socket: {}", e)))?;
        info!("Listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            store,
            ids: ConnectionIds::default(),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves.
    ///
    /// Connections already being served keep running after shutdown.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, peer)) => self.spawn_session(stream, peer),
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    info!("Shutting down listener");
                    break;
                }
            }
        }

        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream, peer: SocketAddr) {
        let id = self.ids.next_id();
        debug!("[{}] Accepted {}", id, peer);
        let dispatcher = Dispatcher::new(id, AccountSession::new(Arc::clone(&self.store)));

        tokio::spawn(async move {
            if let Err(e) = dispatcher.run(stream).await {
                error!("[{}] Connection failed: {}", id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::client::ServerConnection;
    use crate::ipc::messages::{Message, Tag};
    use crate::storage::FileLedger;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    async fn start() -> (TempDir, SocketAddr, oneshot::Sender<()>, tokio::task::JoinHandle<Result<()>>) {
        let dir = TempDir::new().unwrap();
        let ledger = FileLedger::open(dir.path()).unwrap();
        ledger.create("alice", "secret").unwrap();

        let server = AccountServer::bind("127.0.0.1:0", Arc::new(ledger)).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_with_shutdown(async {
            let _ = rx.await;
        }));
        (dir, addr, tx, handle)
    }

    async fn connect(addr: SocketAddr) -> ServerConnection {
        ServerConnection::connect(&addr.ip().to_string(), addr.port()).await.unwrap()
    }

    #[tokio::test]
    async fn test_bind_ephemeral_port() {
        let dir = TempDir::new().unwrap();
        let ledger = FileLedger::open(dir.path()).unwrap();
        let server = AccountServer::bind("127.0.0.1:0", Arc::new(ledger)).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_bind_address_in_use() {
        let dir = TempDir::new().unwrap();
        let store: Arc<dyn LedgerStore> = Arc::new(FileLedger::open(dir.path()).unwrap());
        let first = AccountServer::bind("127.0.0.1:0", store.clone()).await.unwrap();
        let addr = first.local_addr().unwrap();
        let err = AccountServer::bind(addr, store).await.unwrap_err();
        assert!(matches!(err, BalanceError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_greeting_on_connect() {
        let (_dir, addr, tx, handle) = start().await;
        let mut conn = connect(addr).await;
        let greeting = conn.recv_batch().await.unwrap().unwrap();
        assert_eq!(greeting[0].as_ref().unwrap().tag, Tag::Help);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_connections_have_independent_sessions() {
        let (_dir, addr, tx, handle) = start().await;

        let mut first = connect(addr).await;
        let mut second = connect(addr).await;
        first.recv_batch().await.unwrap();
        second.recv_batch().await.unwrap();

        first.send_line("login alice secret").await.unwrap();
        let reply = first.recv_batch().await.unwrap().unwrap();
        assert_eq!(reply[0].as_ref().unwrap(), &Message::new(Tag::Login, "user"));

        second.send_line("balance").await.unwrap();
        let reply = second.recv_batch().await.unwrap().unwrap();
        assert_eq!(reply[0].as_ref().unwrap().tag, Tag::Text);

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_quit_closes_connection() {
        let (_dir, addr, tx, handle) = start().await;
        let mut conn = connect(addr).await;
        conn.recv_batch().await.unwrap();

        conn.send_line("quit").await.unwrap();
        assert!(conn.recv_batch().await.unwrap().is_none());

        tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}

//! Client side of the account protocol.
//!
//! Wraps a framed TCP stream: request lines go out, decoded response batches
//! come back. Fragments that fail to decode are handed to the caller as
//! errors inside the batch so one bad fragment does not drop the rest.

use futures::{SinkExt, StreamExt};
use log::debug;
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::error::{BalanceError, Result};
use crate::ipc::codec::ResponseCodec;
use crate::ipc::messages::Message;

/// One decoded response line.
pub type Batch = Vec<Result<Message>>;

/// Connection to an account server.
#[derive(Debug)]
pub struct ServerConnection {
    framed: Framed<TcpStream, ResponseCodec>,
}

impl ServerConnection {
    /// Connect to the server.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| BalanceError::Protocol(format!("Failed to connect to {}:{}: {}", host, port, e)))?;
        debug!("Connected to {}:{}", host, port);
        Ok(Self {
            framed: Framed::new(stream, ResponseCodec::new()),
        })
    }

    /// Wait for the next response line. `None` once the server has closed.
    pub async fn recv_batch(&mut self) -> Result<Option<Batch>> {
        match self.framed.next().await {
            Some(batch) => Ok(Some(batch?)),
            None => Ok(None),
        }
    }

    /// Send one request line.
    pub async fn send_line(&mut self, line: impl Into<String>) -> Result<()> {
        self.framed.send(line.into()).await?;
        Ok(())
    }

    /// Flush and shut down the write half.
    pub async fn close(mut self) -> Result<()> {
        self.framed.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::messages::Tag;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = ServerConnection::connect("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, BalanceError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_round_trip_against_raw_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            writer.write_all(b":::text::hello:::bogus\n").await.unwrap();

            let mut line = String::new();
            reader.read_line(&mut line).await.unwrap();
            line
        });

        let mut conn = ServerConnection::connect("127.0.0.1", port).await.unwrap();
        let batch = conn.recv_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].as_ref().unwrap(), &Message::new(Tag::Text, "hello"));
        assert!(matches!(batch[1], Err(BalanceError::MalformedResponse(_))));

        conn.send_line("withdraw 5").await.unwrap();
        assert_eq!(server.await.unwrap(), "withdraw 5\n");

        assert!(conn.recv_batch().await.unwrap().is_none());
    }
}

//! Session dispatcher - the per-connection control loop.
//!
//! One dispatcher owns one connection and one account session. It sends the
//! help catalog on connect, then serves requests strictly one at a time:
//! read a line, run the command's handler, flush the batch as one line.
//! `quit`, `exit`, end of stream or a read failure ends the loop.

pub mod handlers;
pub mod help;

use futures::{SinkExt, StreamExt};
use log::{info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::error::Result;
use crate::id::ConnectionId;
use crate::ipc::codec::{RequestCodec, decode_request};
use crate::ipc::messages::{Message, Request};
use crate::session::AccountSession;

pub use handlers::{Flow, handler_for};

/// Drives one connection against its own account session.
#[derive(Debug)]
pub struct Dispatcher {
    id: ConnectionId,
    session: AccountSession,
}

impl Dispatcher {
    pub fn new(id: ConnectionId, session: AccountSession) -> Self {
        Self { id, session }
    }

    pub fn session(&self) -> &AccountSession {
        &self.session
    }

    /// Batch sent right after accept.
    pub fn greeting(&self) -> Vec<Message> {
        vec![handlers::full_help(&self.session)]
    }

    /// Execute one request and collect its responses.
    pub fn handle(&mut self, request: &Request) -> (Vec<Message>, Flow) {
        let mut out = Vec::new();
        let flow = handler_for(request.command)(&mut self.session, request, &mut out);
        (out, flow)
    }

    /// Decode and execute one raw request line.
    pub fn handle_line(&mut self, line: &str) -> (Vec<Message>, Flow) {
        self.handle(&decode_request(line))
    }

    /// Serve the connection until it closes.
    ///
    /// Read failures end the loop quietly; write failures are returned so the
    /// caller can log them. Either way only this connection is affected.
    pub async fn run<S>(mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        info!("[{}] Client connected", self.id);
        let mut framed = Framed::new(stream, RequestCodec::new());
        framed.send(self.greeting()).await?;

        loop {
            let request = match framed.next().await {
                Some(Ok(request)) => request,
                Some(Err(e)) => {
                    warn!("[{}] Read failed: {}", self.id, e);
                    break;
                }
                None => Request::quit(),
            };

            info!("[{}] Request: {}", self.id, request.name);
            let (reply, flow) = self.handle(&request);
            if flow == Flow::Close {
                break;
            }
            framed.send(reply).await?;
        }

        info!("[{}] Socket closed", self.id);
        Ok(())
    }
}

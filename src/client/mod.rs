//! Interactive client - a prompt loop over one server connection.
//!
//! Each turn waits for one response batch, folds it into the local state and
//! view, prints the prompt and forwards one input line. Input is sent as
//! typed; the server handles command-name case.

mod state;
mod view;

use std::io::Write;

use log::{debug, info, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::Result;
use crate::ipc::client::{Batch, ServerConnection};
use crate::ipc::messages::Tag;

pub use state::ClientState;
pub use view::{ClientView, NOT_ALLOWED, UNKNOWN_RESPONSE};

/// Fold one response batch into the client state and view.
pub fn apply_batch(state: &mut ClientState, view: &mut ClientView, batch: Batch) {
    for message in batch {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                debug!("Dropping response fragment: {}", e);
                view.unknown_response();
                continue;
            }
        };

        match message.tag {
            Tag::Text => view.print(message.payload),
            Tag::Help => view.set_help(message.payload),
            Tag::ActionNotAllowed => view.not_allowed(),
            Tag::Login | Tag::Username | Tag::Logout | Tag::Balance => {
                if let Err(e) = state.apply(&message) {
                    debug!("Bad {} payload: {}", message.tag, e);
                    view.unknown_response();
                }
            }
        }
    }
}

fn is_quit(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit")
}

/// Run the prompt loop until the user quits or the server closes.
pub async fn run<R, W>(mut conn: ServerConnection, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut state = ClientState::new();
    let mut view = ClientView::new();
    let mut lines = input.lines();

    loop {
        let Some(batch) = conn.recv_batch().await? else {
            warn!("Server closed the connection");
            eprintln!("Connection closed by server");
            break;
        };
        apply_batch(&mut state, &mut view, batch);

        write!(out, "{}", view.render_prompt(&state))?;
        out.flush()?;

        match lines.next_line().await? {
            Some(line) if !is_quit(&line) => conn.send_line(line).await?,
            _ => {
                info!("Quitting");
                conn.send_line("quit").await?;
                conn.close().await?;
                break;
            }
        }
    }

    Ok(())
}

//! IPC Layer - TCP transport for the account protocol
//!
//! This module provides:
//! - Message, tag and request types
//! - Line codecs for both directions
//! - TCP acceptor spawning one dispatcher per connection
//! - Client connection used by the interactive prompt

pub mod client;
pub mod codec;
pub mod messages;
pub mod server;

pub use client::{Batch, ServerConnection};
pub use codec::{RequestCodec, ResponseCodec, decode_batch, decode_request, encode_batch};
pub use messages::{Command, Message, Request, Tag};
pub use server::{AccountServer, DEFAULT_PORT};

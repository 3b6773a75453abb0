//! Line codec for the balance protocol.
//!
//! Responses are batches packed into one line:
//!
//! ```text
//! :::<tag1>::<payload1>:::<tag2>::<payload2>...
//! ```
//!
//! Newlines inside a payload travel as the sentinel `_` so that a batch never
//! spans lines. Requests are plain lines: `<command> [<arg1>] [<rest of line>]`.

use bytes::{Buf, BufMut, BytesMut};
use log::warn;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{BalanceError, Result};
use crate::ipc::messages::{Message, Request, Tag};

/// Separates messages within one response line.
pub const MESSAGE_SEPARATOR: &str = ":::";
/// Separates tag from payload within one message.
pub const FIELD_SEPARATOR: &str = "::";
/// Stands in for `\n` inside payloads.
pub const NEWLINE_SENTINEL: char = '_';

const DEFAULT_MAX_LENGTH: usize = 16 * 1024 * 1024;

/// Whether a payload would not survive a trip through the framing intact.
///
/// A literal sentinel decodes back as a newline, and stray colons can merge
/// with the separators around them.
pub fn collides_with_framing(payload: &str) -> bool {
    payload.contains(NEWLINE_SENTINEL)
        || payload.contains(FIELD_SEPARATOR)
        || payload.starts_with(':')
        || payload.ends_with(':')
}

/// Encode a batch of messages into one line (without the trailing newline).
///
/// An empty payload is replaced by the tag's own name.
pub fn encode_batch(messages: &[Message]) -> String {
    let mut line = String::new();
    for message in messages {
        let tag = message.tag.as_str();
        let payload = if message.payload.is_empty() {
            tag
        } else {
            message.payload.as_str()
        };
        if collides_with_framing(payload) {
            warn!("Payload of {} message collides with protocol framing: {:?}", tag, payload);
        }

        line.push_str(MESSAGE_SEPARATOR);
        line.push_str(tag);
        line.push_str(FIELD_SEPARATOR);
        for c in payload.chars() {
            line.push(if c == '\n' { NEWLINE_SENTINEL } else { c });
        }
    }
    line
}

/// Decode one response line into its messages.
///
/// Fragments that are not exactly `tag::payload`, or whose tag is outside the
/// vocabulary, come back as errors in place; the rest of the batch still
/// decodes.
pub fn decode_batch(line: &str) -> Vec<Result<Message>> {
    trim_line_end(line)
        .split(MESSAGE_SEPARATOR)
        .filter(|fragment| !fragment.is_empty())
        .map(decode_fragment)
        .collect()
}

fn decode_fragment(fragment: &str) -> Result<Message> {
    let fields: Vec<&str> = fragment.split(FIELD_SEPARATOR).collect();
    let [tag, payload] = fields.as_slice() else {
        return Err(BalanceError::MalformedResponse(fragment.to_string()));
    };
    let tag: Tag = tag.parse()?;
    let payload: String = payload
        .chars()
        .map(|c| if c == NEWLINE_SENTINEL { '\n' } else { c })
        .collect();
    Ok(Message::new(tag, payload))
}

/// Split a request line into command name and at most two arguments.
///
/// Only the first two spaces are significant; the second argument keeps the
/// remainder of the line verbatim. Argument case is preserved.
pub fn decode_request(line: &str) -> Request {
    let mut tokens = trim_line_end(line).splitn(3, ' ');
    let name = tokens.next().unwrap_or_default();
    let args = tokens.map(str::to_string).collect();
    Request::new(name, args)
}

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(|c: char| c == '\n' || c == '\r')
}

fn too_large(length: usize, max_length: usize) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Line too long: {} > {}", length, max_length),
    )
}

fn into_line(bytes: BytesMut) -> std::io::Result<String> {
    let line = String::from_utf8(bytes.to_vec())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, format!("Invalid UTF-8: {}", e)))?;
    Ok(trim_line_end(&line).to_string())
}

/// Take one newline-terminated line off the front of the buffer.
fn next_line(src: &mut BytesMut, max_length: usize) -> std::io::Result<Option<String>> {
    match src.iter().position(|&b| b == b'\n') {
        Some(pos) => {
            if pos > max_length {
                return Err(too_large(pos, max_length));
            }
            let line = src.split_to(pos);
            src.advance(1);
            into_line(line).map(Some)
        }
        None => {
            if src.len() > max_length {
                return Err(too_large(src.len(), max_length));
            }
            Ok(None)
        }
    }
}

/// Take whatever is left at end of stream as a final unterminated line.
fn last_line(src: &mut BytesMut, max_length: usize) -> std::io::Result<Option<String>> {
    if let Some(line) = next_line(src, max_length)? {
        return Ok(Some(line));
    }
    if src.is_empty() {
        return Ok(None);
    }
    let rest = src.split_to(src.len());
    into_line(rest).map(Some)
}

fn put_line(dst: &mut BytesMut, line: &str) {
    dst.reserve(line.len() + 1);
    dst.put_slice(line.as_bytes());
    dst.put_u8(b'\n');
}

/// Server side: decodes request lines, encodes response batches.
#[derive(Debug, Clone)]
pub struct RequestCodec {
    max_length: usize,
}

impl RequestCodec {
    /// Create a new codec with default max line length (16 MB).
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }
}

impl Default for RequestCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RequestCodec {
    type Item = Request;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        Ok(next_line(src, self.max_length)?.map(|line| decode_request(&line)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        Ok(last_line(src, self.max_length)?.map(|line| decode_request(&line)))
    }
}

impl Encoder<Vec<Message>> for RequestCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: Vec<Message>, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let line = encode_batch(&item);
        if line.len() > self.max_length {
            return Err(too_large(line.len(), self.max_length));
        }
        put_line(dst, &line);
        Ok(())
    }
}

/// Client side: decodes response batches, encodes request lines.
#[derive(Debug, Clone)]
pub struct ResponseCodec {
    max_length: usize,
}

impl ResponseCodec {
    /// Create a new codec with default max line length (16 MB).
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
        }
    }
}

impl Default for ResponseCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ResponseCodec {
    type Item = Vec<Result<Message>>;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        Ok(next_line(src, self.max_length)?.map(|line| decode_batch(&line)))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        Ok(last_line(src, self.max_length)?.map(|line| decode_batch(&line)))
    }
}

impl Encoder<String> for ResponseCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let line = trim_line_end(&item);
        if line.contains('\n') {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Request must be a single line",
            ));
        }
        if line.len() > self.max_length {
            return Err(too_large(line.len(), self.max_length));
        }
        put_line(dst, line);
        Ok(())
    }
}

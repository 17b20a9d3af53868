//! Decoding for `application/vnd.amazon.eventstream` response bodies.
//!
//! A body is a sequence of binary frames:
//!
//! ```text
//! | total_len: u32 | headers_len: u32 | prelude_crc: u32 | headers | payload | message_crc: u32 |
//! ```
//!
//! Frames may be split across (or packed into) transport chunks arbitrarily,
//! so [`EventStreamDecoder`] buffers input until a whole frame is available.
//! CRCs are skipped over, not verified; TLS already guarantees integrity.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::{Buf, Bytes, BytesMut};
use futures_util::Stream;
use serde::Deserialize;

use crate::AgentError;

/// MIME type announcing an event-stream body.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "application/vnd.amazon.eventstream";

pub(crate) const PRELUDE_LENGTH: usize = 12;
pub(crate) const CRC_LENGTH: usize = 4;
pub(crate) const MINIMUM_FRAME_LENGTH: usize = PRELUDE_LENGTH + CRC_LENGTH;
const MAXIMUM_FRAME_LENGTH: usize = 16 * 1024 * 1024;

/// Typed value of a frame header.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HeaderValue {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Bytes(Bytes),
    String(String),
    /// Milliseconds since the epoch
    Timestamp(i64),
    Uuid([u8; 16]),
}

/// One decoded frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    pub headers: Vec<(String, HeaderValue)>,
    pub payload: Bytes,
}

impl Message {
    /// Look up a string-typed header.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.iter().find_map(|(key, value)| match value {
            HeaderValue::String(value) if key == name => Some(value.as_str()),
            _ => None,
        })
    }
}

/// Incremental frame decoder.
#[derive(Debug, Default)]
pub struct EventStreamDecoder {
    buffer: BytesMut,
}

impl EventStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append raw body bytes.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Bytes buffered but not yet decoded.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Take the next complete frame off the buffer, if there is one.
    pub fn next_message(&mut self) -> Result<Option<Message>, AgentError> {
        if self.buffer.len() < PRELUDE_LENGTH {
            return Ok(None);
        }

        let total_length = read_u32(&self.buffer[0..4]) as usize;
        let headers_length = read_u32(&self.buffer[4..8]) as usize;

        if !(MINIMUM_FRAME_LENGTH..=MAXIMUM_FRAME_LENGTH).contains(&total_length) {
            return Err(decode_error(format!(
                "Frame length {} out of range",
                total_length
            )));
        }
        if PRELUDE_LENGTH + headers_length + CRC_LENGTH > total_length {
            return Err(decode_error(format!(
                "Header length {} exceeds frame length {}",
                headers_length, total_length
            )));
        }
        if self.buffer.len() < total_length {
            return Ok(None);
        }

        let mut frame = self.buffer.split_to(total_length).freeze();
        frame.advance(PRELUDE_LENGTH);
        let headers = parse_headers(frame.split_to(headers_length))?;
        let payload = frame.split_to(frame.len() - CRC_LENGTH);

        Ok(Some(Message { headers, payload }))
    }

    /// Check that the body ended on a frame boundary.
    pub fn finish(&self) -> Result<(), AgentError> {
        if self.buffer.is_empty() {
            Ok(())
        } else {
            Err(decode_error(format!(
                "Stream ended inside a frame ({} bytes left over)",
                self.buffer.len()
            )))
        }
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn decode_error(message: String) -> AgentError {
    AgentError::StreamDecodeError(message)
}

fn take(bytes: &mut Bytes, count: usize, what: &str) -> Result<Bytes, AgentError> {
    if bytes.remaining() < count {
        return Err(decode_error(format!("Truncated header {}", what)));
    }
    Ok(bytes.split_to(count))
}

fn take_string(bytes: &mut Bytes, count: usize, what: &str) -> Result<String, AgentError> {
    let raw = take(bytes, count, what)?;
    String::from_utf8(raw.to_vec())
        .map_err(|error| decode_error(format!("Header {} is not UTF-8: {}", what, error)))
}

fn parse_headers(mut bytes: Bytes) -> Result<Vec<(String, HeaderValue)>, AgentError> {
    let mut headers = Vec::new();

    while bytes.has_remaining() {
        let name_length = take(&mut bytes, 1, "name length")?.get_u8() as usize;
        let name = take_string(&mut bytes, name_length, "name")?;
        let value_type = take(&mut bytes, 1, "type")?.get_u8();

        let value = match value_type {
            0 => HeaderValue::Bool(true),
            1 => HeaderValue::Bool(false),
            2 => HeaderValue::Byte(take(&mut bytes, 1, "value")?.get_i8()),
            3 => HeaderValue::Short(take(&mut bytes, 2, "value")?.get_i16()),
            4 => HeaderValue::Int(take(&mut bytes, 4, "value")?.get_i32()),
            5 => HeaderValue::Long(take(&mut bytes, 8, "value")?.get_i64()),
            6 => {
                let length = take(&mut bytes, 2, "value length")?.get_u16() as usize;
                HeaderValue::Bytes(take(&mut bytes, length, "value")?)
            }
            7 => {
                let length = take(&mut bytes, 2, "value length")?.get_u16() as usize;
                HeaderValue::String(take_string(&mut bytes, length, "value")?)
            }
            8 => HeaderValue::Timestamp(take(&mut bytes, 8, "value")?.get_i64()),
            9 => {
                let mut uuid = [0u8; 16];
                take(&mut bytes, 16, "value")?.copy_to_slice(&mut uuid);
                HeaderValue::Uuid(uuid)
            }
            other => {
                return Err(decode_error(format!(
                    "Unknown header value type {} for {}",
                    other, name
                )));
            }
        };

        headers.push((name, value));
    }

    Ok(headers)
}

#[derive(Deserialize)]
struct ChunkPayload {
    bytes: Option<String>,
}

/// HTTP status an upstream exception frame stands for.
pub fn exception_status(exception_type: &str) -> u16 {
    match exception_type {
        "throttlingException" => 429,
        "validationException" => 400,
        "accessDeniedException" => 403,
        "resourceNotFoundException" => 404,
        _ => 500,
    }
}

/// Interpret a frame: completion text for `chunk` events, an error for
/// exception frames, nothing for everything else.
pub fn completion_bytes(message: &Message) -> Result<Option<Bytes>, AgentError> {
    match message.header_str(":message-type") {
        Some("event") => {
            if message.header_str(":event-type") != Some("chunk") {
                return Ok(None);
            }

            let chunk: ChunkPayload = serde_json::from_slice(&message.payload)
                .map_err(|error| decode_error(format!("Invalid chunk payload: {}", error)))?;

            match chunk.bytes {
                Some(encoded) => STANDARD
                    .decode(encoded)
                    .map(|decoded| Some(Bytes::from(decoded)))
                    .map_err(|error| decode_error(format!("Invalid chunk encoding: {}", error))),
                None => Ok(None),
            }
        }
        Some("exception") => {
            let exception_type = message.header_str(":exception-type").unwrap_or("exception");
            Err(AgentError::UpstreamError {
                status: exception_status(exception_type),
                body: String::from_utf8_lossy(&message.payload).into_owned(),
            })
        }
        Some("error") => Err(AgentError::UpstreamError {
            status: 500,
            body: format!(
                "{}: {}",
                message.header_str(":error-code").unwrap_or("error"),
                message.header_str(":error-message").unwrap_or_default()
            ),
        }),
        _ => Ok(None),
    }
}

/// Turn an event-stream body into the stream of completion chunks it carries.
pub fn completion_chunks<S>(body: S) -> impl Stream<Item = Result<Bytes, AgentError>>
where
    S: Stream<Item = Result<Bytes, AgentError>>,
{
    async_stream::try_stream! {
        let mut decoder = EventStreamDecoder::new();

        for await chunk in body {
            decoder.push(&chunk?);

            while let Some(message) = decoder.next_message()? {
                if let Some(text) = completion_bytes(&message)? {
                    yield text;
                }
            }
        }

        decoder.finish()?;
    }
}

//! Frame encoders for exercising event-stream decoding without a live
//! service. CRC fields are written as zero, which the decoder accepts.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::eventstream::{CRC_LENGTH, MINIMUM_FRAME_LENGTH};

/// Encode a frame with string-typed headers.
pub fn encode_message(headers: &[(&str, &str)], payload: &[u8]) -> Vec<u8> {
    let mut encoded_headers = Vec::new();
    for (name, value) in headers {
        encoded_headers.push(name.len() as u8);
        encoded_headers.extend_from_slice(name.as_bytes());
        encoded_headers.push(7);
        encoded_headers.extend_from_slice(&(value.len() as u16).to_be_bytes());
        encoded_headers.extend_from_slice(value.as_bytes());
    }

    let total_length = MINIMUM_FRAME_LENGTH + encoded_headers.len() + payload.len();
    let mut frame = Vec::with_capacity(total_length);
    frame.extend_from_slice(&(total_length as u32).to_be_bytes());
    frame.extend_from_slice(&(encoded_headers.len() as u32).to_be_bytes());
    frame.extend_from_slice(&[0; CRC_LENGTH]);
    frame.extend_from_slice(&encoded_headers);
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0; CRC_LENGTH]);
    frame
}

/// Encode a `chunk` event carrying `text`.
pub fn encode_chunk(text: &str) -> Vec<u8> {
    encode_chunk_bytes(text.as_bytes())
}

/// Encode a `chunk` event carrying raw bytes, which need not be valid UTF-8.
pub fn encode_chunk_bytes(bytes: &[u8]) -> Vec<u8> {
    let payload = serde_json::json!({ "bytes": STANDARD.encode(bytes) }).to_string();
    encode_message(
        &[
            (":message-type", "event"),
            (":event-type", "chunk"),
            (":content-type", "application/json"),
        ],
        payload.as_bytes(),
    )
}

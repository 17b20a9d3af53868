use std::pin::Pin;

use bytes::Bytes;
use futures_util::{Stream, StreamExt, pin_mut};

use crate::AgentError;

/// A boxed stream of response body chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, AgentError>> + Send>>;

/// Concatenate a stream of UTF-8 chunks into one string, in arrival order.
///
/// A multi-byte character split across two chunks is carried over and
/// decoded once complete. Invalid bytes, a body that ends mid-character, or
/// the first error the stream yields end reassembly.
pub async fn reassemble<S>(chunks: S) -> Result<String, AgentError>
where
    S: Stream<Item = Result<Bytes, AgentError>>,
{
    pin_mut!(chunks);

    let mut completion = String::new();
    let mut pending: Vec<u8> = Vec::new();
    let mut count = 0usize;

    while let Some(chunk) = chunks.next().await {
        pending.extend_from_slice(&chunk?);

        let decoded = match std::str::from_utf8(&pending) {
            Ok(text) => {
                completion.push_str(text);
                pending.len()
            }
            // Only an incomplete sequence at the very end may wait for more.
            Err(error) if error.error_len().is_none() => {
                let valid = error.valid_up_to();
                completion.push_str(&String::from_utf8_lossy(&pending[..valid]));
                valid
            }
            Err(error) => {
                return Err(AgentError::StreamDecodeError(format!(
                    "Chunk {} is not valid UTF-8: {}",
                    count, error
                )));
            }
        };
        pending.drain(..decoded);
        count += 1;
    }

    if !pending.is_empty() {
        return Err(AgentError::StreamDecodeError(format!(
            "Stream ended inside a multi-byte character ({} bytes left over)",
            pending.len()
        )));
    }

    tracing::trace!(chunks = count, bytes = completion.len(), "Reassembled completion");

    Ok(completion)
}

/// Buffer a whole body.
pub async fn collect_body<S>(chunks: S) -> Result<Vec<u8>, AgentError>
where
    S: Stream<Item = Result<Bytes, AgentError>>,
{
    pin_mut!(chunks);

    let mut body = Vec::new();
    while let Some(chunk) = chunks.next().await {
        body.extend_from_slice(&chunk?);
    }

    Ok(body)
}

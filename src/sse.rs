//! Server-Sent Events (SSE) processing for streaming chat completions.
//!
//! This module turns the raw byte stream of a `chat/completions` response into
//! a stream of [`ChatCompletionChunk`]s. Frames are separated by a blank line,
//! carry their payload on `data:` lines and the stream ends with
//! `data: [DONE]`.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use serde_json::Value;

use crate::observability::{STREAM_BYTES, STREAM_ERRORS};
use crate::{ChatCompletionChunk, Error, Result};

/// Marker payload that ends the stream.
const DONE_MARKER: &str = "[DONE]";

/// Outcome of decoding one complete frame.
enum Frame {
    Chunk(Result<ChatCompletionChunk>),
    Done,
    Skip,
}

/// Process a stream of bytes into a stream of completion chunks.
///
/// Transport errors, undecodable frames and error frames sent by the endpoint
/// all surface as [`Error::Upstream`] items. Nothing after `[DONE]` is read,
/// and a stream that ends without `[DONE]` yields a final error so a truncated
/// answer is never mistaken for a complete one. The stream ends after the
/// first error.
pub fn process_sse<S, E>(byte_stream: S) -> impl Stream<Item = Result<ChatCompletionChunk>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream
        .map(|result| {
            result.map_err(|e| {
                Error::upstream(format!("Error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        })
        .fuse();

    stream::unfold(
        (stream, String::new(), Vec::new(), false),
        move |(mut stream, mut buffer, mut pending, done)| async move {
            if done {
                return None;
            }
            loop {
                // Drain every complete frame before reading more bytes.
                while let Some((frame, remaining)) = extract_frame(&buffer) {
                    buffer = remaining;
                    match frame {
                        Frame::Chunk(chunk) => {
                            let failed = chunk.is_err();
                            if failed {
                                STREAM_ERRORS.click();
                            }
                            return Some((chunk, (stream, buffer, pending, failed)));
                        }
                        Frame::Done => return None,
                        Frame::Skip => {}
                    }
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        pending.extend_from_slice(&bytes);
                        if let Err(e) = decode_pending(&mut pending, &mut buffer) {
                            STREAM_ERRORS.click();
                            return Some((
                                Err(Error::upstream(
                                    format!("Invalid UTF-8 in stream: {e}"),
                                    Some(Box::new(e)),
                                )),
                                (stream, buffer, pending, true),
                            ));
                        }
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, pending, true)));
                    }
                    None => {
                        // A final frame may arrive without its trailing blank line.
                        if !buffer.trim().is_empty() {
                            buffer.push_str("\n\n");
                            match extract_frame(&buffer) {
                                Some((Frame::Done, _)) => return None,
                                Some((Frame::Chunk(chunk), _)) => {
                                    let failed = chunk.is_err();
                                    if failed {
                                        STREAM_ERRORS.click();
                                    }
                                    return Some((chunk, (stream, String::new(), pending, failed)));
                                }
                                Some((Frame::Skip, _)) | None => {}
                            }
                        }
                        STREAM_ERRORS.click();
                        return Some((
                            Err(Error::upstream("stream ended before [DONE]", None)),
                            (stream, String::new(), pending, true),
                        ));
                    }
                }
            }
        },
    )
}

/// Move every complete UTF-8 sequence from `pending` into `buffer`.
///
/// A character split across network reads stays in `pending` until the rest
/// of it arrives. `\r\n` line endings are folded to `\n`.
fn decode_pending(
    pending: &mut Vec<u8>,
    buffer: &mut String,
) -> std::result::Result<(), std::str::Utf8Error> {
    let valid = match std::str::from_utf8(pending) {
        Ok(text) => text.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(e) => return Err(e),
    };
    let text = std::str::from_utf8(&pending[..valid])?;
    buffer.push_str(text);
    pending.drain(..valid);
    if buffer.contains("\r\n") {
        *buffer = buffer.replace("\r\n", "\n");
    }
    Ok(())
}

/// Extract a complete SSE frame from a buffer string.
fn extract_frame(buffer: &str) -> Option<(Frame, String)> {
    let (frame_text, rest) = buffer.split_once("\n\n")?;
    let rest = rest.to_string();

    let data: Vec<&str> = frame_text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();
    if data.is_empty() {
        // Some endpoints answer with a bare JSON error body instead of events.
        if frame_text.trim_start().starts_with('{') {
            return Some((Frame::Chunk(parse_chunk(frame_text.trim())), rest));
        }
        // Comments, keep-alives and bare `event:` lines.
        return Some((Frame::Skip, rest));
    }
    let data = data.join("\n");

    if data.trim() == DONE_MARKER {
        return Some((Frame::Done, rest));
    }

    Some((Frame::Chunk(parse_chunk(&data)), rest))
}

/// Parse the JSON payload of one frame.
fn parse_chunk(data: &str) -> Result<ChatCompletionChunk> {
    let value: Value = serde_json::from_str(data).map_err(|e| {
        Error::upstream(
            format!("Failed to parse event JSON: {e}"),
            Some(Box::new(e)),
        )
    })?;

    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(Error::upstream(message, None));
    }

    serde_json::from_value(value).map_err(|e| {
        Error::upstream(
            format!("Unexpected chunk shape: {e}"),
            Some(Box::new(e)),
        )
    })
}

//! Server-Sent Events decoding for streamed chat completions

use super::types::ChatChunk;
use crate::http::error::TransportError;
use crate::http::ChunkStream;
use bytes::Bytes;
use eventsource_stream::Eventsource;
use futures::{future, Stream, StreamExt};
use std::fmt;

/// Sentinel data of the final event
const DONE_SENTINEL: &str = "[DONE]";

/// Parse a Server-Sent Events byte stream into chat chunks
///
/// The stream ends at the `[DONE]` sentinel. Events that do not decode as a
/// chunk are logged and skipped.
pub fn parse_stream<S, E>(stream: S) -> ChunkStream
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let event_stream = stream
        .eventsource()
        .take_while(|result| {
            let done = matches!(result, Ok(event) if event.data.trim() == DONE_SENTINEL);
            future::ready(!done)
        });

    Box::pin(event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = event.data.trim();
                if data.is_empty() {
                    return None;
                }

                match serde_json::from_str::<ChatChunk>(data) {
                    Ok(chunk) => Some(Ok(chunk)),
                    Err(e) => {
                        // Log parsing error but continue stream
                        tracing::warn!("Failed to parse stream chunk: {}", e);
                        None
                    }
                }
            }
            Err(e) => Some(Err(TransportError::Network(format!("Stream error: {}", e)))),
        }
    }))
}

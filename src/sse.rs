//! Server-Sent Events decoding for run streams.
//!
//! This module converts the raw byte stream of a run's `text/event-stream`
//! response into discrete [`RawEvent`] records. Framing rules:
//!
//! - `event: <type>` sets the current event type, sticky until overwritten.
//! - `data: <json>` emits one record carrying the current event type.
//! - A `data:` payload of exactly `{}` is the end-of-stream sentinel.
//! - Comment lines (`:`) and blank lines carry no payload.
//!
//! A trailing partial line is buffered across deliveries and never parsed.
//! Malformed JSON in a single `data:` line is logged and skipped; it does not
//! abort the stream.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::warn;

use crate::{Error, EventPayload, Result};

/// One decoded record from a run's event stream.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    /// The event type, as sent on the wire.
    pub event_type: String,
    /// The JSON payload of the record's `data:` line.
    pub payload: EventPayload,
}

impl RawEvent {
    /// Creates a record; handy in tests and fixtures.
    pub fn new(event_type: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }
}

/// Event type assigned to `data:` lines that arrive before any `event:` line.
const DEFAULT_EVENT_TYPE: &str = "message";

/// Result of feeding one complete line to the decoder.
enum Decoded {
    /// A complete record.
    Event(RawEvent),
    /// The `{}` sentinel: the stream has no more data.
    Finished,
}

/// Incremental decoder for `text/event-stream` framing.
///
/// Bytes go in via [`EventDecoder::extend`]; complete records come out via
/// [`EventDecoder::next_record`]. Anything after a sentinel is ignored.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    event_type: Option<String>,
    finished: bool,
}

impl EventDecoder {
    /// Creates an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends newly received bytes to the internal buffer.
    pub fn extend(&mut self, chunk: &[u8]) {
        if !self.finished {
            self.buffer.extend_from_slice(chunk);
        }
    }

    /// Returns true once the end-of-stream sentinel has been decoded.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Pops the next complete record out of the buffer, if one is available.
    ///
    /// Only complete lines are consumed; a trailing partial line stays
    /// buffered for the next [`extend`](EventDecoder::extend).
    pub fn next_record(&mut self) -> Option<RawEvent> {
        while !self.finished {
            let newline = self.buffer.iter().position(|&b| b == b'\n')?;
            let line: Vec<u8> = self.buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line[..newline.min(line.len())]).into_owned();
            match self.feed_line(line.trim_end_matches('\r')) {
                Some(Decoded::Event(event)) => return Some(event),
                Some(Decoded::Finished) => {
                    self.finished = true;
                    self.buffer.clear();
                    return None;
                }
                None => continue,
            }
        }
        None
    }

    /// Flushes a trailing line that never received its newline.
    ///
    /// Called once when the byte source ends.
    pub fn flush(&mut self) -> Option<RawEvent> {
        if self.finished || self.buffer.is_empty() {
            return None;
        }
        let line = String::from_utf8_lossy(&std::mem::take(&mut self.buffer)).into_owned();
        match self.feed_line(line.trim_end_matches('\r')) {
            Some(Decoded::Event(event)) => Some(event),
            Some(Decoded::Finished) => {
                self.finished = true;
                None
            }
            None => None,
        }
    }

    fn feed_line(&mut self, line: &str) -> Option<Decoded> {
        if line.is_empty() {
            return None;
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some(event_type) = line.strip_prefix("event:") {
            self.event_type = Some(event_type.trim().to_string());
            return None;
        }
        if let Some(data) = line.strip_prefix("data:") {
            let data = data.trim();
            if data == "{}" {
                return Some(Decoded::Finished);
            }
            let event_type = self
                .event_type
                .clone()
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string());
            return match serde_json::from_str::<EventPayload>(data) {
                Ok(payload) => Some(Decoded::Event(RawEvent {
                    event_type,
                    payload,
                })),
                Err(err) => {
                    warn!(%event_type, %err, "skipping malformed event payload");
                    None
                }
            };
        }
        // Unknown line shape; the wire contract only uses the above.
        None
    }
}

/// Decodes a stream of bytes into a stream of run events.
///
/// The returned stream is tied to one HTTP response body and is not
/// restartable. It ends when the byte source ends or the `{}` sentinel is
/// decoded, whichever comes first.
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use futures::StreamExt;
/// use inventio::sse::decode_event_stream;
///
/// # tokio_test::block_on(async {
/// let bytes = futures::stream::iter(vec![Ok::<_, std::io::Error>(Bytes::from_static(
///     b"event: processing\ndata: {\"message\": \"working\"}\n\n",
/// ))]);
/// let events: Vec<_> = decode_event_stream(bytes).collect().await;
/// assert_eq!(events[0].as_ref().unwrap().event_type, "processing");
/// # });
/// ```
pub fn decode_event_stream<S, E>(byte_stream: S) -> impl Stream<Item = Result<RawEvent>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, EventDecoder::new(), false),
        move |(mut stream, mut decoder, mut eof)| async move {
            loop {
                if let Some(event) = decoder.next_record() {
                    return Some((Ok(event), (stream, decoder, eof)));
                }
                if decoder.finished() || eof {
                    return None;
                }

                match stream.next().await {
                    Some(Ok(bytes)) => decoder.extend(&bytes),
                    Some(Err(e)) => {
                        return Some((Err(e), (stream, decoder, eof)));
                    }
                    None => {
                        eof = true;
                        if let Some(event) = decoder.flush() {
                            return Some((Ok(event), (stream, decoder, eof)));
                        }
                        return None;
                    }
                }
            }
        },
    )
}

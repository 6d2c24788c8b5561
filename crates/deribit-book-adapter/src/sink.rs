/*
[INPUT]:  Decoded messages, decode failures and lifecycle changes from a session
[OUTPUT]: Console output or channel events for the embedding application
[POS]:    Output layer - where feed data leaves the session
[UPDATE]: When adding a new destination for feed data
*/

use std::io::{self, Write};

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::message::pretty;
use crate::state::SessionState;

/// Destination for everything a session produces besides its terminal error.
pub trait FeedSink: Send {
    /// Called once per message that parsed as JSON
    fn on_message(&mut self, message: &Value);

    /// Called once per message that did not parse; the session keeps reading
    fn on_decode_error(&mut self, error: &DecodeError);

    fn on_state(&mut self, _state: SessionState) {}
}

/// Prints messages to stdout and decode failures to stderr
#[derive(Debug)]
pub struct ConsoleSink<O = io::Stdout, E = io::Stderr> {
    out: O,
    err: E,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            out: io::stdout(),
            err: io::stderr(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn with_writers(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write + Send, E: Write + Send> FeedSink for ConsoleSink<O, E> {
    fn on_message(&mut self, message: &Value) {
        let written = writeln!(self.out, "Received message:\n{}", pretty(message))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            warn!(error = %err, "failed to write message to output");
        }
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        if let Err(err) = writeln!(self.err, "Failed to parse JSON: {}", error.raw) {
            warn!(error = %err, "failed to write decode diagnostic");
        }
    }
}

/// Event forwarded by [`ChannelSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    State(SessionState),
    Message(Value),
    DecodeFailed { raw: String, error: String },
}

/// Forwards session output to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<FeedEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FeedEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: FeedEvent) {
        if self.tx.send(event).is_err() {
            debug!("feed receiver dropped; event discarded");
        }
    }
}

impl FeedSink for ChannelSink {
    fn on_message(&mut self, message: &Value) {
        self.forward(FeedEvent::Message(message.clone()));
    }

    fn on_decode_error(&mut self, error: &DecodeError) {
        self.forward(FeedEvent::DecodeFailed {
            raw: error.raw.clone(),
            error: error.source.to_string(),
        });
    }

    fn on_state(&mut self, state: SessionState) {
        self.forward(FeedEvent::State(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::decode_message;
    use serde_json::json;

    #[test]
    fn test_console_sink_splits_streams() {
        let mut sink = ConsoleSink::with_writers(Vec::new(), Vec::new());
        sink.on_message(&json!({"id": 1}));
        sink.on_decode_error(&decode_message("garbage").unwrap_err());

        let (out, err) = sink.into_writers();
        let out = String::from_utf8(out).unwrap();
        let err = String::from_utf8(err).unwrap();

        assert!(out.starts_with("Received message:\n{\n"));
        assert!(out.contains("\"id\": 1"));
        assert_eq!(err, "Failed to parse JSON: garbage\n");
    }

    #[test]
    fn test_channel_sink_forwards_in_order() {
        let (mut sink, mut rx) = ChannelSink::new();
        sink.on_state(SessionState::Receiving);
        sink.on_message(&json!({"n": 1}));
        sink.on_decode_error(&decode_message("{").unwrap_err());

        assert_eq!(rx.try_recv().unwrap(), FeedEvent::State(SessionState::Receiving));
        assert_eq!(rx.try_recv().unwrap(), FeedEvent::Message(json!({"n": 1})));
        assert!(matches!(
            rx.try_recv().unwrap(),
            FeedEvent::DecodeFailed { raw, .. } if raw == "{"
        ));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_sink_survives_dropped_receiver() {
        let (mut sink, rx) = ChannelSink::new();
        drop(rx);
        sink.on_message(&json!(null));
    }
}

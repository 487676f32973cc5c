//! Output sinks for state events.
//!
//! The default sink writes a line-oriented stream that consumers may tail, so
//! every write is flushed immediately.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

use crate::{APP_NAME, EventKind, MicState, OutputFormat, VERSION};

#[derive(Debug, Error)]
pub enum SinkError {
    /// The output stream rejected a write or flush
    #[error("failed to write state event: {0}")]
    Io(#[from] io::Error),
    /// The event could not be encoded
    #[error("failed to encode state event: {0}")]
    Encode(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, SinkError>;

/// Receives state events from the monitor.
///
/// Calls are made synchronously from the polling loop. An error terminates
/// the monitor, nothing is buffered or retried.
pub trait EventSink {
    /// Announce that monitoring has started. Called once before the first
    /// poll.
    fn banner(&mut self) -> Result<()> {
        Ok(())
    }

    /// Report a state that the monitor decided to emit.
    fn report(&mut self, state: MicState, kind: EventKind) -> Result<()>;
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    marker: &'a str,
    active: bool,
    kind: &'a str,
}

#[derive(Serialize)]
struct JsonBanner<'a> {
    event: &'a str,
    version: &'a str,
}

/// Writes state events to a byte stream, usually stdout.
pub struct StreamSink<W> {
    writer: W,
    format: OutputFormat,
}

impl StreamSink<io::Stdout> {
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(io::stdout(), format)
    }
}

impl<W: Write> StreamSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_json<T: Serialize>(&mut self, value: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, value)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Human-readable status line for an event.
fn status_line(state: MicState, kind: EventKind) -> &'static str {
    match (kind, state) {
        (EventKind::Initial, MicState::Active) => "Initial state: in use",
        (EventKind::Initial, MicState::Idle) => "Initial state: idle",
        (EventKind::Transition, MicState::Active) => "Microphone started being used",
        (EventKind::Transition, MicState::Idle) => "Microphone stopped being used",
    }
}

impl<W: Write> EventSink for StreamSink<W> {
    fn banner(&mut self) -> Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(
                self.writer,
                "[{}] Listener started, monitoring microphone state...",
                APP_NAME
            )?,
            OutputFormat::Json => self.write_json(&JsonBanner {
                event: "started",
                version: VERSION,
            })?,
        }
        self.writer.flush()?;
        Ok(())
    }

    fn report(&mut self, state: MicState, kind: EventKind) -> Result<()> {
        match self.format {
            OutputFormat::Text => {
                writeln!(self.writer, "{}", state.marker())?;
                writeln!(self.writer, "[{}] {}", APP_NAME, status_line(state, kind))?;
            }
            OutputFormat::Json => self.write_json(&JsonEvent {
                marker: state.marker(),
                active: state.is_active(),
                kind: kind.as_str(),
            })?,
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(sink: StreamSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn test_text_event_lines() {
        let mut sink = StreamSink::new(Vec::new(), OutputFormat::Text);
        sink.banner().unwrap();
        sink.report(MicState::Idle, EventKind::Initial).unwrap();
        sink.report(MicState::Active, EventKind::Transition).unwrap();

        let text = output(sink);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "[micwatch] Listener started, monitoring microphone state...",
                "STATE_STOPPED",
                "[micwatch] Initial state: idle",
                "STATE_RUNNING",
                "[micwatch] Microphone started being used",
            ]
        );
    }

    #[test]
    fn test_text_markers_round_trip_through_consumer() {
        let mut sink = StreamSink::new(Vec::new(), OutputFormat::Text);
        sink.banner().unwrap();
        sink.report(MicState::Active, EventKind::Initial).unwrap();
        sink.report(MicState::Idle, EventKind::Transition).unwrap();

        let states: Vec<MicState> = output(sink)
            .lines()
            .filter_map(MicState::from_marker_line)
            .collect();
        assert_eq!(states, vec![MicState::Active, MicState::Idle]);
    }

    #[test]
    fn test_json_event_line() {
        let mut sink = StreamSink::new(Vec::new(), OutputFormat::Json);
        sink.report(MicState::Active, EventKind::Initial).unwrap();

        let text = output(sink);
        assert_eq!(
            text,
            "{\"marker\":\"STATE_RUNNING\",\"active\":true,\"kind\":\"initial\"}\n"
        );
        assert_eq!(MicState::from_marker_line(&text), Some(MicState::Active));
    }

    #[test]
    fn test_json_banner_has_no_marker() {
        let mut sink = StreamSink::new(Vec::new(), OutputFormat::Json);
        sink.banner().unwrap();

        let text = output(sink);
        let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(value["event"], "started");
        assert_eq!(MicState::from_marker_line(&text), None);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut sink = StreamSink::new(BrokenPipe, OutputFormat::Text);
        let err = sink.report(MicState::Idle, EventKind::Initial).unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}

//! Incremental `text/event-stream` decoding for `GET /event`.

use super::{Event, EventStream};
use crate::error::StreamError;
use futures_util::{stream, Stream, StreamExt};
use std::collections::VecDeque;

/// Incremental SSE framer.
///
/// Bytes are buffered until a full line is available, so chunk boundaries may
/// fall anywhere (including inside a multi-byte character). Multiple `data:`
/// lines in one event are joined with `\n`; comment lines are skipped.
#[derive(Debug, Default)]
pub(crate) struct SseFrameParser {
    buffer: Vec<u8>,
    /// Bytes of `buffer` already known to hold no newline.
    scanned: usize,
    data_lines: Vec<String>,
}

impl SseFrameParser {
    /// Feed arbitrary bytes and drain complete event payloads.
    pub(crate) fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);
        let mut payloads = Vec::new();
        let mut start = 0;
        let mut search_from = self.scanned;

        while let Some(offset) = self.buffer[search_from..].iter().position(|b| *b == b'\n') {
            let end = search_from + offset;
            let line = String::from_utf8_lossy(&self.buffer[start..end]);
            accept_line(
                line.strip_suffix('\r').unwrap_or(&line),
                &mut self.data_lines,
                &mut payloads,
            );
            start = end + 1;
            search_from = start;
        }

        self.buffer.drain(..start);
        self.scanned = self.buffer.len();
        payloads
    }
}

fn accept_line(line: &str, data_lines: &mut Vec<String>, payloads: &mut Vec<String>) {
    if line.is_empty() {
        if !data_lines.is_empty() {
            payloads.push(data_lines.join("\n"));
            data_lines.clear();
        }
        return;
    }
    if line.starts_with(':') {
        return;
    }
    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };
    if field == "data" {
        data_lines.push(value.to_string());
    }
}

fn decode_payload(payload: &str) -> Result<Event, StreamError> {
    serde_json::from_str::<Event>(payload).map_err(|err| StreamError::Decode(err.to_string()))
}

struct DecodeState<S> {
    body: std::pin::Pin<Box<S>>,
    parser: SseFrameParser,
    pending: VecDeque<String>,
    finished: bool,
}

/// Turn a raw byte stream into an [`EventStream`].
///
/// A transport error or an undecodable payload is yielded once and ends the
/// stream; a clean end of body ends it without an error.
pub(crate) fn decode_event_stream<S, B, E>(body: S) -> EventStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Into<StreamError> + Send + 'static,
{
    let state = DecodeState {
        body: Box::pin(body),
        parser: SseFrameParser::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.pending.pop_front() {
                if payload.is_empty() || payload == "[DONE]" {
                    continue;
                }
                return match decode_payload(&payload) {
                    Ok(event) => Some((Ok(event), state)),
                    Err(err) => {
                        state.pending.clear();
                        state.finished = true;
                        Some((Err(err), state))
                    }
                };
            }
            if state.finished {
                return None;
            }
            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let payloads = state.parser.feed(chunk.as_ref());
                    state.pending.extend(payloads);
                }
                Some(Err(err)) => {
                    state.finished = true;
                    return Some((Err(err.into()), state));
                }
                None => state.finished = true,
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::sse_event_block;
    use serde_json::json;

    #[test]
    fn joins_data_lines_and_skips_comments() {
        let mut parser = SseFrameParser::default();
        let payloads = parser.feed(
            b": ping\n\
              event: demo\n\
              data: one\n\
              data: two\n\
              id: 1\n\
              \n\
              data: [DONE]\n\
              \n",
        );
        assert_eq!(payloads, vec!["one\ntwo".to_string(), "[DONE]".to_string()]);
    }

    #[test]
    fn frames_survive_arbitrary_chunk_boundaries() {
        let frame = sse_event_block(r#"{"type":"session.idle","properties":{"title":"héllo"}}"#);
        let bytes = frame.as_bytes();
        let mut parser = SseFrameParser::default();
        let mut payloads = Vec::new();
        for chunk in bytes.chunks(3) {
            payloads.extend(parser.feed(chunk));
        }
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].contains("héllo"));
    }

    #[test]
    fn long_line_split_into_small_chunks_is_scanned_once() {
        let text = "x".repeat(200_000);
        let frame = sse_event_block(&format!(
            r#"{{"type":"message.part.updated","properties":{{"text":"{text}"}}}}"#
        ));
        let mut parser = SseFrameParser::default();
        let mut payloads = Vec::new();
        for chunk in frame.as_bytes().chunks(16) {
            payloads.extend(parser.feed(chunk));
            assert_eq!(parser.scanned, parser.buffer.len());
        }
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].ends_with(&format!("{text}\"}}}}")));
        assert!(parser.buffer.is_empty());
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut parser = SseFrameParser::default();
        let payloads = parser.feed(b"data: {\"a\":1}\r\n\r\n");
        assert_eq!(payloads, vec![r#"{"a":1}"#.to_string()]);
    }

    #[tokio::test]
    async fn decodes_events_in_order_then_ends_cleanly() {
        let chunks: Vec<Result<Vec<u8>, StreamError>> = vec![
            Ok(sse_event_block(r#"{"type":"server.connected","properties":{}}"#).into_bytes()),
            Ok(format!(
                "{}{}",
                sse_event_block(r#"{"type":"storage.write","properties":{"key":"k"}}"#),
                sse_event_block(r#"{"type":"session.idle","properties":{"sessionID":"s"}}"#)
            )
            .into_bytes()),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks)).collect().await;
        let kinds: Vec<_> = events
            .iter()
            .map(|e| e.as_ref().expect("event").kind().to_string())
            .collect();
        assert_eq!(kinds, vec!["server.connected", "storage.write", "session.idle"]);
        assert_eq!(
            events[2].as_ref().expect("event").properties(),
            &json!({"sessionID": "s"})
        );
    }

    #[tokio::test]
    async fn undecodable_payload_is_terminal() {
        let chunks: Vec<Result<Vec<u8>, StreamError>> = vec![Ok(format!(
            "{}{}",
            sse_event_block("not json"),
            sse_event_block(r#"{"type":"session.idle","properties":{}}"#)
        )
        .into_bytes())];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(StreamError::Decode(_))));
    }

    #[tokio::test]
    async fn transport_error_is_yielded_once() {
        let chunks: Vec<Result<Vec<u8>, StreamError>> = vec![
            Ok(sse_event_block(r#"{"type":"session.idle","properties":{}}"#).into_bytes()),
            Err(StreamError::Decode("connection reset".into())),
            Ok(sse_event_block(r#"{"type":"session.idle","properties":{}}"#).into_bytes()),
        ];
        let events: Vec<_> = decode_event_stream(stream::iter(chunks)).collect().await;
        assert_eq!(events.len(), 2);
        assert!(events[0].is_ok());
        assert!(events[1].is_err());
    }

    #[cfg(feature = "fuzz-tests")]
    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn payloads_do_not_depend_on_chunk_size(
                payloads in proptest::collection::vec(
                    proptest::collection::vec(
                        proptest::string::string_regex("[ -~]{0,24}").expect("regex"),
                        1..4
                    ),
                    0..8
                ),
                chunk in 1usize..17
            ) {
                let mut body = String::new();
                let mut expected = Vec::new();
                for payload_lines in &payloads {
                    body.push_str(": keepalive\r\n");
                    for line in payload_lines {
                        body.push_str("data: ");
                        body.push_str(line);
                        body.push_str("\r\n");
                    }
                    body.push_str("\r\n");
                    expected.push(payload_lines.join("\n"));
                }

                let mut parser = SseFrameParser::default();
                let mut seen = Vec::new();
                for piece in body.as_bytes().chunks(chunk) {
                    seen.extend(parser.feed(piece));
                }
                prop_assert_eq!(seen, expected);
            }
        }
    }
}

//! Server-Sent Events (SSE) processing for streaming responses.
//!
//! `streamGenerateContent?alt=sse` answers with one `data:` event per
//! response increment, each holding a complete `GenerateContentResponse`.
//! This module turns the raw byte stream into a stream of those responses.

use bytes::{Bytes, BytesMut};
use futures::stream::{self, Stream, StreamExt};
use serde::Deserialize;

use crate::client::{ApiErrorDetail, error_for_status};
use crate::observability::{STREAM_BYTES, STREAM_ERRORS, STREAM_EVENTS};
use crate::{Error, GenerateContentResponse, Result};

/// Process a stream of bytes into a stream of parsed responses.
///
/// Bytes are buffered until a blank line terminates an event, so events and
/// multi-byte characters split across network reads decode correctly.
pub fn process_sse<S>(byte_stream: S) -> impl Stream<Item = Result<GenerateContentResponse>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + Send + 'static,
{
    // Convert reqwest errors to our error type
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    stream::unfold(
        (stream, BytesMut::new(), false),
        move |(mut stream, mut buffer, mut done)| async move {
            loop {
                if let Some(event) = split_event(&mut buffer) {
                    match parse_event(&event) {
                        Some(item) => return Some((item, (stream, buffer, done))),
                        None => continue,
                    }
                }

                if done {
                    // A final event may arrive without its terminating blank line.
                    if buffer.iter().all(u8::is_ascii_whitespace) {
                        return None;
                    }
                    let event = std::mem::take(&mut buffer);
                    return parse_event(&event).map(|item| (item, (stream, buffer, done)));
                }

                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_BYTES.count(bytes.len() as u64);
                        buffer.extend_from_slice(&bytes);
                    }
                    Some(Err(e)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(e), (stream, buffer, done)));
                    }
                    None => done = true,
                }
            }
        },
    )
}

/// Split the first complete event off the front of the buffer, leaving the
/// rest in place.  The blank line ending the event is dropped.
fn split_event(buffer: &mut BytesMut) -> Option<BytesMut> {
    let (at, len) = (0..buffer.len()).find_map(|i| {
        let tail = &buffer[i..];
        if tail.starts_with(b"\n\n") {
            Some((i, 2))
        } else if tail.starts_with(b"\r\n\r\n") {
            Some((i, 4))
        } else {
            None
        }
    })?;
    let mut event = buffer.split_to(at + len);
    event.truncate(at);
    Some(event)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StreamPayload {
    Error { error: ApiErrorDetail },
    Response(GenerateContentResponse),
}

/// Parse one event.  Returns `None` for events that carry no data.
fn parse_event(event: &[u8]) -> Option<Result<GenerateContentResponse>> {
    let text = match std::str::from_utf8(event) {
        Ok(text) => text,
        Err(e) => {
            STREAM_ERRORS.click();
            return Some(Err(e.into()));
        }
    };

    let data = text
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect::<Vec<_>>();
    if data.is_empty() {
        return None;
    }
    let data = data.join("\n");
    if data.trim() == "[DONE]" {
        return None;
    }

    STREAM_EVENTS.click();
    match serde_json::from_str::<StreamPayload>(&data) {
        Ok(StreamPayload::Response(response)) => Some(Ok(response)),
        Ok(StreamPayload::Error { error }) => {
            STREAM_ERRORS.click();
            let status_code = error.code.unwrap_or(500);
            Some(Err(error_for_status(status_code, error, None)))
        }
        Err(e) => {
            STREAM_ERRORS.click();
            Some(Err(Error::serialization(
                format!("Failed to parse event JSON: {e}"),
                Some(Box::new(e)),
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    const HELLO: &[u8] =
        br#"data: {"candidates": [{"content": {"parts": [{"text": "Bon"}], "role": "model"}}]}"#;

    fn event(payload: &[u8], terminator: &[u8]) -> Vec<u8> {
        let mut bytes = payload.to_vec();
        bytes.extend_from_slice(terminator);
        bytes
    }

    #[tokio::test]
    async fn parse_single_event() {
        let data = event(HELLO, b"\n\n");
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let response = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(response.text(), "Bon");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn parse_crlf_events() {
        let mut data = event(HELLO, b"\r\n\r\n");
        data.extend(event(HELLO, b"\r\n\r\n"));
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let sse_stream = Box::pin(process_sse(stream));
        let responses = sse_stream.collect::<Vec<_>>().await;
        assert_eq!(responses.len(), 2);
        assert!(responses.iter().all(|r| r.as_ref().unwrap().text() == "Bon"));
    }

    #[tokio::test]
    async fn handle_split_multibyte_character() {
        let data = "data: {\"candidates\": [{\"content\": {\"parts\": [{\"text\": \"49,99€.\"}]}}]}\n\n"
            .as_bytes()
            .to_vec();
        let euro = data
            .windows(3)
            .position(|w| w == "€".as_bytes())
            .unwrap();
        // Cut inside the three-byte euro sign.
        let (first, second) = data.split_at(euro + 1);

        let stream = Box::pin(stream::iter(vec![
            Ok(Bytes::from(first.to_vec())),
            Ok(Bytes::from(second.to_vec())),
        ]));

        let mut sse_stream = Box::pin(process_sse(stream));
        let response = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(response.text(), "49,99€.");
    }

    #[tokio::test]
    async fn trailing_event_without_terminator() {
        let data = HELLO.to_vec();
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let response = sse_stream.next().await.unwrap().unwrap();
        assert_eq!(response.text(), "Bon");
        assert!(sse_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn skip_comments_and_keepalives() {
        let mut data = b": keep-alive\n\n".to_vec();
        data.extend(event(HELLO, b"\n\n"));
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let sse_stream = Box::pin(process_sse(stream));
        let responses = sse_stream.collect::<Vec<_>>().await;
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn split_event_keeps_the_rest() {
        let mut buffer = BytesMut::from(&b"data: a\r\n\r\ndata: b\n\ndata: c"[..]);
        assert_eq!(&split_event(&mut buffer).unwrap()[..], b"data: a");
        assert_eq!(&split_event(&mut buffer).unwrap()[..], b"data: b");
        assert!(split_event(&mut buffer).is_none());
        assert_eq!(&buffer[..], b"data: c");
    }

    #[tokio::test]
    async fn many_events_in_one_read() {
        let mut data = Vec::new();
        for _ in 0..5000 {
            data.extend(event(HELLO, b"\r\n\r\n"));
        }
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let sse_stream = Box::pin(process_sse(stream));
        let responses = sse_stream.collect::<Vec<_>>().await;
        assert_eq!(responses.len(), 5000);
        assert!(responses.iter().all(|r| r.as_ref().unwrap().text() == "Bon"));
    }

    #[tokio::test]
    async fn handle_malformed_event() {
        let data = b"data: {not json\n\n".to_vec();
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();
        assert!(matches!(event, Err(Error::Serialization { .. })));
    }

    #[tokio::test]
    async fn error_payload_mid_stream() {
        let data = br#"data: {"error": {"code": 503, "message": "The model is overloaded.", "status": "UNAVAILABLE"}}

"#
        .to_vec();
        let stream = Box::pin(stream::once(async move { Ok(Bytes::from(data)) }));

        let mut sse_stream = Box::pin(process_sse(stream));
        let event = sse_stream.next().await.unwrap();
        match event {
            Err(err) => {
                assert!(err.is_server_error());
                assert!(err.to_string().contains("overloaded"));
            }
            Ok(_) => panic!("expected an error"),
        }
    }
}

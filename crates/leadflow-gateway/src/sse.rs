use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Future, Stream};
use leadflow_core::{ActivityEvent, ActivityStream, EventSource, GatewayError, SessionId};
use leadflow_settings::GatewaySettings;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Progress feeds go quiet while an agent works; only a long silence ends one.
const FEED_IDLE_TIMEOUT: Duration = Duration::from_secs(300);

/// Split raw SSE text into `(event, data)` frames.
///
/// Frames end at a blank line. Multiple `data:` lines are joined with `\n`.
/// Comment lines (`:`) are ignored. Frames with no data are dropped.
pub fn parse_sse_frames(raw: &str) -> Vec<(String, String)> {
    let mut frames = Vec::new();
    let mut event = String::new();
    let mut data: Vec<String> = Vec::new();

    for line in raw.lines() {
        if line.is_empty() {
            flush_frame(&mut frames, &mut event, &mut data);
        } else if let Some(rest) = line.strip_prefix("event:") {
            event = rest.trim_start().to_string();
        } else if let Some(rest) = line.strip_prefix("data:") {
            data.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
        }
    }
    flush_frame(&mut frames, &mut event, &mut data);

    frames
}

fn flush_frame(frames: &mut Vec<(String, String)>, event: &mut String, data: &mut Vec<String>) {
    if !data.is_empty() {
        frames.push((std::mem::take(event), data.join("\n")));
    }
    event.clear();
    data.clear();
}

/// Decode one frame into an activity event. The SSE `event:` name stands in
/// for a missing `type` field. Non-JSON data is ignored.
fn decode_frame(event: &str, data: &str, subscribed: &SessionId) -> Option<ActivityEvent> {
    let mut value: Value = serde_json::from_str(data).ok()?;
    if let Value::Object(obj) = &mut value {
        if !obj.contains_key("type") && !event.is_empty() && event != "message" {
            let _ = obj.insert("type".into(), Value::String(event.to_string()));
        }
    }
    ActivityEvent::from_wire(&value, subscribed)
}

/// [`EventSource`] reading `GET {events_url}/{session_id}` as server-sent
/// events.
pub struct SseEventSource {
    client: Client,
    events_url: String,
    api_key: Option<SecretString>,
    idle_timeout: Duration,
}

impl SseEventSource {
    pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout())
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("http client: {e}")))?;
        Ok(Self {
            client,
            events_url: settings.events_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.as_ref().map(|k| k.0.clone()),
            idle_timeout: FEED_IDLE_TIMEOUT,
        })
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }
}

#[async_trait]
impl EventSource for SseEventSource {
    #[instrument(skip(self), fields(session_id = %session_id))]
    async fn subscribe(&self, session_id: &SessionId) -> Result<ActivityStream, GatewayError> {
        let url = format!("{}/{}", self.events_url, session_id.as_str());
        let mut req = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key.expose_secret());
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status, body));
        }

        debug!("activity feed opened");
        Ok(Box::pin(ActivityFeed::with_idle_timeout(
            resp.bytes_stream(),
            session_id.clone(),
            self.idle_timeout,
        )))
    }
}

/// Wraps a byte stream and yields decoded activity events. Transport errors
/// and idle timeouts end the feed.
///
/// Bytes are buffered until a whole frame has arrived, so a UTF-8 sequence
/// split across chunks is decoded intact.
struct ActivityFeed {
    inner: Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>,
    session_id: SessionId,
    buffer: Vec<u8>,
    pending: VecDeque<ActivityEvent>,
    idle_deadline: Pin<Box<tokio::time::Sleep>>,
    idle_duration: Duration,
    finished: bool,
}

impl ActivityFeed {
    fn with_idle_timeout(
        byte_stream: impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send + 'static,
        session_id: SessionId,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            session_id,
            buffer: Vec::new(),
            pending: VecDeque::new(),
            idle_deadline: Box::pin(tokio::time::sleep(idle_timeout)),
            idle_duration: idle_timeout,
            finished: false,
        }
    }

    fn decode(&mut self, frame: &[u8]) {
        let text = String::from_utf8_lossy(frame);
        for (event, data) in parse_sse_frames(&text) {
            if let Some(evt) = decode_frame(&event, &data, &self.session_id) {
                self.pending.push_back(evt);
            }
        }
    }
}

/// Index just past the first blank line in `buf`.
fn frame_end(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\n\n").map(|pos| pos + 2)
}

impl Stream for ActivityFeed {
    type Item = ActivityEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if let Some(evt) = self.pending.pop_front() {
            return Poll::Ready(Some(evt));
        }
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match self.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    let deadline = tokio::time::Instant::now() + self.idle_duration;
                    self.idle_deadline.as_mut().reset(deadline);

                    // CR never occurs inside a multi-byte sequence.
                    self.buffer.extend(bytes.iter().copied().filter(|b| *b != b'\r'));

                    while let Some(end) = frame_end(&self.buffer) {
                        let frame: Vec<u8> = self.buffer.drain(..end).collect();
                        self.decode(&frame);
                    }

                    if let Some(evt) = self.pending.pop_front() {
                        return Poll::Ready(Some(evt));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    warn!(session_id = %self.session_id, error = %e, "activity feed interrupted");
                    self.finished = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(None) => {
                    self.finished = true;
                    if !self.buffer.is_empty() {
                        let remaining = std::mem::take(&mut self.buffer);
                        self.decode(&remaining);
                    }
                    return Poll::Ready(self.pending.pop_front());
                }
                Poll::Pending => {
                    if self.idle_deadline.as_mut().poll(cx).is_ready() {
                        warn!(
                            session_id = %self.session_id,
                            idle_secs = self.idle_duration.as_secs(),
                            "activity feed idle timeout"
                        );
                        self.finished = true;
                        return Poll::Ready(None);
                    }
                    return Poll::Pending;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use leadflow_core::ActivityKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn frames_basic() {
        let raw = "event: thinking\ndata: {\"message\":\"a\"}\n\ndata: {\"type\":\"progress\"}\n\n";
        let frames = parse_sse_frames(raw);
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], ("thinking".into(), "{\"message\":\"a\"}".into()));
        assert_eq!(frames[1].0, "");
    }

    #[test]
    fn frames_join_multiline_data_and_skip_comments() {
        let raw = ": keepalive\n\ndata: line1\ndata: line2\n\n";
        let frames = parse_sse_frames(raw);
        assert_eq!(frames, vec![(String::new(), "line1\nline2".to_string())]);
    }

    #[test]
    fn frames_trailing_without_blank_line() {
        let frames = parse_sse_frames("data: {}");
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn event_name_fills_missing_type() {
        let sid = SessionId::from_raw("s");
        let evt = decode_frame("thinking", r#"{"message":"hmm"}"#, &sid).unwrap();
        assert_eq!(evt.kind, ActivityKind::Thinking);

        let evt = decode_frame("thinking", r#"{"type":"progress"}"#, &sid).unwrap();
        assert_eq!(evt.kind, ActivityKind::Progress);

        assert!(decode_frame("", "not json", &sid).is_none());
    }

    #[tokio::test]
    async fn feed_idle_timeout_ends_stream() {
        tokio::time::pause();

        let byte_stream = futures::stream::pending::<Result<bytes::Bytes, reqwest::Error>>();
        let mut feed = Box::pin(ActivityFeed::with_idle_timeout(
            byte_stream,
            SessionId::from_raw("s"),
            Duration::from_secs(5),
        ));

        tokio::time::advance(Duration::from_secs(6)).await;
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn feed_splits_frames_across_chunks() {
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<bytes::Bytes, reqwest::Error>>(8);
        let rx_stream = tokio_stream::wrappers::ReceiverStream::new(rx);
        let mut feed = Box::pin(ActivityFeed::with_idle_timeout(
            rx_stream,
            SessionId::from_raw("s"),
            Duration::from_secs(60),
        ));

        tx.send(Ok(bytes::Bytes::from("data: {\"type\":\"thin")))
            .await
            .unwrap();
        tx.send(Ok(bytes::Bytes::from("king\",\"message\":\"step 1\"}\n\n")))
            .await
            .unwrap();
        drop(tx);

        let evt = feed.next().await.unwrap();
        assert!(evt.is_thinking());
        assert_eq!(evt.message, "step 1");
        assert!(feed.next().await.is_none());
    }

    #[tokio::test]
    async fn feed_keeps_multibyte_chars_split_across_chunks() {
        let (tx, rx) = tokio::sync::mpsc::channel::<Result<bytes::Bytes, reqwest::Error>>(8);
        let mut feed = Box::pin(ActivityFeed::with_idle_timeout(
            tokio_stream::wrappers::ReceiverStream::new(rx),
            SessionId::from_raw("s"),
            Duration::from_secs(60),
        ));

        let frame = "data: {\"type\":\"thinking\",\"message\":\"Résumé\"}\r\n\r\n".as_bytes();
        let split = frame.iter().position(|b| *b == 0xC3).unwrap() + 1;
        tx.send(Ok(bytes::Bytes::copy_from_slice(&frame[..split])))
            .await
            .unwrap();
        tx.send(Ok(bytes::Bytes::copy_from_slice(&frame[split..])))
            .await
            .unwrap();
        drop(tx);

        let evt = feed.next().await.unwrap();
        assert_eq!(evt.message, "Résumé");
        assert!(feed.next().await.is_none());
    }

    #[test]
    fn frame_end_finds_first_blank_line() {
        assert_eq!(frame_end(b"data: a\n\ndata: b\n\n"), Some(9));
        assert_eq!(frame_end(b"data: a\n"), None);
    }

    #[tokio::test]
    async fn subscribe_reads_session_feed() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"type\":\"agent_start\",\"agent_id\":\"outreach-coordinator\",\"agent_name\":\"Outreach Coordinator\"}\n\n",
            "event: thinking\n",
            "data: {\"message\":\"Researching TechCorp\"}\n\n",
        );
        Mock::given(method("GET"))
            .and(path("/api/events/sess-1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let settings = GatewaySettings {
            events_url: format!("{}/api/events/", server.uri()),
            ..GatewaySettings::default()
        };
        let source = SseEventSource::new(&settings).unwrap();
        let stream = source.subscribe(&SessionId::from_raw("sess-1")).await.unwrap();
        let events: Vec<ActivityEvent> = stream.collect().await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, ActivityKind::AgentStart);
        assert_eq!(events[0].session_id.as_str(), "sess-1");
        assert!(events[1].is_thinking());
        assert_eq!(events[1].message, "Researching TechCorp");
    }

    #[tokio::test]
    async fn subscribe_rejects_unknown_session() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such session"))
            .mount(&server)
            .await;

        let settings = GatewaySettings {
            events_url: format!("{}/api/events", server.uri()),
            ..GatewaySettings::default()
        };
        let source = SseEventSource::new(&settings).unwrap();
        let result = source.subscribe(&SessionId::from_raw("gone")).await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
    }
}

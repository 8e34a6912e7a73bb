use futures_util::StreamExt;
use memchr::memchr;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, ChatResponse};
use crate::utils::url::construct_api_url;

/// Longest error detail surfaced in the banner before truncation.
const MAX_ERROR_DETAIL: usize = 200;

/// One event of a reply stream, tagged on the channel with the id of the
/// stream it belongs to.
#[derive(Clone, Debug)]
pub enum StreamMessage {
    /// The next piece of reply text, in arrival order.
    Fragment(String),
    /// The stream failed; the detail is banner-ready.
    Failed(String),
    /// No further events will arrive for this stream.
    Completed,
}

/// What one SSE line amounts to.
#[derive(Debug)]
enum SseEvent {
    Fragment(String),
    Done,
    ApiError(String),
    Skip,
}

fn parse_sse_line(line: &str) -> SseEvent {
    let Some(payload) = line.strip_prefix("data:").map(str::trim_start) else {
        return SseEvent::Skip;
    };
    if payload == "[DONE]" {
        return SseEvent::Done;
    }

    match serde_json::from_str::<ChatResponse>(payload) {
        Ok(chunk) => match chunk
            .choices
            .first()
            .and_then(|choice| choice.delta.content.clone())
        {
            Some(content) => SseEvent::Fragment(content),
            None => SseEvent::Skip,
        },
        Err(_) if payload.trim().is_empty() => SseEvent::Skip,
        // Providers report mid-stream failures as a JSON error object in
        // place of a chunk.
        Err(_) => SseEvent::ApiError(summarize_api_error(payload)),
    }
}

fn error_detail(value: &serde_json::Value) -> Option<String> {
    let detail = match value.get("error") {
        Some(serde_json::Value::String(text)) => Some(text.clone()),
        Some(inner) => inner
            .get("message")
            .and_then(|message| message.as_str())
            .map(str::to_owned),
        None => value
            .get("message")
            .and_then(|message| message.as_str())
            .map(str::to_owned),
    }?;

    let collapsed = detail.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// Reduce an API failure body to one banner-sized line.
///
/// JSON bodies prefer the provider's `error.message`; anything else is
/// whitespace-collapsed and truncated.
pub fn summarize_api_error(error_text: &str) -> String {
    let trimmed = error_text.trim();

    if trimmed.is_empty() {
        return "empty response from API".to_string();
    }

    if let Ok(json_value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if let Some(detail) = error_detail(&json_value) {
            return truncate_detail(&detail);
        }
    }

    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    truncate_detail(&collapsed)
}

fn truncate_detail(text: &str) -> String {
    if text.chars().count() <= MAX_ERROR_DETAIL {
        return text.to_string();
    }
    let clipped: String = text.chars().take(MAX_ERROR_DETAIL).collect();
    format!("{clipped}…")
}

pub struct StreamParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub api_messages: Vec<ChatMessage>,
    pub cancel_token: tokio_util::sync::CancellationToken,
    pub stream_id: u64,
}

/// Spawns reply streams and forwards their fragments, tagged with the stream
/// id they belong to, over one shared channel. The event loop drains that
/// channel and drops events whose id is no longer current.
#[derive(Clone)]
pub struct ChatStreamService {
    tx: mpsc::UnboundedSender<(StreamMessage, u64)>,
}

impl ChatStreamService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(StreamMessage, u64)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Starts one streaming exchange in the background. Every stream settles
    /// with `Completed`, preceded by `Failed` when it went wrong; a cancelled
    /// stream settles silently and the stale-id filter mops up any stragglers.
    pub fn spawn_stream(&self, params: StreamParams) {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let stream_id = params.stream_id;
            let cancel_token = params.cancel_token.clone();

            tokio::select! {
                outcome = drive_stream(params, &tx) => {
                    if let Err(detail) = outcome {
                        let _ = tx.send((StreamMessage::Failed(detail), stream_id));
                    }
                    let _ = tx.send((StreamMessage::Completed, stream_id));
                }
                _ = cancel_token.cancelled() => {}
            }
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: StreamMessage, stream_id: u64) {
        let _ = self.tx.send((message, stream_id));
    }
}

/// Runs one streaming request, forwarding fragments as they arrive. `Err`
/// carries the banner detail for a failed stream.
async fn drive_stream(
    params: StreamParams,
    tx: &mpsc::UnboundedSender<(StreamMessage, u64)>,
) -> Result<(), String> {
    let StreamParams {
        client,
        base_url,
        api_key,
        model,
        api_messages,
        cancel_token,
        stream_id,
    } = params;

    debug!(stream_id, %model, "starting reply stream");

    let request = ChatRequest {
        model,
        messages: api_messages,
        stream: true,
    };

    let url = construct_api_url(&base_url, "chat/completions");
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await
        .map_err(|e| summarize_api_error(&e.to_string()))?;

    if !response.status().is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        return Err(summarize_api_error(&body));
    }

    let mut body = response.bytes_stream();
    let mut buffer: Vec<u8> = Vec::new();

    while let Some(chunk) = body.next().await {
        if cancel_token.is_cancelled() {
            return Ok(());
        }

        let bytes = chunk.map_err(|e| summarize_api_error(&e.to_string()))?;
        buffer.extend_from_slice(&bytes);

        // A network read may carry several SSE lines or stop mid-line, so
        // complete lines are peeled off a carry buffer.
        while let Some(newline_pos) = memchr(b'\n', &buffer) {
            let event = match std::str::from_utf8(&buffer[..newline_pos]) {
                Ok(line) => parse_sse_line(line.trim()),
                Err(e) => {
                    debug!(stream_id, "dropping invalid UTF-8 line: {e}");
                    SseEvent::Skip
                }
            };
            buffer.drain(..=newline_pos);

            match event {
                SseEvent::Fragment(content) => {
                    let _ = tx.send((StreamMessage::Fragment(content), stream_id));
                }
                SseEvent::Done => return Ok(()),
                SseEvent::ApiError(detail) => return Err(detail),
                SseEvent::Skip => {}
            }
        }
    }

    // Server closed the connection without a [DONE] marker.
    Ok(())
}

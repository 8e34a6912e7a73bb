use tokio::sync::mpsc;
use tracing::debug;

use crate::api::{ChatMessage, ChatRequest, CompletionResponse};
use crate::core::chat_stream::summarize_api_error;
use crate::core::message::TranslationStyle;
use crate::utils::url::construct_api_url;

/// Outcome of one translation request, keyed by the message and style it was
/// issued for. The keys let the reducer merge results index-addressed, so a
/// late completion can never touch any other message or style.
#[derive(Clone, Debug)]
pub enum TranslationMessage {
    Done {
        message_index: usize,
        style: TranslationStyle,
        text: String,
    },
    Failed {
        message_index: usize,
        style: TranslationStyle,
        error: String,
    },
}

pub struct TranslationParams {
    pub client: reqwest::Client,
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub source_text: String,
    pub target_language: String,
    pub style: TranslationStyle,
    pub message_index: usize,
}

/// Issues one-shot styled translation requests. Requests for different
/// (message, style) pairs run concurrently; each resolves to exactly one
/// `TranslationMessage` on the shared channel.
#[derive(Clone)]
pub struct TranslationService {
    tx: mpsc::UnboundedSender<TranslationMessage>,
}

impl TranslationService {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TranslationMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn spawn_translation(&self, params: TranslationParams) {
        let tx_clone = self.tx.clone();
        tokio::spawn(async move {
            let TranslationParams {
                client,
                base_url,
                api_key,
                model,
                source_text,
                target_language,
                style,
                message_index,
            } = params;

            debug!(
                message_index,
                style = style.as_str(),
                %target_language,
                "starting translation request"
            );

            let prompt = style.prompt(&source_text, &target_language);
            let request = ChatRequest {
                model,
                messages: vec![ChatMessage {
                    role: "user".to_string(),
                    content: prompt,
                }],
                stream: false,
            };

            let message = match request_translation(&client, &base_url, &api_key, &request).await
            {
                Ok(text) => TranslationMessage::Done {
                    message_index,
                    style,
                    text,
                },
                Err(error) => TranslationMessage::Failed {
                    message_index,
                    style,
                    error,
                },
            };
            let _ = tx_clone.send(message);
        });
    }

    #[cfg(test)]
    pub fn send_for_test(&self, message: TranslationMessage) {
        let _ = self.tx.send(message);
    }
}

async fn request_translation(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    request: &ChatRequest,
) -> Result<String, String> {
    let url = construct_api_url(base_url, "chat/completions");
    let response = client
        .post(url)
        .header("Authorization", format!("Bearer {api_key}"))
        .header("Content-Type", "application/json")
        .json(request)
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

    let completion: CompletionResponse = response
        .json()
        .await
        .map_err(|e| summarize_api_error(&e.to_string()))?;

    match completion.first_content() {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err("translation service returned no text".to_string()),
    }
}

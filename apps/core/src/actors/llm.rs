use crate::actors::messages::{ActorError, AppError, LlmMessage};
use crate::actors::traits::LlmActor;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{error, info, warn};

// --- Constants ---
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAILBOX_CAPACITY: usize = 64;
/// Extra time the handle waits on top of the HTTP timeout before giving up on a reply.
const REPLY_GRACE: Duration = Duration::from_secs(5);

/// Connection settings for the hosted model.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub request_timeout: Duration,
}

/// A handle to the `LlmActor`.
///
/// This struct provides a public, cloneable interface for sending messages to the
/// running LLM actor. It abstracts away the `mpsc::Sender`.
#[derive(Clone)]
pub struct LlmActorHandle {
    sender: mpsc::Sender<LlmMessage>,
    reply_timeout: Duration,
}

impl LlmActorHandle {
    /// Creates a new `LlmActor` and returns a handle to it.
    ///
    /// This will spawn the `LlmActorRunner` in a new Tokio task.
    pub fn new(settings: LlmSettings) -> Self {
        let (sender, receiver) = mpsc::channel(MAILBOX_CAPACITY);
        let reply_timeout = settings.request_timeout + REPLY_GRACE;
        let actor = LlmActorRunner::new(receiver, MessagesClient::new(settings));
        tokio::spawn(async move { actor.run().await });
        Self {
            sender,
            reply_timeout,
        }
    }
}

#[async_trait]
impl LlmActor for LlmActorHandle {
    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String, AppError> {
        let (send, recv) = oneshot::channel();
        let msg = LlmMessage::Complete {
            prompt,
            max_tokens,
            responder: send,
        };

        self.sender
            .send(msg)
            .await
            .map_err(|e| ActorError::ChannelClosed(e.to_string()))?;
        timeout(self.reply_timeout, recv)
            .await?
            .map_err(|e| ActorError::ChannelClosed(e.to_string()))?
    }
}

// --- Actor Runner (Internal Logic) ---
struct LlmActorRunner {
    receiver: mpsc::Receiver<LlmMessage>,
    client: MessagesClient,
}

impl LlmActorRunner {
    fn new(receiver: mpsc::Receiver<LlmMessage>, client: MessagesClient) -> Self {
        Self { receiver, client }
    }

    async fn run(mut self) {
        info!(model = %self.client.model, "LlmActor started");

        while let Some(msg) = self.receiver.recv().await {
            self.handle_message(msg);
        }

        info!("LlmActor stopped");
    }

    /// Every completion runs in its own task so a slow request never holds up the mailbox.
    fn handle_message(&self, msg: LlmMessage) {
        match msg {
            LlmMessage::Complete {
                prompt,
                max_tokens,
                responder,
            } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.create_message(&prompt, max_tokens).await;
                    if let Err(e) = &result {
                        error!("Completion failed: {}", e);
                    }
                    if responder.send(result).is_err() {
                        warn!("Completion finished after the caller went away; result discarded");
                    }
                });
            }
        }
    }
}

/// Thin client for the Anthropic Messages API.
#[derive(Clone)]
struct MessagesClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesClient {
    fn new(settings: LlmSettings) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/v1/messages", settings.base_url.trim_end_matches('/')),
            api_key: settings.api_key,
            model: settings.model,
            request_timeout: settings.request_timeout,
        }
    }

    async fn create_message(&self, prompt: &str, max_tokens: u32) -> Result<String, AppError> {
        info!(
            prompt_chars = prompt.chars().count(),
            max_tokens, "LLM completion requested"
        );

        let payload = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let request_future = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send();

        let res = timeout(self.request_timeout, request_future).await??;
        let status = res.status();

        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(AppError::Provider(format!(
                "Completion request failed with status {}: {}",
                status, body
            )));
        }

        let body: MessagesResponse = res
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("Malformed completion response: {}", e)))?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| {
                AppError::Provider("Completion response contained no text content".to_string())
            })
    }
}

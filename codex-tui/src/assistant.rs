//! Writing assistant worker thread
//!
//! Requests run off the UI thread; replies come back tagged with the
//! segment they were made for.

use codex_core::assist::Assistant;
use codex_core::config::AssistantConfig;
use crossbeam_channel::{Receiver, Sender};
use std::thread;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssistKind {
    Continue,
    Summarize,
}

#[derive(Debug, Clone)]
pub struct AssistRequest {
    pub kind: AssistKind,
    pub segment_id: String,
    pub title: String,
    pub content: String,
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistReply {
    pub kind: AssistKind,
    pub segment_id: String,
    pub text: String,
}

pub struct AssistantWorker {
    request_tx: Sender<AssistRequest>,
    reply_rx: Receiver<AssistReply>,
    _worker_thread: thread::JoinHandle<()>,
}

impl AssistantWorker {
    pub fn spawn(assistant: Box<dyn Assistant>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::unbounded::<AssistRequest>();
        let (reply_tx, reply_rx) = crossbeam_channel::unbounded();

        let worker_thread = thread::spawn(move || {
            for req in request_rx {
                let text = match req.kind {
                    AssistKind::Continue => {
                        assistant.continue_text(&req.content, &req.title, &req.context)
                    }
                    AssistKind::Summarize => assistant.summarize(&req.content),
                };
                let reply = AssistReply {
                    kind: req.kind,
                    segment_id: req.segment_id,
                    text,
                };
                if reply_tx.send(reply).is_err() {
                    break;
                }
            }
        });

        Self {
            request_tx,
            reply_rx,
            _worker_thread: worker_thread,
        }
    }

    pub fn request(&self, req: AssistRequest) {
        let _ = self.request_tx.send(req);
    }

    /// Try to receive a reply (non-blocking)
    pub fn try_recv_reply(&self) -> Option<AssistReply> {
        self.reply_rx.try_recv().ok()
    }
}

/// Backend selected by configuration. Without the `ai` feature, or without
/// an API key, every request gets the offline message.
pub fn from_config(config: &AssistantConfig) -> Box<dyn Assistant> {
    if !config.enabled {
        return Box::new(codex_core::assist::OfflineAssistant);
    }

    #[cfg(feature = "ai")]
    {
        match gemini::GeminiAssistant::from_config(config) {
            Some(assistant) => return Box::new(assistant),
            None => log::warn!(
                "assistant enabled but {} is not set; running offline",
                config.api_key_env
            ),
        }
    }
    #[cfg(not(feature = "ai"))]
    log::warn!("assistant enabled but codex was built without the `ai` feature");

    Box::new(codex_core::assist::OfflineAssistant)
}

#[cfg(feature = "ai")]
pub mod gemini {
    //! Gemini `generateContent` client

    use anyhow::{Context, Result};
    use codex_core::assist::{
        continuation_prompt, summary_prompt, Assistant, SUMMARY_FAILED_MESSAGE,
        UNAVAILABLE_MESSAGE,
    };
    use codex_core::config::AssistantConfig;
    use std::time::Duration;

    pub struct GeminiAssistant {
        client: reqwest::blocking::Client,
        endpoint: String,
        model: String,
        api_key: String,
    }

    impl GeminiAssistant {
        pub fn from_config(config: &AssistantConfig) -> Option<Self> {
            let api_key = std::env::var(&config.api_key_env).ok()?;
            let client = reqwest::blocking::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .ok()?;
            Some(Self {
                client,
                endpoint: config.endpoint.trim_end_matches('/').to_string(),
                model: config.model.clone(),
                api_key,
            })
        }

        fn generate(&self, prompt: &str) -> Result<String> {
            let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
            let body = serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            });

            let response: serde_json::Value = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&body)
                .send()
                .context("Request failed")?
                .error_for_status()
                .context("Request rejected")?
                .json()
                .context("Invalid response body")?;

            Ok(response_text(&response))
        }
    }

    /// Concatenated text parts of the first candidate
    pub fn response_text(response: &serde_json::Value) -> String {
        response["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|p| p["text"].as_str())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    impl Assistant for GeminiAssistant {
        fn continue_text(&self, content: &str, title: &str, context: &str) -> String {
            match self.generate(&continuation_prompt(content, title, context)) {
                Ok(text) => text,
                Err(e) => {
                    log::error!("continuation failed: {:#}", e);
                    UNAVAILABLE_MESSAGE.to_string()
                }
            }
        }

        fn summarize(&self, content: &str) -> String {
            match self.generate(&summary_prompt(content)) {
                Ok(text) => text,
                Err(e) => {
                    log::error!("summary failed: {:#}", e);
                    SUMMARY_FAILED_MESSAGE.to_string()
                }
            }
        }
    }

}

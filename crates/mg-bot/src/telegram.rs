//! Thin typed client for the Telegram Bot API.
//!
//! Covers exactly the methods the bot uses: `getMe` for startup
//! validation, `getUpdates` long polling, `sendMessage`, and the
//! "typing" chat action. Everything else the Bot API offers is out of
//! scope here.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the Telegram transport.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP-level failure (connect, timeout, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The API answered with `ok: false`.
    #[error("telegram api error: {0}")]
    Api(String),
}

pub type TelegramResult<T> = Result<T, TelegramError>;

/// Configuration for the Telegram transport.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather. Overridable via TELEGRAM_BOT_TOKEN.
    #[serde(default)]
    pub token: String,
    /// API base URL (overridden in tests).
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Long-poll hold time in seconds for `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_poll_timeout_secs() -> u64 {
    50
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_base: default_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

// ── Wire types ────────────────────────────────────────────────

/// Envelope every Bot API method responds with.
#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Serialize)]
struct SendChatActionRequest<'a> {
    chat_id: i64,
    action: &'a str,
}

/// One incoming update from long polling.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonic update identifier; the next poll offset derives from it.
    pub update_id: i64,
    /// Message payload, present for message updates.
    pub message: Option<Message>,
}

/// An incoming message (only the fields the bot reads).
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    /// Sender; absent for channel posts.
    pub from: Option<User>,
    pub chat: Chat,
    /// Text content; absent for stickers, photos, joins and the like.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// The bot's own identity, from `getMe`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotProfile {
    pub id: i64,
    pub username: Option<String>,
}

// ── Client ────────────────────────────────────────────────────

/// Client for the Telegram Bot API.
pub struct TelegramClient {
    client: reqwest::Client,
    config: TelegramConfig,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> Self {
        // The HTTP timeout must outlast the long-poll hold time, or
        // every quiet poll would surface as an error.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .expect("failed to build reqwest client");
        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.config.api_base, self.config.token, method)
    }

    /// POST a method call and unwrap the `ok`/`result` envelope.
    async fn call<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> TelegramResult<T> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;
        let envelope: ApiResponse<T> = response.json().await?;
        if !envelope.ok {
            return Err(TelegramError::Api(
                envelope
                    .description
                    .unwrap_or_else(|| "no description".into()),
            ));
        }
        envelope
            .result
            .ok_or_else(|| TelegramError::Api("ok response without result".into()))
    }

    /// Validate the token and fetch the bot's own identity.
    pub async fn get_me(&self) -> TelegramResult<BotProfile> {
        self.call("getMe", &serde_json::json!({})).await
    }

    /// Long-poll for updates at the given offset.
    pub async fn get_updates(&self, offset: i64) -> TelegramResult<Vec<Update>> {
        let body = GetUpdatesRequest {
            offset,
            timeout: self.config.poll_timeout_secs,
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &body).await
    }

    /// Send a plain-text reply to a chat.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> TelegramResult<()> {
        let body = SendMessageRequest { chat_id, text };
        let _: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }

    /// Show the "typing" indicator while a reply is being produced.
    pub async fn send_typing(&self, chat_id: i64) -> TelegramResult<()> {
        let body = SendChatActionRequest {
            chat_id,
            action: "typing",
        };
        let _: serde_json::Value = self.call("sendChatAction", &body).await?;
        Ok(())
    }
}

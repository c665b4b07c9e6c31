//! Tghook Telegram Adapter
//!
//! Telegram Bot API wire types plus a small reqwest client covering the
//! webhook administration calls, message sending and long polling.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const TELEGRAM_MAX_MESSAGE_LEN: usize = 4096;

/// One inbound event. Every payload field except the envelope itself is
/// optional: a callback query or an edited message is still a valid update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub edited_message: Option<TelegramMessage>,
    #[serde(default)]
    pub channel_post: Option<TelegramMessage>,
    #[serde(default)]
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub message_id: i64,
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub date: Option<i64>,
}

impl TelegramMessage {
    pub fn sender_username(&self) -> &str {
        self.from
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub chat_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelegramUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub is_bot: Option<bool>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    #[serde(default = "Option::default")]
    result: Option<T>,
}

/// Telegram's acknowledgement of an administrative call. `ok` is the
/// platform's own verdict and can be false on an HTTP 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiAck {
    pub ok: bool,
    pub description: Option<String>,
}

/// Bot API capability handed to update handlers and to webhook registration.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn set_webhook(&self, url: &str) -> Result<ApiAck>;

    async fn delete_webhook(&self) -> Result<ApiAck>;

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()>;

    async fn get_me(&self) -> Result<TelegramUser>;

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64)
        -> Result<Vec<TelegramUpdate>>;
}

/// Builds a [`BotApi`] handle for a token. Tokens are resolved per request,
/// so a connector is asked for a fresh handle each time.
pub trait BotConnector: Send + Sync {
    fn connect(&self, token: &str) -> Arc<dyn BotApi>;
}

pub struct TelegramClient {
    client: Client,
    api_url: String,
}

impl TelegramClient {
    pub fn new(client: Client, api_base_url: &str, token: &str) -> Self {
        let api_url = format!("{}/bot{}", api_base_url.trim_end_matches('/'), token);
        Self { client, api_url }
    }

    pub fn build_client(request_timeout: Duration) -> Result<Client> {
        ClientBuilder::new()
            .pool_idle_timeout(Duration::from_secs(600))
            .pool_max_idle_per_host(10)
            .tcp_keepalive(Some(Duration::from_secs(30)))
            .timeout(request_timeout)
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| anyhow!("failed to build HTTP client: {}", e))
    }

    /// Posts `payload` to `method` and decodes the envelope. Telegram answers
    /// API-level failures with a 4xx status and a JSON body, so the body is
    /// decoded before the status is judged.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<ApiResponse<T>> {
        let url = format!("{}/{}", self.api_url, method);

        // reqwest errors embed the URL, which carries the bot token.
        let resp = self
            .client
            .post(&url)
            .json(payload)
            .send()
            .await
            .map_err(|e| anyhow!("telegram {} request failed: {}", method, e.without_url()))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| anyhow!("telegram {} read failed: {}", method, e.without_url()))?;

        match serde_json::from_slice::<ApiResponse<T>>(&body) {
            Ok(parsed) => {
                debug!(method, status = %status, ok = parsed.ok, "telegram call completed");
                Ok(parsed)
            }
            Err(e) if status.is_success() => {
                Err(anyhow!("telegram {} decode failed: {}", method, e))
            }
            Err(_) => Err(anyhow!(
                "telegram {} HTTP {}: {}",
                method,
                status,
                String::from_utf8_lossy(&body)
            )),
        }
    }

    async fn call_ack(&self, method: &str, payload: &serde_json::Value) -> Result<ApiAck> {
        let parsed: ApiResponse<serde_json::Value> = self.call(method, payload).await?;
        Ok(ApiAck {
            ok: parsed.ok,
            description: parsed.description,
        })
    }

    async fn call_result<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
    ) -> Result<T> {
        let parsed: ApiResponse<T> = self.call(method, payload).await?;
        if !parsed.ok {
            return Err(anyhow!(
                "telegram {} returned ok=false: {}",
                method,
                parsed.description.unwrap_or_default()
            ));
        }
        parsed
            .result
            .ok_or_else(|| anyhow!("telegram {} returned no result", method))
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn set_webhook(&self, url: &str) -> Result<ApiAck> {
        self.call_ack("setWebhook", &serde_json::json!({ "url": url }))
            .await
    }

    async fn delete_webhook(&self) -> Result<ApiAck> {
        self.call_ack("deleteWebhook", &serde_json::json!({})).await
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        for chunk in chunk_message(text) {
            let payload = serde_json::json!({
                "chat_id": chat_id,
                "text": chunk,
            });
            let _: serde_json::Value = self.call_result("sendMessage", &payload).await?;
        }
        Ok(())
    }

    async fn get_me(&self) -> Result<TelegramUser> {
        self.call_result("getMe", &serde_json::json!({})).await
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        let mut payload = serde_json::json!({ "timeout": timeout_secs });
        if let Some(offset) = offset {
            payload["offset"] = serde_json::json!(offset);
        }
        self.call_result("getUpdates", &payload).await
    }
}

/// Connector producing [`TelegramClient`]s that share one connection pool.
#[derive(Clone)]
pub struct TelegramConnector {
    client: Client,
    api_base_url: String,
}

impl TelegramConnector {
    pub fn new(api_base_url: impl Into<String>, request_timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: TelegramClient::build_client(request_timeout)?,
            api_base_url: api_base_url.into(),
        })
    }
}

impl BotConnector for TelegramConnector {
    fn connect(&self, token: &str) -> Arc<dyn BotApi> {
        Arc::new(TelegramClient::new(
            self.client.clone(),
            &self.api_base_url,
            token,
        ))
    }
}

/// Splits `text` into pieces Telegram accepts, preferring to break after
/// whitespace or sentence punctuation.
fn chunk_message(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= TELEGRAM_MAX_MESSAGE_LEN {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let mut end = (start + TELEGRAM_MAX_MESSAGE_LEN).min(chars.len());

        if end < chars.len() {
            let mut split = end;
            for i in (start..end).rev() {
                let c = chars[i];
                if c == '\n' || c == ' ' || c == '.' || c == '!' || c == '?' {
                    split = i + 1;
                    break;
                }
            }
            if split > start {
                end = split;
            }
        }

        chunks.push(chars[start..end].iter().collect::<String>());
        start = end;
    }

    chunks
}

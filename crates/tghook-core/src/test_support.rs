//! In-memory Bot API doubles shared by unit tests.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tghook_telegram::{ApiAck, BotApi, BotConnector, TelegramUpdate, TelegramUser};

pub fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Default)]
struct FakeBotState {
    webhook_urls: Vec<String>,
    sent: Vec<(i64, String)>,
    deleted_webhooks: usize,
    update_batches: VecDeque<Vec<TelegramUpdate>>,
    offsets: Vec<Option<i64>>,
}

#[derive(Clone)]
pub struct FakeBot {
    state: Arc<Mutex<FakeBotState>>,
    ack: ApiAck,
    fail: bool,
    fail_updates: bool,
}

impl Default for FakeBot {
    fn default() -> Self {
        Self::with_ack(ApiAck {
            ok: true,
            description: Some("Webhook was set".to_string()),
        })
    }
}

impl FakeBot {
    pub fn with_ack(ack: ApiAck) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeBotState::default())),
            ack,
            fail: false,
            fail_updates: false,
        }
    }

    /// Every call fails as if Telegram were unreachable.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Only `getUpdates` fails; the token checks in `prepare` pass.
    pub fn failing_updates() -> Self {
        Self {
            fail_updates: true,
            ..Self::default()
        }
    }

    pub fn push_updates(&self, updates: Vec<TelegramUpdate>) {
        self.state.lock().unwrap().update_batches.push_back(updates);
    }

    pub fn webhook_urls(&self) -> Vec<String> {
        self.state.lock().unwrap().webhook_urls.clone()
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn deleted_webhooks(&self) -> usize {
        self.state.lock().unwrap().deleted_webhooks
    }

    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.state.lock().unwrap().offsets.clone()
    }

    fn check(&self, method: &str) -> Result<()> {
        if self.fail {
            return Err(anyhow!("telegram {} request failed: connection refused", method));
        }
        Ok(())
    }
}

#[async_trait]
impl BotApi for FakeBot {
    async fn set_webhook(&self, url: &str) -> Result<ApiAck> {
        self.check("setWebhook")?;
        self.state.lock().unwrap().webhook_urls.push(url.to_string());
        Ok(self.ack.clone())
    }

    async fn delete_webhook(&self) -> Result<ApiAck> {
        self.check("deleteWebhook")?;
        self.state.lock().unwrap().deleted_webhooks += 1;
        Ok(ApiAck {
            ok: true,
            description: Some("Webhook was deleted".to_string()),
        })
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<()> {
        self.check("sendMessage")?;
        self.state.lock().unwrap().sent.push((chat_id, text.to_string()));
        Ok(())
    }

    async fn get_me(&self) -> Result<TelegramUser> {
        self.check("getMe")?;
        Ok(TelegramUser {
            id: 7,
            is_bot: Some(true),
            first_name: Some("Echo".to_string()),
            username: Some("echo_bot".to_string()),
        })
    }

    async fn get_updates(
        &self,
        offset: Option<i64>,
        _timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        self.check("getUpdates")?;
        let mut state = self.state.lock().unwrap();
        state.offsets.push(offset);
        if self.fail_updates {
            return Err(anyhow!("telegram getUpdates HTTP 502 Bad Gateway"));
        }
        Ok(state.update_batches.pop_front().unwrap_or_default())
    }
}

pub struct FakeConnector {
    bot: FakeBot,
    tokens: Mutex<Vec<String>>,
}

impl FakeConnector {
    pub fn new(bot: FakeBot) -> Self {
        Self {
            bot,
            tokens: Mutex::new(Vec::new()),
        }
    }

    pub fn bot(&self) -> &FakeBot {
        &self.bot
    }

    pub fn tokens(&self) -> Vec<String> {
        self.tokens.lock().unwrap().clone()
    }
}

impl BotConnector for FakeConnector {
    fn connect(&self, token: &str) -> Arc<dyn BotApi> {
        self.tokens.lock().unwrap().push(token.to_string());
        Arc::new(self.bot.clone())
    }
}

pub fn message_update(chat_id: i64, username: &str, text: Option<&str>) -> TelegramUpdate {
    let mut message = serde_json::json!({
        "chat": { "id": chat_id },
        "from": { "username": username },
    });
    if let Some(text) = text {
        message["text"] = serde_json::json!(text);
    }
    serde_json::from_value(serde_json::json!({ "message": message })).unwrap()
}

//! Routing of decoded updates to a pluggable handler.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tghook_telegram::{BotApi, TelegramUpdate};
use tracing::{debug, info, warn};

/// Business logic plugged into the receive path. Implementations talk back to
/// Telegram through `bot`; nothing they return reaches the HTTP response.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    async fn handle(&self, bot: &dyn BotApi, update: &TelegramUpdate) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// The update carried no message; the handler was not called.
    Skipped,
    /// The handler ran and failed. Already logged.
    HandlerFailed,
}

#[derive(Clone)]
pub struct Dispatcher {
    handler: Arc<dyn UpdateHandler>,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn UpdateHandler>) -> Self {
        Self { handler }
    }

    /// Whether `update` would reach the handler at all.
    pub fn accepts(update: &TelegramUpdate) -> bool {
        update.message.is_some()
    }

    /// Runs the handler at most once. Handler errors are logged and reported
    /// through the outcome, never propagated.
    pub async fn dispatch(&self, bot: &dyn BotApi, update: &TelegramUpdate) -> DispatchOutcome {
        if !Self::accepts(update) {
            debug!(update_id = update.update_id, "Update has no message, skipping");
            return DispatchOutcome::Skipped;
        }

        match self.handler.handle(bot, update).await {
            Ok(()) => DispatchOutcome::Handled,
            Err(e) => {
                warn!(update_id = update.update_id, "Update handler failed: {:#}", e);
                DispatchOutcome::HandlerFailed
            }
        }
    }
}

/// Replies to every text message with the same text behind a prefix.
/// Messages without text (photos, stickers, service messages) get no reply,
/// rather than a bare prefix.
#[derive(Debug, Clone)]
pub struct EchoHandler {
    prefix: String,
}

impl Default for EchoHandler {
    fn default() -> Self {
        Self::new("echo: ")
    }
}

impl EchoHandler {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

#[async_trait]
impl UpdateHandler for EchoHandler {
    async fn handle(&self, bot: &dyn BotApi, update: &TelegramUpdate) -> Result<()> {
        let Some(message) = &update.message else {
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            debug!(chat_id = message.chat.id, "Message without text, nothing to echo");
            return Ok(());
        };

        info!("[{}] {}", message.sender_username(), text);
        bot.send_message(message.chat.id, &format!("{}{}", self.prefix, text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{message_update, FakeBot};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl UpdateHandler for CountingHandler {
        async fn handle(&self, _bot: &dyn BotApi, _update: &TelegramUpdate) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("reply failed");
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn echo_handler_replies_to_same_chat() {
        let bot = FakeBot::default();
        let dispatcher = Dispatcher::new(Arc::new(EchoHandler::default()));

        let outcome = dispatcher
            .dispatch(&bot, &message_update(42, "alice", Some("hi")))
            .await;

        assert_eq!(outcome, DispatchOutcome::Handled);
        assert_eq!(bot.sent(), vec![(42, "echo: hi".to_string())]);
    }

    #[tokio::test]
    async fn update_without_message_skips_handler() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(handler.clone());

        let outcome = dispatcher
            .dispatch(&FakeBot::default(), &TelegramUpdate::default())
            .await;

        assert_eq!(outcome, DispatchOutcome::Skipped);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn handler_error_is_contained() {
        let handler = Arc::new(CountingHandler {
            fail: true,
            ..CountingHandler::default()
        });
        let dispatcher = Dispatcher::new(handler.clone());

        let outcome = dispatcher
            .dispatch(&FakeBot::default(), &message_update(1, "bob", Some("x")))
            .await;

        assert_eq!(outcome, DispatchOutcome::HandlerFailed);
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn echo_send_failure_surfaces_as_handler_failure() {
        let dispatcher = Dispatcher::new(Arc::new(EchoHandler::default()));
        let outcome = dispatcher
            .dispatch(&FakeBot::failing(), &message_update(42, "alice", Some("hi")))
            .await;
        assert_eq!(outcome, DispatchOutcome::HandlerFailed);
    }

    #[tokio::test]
    async fn echo_ignores_messages_without_text() {
        let bot = FakeBot::default();
        let dispatcher = Dispatcher::new(Arc::new(EchoHandler::new(">> ")));
        let outcome = dispatcher
            .dispatch(&bot, &message_update(42, "alice", None))
            .await;
        assert_eq!(outcome, DispatchOutcome::Handled);
        assert!(bot.sent().is_empty());
    }
}

//! Long-polling runner for local development.
//!
//! Feeds updates fetched with `getUpdates` through the same [`Dispatcher`]
//! the webhook endpoint uses.

use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tghook_telegram::{BotApi, TelegramUser};
use tracing::{info, warn};

use crate::dispatch::Dispatcher;

const RETRY_DELAY: Duration = Duration::from_secs(2);

pub struct Poller {
    bot: Arc<dyn BotApi>,
    dispatcher: Dispatcher,
    poll_timeout_secs: u64,
    offset: Option<i64>,
}

impl Poller {
    pub fn new(bot: Arc<dyn BotApi>, dispatcher: Dispatcher, poll_timeout_secs: u64) -> Self {
        Self {
            bot,
            dispatcher,
            poll_timeout_secs,
            offset: None,
        }
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Confirms the token works and clears any registered webhook, which
    /// Telegram requires before `getUpdates` may be used.
    pub async fn prepare(&self) -> Result<TelegramUser> {
        let me = self.bot.get_me().await?;
        info!(
            "Authorized on account {}",
            me.username.as_deref().unwrap_or("unknown")
        );

        let ack = self.bot.delete_webhook().await?;
        if !ack.ok {
            return Err(anyhow!(
                "failed to delete webhook: {}",
                ack.description.unwrap_or_default()
            ));
        }
        Ok(me)
    }

    /// Fetches one batch and dispatches it in order. Returns the batch size.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self
            .bot
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;

        for update in &updates {
            self.offset = Some(update.update_id + 1);
            self.dispatcher.dispatch(self.bot.as_ref(), update).await;
        }

        Ok(updates.len())
    }

    /// Polls until `shutdown` resolves. Fetch errors are logged and retried.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.prepare().await?;
        info!(timeout_secs = self.poll_timeout_secs, "Telegram polling started");

        tokio::pin!(shutdown);
        loop {
            let result = tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.poll_once() => result,
            };

            if let Err(err) = result {
                warn!("Telegram polling error: {}", err);
                tokio::select! {
                    biased;
                    _ = &mut shutdown => break,
                    _ = tokio::time::sleep(RETRY_DELAY) => {}
                }
            }
        }

        info!("Telegram polling stopped");
        Ok(())
    }
}

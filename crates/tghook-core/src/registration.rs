//! Webhook registration handshake.
//!
//! Resolves credentials, checks the caller's key, builds the public endpoint
//! and asks Telegram to deliver updates there. Telegram's own `ok` flag is
//! honoured even when the HTTP exchange itself succeeded.

use tghook_config::{EnvSource, Options};
use tghook_telegram::BotConnector;
use tracing::info;

use crate::credentials::Credentials;
use crate::endpoint::resolve_endpoint;
use crate::secret;
use crate::WebhookError;

/// Registers the webhook and returns Telegram's description of the result.
///
/// Configuration is checked before the key, and no network call happens
/// unless both pass. Repeat registrations are passed through unchanged;
/// Telegram treats them as no-ops.
pub async fn register_webhook(
    options: &Options,
    env: &dyn EnvSource,
    connector: &dyn BotConnector,
    supplied_key: &str,
) -> Result<String, WebhookError> {
    let credentials = Credentials::resolve(options, env)?;
    secret::authorize(&credentials.secret, supplied_key)?;

    let url = resolve_endpoint(&credentials.public_host, &options.webhook_relative_url);
    let bot = connector.connect(&credentials.token);

    let ack = bot
        .set_webhook(&url)
        .await
        .map_err(|e| WebhookError::Upstream(format!("failed to set webhook: {}", e)))?;

    if !ack.ok {
        return Err(WebhookError::Upstream(format!(
            "failed to set webhook: {}",
            ack.description.unwrap_or_default()
        )));
    }

    info!(url = %url, "Webhook registered");
    Ok(ack.description.unwrap_or_default())
}

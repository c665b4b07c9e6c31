//! Tghook Core
//!
//! Webhook lifecycle for a Telegram bot: registering the delivery endpoint
//! behind a shared secret, and decoding pushed updates into a pluggable
//! [`UpdateHandler`].

pub mod credentials;
pub mod decode;
pub mod dispatch;
pub mod endpoint;
mod error;
pub mod poll;
pub mod registration;
pub mod response;
pub mod secret;
pub mod server;

#[cfg(test)]
mod test_support;

pub use credentials::Credentials;
pub use decode::decode_update;
pub use dispatch::{DispatchOutcome, Dispatcher, EchoHandler, UpdateHandler};
pub use endpoint::resolve_endpoint;
pub use error::WebhookError;
pub use poll::Poller;
pub use registration::register_webhook;
pub use server::{build_router, AppState};

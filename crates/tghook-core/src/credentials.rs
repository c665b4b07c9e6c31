use std::fmt;
use tghook_config::{EnvSource, Options};

use crate::WebhookError;

/// Values looked up from the environment for one registration. Never cached,
/// so rotating any of them takes effect on the next request.
#[derive(Clone)]
pub struct Credentials {
    pub secret: String,
    pub token: String,
    pub public_host: String,
}

impl Credentials {
    /// Resolves secret, token and public hostname in that order, failing on
    /// the first one that is unset or empty.
    pub fn resolve(options: &Options, env: &dyn EnvSource) -> Result<Self, WebhookError> {
        let secret = require(env, &options.key_env)?;
        let token = require(env, &options.telegram_token_env)?;
        let public_host = require(env, &options.public_host_env)?;
        Ok(Self {
            secret,
            token,
            public_host,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("secret", &"<redacted>")
            .field("token", &"<redacted>")
            .field("public_host", &self.public_host)
            .finish()
    }
}

pub fn require(env: &dyn EnvSource, name: &str) -> Result<String, WebhookError> {
    env.non_empty(name)
        .ok_or_else(|| WebhookError::missing_env(name))
}

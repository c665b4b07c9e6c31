//! HTTP surface.
//!
//! # Endpoints
//!
//! - `GET|POST <setup_path>?<key_param>=<secret>` - registers the webhook
//! - `POST <webhook_relative_url>` - receives Telegram updates
//! - `GET /health` - returns 200 while the process is up

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use std::collections::HashMap;
use std::sync::Arc;
use tghook_config::{EnvSource, Options, HEALTH_PATH};
use tghook_telegram::BotConnector;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::decode::decode_update;
use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::registration::register_webhook;
use crate::response::success_response;
use crate::WebhookError;

/// Shared, read-only application state handed to every request.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    options: Options,
    env: Arc<dyn EnvSource>,
    connector: Arc<dyn BotConnector>,
    dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        options: Options,
        env: Arc<dyn EnvSource>,
        connector: Arc<dyn BotConnector>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                options,
                env,
                connector,
                dispatcher,
            }),
        }
    }

    pub fn options(&self) -> &Options {
        &self.inner.options
    }
}

/// Builds the router. `setup_path` and the webhook path must both start
/// with `/` and differ; config validation guarantees this.
pub fn build_router(state: AppState, setup_path: &str) -> Router {
    let webhook_path = state.options().webhook_relative_url.clone();

    Router::new()
        .route(setup_path, get(setup_handler).post(setup_handler))
        .route(&webhook_path, post(webhook_handler))
        .route(HEALTH_PATH, get(health_handler))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .with_state(state)
}

/// Request span carrying only the path. The setup query string holds the
/// shared secret and must stay out of the logs.
fn request_span(request: &Request<Body>) -> tracing::Span {
    tracing::debug_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
    )
}

async fn health_handler() -> &'static str {
    "OK"
}

async fn setup_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let inner = &state.inner;
    let key = params
        .get(&inner.options.key_param)
        .map(String::as_str)
        .unwrap_or_default();

    match register_webhook(
        &inner.options,
        inner.env.as_ref(),
        inner.connector.as_ref(),
        key,
    )
    .await
    {
        Ok(description) => success_response(&description),
        Err(err) => {
            match &err {
                WebhookError::Unauthorized => info!("Webhook registration rejected: invalid key"),
                WebhookError::Configuration(msg) => {
                    error!("Webhook registration misconfigured: {}", msg)
                }
                other => warn!("Webhook registration failed: {}", other),
            }
            err.into_response()
        }
    }
}

async fn webhook_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let inner = &state.inner;

    let update = match decode_update(&body) {
        Ok(update) => update,
        Err(err) => {
            warn!("Rejected webhook delivery: {}", err);
            return err.into_response();
        }
    };

    if !Dispatcher::accepts(&update) {
        return StatusCode::OK.into_response();
    }

    // Deliveries are always acknowledged once decoded so Telegram does not
    // redeliver an update the handler cannot process.
    let Some(token) = inner.env.non_empty(&inner.options.telegram_token_env) else {
        error!(
            update_id = update.update_id,
            "{} is not set, update dropped", inner.options.telegram_token_env
        );
        return StatusCode::OK.into_response();
    };

    let bot = inner.connector.connect(&token);
    if inner.dispatcher.dispatch(bot.as_ref(), &update).await == DispatchOutcome::Handled {
        info!(update_id = update.update_id, "Update handled");
    }
    StatusCode::OK.into_response()
}

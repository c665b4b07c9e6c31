//! Tghook CLI
//!
//! Serves the webhook endpoints, registers the webhook from the shell, or
//! runs the bot locally with long polling.

mod logging;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tghook_config::{Config, EnvSource, ProcessEnv};
use tghook_core::{build_router, register_webhook, AppState, Dispatcher, EchoHandler, Poller};
use tghook_telegram::{BotConnector, TelegramConnector};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "tghook")]
#[command(about = "Telegram bot webhook registration and delivery", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(short, long)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server with the registration and webhook endpoints
    Serve {
        /// Listen address, e.g. 0.0.0.0:3000
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Register the webhook with Telegram using the configured secret
    Register,

    /// Run the bot locally with long polling instead of a webhook
    Poll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::load_or_default(cli.config.as_deref().map(Path::new))
        .context("failed to load configuration")?;

    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.core.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let _log_guard = logging::init_logging(config.core.log_dir.as_deref().map(Path::new), &log_level)?;

    match &dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if matches!(cli.command, Commands::Poll) => {
            warn!("No .env file loaded: {}", e)
        }
        Err(_) => {}
    }

    let connector = TelegramConnector::new(
        config.telegram.api_base_url.clone(),
        Duration::from_secs(config.telegram.request_timeout_secs),
    )?;

    match cli.command {
        Commands::Serve { bind } => serve(&config, bind, connector).await,
        Commands::Register => register(&config, &connector).await,
        Commands::Poll => poll(&config, &connector).await,
    }
}

async fn serve(config: &Config, bind: Option<String>, connector: TelegramConnector) -> Result<()> {
    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let state = AppState::new(
        config.webhook.clone(),
        Arc::new(ProcessEnv),
        Arc::new(connector),
        Dispatcher::new(Arc::new(EchoHandler::default())),
    );
    let app = build_router(state, &config.server.setup_path);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    info!(
        "Listening on {} (setup: {}, webhook: {})",
        bind, config.server.setup_path, config.webhook.webhook_relative_url
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn register(config: &Config, connector: &TelegramConnector) -> Result<()> {
    let env = ProcessEnv;
    let key = env
        .non_empty(&config.webhook.key_env)
        .ok_or_else(|| anyhow!("{} is not set", config.webhook.key_env))?;

    let description = register_webhook(&config.webhook, &env, connector, &key).await?;
    println!("{}", description);
    Ok(())
}

async fn poll(config: &Config, connector: &TelegramConnector) -> Result<()> {
    let token = ProcessEnv
        .non_empty(&config.webhook.telegram_token_env)
        .ok_or_else(|| anyhow!("{} is not set", config.webhook.telegram_token_env))?;

    let mut poller = Poller::new(
        connector.connect(&token),
        Dispatcher::new(Arc::new(EchoHandler::default())),
        config.telegram.poll_timeout_secs,
    );
    poller.run(shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

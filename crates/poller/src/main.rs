use tokio_util::sync::CancellationToken;

use herald_common::config::AppConfig;
use herald_notifier::{Notifier, TelegramClient};
use herald_poller::fetcher::HttpStatusFetcher;
use herald_poller::poller::StatusPoller;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "herald_poller=debug,herald_notifier=debug,herald_common=info".into()
            }),
        )
        .json()
        .init();

    tracing::info!("Review Herald starting...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let credentials = config.credentials().inspect_err(|e| {
        tracing::error!(error = %e, critical = true, "Cannot start without credentials");
    })?;

    // One client for both APIs; the timeout bounds every request
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()?;

    let fetcher = HttpStatusFetcher::new(
        http.clone(),
        config.review_api_endpoint.clone(),
        credentials.review_api_token,
    );
    let notifier = Notifier::new(TelegramClient::new(
        http,
        config.telegram_api_url.clone(),
        credentials.telegram_bot_token,
    ));

    let mut poller = StatusPoller::new(
        fetcher,
        notifier,
        credentials.telegram_chat_id,
        config.retry_period(),
    );

    // Graceful shutdown on Ctrl+C
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received shutdown signal, stopping gracefully...");
            signal.cancel();
        }
    });

    poller.run(shutdown).await;

    tracing::info!("Review Herald stopped.");
    Ok(())
}

//! media-relay server entry point.
//!
//! Startup order:
//! 1. Load `.env` if present.
//! 2. Initialise tracing (JSON or human-readable) from the logging settings.
//! 3. Build the rest of the configuration from environment variables.
//! 4. Start the HTTP server with graceful shutdown.

use media_relay::config::LoggingConfig;
use media_relay::{Config, api, wait_for_signal};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => eprintln!("WARN: failed to load .env: {}", e),
    }

    let logging = LoggingConfig::from_env();

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => match logging.level.parse::<EnvFilter>() {
            Ok(filter) => filter,
            Err(e) => {
                eprintln!(
                    "WARN: MEDIA_RELAY_LOG='{}' is not a valid tracing filter ({}); \
                     falling back to 'info'",
                    logging.level, e
                );
                EnvFilter::new("info")
            }
        },
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if logging.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = Config::from_env()?;
    config.validate()?;

    if config.runner.token.is_none() {
        tracing::warn!("APIFY_TOKEN is not set; media requests will fail until it is configured");
    }

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platforms = config.platforms.len(),
        "media-relay starting"
    );

    api::start_api_server(Arc::new(config), wait_for_signal()).await?;

    Ok(())
}

//! Binary crate for the `weather-collector` daemon.
//!
//! This crate focuses on:
//! - Logging setup
//! - Loading configuration once at startup
//! - Wiring the fetcher and publisher into the scheduler loop

use anyhow::Context;
use collector_core::{AmqpConnector, Config, OpenWeatherFetcher, Publisher, Scheduler};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().context("Failed to load configuration")?;
    config.validate()?;
    tracing::debug!(?config, "Configuration loaded");

    if config.api.api_key.is_empty() {
        tracing::warn!("WEATHER_API_KEY is not set; upstream requests will likely be rejected");
    }

    let fetcher = OpenWeatherFetcher::new(&config.api).context("Failed to build HTTP client")?;
    let connector = AmqpConnector::new(&config.broker);
    let publisher = Publisher::new(connector, config.broker.queue_name.clone());

    tracing::info!(
        "Collector started. Publishing to queue '{}' on host '{}'",
        publisher.queue(),
        publisher.connector().host()
    );

    let scheduler = Scheduler::new(fetcher, publisher);
    match scheduler.run().await {}
}

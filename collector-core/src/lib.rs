//! Core library for the weather collector.
//!
//! This crate defines:
//! - Configuration loading (defaults, optional TOML file, environment)
//! - The normalized `Reading` record and its construction from upstream JSON
//! - A fetcher for the OpenWeather current-conditions endpoint
//! - A publisher delivering readings to a durable AMQP queue
//! - The scheduler loop tying the two together
//!
//! It is used by `collector-cli`, but the traits at each seam let other
//! binaries or tests plug in their own source or sink.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod publisher;
pub mod retry;
pub mod scheduler;

pub use config::{ApiConfig, BrokerConfig, Config, ConfigError};
pub use error::{BrokerError, FetchError};
pub use fetcher::{ReadingSource, openweather::OpenWeatherFetcher};
pub use model::{Location, Reading};
pub use publisher::{
    BrokerConnector, BrokerSession, PublishOutcome, Publisher, ReadingSink, amqp::AmqpConnector,
};
pub use retry::RetryPolicy;
pub use scheduler::{CycleOutcome, Scheduler};

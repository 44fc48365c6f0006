//! Delivery of readings to the broker.
//!
//! Each call to [`Publisher::publish`] walks one connection lifecycle:
//! connect (bounded retry), declare the durable queue, publish, close.
//! Nothing is kept between calls.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::BrokerError,
    model::Reading,
    retry::{self, RetryPolicy},
};

pub mod amqp;

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Opens a fresh broker session.
#[async_trait]
pub trait BrokerConnector: Send + Sync + Debug {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError>;
}

/// One open broker connection.
#[async_trait]
pub trait BrokerSession: Send {
    /// Declare `queue` as durable. Repeating this is harmless.
    async fn declare_durable_queue(&mut self, queue: &str) -> Result<(), BrokerError>;

    /// Publish a persistent message with the given content type to `queue`.
    async fn publish(
        &mut self,
        queue: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), BrokerError>;

    async fn close(self: Box<Self>) -> Result<(), BrokerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Published,
    /// Every connection attempt failed; nothing was sent.
    ConnectionExhausted,
    /// Connected, but serialization, declaration or publishing failed.
    Failed,
}

impl PublishOutcome {
    pub fn is_success(self) -> bool {
        self == PublishOutcome::Published
    }
}

/// Consumer side of the collection loop.
#[async_trait]
pub trait ReadingSink: Send + Sync + Debug {
    async fn publish(&self, reading: &Reading) -> PublishOutcome;
}

#[derive(Debug)]
pub struct Publisher<C> {
    connector: C,
    queue: String,
    retry: RetryPolicy,
}

impl<C: BrokerConnector> Publisher<C> {
    pub fn new(connector: C, queue: impl Into<String>) -> Self {
        Self { connector, queue: queue.into(), retry: RetryPolicy::default() }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    async fn deliver(
        &self,
        session: &mut dyn BrokerSession,
        reading: &Reading,
    ) -> Result<(), BrokerError> {
        let payload = serde_json::to_vec(reading)?;
        session.declare_durable_queue(&self.queue).await?;
        session.publish(&self.queue, &payload, CONTENT_TYPE_JSON).await
    }
}

#[async_trait]
impl<C: BrokerConnector> ReadingSink for Publisher<C> {
    async fn publish(&self, reading: &Reading) -> PublishOutcome {
        let connected = retry::attempt(&self.retry, || self.connector.connect()).await;

        let mut session = match connected {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    queue = %self.queue,
                    "Giving up on broker connection this cycle after {} attempts: {}",
                    e.attempts,
                    e.last_error
                );
                return PublishOutcome::ConnectionExhausted;
            }
        };

        let outcome = match self.deliver(session.as_mut(), reading).await {
            Ok(()) => {
                tracing::info!(queue = %self.queue, "Reading published to queue '{}'", self.queue);
                PublishOutcome::Published
            }
            Err(e) => {
                tracing::error!(queue = %self.queue, "Failed to publish reading: {e}");
                PublishOutcome::Failed
            }
        };

        if let Err(e) = session.close().await {
            tracing::warn!("{e}");
        }

        outcome
    }
}

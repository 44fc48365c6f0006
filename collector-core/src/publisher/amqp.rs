use async_trait::async_trait;
use lapin::{
    BasicProperties, Channel, Connection, ConnectionProperties,
    options::{BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions},
    publisher_confirm::Confirmation,
    types::FieldTable,
    uri::{AMQPAuthority, AMQPUri, AMQPUserInfo},
};
use std::time::Duration;

use crate::{
    config::BrokerConfig,
    error::BrokerError,
    publisher::{BrokerConnector, BrokerSession},
};

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// AMQP 0-9-1 delivery mode for messages that survive a broker restart.
const PERSISTENT: u8 = 2;

/// Connects to a RabbitMQ-compatible broker with plain credentials.
#[derive(Debug, Clone)]
pub struct AmqpConnector {
    uri: AMQPUri,
    connect_timeout: Duration,
}

impl AmqpConnector {
    pub fn new(config: &BrokerConfig) -> Self {
        let uri = AMQPUri {
            authority: AMQPAuthority {
                userinfo: AMQPUserInfo {
                    username: config.user.clone(),
                    password: config.password.clone(),
                },
                host: config.host.clone(),
                port: config.port,
            },
            ..AMQPUri::default()
        };

        Self { uri, connect_timeout: CONNECT_TIMEOUT }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.uri.authority.host
    }
}

#[async_trait]
impl BrokerConnector for AmqpConnector {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        tracing::debug!(host = %self.uri.authority.host, port = self.uri.authority.port, "Connecting to broker");

        let connecting = Connection::connect_uri(self.uri.clone(), ConnectionProperties::default());
        let connection = tokio::time::timeout(self.connect_timeout, connecting)
            .await
            .map_err(|_| BrokerError::ConnectTimeout(self.connect_timeout))?
            .map_err(|e| BrokerError::Connect(e.to_string()))?;

        let channel = match open_confirm_channel(&connection).await {
            Ok(channel) => channel,
            Err(e) => {
                let _ = connection.close(200, "channel setup failed").await;
                return Err(BrokerError::Connect(e.to_string()));
            }
        };

        Ok(Box::new(AmqpSession { connection, channel }))
    }
}

/// A channel on which every publish is acknowledged by the broker.
async fn open_confirm_channel(connection: &Connection) -> lapin::Result<Channel> {
    let channel = connection.create_channel().await?;
    channel.confirm_select(ConfirmSelectOptions::default()).await?;
    Ok(channel)
}

fn durable_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions { durable: true, ..QueueDeclareOptions::default() }
}

fn message_properties(content_type: &str) -> BasicProperties {
    BasicProperties::default()
        .with_delivery_mode(PERSISTENT)
        .with_content_type(content_type.into())
}

fn check_confirmation(queue: &str, confirmation: Confirmation) -> Result<(), BrokerError> {
    let reason = match confirmation {
        Confirmation::Ack(_) => return Ok(()),
        Confirmation::Nack(_) => "broker rejected the message",
        Confirmation::NotRequested => "channel is not in confirm mode",
    };
    Err(BrokerError::Publish { queue: queue.to_string(), reason: reason.to_string() })
}

struct AmqpSession {
    connection: Connection,
    channel: Channel,
}

#[async_trait]
impl BrokerSession for AmqpSession {
    async fn declare_durable_queue(&mut self, queue: &str) -> Result<(), BrokerError> {
        self.channel
            .queue_declare(queue, durable_queue_options(), FieldTable::default())
            .await
            .map(|_| ())
            .map_err(|e| BrokerError::Declare { queue: queue.to_string(), reason: e.to_string() })
    }

    async fn publish(
        &mut self,
        queue: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), BrokerError> {
        let publish_err =
            |e: lapin::Error| BrokerError::Publish { queue: queue.to_string(), reason: e.to_string() };

        // Default exchange routes by queue name.
        let confirmation = self
            .channel
            .basic_publish(
                "",
                queue,
                BasicPublishOptions::default(),
                payload,
                message_properties(content_type),
            )
            .await
            .map_err(publish_err)?
            .await
            .map_err(publish_err)?;

        check_confirmation(queue, confirmation)
    }

    async fn close(self: Box<Self>) -> Result<(), BrokerError> {
        self.connection
            .close(200, "OK")
            .await
            .map_err(|e| BrokerError::Close(e.to_string()))
    }
}

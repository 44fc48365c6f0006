//! Shared fixtures for collector integration tests.

use async_trait::async_trait;
use collector_core::{ApiConfig, BrokerConnector, BrokerError, BrokerSession};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicU32, Ordering},
};

/// A message as the broker received it.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub queue: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Debug, Default)]
pub struct BrokerLog {
    pub connects: u32,
    pub declared: Vec<String>,
    pub delivered: Vec<Delivered>,
    pub closes: u32,
}

/// In-memory broker that can refuse a number of connections first.
#[derive(Debug, Clone, Default)]
pub struct RecordingBroker {
    refusals: Arc<AtomicU32>,
    pub log: Arc<Mutex<BrokerLog>>,
}

impl RecordingBroker {
    pub fn refusing(n: u32) -> Self {
        Self { refusals: Arc::new(AtomicU32::new(n)), ..Self::default() }
    }

    pub fn delivered(&self) -> Vec<Delivered> {
        self.log.lock().unwrap().delivered.clone()
    }

    pub fn connects(&self) -> u32 {
        self.log.lock().unwrap().connects
    }
}

#[async_trait]
impl BrokerConnector for RecordingBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        self.log.lock().unwrap().connects += 1;

        let refused = self
            .refusals
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(BrokerError::Connect("ACCESS_REFUSED".into()));
        }

        Ok(Box::new(RecordingSession { log: self.log.clone() }))
    }
}

struct RecordingSession {
    log: Arc<Mutex<BrokerLog>>,
}

#[async_trait]
impl BrokerSession for RecordingSession {
    async fn declare_durable_queue(&mut self, queue: &str) -> Result<(), BrokerError> {
        self.log.lock().unwrap().declared.push(queue.to_string());
        Ok(())
    }

    async fn publish(
        &mut self,
        queue: &str,
        payload: &[u8],
        content_type: &str,
    ) -> Result<(), BrokerError> {
        self.log.lock().unwrap().delivered.push(Delivered {
            queue: queue.to_string(),
            body: payload.to_vec(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), BrokerError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}

/// API settings pointing at a mock server.
pub fn api_config(base_uri: &str) -> ApiConfig {
    ApiConfig {
        base_url: format!("{base_uri}/data/2.5/weather"),
        api_key: "TEST_KEY".to_string(),
        latitude: 40.7128,
        longitude: -74.006,
    }
}

use reqwest::StatusCode;

/// Why a single fetch produced no reading.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to send request to weather API: {0}")]
    Request(#[source] reqwest::Error),

    #[error("weather API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("failed to read weather API response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("weather API returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Failures talking to the message broker.
#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    #[error("broker connection failed: {0}")]
    Connect(String),

    #[error("broker connection timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),

    #[error("failed to declare queue '{queue}': {reason}")]
    Declare { queue: String, reason: String },

    #[error("failed to publish to queue '{queue}': {reason}")]
    Publish { queue: String, reason: String },

    #[error("failed to serialize reading: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to close broker connection: {0}")]
    Close(String),
}

use thiserror::Error;

/// Failures talking to the shared state store.
///
/// These are the only conditions fatal to a driver run: losing the store
/// means losing the ability to track progress correctly.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("Failed to connect to state store: {0}")]
    ConnectionFailed(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Corrupt state value for key {key}: {details}")]
    CorruptValue { key: String, details: String },
}

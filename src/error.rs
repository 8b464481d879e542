//! Error types for FlowKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using FlowError
pub type Result<T> = std::result::Result<T, FlowError>;

/// Unified error type for FlowKV operations
///
/// A missing key is never an error: reads return `Ok(None)`.
#[derive(Debug, Error)]
pub enum FlowError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    /// WAL record (bincode) encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored value could not be decoded, or a value could not be encoded
    #[error("Codec error: {0}")]
    Codec(String),

    // -------------------------------------------------------------------------
    // Command Stream Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Output channel closed")]
    ChannelClosed,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for FlowError {
    fn from(err: bincode::Error) -> Self {
        FlowError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Codec(err.to_string())
    }
}

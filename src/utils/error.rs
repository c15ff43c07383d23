//! Error types for the telemetry client.
//!
//! Only `StreamError` crosses the client boundary. Connection-level failures
//! (refused connects, resets, heartbeat probes) are absorbed by the background
//! thread and surface only as a liveness drop.

use thiserror::Error;

/// Consumer-facing failures of the blocking client API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// Deadline elapsed without a connection or without a fresh frame.
    #[error("timed out: {0}")]
    Timeout(String),

    /// The client has been shut down; no further frames will arrive.
    #[error("client is shut down")]
    Shutdown,
}

/// A fixed-size slice could not be reinterpreted as a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame length mismatch: expected {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}

/// Invalid configuration value (usually from the environment).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("host must not be empty")]
    EmptyHost,
}

/// Failures of the out-of-process collaborators (virtual pad, window tools).
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{tool} exited with status {status}")]
    ToolFailed { tool: &'static str, status: String },
}

pub type Result<T> = std::result::Result<T, StreamError>;

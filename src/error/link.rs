// Transport error types and constants

use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Log a link error with structured context
///
/// Logs transport errors with structured fields including:
/// - error_code: Numeric error code for programmatic handling
/// - component: The component where the error occurred
/// - message: Human-readable error message
/// - context: Additional contextual information
///
/// The logging is non-blocking and will not panic on failure.
pub fn log_link_error(err: &LinkError, context: &str) {
    error!(
        "Link error in {}: code={}, component=DetectionLink, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Transport-related errors
///
/// These errors cover the detection event channel and the media stream
/// control calls. All of them are recoverable: the link retries per its
/// reconnect policy and the stream controller surfaces the failure for an
/// explicit user retry.
///
/// Error code range: 1001-1006
#[derive(Debug, Clone, PartialEq)]
pub enum LinkError {
    /// Establishing the event channel failed
    ConnectFailed { reason: String },

    /// The event channel closed unexpectedly
    ChannelClosed { reason: String },

    /// Detection link is already connected
    AlreadyConnected,

    /// Detection link is not connected
    NotConnected,

    /// A stream start/stop control request failed
    StreamRequestFailed { reason: String },

    /// Mutex/RwLock was poisoned
    LockPoisoned { component: String },
}

impl LinkError {
    pub const CONNECT_FAILED: i32 = 1001;
    pub const CHANNEL_CLOSED: i32 = 1002;
    pub const ALREADY_CONNECTED: i32 = 1003;
    pub const NOT_CONNECTED: i32 = 1004;
    pub const STREAM_REQUEST_FAILED: i32 = 1005;
    pub const LOCK_POISONED: i32 = 1006;
}

impl ErrorCode for LinkError {
    fn code(&self) -> i32 {
        match self {
            LinkError::ConnectFailed { .. } => Self::CONNECT_FAILED,
            LinkError::ChannelClosed { .. } => Self::CHANNEL_CLOSED,
            LinkError::AlreadyConnected => Self::ALREADY_CONNECTED,
            LinkError::NotConnected => Self::NOT_CONNECTED,
            LinkError::StreamRequestFailed { .. } => Self::STREAM_REQUEST_FAILED,
            LinkError::LockPoisoned { .. } => Self::LOCK_POISONED,
        }
    }

    fn message(&self) -> String {
        match self {
            LinkError::ConnectFailed { reason } => {
                format!("Failed to connect to detection backend: {}", reason)
            }
            LinkError::ChannelClosed { reason } => {
                format!("Detection channel closed: {}", reason)
            }
            LinkError::AlreadyConnected => {
                "Detection link already connected. Call disconnect() first.".to_string()
            }
            LinkError::NotConnected => {
                "Detection link not connected. Call connect() first.".to_string()
            }
            LinkError::StreamRequestFailed { reason } => {
                format!("Stream control request failed: {}", reason)
            }
            LinkError::LockPoisoned { component } => {
                format!("Lock poisoned on {}", component)
            }
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LinkError::{:?} (code {}): {}",
            self,
            self.code(),
            self.message()
        )
    }
}

impl std::error::Error for LinkError {}

impl From<std::io::Error> for LinkError {
    fn from(err: std::io::Error) -> Self {
        LinkError::ConnectFailed {
            reason: err.to_string(),
        }
    }
}

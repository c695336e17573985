//! StreamController: start/stop control for the media feed
//!
//! The backend serves a continuous-image stream rendered by an external
//! collaborator; this component only issues the begin/end control calls
//! and tracks whether the stream should be live. Unlike the detection
//! link there is no automatic retry: a stream start is a deliberate user
//! action, so a failed start surfaces an Error state and waits for an
//! explicit retry.

use std::sync::RwLock;
use std::time::Duration;

use log::{info, warn};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::StreamConfig;
use crate::error::{log_link_error, LinkError};

/// State of the media stream, independent of the event channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StreamState {
    Stopped,
    Starting,
    Streaming,
    Error(String),
}

/// Controller for the media stream's begin/end control calls.
pub struct StreamController {
    base_url: String,
    http: reqwest::Client,
    state: RwLock<StreamState>,
    state_tx: broadcast::Sender<StreamState>,
    frame_fault: RwLock<Option<String>>,
}

impl StreamController {
    /// Create a controller for the configured backend.
    pub fn new(config: &StreamConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .unwrap_or_default();
        let (state_tx, _) = broadcast::channel(32);
        Self {
            base_url: config.control_base_url.trim_end_matches('/').to_string(),
            http,
            state: RwLock::new(StreamState::Stopped),
            state_tx,
            frame_fault: RwLock::new(None),
        }
    }

    fn set_state(&self, next: StreamState) {
        if let Ok(mut guard) = self.state.write() {
            *guard = next.clone();
        }
        let _ = self.state_tx.send(next);
    }

    /// Current stream state snapshot.
    pub fn state(&self) -> StreamState {
        self.state
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|_| StreamState::Error("state lock poisoned".to_string()))
    }

    /// Subscribe to stream state transitions.
    pub fn subscribe_state(&self) -> broadcast::Receiver<StreamState> {
        self.state_tx.subscribe()
    }

    /// URL of the continuous-image endpoint for the external renderer.
    pub fn feed_url(&self) -> String {
        format!("{}/video_feed", self.base_url)
    }

    /// Request the backend to begin the media stream.
    ///
    /// On an acknowledged start the state becomes Streaming. On failure
    /// the state becomes Error and Streaming is not entered; the caller
    /// must retry explicitly.
    pub async fn start(&self) -> Result<(), LinkError> {
        self.set_state(StreamState::Starting);

        let url = format!("{}/start", self.base_url);
        match self.http.post(&url).send().await {
            Ok(response) if response.status().is_success() => {
                info!("[StreamController] Stream started");
                self.clear_frame_fault();
                self.set_state(StreamState::Streaming);
                Ok(())
            }
            Ok(response) => {
                let reason = format!("backend returned {}", response.status());
                let err = LinkError::StreamRequestFailed {
                    reason: reason.clone(),
                };
                log_link_error(&err, "start_stream");
                self.set_state(StreamState::Error(reason));
                Err(err)
            }
            Err(err) => {
                let reason = err.to_string();
                let err = LinkError::StreamRequestFailed {
                    reason: reason.clone(),
                };
                log_link_error(&err, "start_stream");
                self.set_state(StreamState::Error(reason));
                Err(err)
            }
        }
    }

    /// Request the backend to end the media stream.
    ///
    /// Idempotent: the local state becomes Stopped regardless of prior
    /// state. A failed control request is reported but does not keep the
    /// stream marked live.
    pub async fn stop(&self) -> Result<(), LinkError> {
        let url = format!("{}/stop", self.base_url);
        let result = match self.http.post(&url).send().await {
            Ok(response) if response.status().is_success() => Ok(()),
            Ok(response) => {
                let reason = format!("backend returned {}", response.status());
                warn!("[StreamController] Stop request rejected: {}", reason);
                Err(LinkError::StreamRequestFailed { reason })
            }
            Err(err) => {
                let reason = err.to_string();
                warn!("[StreamController] Stop request failed: {}", reason);
                Err(LinkError::StreamRequestFailed { reason })
            }
        };

        self.clear_frame_fault();
        self.set_state(StreamState::Stopped);
        result
    }

    /// Record a transient frame-delivery fault.
    ///
    /// A single failed frame does not tear down Streaming; the fault is
    /// surfaced alongside the state until frames resume.
    pub fn report_frame_fault(&self, reason: impl Into<String>) {
        let reason = reason.into();
        warn!("[StreamController] Frame fault: {}", reason);
        if let Ok(mut guard) = self.frame_fault.write() {
            *guard = Some(reason);
        }
    }

    /// Clear the transient frame fault once frames resume.
    pub fn clear_frame_fault(&self) {
        if let Ok(mut guard) = self.frame_fault.write() {
            *guard = None;
        }
    }

    /// The current transient frame fault, if any.
    pub fn frame_fault(&self) -> Option<String> {
        self.frame_fault.read().ok().and_then(|guard| guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> StreamController {
        // Port 1 refuses connections, so control calls fail fast.
        StreamController::new(&StreamConfig {
            control_base_url: "http://127.0.0.1:1".to_string(),
            request_timeout_secs: 1,
        })
    }

    #[test]
    fn test_initial_state_is_stopped() {
        let stream = controller();
        assert_eq!(stream.state(), StreamState::Stopped);
        assert!(stream.frame_fault().is_none());
    }

    #[test]
    fn test_feed_url() {
        let stream = controller();
        assert_eq!(stream.feed_url(), "http://127.0.0.1:1/video_feed");
    }

    #[tokio::test]
    async fn test_failed_start_enters_error_not_streaming() {
        let stream = controller();
        let result = stream.start().await;
        assert!(result.is_err());
        match stream.state() {
            StreamState::Error(_) => {}
            other => panic!("Expected Error state, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_even_on_transport_failure() {
        let stream = controller();
        let _ = stream.stop().await;
        assert_eq!(stream.state(), StreamState::Stopped);
        // A second stop still lands on Stopped.
        let _ = stream.stop().await;
        assert_eq!(stream.state(), StreamState::Stopped);
    }

    #[tokio::test]
    async fn test_frame_fault_does_not_change_state() {
        let stream = controller();
        stream.report_frame_fault("decode error");
        assert_eq!(stream.frame_fault(), Some("decode error".to_string()));
        assert_eq!(stream.state(), StreamState::Stopped);
        stream.clear_frame_fault();
        assert!(stream.frame_fault().is_none());
    }
}

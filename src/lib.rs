// Guitar Trainer Core - curriculum and live-detection engine
// Detection link, progression tracking, and exercise state machines

// Module declarations
pub mod assist;
pub mod config;
pub mod curriculum;
pub mod detection;
pub mod error;
pub mod exercise;
pub mod media;
pub mod progress;
pub mod session;

// Re-exports for convenience
pub use config::AppConfig;
pub use session::{session_handle, TrainerSession};

/// Initialize logging for binaries and tests.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt().try_init();
}

// Error types for the guitar trainer core
//
// This module defines custom error types for detection-link and curriculum
// operations, providing structured error handling with numeric error codes
// suitable for status banners and logs.

mod curriculum;
mod link;

pub use curriculum::{log_curriculum_error, CurriculumError};
pub use link::{log_link_error, LinkError};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages
/// from custom error types, enabling consistent error handling across
/// the core and any front end consuming it.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}

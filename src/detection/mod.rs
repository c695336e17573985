// Detection subsystem: event channel client and payload normalization
//
// The sensing rig (camera + sensor board) lives in an external backend that
// pushes JSON detection frames over a WebSocket. This module owns the
// client side: the connection lifecycle, payload decoding, and the bounded
// recent-chord history.

pub mod event;
pub mod link;
pub mod normalizer;

pub use event::{ChordLabel, DetectionEvent, RawDetectionEvent, StrumDirection};
pub use link::{ConnectionState, DetectionLink};
pub use normalizer::EventNormalizer;

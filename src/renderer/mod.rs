//! Rendering module
//!
//! The sim never draws. Each frame the driver captures a `FrameSnapshot` and
//! hands it to whatever backend is attached.

pub mod snapshot;

pub use snapshot::FrameSnapshot;

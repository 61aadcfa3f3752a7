//! Capture layer
//!
//! Media model and service contracts for acquiring screens and microphones.
//! Actual device access lives behind [`CaptureService`]; the recorder never
//! touches a platform API directly.

pub mod microphone;
pub mod traits;

// Re-export the capture surface
pub use microphone::SharedMicrophone;
pub use traits::{
    CaptureError, CaptureService, MediaStream, MediaTrack, MicrophoneConstraints,
    ScreenConstraints, TrackKind,
};

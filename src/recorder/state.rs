//! Recording state management
//!
//! Defines the per-session state machine and the coordinator configuration.

use crate::capture::ScreenConstraints;
use crate::export::{ContainerFormat, DEFAULT_ARCHIVE_NAME};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a single recording session
///
/// Transitions are guarded: commands that do not match the current state are
/// silent no-ops, matching the tolerant UI semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created, no media source attached yet
    Idle,
    /// Source attached, no recording device
    Ready,
    /// Device capturing
    Recording,
    /// Device suspended
    Paused,
    /// Stop issued, waiting for the device to flush
    Stopping,
    /// Device flushed; output collected
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

/// Configuration for the recording coordinator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecorderConfig {
    /// Screen capture constraints applied at selection
    pub screen: ScreenConstraints,

    /// Noise-cancellation toggle for the shared microphone; fixed at first
    /// acquisition for the whole session
    pub noise_cancellation: bool,

    /// Distribution format recordings are transcoded into
    pub target_format: ContainerFormat,

    /// Suggested file name of the serialized archive
    pub archive_file_name: String,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            screen: ScreenConstraints::default(),
            noise_cancellation: true,
            target_format: ContainerFormat::Mp4,
            archive_file_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }
}

//! Recording device boundary
//!
//! Contract between the coordinator and whatever actually records a combined
//! stream. A device emits binary data fragments while capturing and exactly
//! one completion signal after `stop`, once all buffered data has flushed.

use crate::capture::{CaptureError, MediaStream};
use crate::export::{ContainerFormat, ExportError};
use crate::recorder::session::SessionId;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors surfaced by the recording layer
#[derive(Error, Debug)]
pub enum RecorderError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Recording device error: {0}")]
    Device(String),

    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Result type alias using RecorderError
pub type RecorderResult<T> = Result<T, RecorderError>;

/// Device-reported capture state, used to guard lifecycle commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    /// Created but not started
    Inactive,
    /// Actively capturing
    Recording,
    /// Capture suspended
    Paused,
    /// Stop issued or completed
    Stopped,
}

/// Resolves exactly once, after a stopped device has flushed all its data
pub type StopComplete = oneshot::Receiver<()>;

/// A recording device bound to one session's combined stream
#[async_trait::async_trait]
pub trait RecordingDevice: Send {
    /// Current device state.
    fn state(&self) -> DeviceState;

    /// Container format of the fragments this device emits.
    fn container(&self) -> ContainerFormat;

    /// The device's fragment stream. Yields data captured while recording;
    /// taken at most once, before `start`.
    fn take_fragments(&mut self) -> Option<mpsc::UnboundedReceiver<Vec<u8>>>;

    /// Begin capturing.
    async fn start(&mut self) -> RecorderResult<()>;

    /// Suspend capturing. Only meaningful while recording.
    async fn pause(&mut self) -> RecorderResult<()>;

    /// Resume a paused capture.
    async fn resume(&mut self) -> RecorderResult<()>;

    /// Issue a stop request. The returned receiver resolves once the device
    /// has flushed its remaining fragments; a dropped sender counts as
    /// flushed.
    async fn stop(&mut self) -> RecorderResult<StopComplete>;
}

/// Opens recording devices bound to combined capture streams
pub trait DeviceFactory: Send + Sync {
    fn open_device(&self, stream: &MediaStream) -> RecorderResult<Box<dyn RecordingDevice>>;
}

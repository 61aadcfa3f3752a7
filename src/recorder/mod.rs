//! Recording system module
//!
//! This module implements the multi-session recording architecture:
//! - SessionRegistry holding independent capture sessions
//! - RecordingDevice contract for whatever records a combined stream
//! - RecordingCoordinator to fan lifecycle commands out and join stops

pub mod coordinator;
pub mod device;
pub mod session;
pub mod state;

pub use coordinator::{RecorderEvent, RecordingCoordinator};
pub use device::{
    DeviceFactory, DeviceState, RecorderError, RecorderResult, RecordingDevice, StopComplete,
};
pub use session::{Session, SessionId, SessionRegistry};
pub use state::{RecorderConfig, SessionState};

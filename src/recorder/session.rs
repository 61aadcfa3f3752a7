//! Session registry
//!
//! A session is one independent screen-capture-and-record unit. The registry
//! owns them in creation order; that order is stable and determines archive
//! entry ordering at finalization.

use crate::capture::MediaStream;
use crate::export::ContainerFormat;
use crate::recorder::device::RecordingDevice;
use crate::recorder::state::SessionState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Stable identifier for a recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One independent recording session
pub struct Session {
    /// Stable identifier
    pub id: SessionId,

    /// User-visible display name; mutable any time before finalization
    pub name: String,

    /// When the session was added
    pub created_at: DateTime<Utc>,

    /// Lifecycle state
    pub state: SessionState,

    /// Combined media source; attached by selection
    pub(crate) source: Option<MediaStream>,

    /// Active recording device, present only while a cycle is in flight
    pub(crate) device: Option<Box<dyn RecordingDevice>>,

    /// Container format reported by the device at creation
    pub(crate) container: Option<ContainerFormat>,

    /// Task appending delivered fragments to the buffer; finishes once the
    /// device closes its fragment channel
    pub(crate) delivery: Option<tokio::task::JoinHandle<()>>,

    /// Ordered data fragments, shared with the delivery task
    fragments: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl Session {
    fn new(name: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            name: name.into(),
            created_at: Utc::now(),
            state: SessionState::Idle,
            source: None,
            device: None,
            container: None,
            delivery: None,
            fragments: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The attached media source, if selection has completed.
    pub fn source(&self) -> Option<&MediaStream> {
        self.source.as_ref()
    }

    pub fn has_source(&self) -> bool {
        self.source.is_some()
    }

    pub(crate) fn attach_source(&mut self, stream: MediaStream) {
        self.source = Some(stream);
    }

    /// Handle to the fragment buffer for the delivery task.
    pub(crate) fn fragment_buffer(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.fragments)
    }

    /// Drop any buffered fragments. Guards against restart residue.
    pub(crate) fn clear_fragments(&mut self) {
        self.fragments.lock().clear();
    }

    /// Number of fragments buffered so far.
    pub fn fragment_count(&self) -> usize {
        self.fragments.lock().len()
    }

    /// Concatenate and consume the buffered fragments.
    pub(crate) fn drain_fragments(&mut self) -> Vec<u8> {
        let fragments = std::mem::take(&mut *self.fragments.lock());
        fragments.concat()
    }
}

/// Holds all sessions in creation order
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Vec<Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new idle session with the given display name.
    pub fn add_session(&mut self, name: impl Into<String>) -> SessionId {
        let session = Session::new(name);
        let id = session.id;
        tracing::info!(session = %id, name = %session.name, "session added");
        self.sessions.push(session);
        id
    }

    /// Update a session's display name. Unknown ids are a silent no-op.
    pub fn rename(&mut self, id: SessionId, name: impl Into<String>) {
        if let Some(session) = self.find_mut(id) {
            session.name = name.into();
        }
    }

    pub fn find(&self, id: SessionId) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn find_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.iter_mut().find(|s| s.id == id)
    }

    /// All sessions, in creation order.
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

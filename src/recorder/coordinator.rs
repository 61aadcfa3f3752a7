//! Recording coordinator
//!
//! Orchestrates independent recording sessions through a shared lifecycle:
//! fans lifecycle commands out to every session's device, joins their
//! asynchronously resolving stop completions, and hands the collected
//! outputs to the finalization pipeline exactly once per stop cycle.

use super::device::{DeviceFactory, DeviceState, RecorderError, RecorderResult, StopComplete};
use super::session::{Session, SessionId, SessionRegistry};
use super::state::{RecorderConfig, SessionState};
use crate::capture::{CaptureService, MediaStream, SharedMicrophone};
use crate::export::{
    ArchiveBundle, ArchiveService, CollectedOutput, ContainerFormat, DownloadTrigger,
    FinalizePipeline, TranscodeService,
};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Coarse status transitions reported to the user-facing sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// Recording started across the registry
    Recording,
    /// Recording paused
    Paused,
    /// Recording resumed
    Resumed,
    /// All stops issued; finalization in progress
    Processing,
    /// Archive serialized and handed to the download step
    Ready,
    /// Finalization failed
    Error(String),
}

/// Drives every session's capture device and finalizes their output
pub struct RecordingCoordinator {
    config: RecorderConfig,

    /// Sessions in creation order
    registry: SessionRegistry,

    /// The one microphone input shared by all sessions
    microphone: SharedMicrophone,

    capture: Arc<dyn CaptureService>,
    devices: Arc<dyn DeviceFactory>,
    pipeline: FinalizePipeline,
    download: Option<Arc<dyn DownloadTrigger>>,

    /// Event broadcaster
    event_tx: broadcast::Sender<RecorderEvent>,
}

impl RecordingCoordinator {
    /// Create a new recording coordinator
    pub fn new(
        config: RecorderConfig,
        capture: Arc<dyn CaptureService>,
        devices: Arc<dyn DeviceFactory>,
        transcoder: Arc<dyn TranscodeService>,
        archiver: Arc<dyn ArchiveService>,
    ) -> Self {
        let pipeline = FinalizePipeline::new(transcoder, archiver)
            .with_target(config.target_format)
            .with_archive_name(config.archive_file_name.clone());
        let (event_tx, _) = broadcast::channel(100);
        Self {
            config,
            registry: SessionRegistry::new(),
            microphone: SharedMicrophone::new(),
            capture,
            devices,
            pipeline,
            download: None,
            event_tx,
        }
    }

    /// Attach a download trigger fired after each successful finalization.
    pub fn with_download_trigger(mut self, trigger: Arc<dyn DownloadTrigger>) -> Self {
        self.download = Some(trigger);
        self
    }

    /// Subscribe to status events
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.event_tx.subscribe()
    }

    /// All sessions, in creation order.
    pub fn sessions(&self) -> &[Session] {
        self.registry.sessions()
    }

    pub fn find(&self, id: SessionId) -> Option<&Session> {
        self.registry.find(id)
    }

    /// Create a new idle session with the given display name.
    pub fn add_session(&mut self, name: impl Into<String>) -> SessionId {
        self.registry.add_session(name)
    }

    /// Update a session's display name. Unknown ids are a silent no-op.
    pub fn rename(&mut self, id: SessionId, name: impl Into<String>) {
        self.registry.rename(id, name);
    }

    /// Attach a combined screen + microphone source to a session.
    ///
    /// Acquires the shared microphone (first call fixes the
    /// noise-cancellation setting), requests a fresh screen stream, and
    /// combines both. On failure the session keeps its previous state.
    pub async fn select_source(&mut self, id: SessionId) -> RecorderResult<()> {
        if self.registry.find(id).is_none() {
            return Err(RecorderError::UnknownSession(id));
        }

        let microphone = self
            .microphone
            .acquire(self.capture.as_ref(), self.config.noise_cancellation)
            .await?;
        let screen = self.capture.request_screen(&self.config.screen).await?;
        let combined = MediaStream::combined(&screen, &microphone);

        if let Some(session) = self.registry.find_mut(id) {
            session.attach_source(combined);
            if session.state == SessionState::Idle {
                session.state = SessionState::Ready;
            }
            tracing::info!(session = %id, "source attached");
        }
        Ok(())
    }

    /// Start recording on every session that has a source.
    ///
    /// Fire-and-forget across the registry: sourceless sessions are skipped,
    /// not errored. Each started session gets a fresh device and an empty
    /// fragment buffer, so restarting never carries residue from an earlier
    /// cycle. A failed device creation propagates.
    pub async fn start_all(&mut self) -> RecorderResult<()> {
        let devices = Arc::clone(&self.devices);
        let mut started = 0usize;

        for session in self.registry.iter_mut() {
            let mut device = match &session.source {
                Some(stream) => devices.open_device(stream)?,
                None => continue,
            };

            session.clear_fragments();
            if let Some(mut fragments) = device.take_fragments() {
                let buffer = session.fragment_buffer();
                session.delivery = Some(tokio::spawn(async move {
                    while let Some(fragment) = fragments.recv().await {
                        buffer.lock().push(fragment);
                    }
                }));
            }

            device.start().await?;
            session.container = Some(device.container());
            session.device = Some(device);
            session.state = SessionState::Recording;
            started += 1;
        }

        tracing::info!(started, "recording started");
        self.emit(RecorderEvent::Recording);
        Ok(())
    }

    /// Pause every session whose device is actually recording.
    ///
    /// Idempotent under repeated clicks: devices not in the recording state
    /// are left untouched.
    pub async fn pause_all(&mut self) {
        for session in self.registry.iter_mut() {
            let Some(device) = session.device.as_mut() else {
                continue;
            };
            if device.state() != DeviceState::Recording {
                continue;
            }
            match device.pause().await {
                Ok(()) => session.state = SessionState::Paused,
                Err(e) => tracing::warn!(session = %session.id, error = %e, "pause failed"),
            }
        }
        self.emit(RecorderEvent::Paused);
    }

    /// Resume every paused session.
    pub async fn resume_all(&mut self) {
        for session in self.registry.iter_mut() {
            let Some(device) = session.device.as_mut() else {
                continue;
            };
            if device.state() != DeviceState::Paused {
                continue;
            }
            match device.resume().await {
                Ok(()) => session.state = SessionState::Recording,
                Err(e) => tracing::warn!(session = %session.id, error = %e, "resume failed"),
            }
        }
        self.emit(RecorderEvent::Resumed);
    }

    /// Stop every recording session, wait for all of them to flush, then
    /// finalize.
    ///
    /// The stoppable set is fixed before any stop is issued; sessions that
    /// were never recording cannot block the join or complete it early. The
    /// join is correct regardless of the order completions arrive in. Once
    /// every stoppable session has reported, collected outputs are assembled
    /// in creation order and run through the pipeline exactly once; with no
    /// stoppable sessions the pipeline still runs over an empty set.
    pub async fn stop_all(&mut self) -> RecorderResult<ArchiveBundle> {
        // Fix the expected set up front.
        let stoppable: Vec<SessionId> = self
            .registry
            .sessions()
            .iter()
            .filter(|s| {
                s.device
                    .as_ref()
                    .map(|d| matches!(d.state(), DeviceState::Recording | DeviceState::Paused))
                    .unwrap_or(false)
            })
            .map(|s| s.id)
            .collect();

        let mut completions: Vec<StopComplete> = Vec::with_capacity(stoppable.len());
        let mut stopped: HashSet<SessionId> = HashSet::with_capacity(stoppable.len());

        for &id in &stoppable {
            let Some(session) = self.registry.find_mut(id) else {
                continue;
            };
            let Some(device) = session.device.as_mut() else {
                continue;
            };
            match device.stop().await {
                Ok(done) => {
                    session.state = SessionState::Stopping;
                    stopped.insert(id);
                    completions.push(done);
                }
                Err(e) => {
                    tracing::warn!(session = %id, error = %e, "stop request failed")
                }
            }
        }

        self.emit(RecorderEvent::Processing);
        tracing::info!(awaiting = completions.len(), "waiting for devices to flush");

        // Join point: resolves only once every stoppable session has flushed.
        // A dropped sender counts as flushed.
        join_all(completions).await;

        let mut outputs = Vec::with_capacity(stopped.len());
        for session in self.registry.iter_mut() {
            if !stopped.contains(&session.id) {
                continue;
            }
            // Let the delivery task drain whatever the device flushed.
            if let Some(delivery) = session.delivery.take() {
                let _ = delivery.await;
            }
            session.device = None;
            session.state = SessionState::Stopped;
            outputs.push(CollectedOutput {
                name: session.name.clone(),
                container: session.container.unwrap_or(ContainerFormat::Webm),
                data: session.drain_fragments(),
            });
        }

        match self.pipeline.run(outputs).await {
            Ok(bundle) => {
                if let Some(trigger) = &self.download {
                    trigger.save(&bundle.file_name, &bundle.data);
                }
                self.emit(RecorderEvent::Ready);
                Ok(bundle)
            }
            Err(e) => {
                self.emit(RecorderEvent::Error(e.to_string()));
                Err(e.into())
            }
        }
    }

    fn emit(&self, event: RecorderEvent) {
        let _ = self.event_tx.send(event);
    }
}

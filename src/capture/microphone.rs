//! Shared microphone provider
//!
//! All sessions that mix microphone audio into their recording share one
//! underlying input. The provider acquires it lazily, exactly once; the
//! noise-cancellation configuration is fixed at first use for the rest of
//! the page session.

use super::traits::{CaptureError, CaptureService, MediaTrack, MicrophoneConstraints};

/// Lazily acquired, memoized microphone input shared across all sessions
#[derive(Default)]
pub struct SharedMicrophone {
    track: Option<MediaTrack>,
}

impl SharedMicrophone {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the shared microphone track.
    ///
    /// The first call performs the actual device acquisition with the
    /// requested noise-cancellation setting. Every later call returns the
    /// memoized handle and ignores its argument. A failed acquisition leaves
    /// nothing memoized, so a later call retries.
    pub async fn acquire(
        &mut self,
        service: &dyn CaptureService,
        noise_cancellation: bool,
    ) -> Result<MediaTrack, CaptureError> {
        if let Some(track) = &self.track {
            return Ok(track.clone());
        }

        let constraints = MicrophoneConstraints::noise_cancellation(noise_cancellation);
        let track = service.request_microphone(&constraints).await?;
        tracing::debug!(track = %track.id, "shared microphone acquired");
        self.track = Some(track.clone());
        Ok(track)
    }

    /// The memoized track, if acquisition has happened.
    pub fn track(&self) -> Option<&MediaTrack> {
        self.track.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::traits::{MediaStream, ScreenConstraints, TrackKind};
    use parking_lot::Mutex;

    /// Capture service that records every microphone request it receives.
    #[derive(Default)]
    struct CountingCapture {
        requests: Mutex<Vec<MicrophoneConstraints>>,
        fail_next: Mutex<bool>,
    }

    #[async_trait::async_trait]
    impl CaptureService for CountingCapture {
        async fn request_screen(
            &self,
            _constraints: &ScreenConstraints,
        ) -> Result<MediaStream, CaptureError> {
            Ok(MediaStream::default())
        }

        async fn request_microphone(
            &self,
            constraints: &MicrophoneConstraints,
        ) -> Result<MediaTrack, CaptureError> {
            if std::mem::take(&mut *self.fail_next.lock()) {
                return Err(CaptureError::PermissionDenied("microphone".into()));
            }
            self.requests.lock().push(*constraints);
            let n = self.requests.lock().len();
            Ok(MediaTrack::new(format!("mic-{n}"), TrackKind::Audio))
        }
    }

    #[tokio::test]
    async fn test_second_acquire_ignores_flag_and_reuses_handle() {
        let capture = CountingCapture::default();
        let mut mic = SharedMicrophone::new();

        let first = mic.acquire(&capture, true).await.unwrap();
        let second = mic.acquire(&capture, false).await.unwrap();

        assert_eq!(first, second);
        let requests = capture.requests.lock();
        assert_eq!(requests.len(), 1, "only one underlying acquisition");
        assert!(requests[0].noise_suppression, "first call's flag wins");
    }

    #[tokio::test]
    async fn test_failed_acquire_memoizes_nothing() {
        let capture = CountingCapture::default();
        *capture.fail_next.lock() = true;
        let mut mic = SharedMicrophone::new();

        assert!(mic.acquire(&capture, true).await.is_err());
        assert!(mic.track().is_none());

        // A later call retries and succeeds
        assert!(mic.acquire(&capture, true).await.is_ok());
        assert!(mic.track().is_some());
    }
}

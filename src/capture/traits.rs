//! Capture service definitions
//!
//! Implementation-agnostic contracts for acquiring screen and microphone
//! media, plus the track/stream model shared with the recorder.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by capture device acquisition
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Capture device unavailable: {0}")]
    Unavailable(String),
}

/// Kind of media carried by a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
}

/// A single audio or video track handle
///
/// Tracks are opaque handles into the capture layer. Cloning a track shares
/// the underlying source; it never duplicates or reconfigures the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaTrack {
    /// Capture-layer identifier for the track
    pub id: String,

    /// Whether this track carries video or audio
    pub kind: TrackKind,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

/// An ordered set of tracks captured and recorded together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaStream {
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Video)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(|t| t.kind == TrackKind::Audio)
    }

    /// Combine a screen stream with the shared microphone track.
    ///
    /// Track order is screen video, then screen audio, then a clone of the
    /// microphone track. The microphone itself is left untouched so every
    /// session can combine against the same source.
    pub fn combined(screen: &MediaStream, microphone: &MediaTrack) -> MediaStream {
        let mut tracks: Vec<MediaTrack> = screen.video_tracks().cloned().collect();
        tracks.extend(screen.audio_tracks().cloned());
        tracks.push(microphone.clone());
        MediaStream { tracks }
    }
}

/// Constraints for screen acquisition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenConstraints {
    /// Preferred frame rate
    pub frame_rate_ideal: u32,

    /// Upper frame rate bound
    pub frame_rate_max: u32,

    /// Preferred capture width in pixels
    pub width_ideal: u32,

    /// Preferred capture height in pixels
    pub height_ideal: u32,

    /// Whether to capture the screen's own audio alongside video
    pub capture_audio: bool,
}

impl Default for ScreenConstraints {
    fn default() -> Self {
        Self {
            frame_rate_ideal: 30,
            frame_rate_max: 60,
            width_ideal: 1920,
            height_ideal: 1080,
            capture_audio: true,
        }
    }
}

/// Constraints for microphone acquisition
///
/// Echo cancellation, noise suppression and automatic gain control are
/// toggled together as a single noise-cancellation setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicrophoneConstraints {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl MicrophoneConstraints {
    /// Build constraints from the bundled noise-cancellation toggle.
    pub fn noise_cancellation(enabled: bool) -> Self {
        Self {
            echo_cancellation: enabled,
            noise_suppression: enabled,
            auto_gain_control: enabled,
        }
    }
}

/// Acquires raw capture devices
///
/// Implementations wrap whatever platform layer actually owns the devices.
/// Both requests may fail with a permission or availability error; failures
/// are surfaced to the user action that triggered them and never retried
/// internally.
#[async_trait::async_trait]
pub trait CaptureService: Send + Sync {
    /// Request a screen capture stream honoring the given constraints.
    async fn request_screen(
        &self,
        constraints: &ScreenConstraints,
    ) -> Result<MediaStream, CaptureError>;

    /// Request a microphone track honoring the given constraints.
    async fn request_microphone(
        &self,
        constraints: &MicrophoneConstraints,
    ) -> Result<MediaTrack, CaptureError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_track_order() {
        let screen = MediaStream::new(vec![
            MediaTrack::new("screen-audio", TrackKind::Audio),
            MediaTrack::new("screen-video", TrackKind::Video),
        ]);
        let mic = MediaTrack::new("mic", TrackKind::Audio);

        let combined = MediaStream::combined(&screen, &mic);
        let ids: Vec<&str> = combined.tracks().iter().map(|t| t.id.as_str()).collect();

        // Video first, then screen audio, then the cloned microphone
        assert_eq!(ids, ["screen-video", "screen-audio", "mic"]);
    }

    #[test]
    fn test_noise_cancellation_bundles_all_three() {
        let on = MicrophoneConstraints::noise_cancellation(true);
        assert!(on.echo_cancellation && on.noise_suppression && on.auto_gain_control);

        let off = MicrophoneConstraints::noise_cancellation(false);
        assert!(!off.echo_cancellation && !off.noise_suppression && !off.auto_gain_control);
    }
}

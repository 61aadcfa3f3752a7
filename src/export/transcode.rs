//! Transcoding service boundary and the FFmpeg CLI implementation
//!
//! The pipeline drives the engine strictly sequentially, one request per
//! call; implementations do not need to be reentrant.

use crate::export::types::{ContainerFormat, ExportError};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::process::Command;

/// Converts recordings between container formats
#[async_trait::async_trait]
pub trait TranscodeService: Send + Sync {
    /// Load or verify the transcoding engine. Idempotent; invoked before the
    /// first transcode of every finalization run.
    async fn ensure_loaded(&self) -> Result<(), ExportError>;

    /// Convert one recording. One request per call, never interleaved.
    async fn transcode(
        &self,
        source: &[u8],
        from: ContainerFormat,
        to: ContainerFormat,
    ) -> Result<Vec<u8>, ExportError>;
}

/// Transcoder shelling out to the `ffmpeg` binary
///
/// Each call round-trips the bytes through a temporary directory and a
/// single `ffmpeg -i` invocation.
#[derive(Default)]
pub struct FfmpegTranscoder {
    verified: AtomicBool,
}

impl FfmpegTranscoder {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TranscodeService for FfmpegTranscoder {
    async fn ensure_loaded(&self) -> Result<(), ExportError> {
        if self.verified.load(Ordering::Acquire) {
            return Ok(());
        }

        let output = Command::new("ffmpeg")
            .arg("-version")
            .output()
            .await
            .map_err(|e| ExportError::Ffmpeg(format!("Failed to run ffmpeg: {}", e)))?;

        if !output.status.success() {
            return Err(ExportError::Ffmpeg(
                "ffmpeg -version exited with error".to_string(),
            ));
        }

        self.verified.store(true, Ordering::Release);
        tracing::debug!("ffmpeg binary verified");
        Ok(())
    }

    async fn transcode(
        &self,
        source: &[u8],
        from: ContainerFormat,
        to: ContainerFormat,
    ) -> Result<Vec<u8>, ExportError> {
        let dir = tempfile::tempdir()?;
        let input_path = dir.path().join(format!("input.{}", from.extension()));
        let output_path = dir.path().join(format!("output.{}", to.extension()));

        tokio::fs::write(&input_path, source).await?;

        let output = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(&input_path)
            .arg(&output_path)
            .output()
            .await
            .map_err(|e| ExportError::Ffmpeg(format!("Failed to start FFmpeg: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExportError::Ffmpeg(format!(
                "FFmpeg exited with error: {}",
                stderr
            )));
        }

        let transcoded = tokio::fs::read(&output_path).await?;
        tracing::debug!(
            input_bytes = source.len(),
            output_bytes = transcoded.len(),
            "transcode complete"
        );
        Ok(transcoded)
    }
}

//! Export types and configuration
//!
//! Types shared across the finalization pipeline: container formats, the
//! per-session collected output, the serialized archive bundle, and error
//! handling.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Media container formats handled by the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Webm,
    Mp4,
}

impl ContainerFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ContainerFormat::Webm => "webm",
            ContainerFormat::Mp4 => "mp4",
        }
    }

    /// Get the MIME type recording devices use for this format
    pub fn mime_type(&self) -> &'static str {
        match self {
            ContainerFormat::Webm => "video/webm;codecs=vp9,opus",
            ContainerFormat::Mp4 => "video/mp4",
        }
    }
}

/// Finalized in-memory recording for one session, ready for transcoding
///
/// Created once the session's device reports completion; immutable and
/// consumed exactly once by the pipeline.
#[derive(Debug, Clone)]
pub struct CollectedOutput {
    /// Display name at collection time; drives the archive entry name
    pub name: String,

    /// Container format the fragments were recorded in
    pub container: ContainerFormat,

    /// Concatenated data fragments, possibly empty
    pub data: Vec<u8>,
}

/// Serialized archive plus its suggested download file name
#[derive(Debug, Clone)]
pub struct ArchiveBundle {
    /// Suggested file name for the save action
    pub file_name: String,

    /// The serialized archive blob
    pub data: Vec<u8>,

    /// Number of entries added during the run
    pub entries: usize,
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Transcode error: {0}")]
    Transcode(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

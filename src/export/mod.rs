//! Finalization pipeline module
//!
//! Everything that happens after the last recording device flushes:
//! transcoding collected outputs, bundling them into one archive, and
//! handing the result to the download step.

pub mod archive;
pub mod pipeline;
pub mod transcode;
pub mod types;

pub use archive::{ArchiveBuilder, ArchiveService, ZipArchiveService};
pub use pipeline::{DiskDownload, DownloadTrigger, FinalizePipeline, DEFAULT_ARCHIVE_NAME};
pub use transcode::{FfmpegTranscoder, TranscodeService};
pub use types::{ArchiveBundle, CollectedOutput, ContainerFormat, ExportError};

//! Finalization pipeline
//!
//! Runs once per stop cycle: transcodes every collected output in strict
//! sequence and packages the results into a single downloadable archive.
//! Any failure aborts the run; no partial archive is ever serialized.

use crate::export::archive::ArchiveService;
use crate::export::transcode::TranscodeService;
use crate::export::types::{ArchiveBundle, CollectedOutput, ContainerFormat, ExportError};
use std::path::PathBuf;
use std::sync::Arc;

/// Default suggested file name for the serialized archive
pub const DEFAULT_ARCHIVE_NAME: &str = "dualcast_recordings.zip";

/// Hands a finished archive to the user-facing save action. Fire-and-forget.
pub trait DownloadTrigger: Send + Sync {
    fn save(&self, file_name: &str, bytes: &[u8]);
}

/// Download trigger that writes finished archives into a directory
pub struct DiskDownload {
    dir: PathBuf,
}

impl DiskDownload {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadTrigger for DiskDownload {
    fn save(&self, file_name: &str, bytes: &[u8]) {
        let path = self.dir.join(file_name);
        match std::fs::write(&path, bytes) {
            Ok(()) => tracing::info!(path = ?path, "archive saved"),
            Err(e) => tracing::error!(path = ?path, error = %e, "failed to save archive"),
        }
    }
}

/// Sequential transcode-then-archive stage, run once per full stop cycle
pub struct FinalizePipeline {
    transcoder: Arc<dyn TranscodeService>,
    archiver: Arc<dyn ArchiveService>,
    target: ContainerFormat,
    archive_name: String,
}

impl FinalizePipeline {
    pub fn new(transcoder: Arc<dyn TranscodeService>, archiver: Arc<dyn ArchiveService>) -> Self {
        Self {
            transcoder,
            archiver,
            target: ContainerFormat::Mp4,
            archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
        }
    }

    /// Set the distribution format entries are transcoded into.
    pub fn with_target(mut self, format: ContainerFormat) -> Self {
        self.target = format;
        self
    }

    /// Set the suggested file name of the serialized archive.
    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = name.into();
        self
    }

    /// Transcode every collected output in order and bundle the results.
    ///
    /// Strictly sequential: the transcoding engine holds shared state and
    /// must not see interleaved requests. Entry names derived from duplicate
    /// display names are not deduplicated. An empty input set still produces
    /// a serialized (empty) archive.
    pub async fn run(&self, outputs: Vec<CollectedOutput>) -> Result<ArchiveBundle, ExportError> {
        self.transcoder.ensure_loaded().await?;

        let mut archive = self.archiver.begin();
        let mut entries = 0usize;

        for output in &outputs {
            let entry_name = format!(
                "{}.{}",
                normalize_base_name(&output.name),
                self.target.extension()
            );
            tracing::debug!(entry = %entry_name, bytes = output.data.len(), "transcoding");

            let transcoded = self
                .transcoder
                .transcode(&output.data, output.container, self.target)
                .await?;
            archive.add_entry(&entry_name, &transcoded)?;
            entries += 1;
        }

        let data = archive.finish()?;
        tracing::info!(entries, bytes = data.len(), "archive serialized");

        Ok(ArchiveBundle {
            file_name: self.archive_name.clone(),
            data,
            entries,
        })
    }
}

/// Derive an archive base name from a display name: lowercased, whitespace
/// runs collapsed to single underscores.
fn normalize_base_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::archive::{ArchiveBuilder, ZipArchiveService};
    use anyhow::Result;
    use parking_lot::Mutex;
    use std::io::{Cursor, Read};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transcoder that tags its input instead of converting it, with an
    /// optional call index that fails.
    #[derive(Default)]
    struct TaggingTranscoder {
        loads: AtomicUsize,
        calls: AtomicUsize,
        fail_on_call: Option<usize>,
    }

    impl TaggingTranscoder {
        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::default()
            }
        }
    }

    #[async_trait::async_trait]
    impl TranscodeService for TaggingTranscoder {
        async fn ensure_loaded(&self) -> Result<(), ExportError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn transcode(
            &self,
            source: &[u8],
            _from: ContainerFormat,
            _to: ContainerFormat,
        ) -> Result<Vec<u8>, ExportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on_call == Some(call) {
                return Err(ExportError::Transcode("engine rejected input".into()));
            }
            let mut out = b"mp4:".to_vec();
            out.extend_from_slice(source);
            Ok(out)
        }
    }

    /// Archive service recording whether any run was serialized.
    #[derive(Default)]
    struct ObservableArchives {
        added: Arc<Mutex<Vec<String>>>,
        finished: Arc<AtomicUsize>,
    }

    struct ObservableBuilder {
        added: Arc<Mutex<Vec<String>>>,
        finished: Arc<AtomicUsize>,
    }

    impl ArchiveBuilder for ObservableBuilder {
        fn add_entry(&mut self, name: &str, _bytes: &[u8]) -> Result<(), ExportError> {
            self.added.lock().push(name.to_string());
            Ok(())
        }

        fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError> {
            self.finished.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    impl ArchiveService for ObservableArchives {
        fn begin(&self) -> Box<dyn ArchiveBuilder> {
            Box::new(ObservableBuilder {
                added: Arc::clone(&self.added),
                finished: Arc::clone(&self.finished),
            })
        }
    }

    fn output(name: &str, data: &[u8]) -> CollectedOutput {
        CollectedOutput {
            name: name.to_string(),
            container: ContainerFormat::Webm,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_disk_download_writes_archive() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let download = DiskDownload::new(dir.path());

        download.save("bundle.zip", b"bytes");

        assert_eq!(std::fs::read(dir.path().join("bundle.zip"))?, b"bytes");
        Ok(())
    }

    #[test]
    fn test_normalize_base_name() {
        assert_eq!(normalize_base_name("Screen 1"), "screen_1");
        assert_eq!(normalize_base_name("  My   DEMO\trun "), "my_demo_run");
        assert_eq!(normalize_base_name("plain"), "plain");
    }

    #[tokio::test]
    async fn test_run_archives_outputs_in_order() -> Result<()> {
        let pipeline = FinalizePipeline::new(
            Arc::new(TaggingTranscoder::default()),
            Arc::new(ZipArchiveService::new()),
        );

        let bundle = pipeline
            .run(vec![output("Screen 1", b"one"), output("Screen 2", b"two")])
            .await?;

        assert_eq!(bundle.entries, 2);
        assert_eq!(bundle.file_name, DEFAULT_ARCHIVE_NAME);

        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.data))?;
        let mut contents = Vec::new();
        archive
            .by_name("screen_1.mp4")?
            .read_to_end(&mut contents)?;
        assert_eq!(contents, b"mp4:one");
        // Entry order follows input order
        assert_eq!(archive.by_index(0)?.name(), "screen_1.mp4");
        assert_eq!(archive.by_index(1)?.name(), "screen_2.mp4");
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_input_still_serializes() -> Result<()> {
        let pipeline = FinalizePipeline::new(
            Arc::new(TaggingTranscoder::default()),
            Arc::new(ZipArchiveService::new()),
        );

        let bundle = pipeline.run(Vec::new()).await?;
        assert_eq!(bundle.entries, 0);

        let archive = zip::ZipArchive::new(Cursor::new(bundle.data))?;
        assert_eq!(archive.len(), 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_aborts_without_serializing() {
        let archives = ObservableArchives::default();
        let added = Arc::clone(&archives.added);
        let finished = Arc::clone(&archives.finished);

        let pipeline = FinalizePipeline::new(
            Arc::new(TaggingTranscoder::failing_on(2)),
            Arc::new(archives),
        );

        let result = pipeline
            .run(vec![
                output("a", b"1"),
                output("b", b"2"),
                output("c", b"3"),
            ])
            .await;

        assert!(matches!(result, Err(ExportError::Transcode(_))));
        // First entry made it in before the abort, but nothing was serialized
        assert_eq!(added.lock().as_slice(), ["a.mp4"]);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_colliding_names_overwrite() -> Result<()> {
        let pipeline = FinalizePipeline::new(
            Arc::new(TaggingTranscoder::default()),
            Arc::new(ZipArchiveService::new()),
        );

        let bundle = pipeline
            .run(vec![output("My Screen", b"old"), output("my  SCREEN", b"new")])
            .await?;

        let mut archive = zip::ZipArchive::new(Cursor::new(bundle.data))?;
        let mut contents = Vec::new();
        archive
            .by_name("my_screen.mp4")?
            .read_to_end(&mut contents)?;
        assert_eq!(contents, b"mp4:new");
        Ok(())
    }
}

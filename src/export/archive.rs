//! Archival service boundary and the zip implementation

use crate::export::types::ExportError;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// An archive under construction
///
/// Built incrementally by the pipeline, serialized exactly once. Entry names
/// are not deduplicated; an entry reusing a name shadows the earlier one when
/// the archive is read back.
pub trait ArchiveBuilder: Send {
    /// Add one entry under the given file name.
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError>;

    /// Serialize the archive into a single downloadable blob.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, ExportError>;
}

/// Creates archive builders, one per finalization run
pub trait ArchiveService: Send + Sync {
    fn begin(&self) -> Box<dyn ArchiveBuilder>;
}

/// Deflate-compressed zip archives held in memory
#[derive(Default)]
pub struct ZipArchiveService;

impl ZipArchiveService {
    pub fn new() -> Self {
        Self
    }
}

struct ZipBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl ArchiveBuilder for ZipBuilder {
    fn add_entry(&mut self, name: &str, bytes: &[u8]) -> Result<(), ExportError> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(name, options)
            .map_err(|e| ExportError::Archive(e.to_string()))?;
        self.writer.write_all(bytes)?;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> Result<Vec<u8>, ExportError> {
        let cursor = self
            .writer
            .finish()
            .map_err(|e| ExportError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

impl ArchiveService for ZipArchiveService {
    fn begin(&self) -> Box<dyn ArchiveBuilder> {
        Box::new(ZipBuilder {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Read;

    #[test]
    fn test_zip_round_trip() -> Result<()> {
        let service = ZipArchiveService::new();
        let mut builder = service.begin();
        builder.add_entry("first.mp4", b"alpha")?;
        builder.add_entry("second.mp4", b"beta")?;
        let blob = builder.finish()?;

        let mut archive = zip::ZipArchive::new(Cursor::new(blob))?;
        assert_eq!(archive.len(), 2);

        let mut contents = Vec::new();
        archive.by_name("first.mp4")?.read_to_end(&mut contents)?;
        assert_eq!(contents, b"alpha");

        contents.clear();
        archive.by_name("second.mp4")?.read_to_end(&mut contents)?;
        assert_eq!(contents, b"beta");
        Ok(())
    }

    #[test]
    fn test_duplicate_name_shadows_earlier_entry() -> Result<()> {
        let service = ZipArchiveService::new();
        let mut builder = service.begin();
        builder.add_entry("screen.mp4", b"old")?;
        builder.add_entry("screen.mp4", b"new")?;
        let blob = builder.finish()?;

        let mut archive = zip::ZipArchive::new(Cursor::new(blob))?;
        let mut contents = Vec::new();
        archive.by_name("screen.mp4")?.read_to_end(&mut contents)?;
        assert_eq!(contents, b"new");
        Ok(())
    }

    #[test]
    fn test_empty_archive_serializes() -> Result<()> {
        let service = ZipArchiveService::new();
        let blob = service.begin().finish()?;

        let archive = zip::ZipArchive::new(Cursor::new(blob))?;
        assert_eq!(archive.len(), 0);
        Ok(())
    }
}

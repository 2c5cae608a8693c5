use super::normalize_entry_path;
use crate::bundle::error::{BundleError, BundleResult};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// One file entry read from a source archive.
///
/// The content is a one-shot stream borrowed from the reader; it has to be
/// consumed (or dropped) before the next entry can be requested.
pub struct ArchiveEntry<'a> {
    path: String,
    size: u64,
    content: Box<dyn Read + 'a>,
}

impl ArchiveEntry<'_> {
    /// Normalized, slash-separated path of the entry.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Uncompressed size as recorded in the archive.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the remaining content into memory.
    pub fn read_all(&mut self) -> BundleResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.size.min(1 << 20) as usize);
        self.content
            .read_to_end(&mut buf)
            .map_err(|source| BundleError::EntryRead {
                entry: self.path.clone(),
                source,
            })?;
        Ok(buf)
    }
}

impl Read for ArchiveEntry<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.content.read(buf)
    }
}

/// Sequential reader over the file entries of one zip/jar.
///
/// Entries come back in archive order; directory markers are skipped.
pub struct ArchiveReader {
    source: PathBuf,
    archive: ZipArchive<BufReader<File>>,
    cursor: usize,
}

impl ArchiveReader {
    /// Open a source archive and parse its central directory.
    pub fn open(source: &Path) -> BundleResult<Self> {
        let file = File::open(source).map_err(|e| BundleError::io(source, e))?;
        let archive = ZipArchive::new(BufReader::new(file))
            .map_err(|e| BundleError::corrupt(source, e))?;

        log::debug!(
            "Opened archive {:?} ({} raw entries)",
            source,
            archive.len()
        );

        Ok(Self {
            source: source.to_path_buf(),
            archive,
            cursor: 0,
        })
    }

    /// Number of raw entries, directories included.
    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Advance to the next non-directory entry.
    pub fn next_entry(&mut self) -> BundleResult<Option<ArchiveEntry<'_>>> {
        loop {
            if self.cursor >= self.archive.len() {
                return Ok(None);
            }
            let index = self.cursor;
            self.cursor += 1;

            let is_dir = self
                .archive
                .by_index_raw(index)
                .map_err(|e| BundleError::corrupt(&self.source, e))?
                .is_dir();
            if is_dir {
                continue;
            }

            let file = self
                .archive
                .by_index(index)
                .map_err(|e| BundleError::corrupt(&self.source, e))?;
            let path = normalize_entry_path(file.name());
            let size = file.size();

            return Ok(Some(ArchiveEntry {
                path,
                size,
                content: Box::new(file),
            }));
        }
    }
}

use crate::bundle::config::COPY_BUFFER_SIZE;
use crate::bundle::error::{BundleError, BundleResult};
use std::fs;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Scoped zip sink for one output jar.
///
/// Entries are written into a hidden staging file beside the destination.
/// [`finish`](Self::finish) writes the central directory and moves the staging
/// file over the destination in one rename. An unfinished writer removes its
/// staging file when dropped, so a failed assembly never leaves a truncated jar
/// behind and never clobbers an existing one.
pub struct ArchiveWriter {
    destination: PathBuf,
    zip: ZipWriter<BufWriter<NamedTempFile>>,
    options: SimpleFileOptions,
    entries: usize,
}

impl ArchiveWriter {
    pub fn begin(destination: &Path) -> BundleResult<Self> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent).map_err(|e| BundleError::io(parent, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".piston-bundle-")
            .suffix(".part")
            .tempfile_in(parent)
            .map_err(|e| BundleError::io(parent, e))?;

        log::debug!(
            "Staging {:?} for output {:?}",
            staging.path(),
            destination
        );

        Ok(Self {
            destination: destination.to_path_buf(),
            zip: ZipWriter::new(BufWriter::new(staging)),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            entries: 0,
        })
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Stream one entry into the archive. Path uniqueness is the caller's job.
    ///
    /// `size` is the expected uncompressed size; entries past 4 GiB get zip64
    /// headers.
    pub fn put_entry<R: Read + ?Sized>(
        &mut self,
        path: &str,
        size: u64,
        content: &mut R,
    ) -> BundleResult<u64> {
        self.start(path, needs_zip64(size))?;

        let mut buffer = vec![0u8; COPY_BUFFER_SIZE];
        let mut written = 0u64;
        loop {
            let read = match content.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(BundleError::EntryRead {
                        entry: path.to_string(),
                        source,
                    })
                }
            };
            self.zip
                .write_all(&buffer[..read])
                .map_err(|e| BundleError::io(&self.destination, e))?;
            written += read as u64;
        }

        Ok(written)
    }

    /// Write an in-memory entry.
    pub fn put_bytes(&mut self, path: &str, bytes: &[u8]) -> BundleResult<()> {
        self.start(path, needs_zip64(bytes.len() as u64))?;
        self.zip
            .write_all(bytes)
            .map_err(|e| BundleError::io(&self.destination, e))
    }

    fn start(&mut self, path: &str, large: bool) -> BundleResult<()> {
        self.zip
            .start_file(path, self.options.large_file(large))
            .map_err(|e| BundleError::io(&self.destination, e.into()))?;
        self.entries += 1;
        Ok(())
    }

    /// Write the trailer and move the finished jar into place.
    pub fn finish(self) -> BundleResult<PathBuf> {
        let Self {
            destination,
            zip,
            entries,
            ..
        } = self;

        let buffered = zip
            .finish()
            .map_err(|e| BundleError::output(&destination, e.into()))?;
        let staging = buffered
            .into_inner()
            .map_err(|e| BundleError::output(&destination, e.into_error()))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|e| BundleError::output(&destination, e))?;
        staging
            .persist(&destination)
            .map_err(|e| BundleError::output(&destination, e.error))?;

        log::debug!("Wrote {} entries to {:?}", entries, destination);
        Ok(destination)
    }

    /// Discard everything written so far.
    pub fn abort(self, reason: &str) {
        log::warn!(
            "Discarding partial output {:?} after {} entries: {}",
            self.destination,
            self.entries,
            reason
        );
        drop(self);
    }
}

fn needs_zip64(size: u64) -> bool {
    size > u32::MAX as u64
}

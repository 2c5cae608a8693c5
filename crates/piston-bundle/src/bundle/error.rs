use std::io;
use std::path::{Path, PathBuf};
use zip::result::ZipError;

/// Fatal failures while assembling a bundle.
///
/// Duplicate entries are not errors; they are collected in
/// [`AssemblyReport`](super::AssemblyReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Archive is corrupt or not a zip file: {path:?}: {source}")]
    ArchiveCorrupt { path: PathBuf, source: ZipError },

    #[error("IO error at {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("Failed to read entry {entry}: {source}")]
    EntryRead { entry: String, source: io::Error },

    #[error("Failed to finalize output {path:?}: {source}")]
    OutputWrite { path: PathBuf, source: io::Error },
}

pub type BundleResult<T> = std::result::Result<T, BundleError>;

impl BundleError {
    pub(crate) fn corrupt(path: &Path, source: ZipError) -> Self {
        // Zip IO errors are disk problems, not structural ones
        match source {
            ZipError::Io(err) => Self::io(path, err),
            other => Self::ArchiveCorrupt {
                path: path.to_path_buf(),
                source: other,
            },
        }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn output(path: &Path, source: io::Error) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    }

    /// True for the structural-corruption case.
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::ArchiveCorrupt { .. })
    }
}

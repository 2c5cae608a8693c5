//! Streaming access to zip/jar containers.
pub mod reader;
pub mod writer;

pub use reader::{ArchiveEntry, ArchiveReader};
pub use writer::ArchiveWriter;

/// Normalize an entry name into archive path form.
///
/// Entry paths are a cross-platform wire format: separators are always `/`
/// and there is never a leading slash. Case is preserved.
pub fn normalize_entry_path(name: &str) -> String {
    let normalized = name.replace('\\', "/");
    normalized.trim_start_matches('/').to_string()
}

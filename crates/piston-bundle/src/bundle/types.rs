use crate::bundle::config::SERVICES_DIR;
use crate::bundle::manifest::BundleManifest;
use std::path::{Path, PathBuf};

/// Progress reporter trait for bundle and install operations
/// Implementations forward updates to the UI/notification system
pub trait ProgressReporter: Send + Sync {
    /// Start a new step with optional total steps
    fn start_step(&self, name: &str, total_steps: Option<u32>);

    /// Set overall percentage (0-100, or -1 for indeterminate)
    fn set_percent(&self, percent: i32);

    /// Set a short status message
    fn set_message(&self, message: &str);

    /// Set a numeric step count for the current step (e.g. "3/12").
    /// `total` may be None when unknown.
    fn set_step_count(&self, current: u32, total: Option<u32>);

    /// Mark operation as complete
    fn done(&self, success: bool, message: Option<&str>);
}

/// A progress reporter that does nothing (silent).
/// Useful for background work or tests.
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start_step(&self, _name: &str, _total_steps: Option<u32>) {}
    fn set_percent(&self, _percent: i32) {}
    fn set_message(&self, _message: &str) {}
    fn set_step_count(&self, _current: u32, _total: Option<u32>) {}
    fn done(&self, _success: bool, _message: Option<&str>) {}
}

/// Adapts a plain status callback. Only messages are forwarded.
pub struct FnProgressReporter<F>(pub F);

impl<F> ProgressReporter for FnProgressReporter<F>
where
    F: Fn(&str) + Send + Sync,
{
    fn start_step(&self, name: &str, _total_steps: Option<u32>) {
        (self.0)(name)
    }
    fn set_percent(&self, _percent: i32) {}
    fn set_message(&self, message: &str) {
        (self.0)(message)
    }
    fn set_step_count(&self, _current: u32, _total: Option<u32>) {}
    fn done(&self, _success: bool, message: Option<&str>) {
        if let Some(message) = message {
            (self.0)(message)
        }
    }
}

/// Bundle assembly specification
#[derive(Debug, Clone)]
pub struct BundleSpec {
    /// Source jars, merged strictly in this order
    pub sources: Vec<PathBuf>,

    /// Output jar; replaced only once assembly succeeds
    pub destination: PathBuf,

    /// Bootstrap entries written first
    pub manifest: BundleManifest,

    /// Directory whose direct children are merged (`META-INF/services/`)
    pub services_prefix: String,
}

impl BundleSpec {
    pub fn new(sources: Vec<PathBuf>, destination: PathBuf, manifest: BundleManifest) -> Self {
        Self {
            sources,
            destination,
            manifest,
            services_prefix: SERVICES_DIR.to_string(),
        }
    }
}

/// A direct-copy entry that was dropped because an earlier source had it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateEntry {
    pub path: String,
    /// Archive whose copy was dropped
    pub source: PathBuf,
}

/// Summary of a successful assembly.
#[derive(Debug, Clone, Default)]
pub struct AssemblyReport {
    pub destination: PathBuf,
    pub duplicates: Vec<DuplicateEntry>,
    /// Entries copied verbatim from sources
    pub copied_entries: usize,
    /// Merged service definition entries
    pub merged_entries: usize,
}

impl AssemblyReport {
    pub(crate) fn new(destination: &Path) -> Self {
        Self {
            destination: destination.to_path_buf(),
            ..Default::default()
        }
    }

    /// Entries in the output jar, the two bootstrap entries included.
    pub fn total_entries(&self) -> usize {
        2 + self.copied_entries + self.merged_entries
    }

    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

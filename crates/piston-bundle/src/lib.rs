//! Server launch-jar assembly for modloader installs.
//!
//! The [`bundle`] module merges a list of library jars into one runnable jar,
//! unioning `META-INF/services` definitions along the way. The [`server`]
//! module wraps it in the install flow used for dedicated servers.

pub mod bundle;
pub mod server;

// Re-export commonly used types
pub use bundle::{
    assemble_bundle, AssemblyReport, BundleError, BundleManifest, BundleResult, BundleSpec,
    DuplicateEntry, FnProgressReporter, ProgressReporter, SilentProgressReporter,
};
pub use server::{install_server, LaunchMeta, LibraryFetcher, LibraryRef, ServerInstallSpec};

pub mod archive;
pub mod config;
pub mod error;
pub mod manifest;
pub mod registry;
pub mod services;
pub mod types;


pub use error::{BundleError, BundleResult};
pub use manifest::BundleManifest;
pub use types::{
    AssemblyReport, BundleSpec, DuplicateEntry, FnProgressReporter, ProgressReporter,
    SilentProgressReporter,
};

use archive::{ArchiveReader, ArchiveWriter};
use config::MANIFEST_PATH;
use registry::EntryRegistry;
use services::ServiceMerger;
use std::path::Path;

/// Merge `spec.sources` into one launch jar at `spec.destination`.
///
/// Sources are visited strictly in the given order: the first copy of a path
/// wins, and merged service lines keep their first-seen order. Any error
/// aborts the whole run and leaves the destination as it was.
pub fn assemble_bundle(
    spec: &BundleSpec,
    reporter: &dyn ProgressReporter,
) -> BundleResult<AssemblyReport> {
    log::info!(
        "Assembling {:?} from {} source archives",
        spec.destination,
        spec.sources.len()
    );

    let writer = ArchiveWriter::begin(&spec.destination)?;
    let mut assembler = BundleAssembler {
        spec,
        reporter,
        writer,
        registry: EntryRegistry::new(),
        services: ServiceMerger::new(spec.services_prefix.as_str()),
        report: AssemblyReport::new(&spec.destination),
    };

    let scanned = assembler
        .write_bootstrap()
        .and_then(|()| assembler.add_sources());
    if let Err(err) = scanned {
        assembler.writer.abort(&err.to_string());
        return Err(err);
    }

    let report = assembler.finish()?;
    reporter.set_message(&format!(
        "Launch jar written: {} entries, {} duplicates skipped",
        report.total_entries(),
        report.duplicate_count()
    ));
    log::info!(
        "Assembled {:?}: {} copied, {} merged service files, {} duplicates",
        report.destination,
        report.copied_entries,
        report.merged_entries,
        report.duplicate_count()
    );

    Ok(report)
}

struct BundleAssembler<'a> {
    spec: &'a BundleSpec,
    reporter: &'a dyn ProgressReporter,
    writer: ArchiveWriter,
    registry: EntryRegistry,
    services: ServiceMerger,
    report: AssemblyReport,
}

impl BundleAssembler<'_> {
    fn write_bootstrap(&mut self) -> BundleResult<()> {
        let manifest = &self.spec.manifest;
        for path in manifest.bootstrap_paths() {
            self.registry.register(path);
        }

        self.writer
            .put_bytes(MANIFEST_PATH, &manifest.render_manifest())?;
        self.writer
            .put_bytes(&manifest.properties_path, &manifest.render_properties())?;
        Ok(())
    }

    fn add_sources(&mut self) -> BundleResult<()> {
        let spec = self.spec;
        let total = spec.sources.len() as u32;
        for (i, source) in spec.sources.iter().enumerate() {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| source.to_string_lossy().to_string());
            self.reporter
                .set_message(&format!("Adding library to launch jar: {}", name));
            self.reporter.set_step_count(i as u32 + 1, Some(total));

            self.add_source(source)?;
        }
        Ok(())
    }

    fn add_source(&mut self, source: &Path) -> BundleResult<()> {
        let mut reader = ArchiveReader::open(source)?;
        let mut leading = true;

        while let Some(mut entry) = reader.next_entry()? {
            let path = entry.path().to_string();
            let first_file = std::mem::replace(&mut leading, false);

            if self.services.is_merge_path(&path) {
                let added = self.services.ingest_reader(&path, &mut entry)?;
                log::debug!("Merged {} new lines into {} from {:?}", added, path, source);
            } else if first_file && path == MANIFEST_PATH {
                // A jar stream consumes a leading manifest; a later one is a plain entry
                log::debug!("Skipping manifest of {:?}", source);
            } else if !self.registry.register(&path) {
                log::warn!("Duplicate file: {} (from {:?})", path, source);
                self.report.duplicates.push(DuplicateEntry {
                    path,
                    source: source.to_path_buf(),
                });
            } else {
                let size = entry.size();
                self.writer.put_entry(&path, size, &mut entry)?;
                self.report.copied_entries += 1;
            }
        }

        Ok(())
    }

    fn finish(self) -> BundleResult<AssemblyReport> {
        let Self {
            mut writer,
            services,
            mut report,
            ..
        } = self;

        let merged = services.flush_all();
        for service in &merged {
            if let Err(err) = writer.put_bytes(&service.path, &service.contents) {
                writer.abort(&err.to_string());
                return Err(err);
            }
        }
        report.merged_entries = merged.len();

        writer.finish()?;
        Ok(report)
    }
}

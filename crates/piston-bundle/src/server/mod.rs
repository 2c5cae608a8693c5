pub mod library;
pub mod types;

pub use library::{file_sha1, maven_to_path, MavenCoords};
pub use types::{LaunchMeta, LibraryRef, MainClass, ServerInstallOutcome, ServerInstallSpec};

use crate::bundle::{assemble_bundle, BundleManifest, BundleSpec, ProgressReporter};
use anyhow::{bail, Context, Result};
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use library::sha1_matches;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Transport for library jars.
/// The installer resolves where a library lives and where it goes; the fetcher
/// only moves bytes (HTTP client, offline mirror, test fixture, ...).
pub trait LibraryFetcher: Send + Sync {
    /// Fetch `url` into `destination`. The parent directory already exists.
    fn fetch<'a>(
        &'a self,
        library: &'a LibraryRef,
        url: &'a str,
        destination: &'a Path,
    ) -> BoxFuture<'a, Result<()>>;
}

/// Install a dedicated server launch jar.
///
/// Fetches every server library (bounded concurrency, results kept in list
/// order), verifies checksums, then merges them into
/// `<server_dir>/fabric-server-launch.jar`.
pub async fn install_server(
    spec: &ServerInstallSpec,
    meta: &LaunchMeta,
    fetcher: Arc<dyn LibraryFetcher>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<ServerInstallOutcome> {
    log::info!(
        "Installing server: loader={} game={} into {:?}",
        spec.loader_version,
        spec.game_version,
        spec.server_dir
    );
    reporter.set_message(&format!(
        "Installing server {}({})",
        spec.loader_version, spec.game_version
    ));

    match run_install(spec, meta, fetcher, reporter.clone()).await {
        Ok(outcome) => {
            let jar_name = outcome
                .launch_jar
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            reporter.done(
                true,
                Some(&format!("Done, start the server with {}", jar_name)),
            );
            log::info!("Server installation completed: {:?}", outcome.launch_jar);
            Ok(outcome)
        }
        Err(err) => {
            log::error!("Server installation failed: {:#}", err);
            reporter.done(false, Some("Server installation failed"));
            Err(err)
        }
    }
}

async fn run_install(
    spec: &ServerInstallSpec,
    meta: &LaunchMeta,
    fetcher: Arc<dyn LibraryFetcher>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<ServerInstallOutcome> {
    tokio::fs::create_dir_all(&spec.server_dir)
        .await
        .with_context(|| format!("Could not create {:?}", spec.server_dir))?;
    tokio::fs::create_dir_all(&spec.libraries_dir)
        .await
        .with_context(|| format!("Could not create {:?}", spec.libraries_dir))?;

    reporter.start_step("Downloading libraries", Some(2));
    let libraries = server_library_list(spec, meta);
    let sources = fetch_libraries(spec, libraries, fetcher, reporter.clone()).await?;

    reporter.start_step("Generating server launch jar", Some(2));
    let bundle = BundleSpec::new(
        sources.clone(),
        spec.launch_jar_path(),
        BundleManifest::server(meta.server_main_class()),
    );
    let destination = bundle.destination.clone();
    let blocking_reporter = reporter.clone();
    let report = tokio::task::spawn_blocking(move || {
        assemble_bundle(&bundle, blocking_reporter.as_ref())
    })
    .await
    .context("Launch jar assembly task failed")?
    .with_context(|| format!("Failed to assemble {:?}", destination))?;

    Ok(ServerInstallOutcome {
        launch_jar: report.destination.clone(),
        libraries: sources,
        report,
    })
}

/// Meta server libraries, then the loader itself and the intermediary mappings,
/// de-duplicated by coordinates.
pub fn server_library_list(spec: &ServerInstallSpec, meta: &LaunchMeta) -> Vec<LibraryRef> {
    let loader = LibraryRef::new(
        format!("net.fabricmc:fabric-loader:{}", spec.loader_version),
        Some(spec.maven_url.as_str()),
    );
    let intermediary = LibraryRef::new(
        format!("net.fabricmc:intermediary:{}", spec.game_version),
        Some(spec.maven_url.as_str()),
    );

    let mut seen = HashSet::new();
    meta.server_libraries()
        .cloned()
        .chain([loader, intermediary])
        .filter(|lib| seen.insert(lib.name.clone()))
        .collect()
}

async fn fetch_libraries(
    spec: &ServerInstallSpec,
    libraries: Vec<LibraryRef>,
    fetcher: Arc<dyn LibraryFetcher>,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<Vec<PathBuf>> {
    let total = libraries.len() as u32;
    let completed = Arc::new(AtomicUsize::new(0));
    reporter.set_step_count(0, Some(total));

    // `buffered` yields in input order, which is the merge order
    stream::iter(libraries)
        .map(|library| {
            let fetcher = fetcher.clone();
            let reporter = reporter.clone();
            let completed = completed.clone();
            async move {
                let path = fetch_library(
                    &library,
                    &spec.libraries_dir,
                    &spec.maven_url,
                    fetcher.as_ref(),
                    reporter.as_ref(),
                )
                .await?;
                let count = completed.fetch_add(1, Ordering::SeqCst) + 1;
                reporter.set_step_count(count as u32, Some(total));
                Ok::<PathBuf, anyhow::Error>(path)
            }
        })
        .buffered(spec.concurrency.max(1))
        .try_collect()
        .await
}

async fn fetch_library(
    library: &LibraryRef,
    libraries_dir: &Path,
    default_repo: &str,
    fetcher: &dyn LibraryFetcher,
    reporter: &dyn ProgressReporter,
) -> Result<PathBuf> {
    let relative = maven_to_path(&library.name)?;
    let destination = libraries_dir.join(&relative);

    if destination.exists() {
        match library.sha1.as_deref() {
            Some(expected) if sha1_matches(&destination, expected).await? => {
                log::debug!("Library {} already present and verified", library.name);
                return Ok(destination);
            }
            Some(_) => {
                log::warn!(
                    "Library '{}' had mismatched sha1, fetching again...",
                    destination.display()
                );
                let _ = tokio::fs::remove_file(&destination).await;
            }
            None => {
                log::debug!("Library {} already present", library.name);
                return Ok(destination);
            }
        }
    }

    if let Some(parent) = destination.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Create library dir {:?}", parent))?;
    }

    let url = library.download_url(default_repo)?;
    reporter.set_message(&format!("Downloading library {}", library.name));

    // The cache path only ever holds complete, verified jars
    let part = part_path(&destination);
    let _ = tokio::fs::remove_file(&part).await;
    if let Err(err) = fetch_verified(library, url.as_str(), &part, fetcher).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(err);
    }

    tokio::fs::rename(&part, &destination)
        .await
        .with_context(|| format!("Move {:?} into place at {:?}", part, destination))?;

    Ok(destination)
}

fn part_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("library");
    destination.with_file_name(format!("{}.part", name))
}

async fn fetch_verified(
    library: &LibraryRef,
    url: &str,
    part: &Path,
    fetcher: &dyn LibraryFetcher,
) -> Result<()> {
    fetcher
        .fetch(library, url, part)
        .await
        .with_context(|| format!("Failed to fetch library {} from {}", library.name, url))?;

    if !part.exists() {
        bail!(
            "Fetch of {} reported success but {:?} is missing",
            library.name,
            part
        );
    }

    if let Some(expected) = library.sha1.as_deref() {
        let actual = file_sha1(part).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            bail!(
                "SHA-1 mismatch for {}: expected {}, got {}",
                library.name,
                expected,
                actual
            );
        }
        log::debug!("SHA-1 verified for {}: {}", library.name, actual);
    }

    Ok(())
}

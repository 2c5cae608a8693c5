use piston_bundle::bundle::archive::ArchiveReader;
use piston_bundle::{
    assemble_bundle, BundleManifest, BundleSpec, FnProgressReporter, SilentProgressReporter,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

fn jar(dir: &Path, name: &str, entries: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let f = std::fs::File::create(&path).unwrap();
    let mut zip = zip::ZipWriter::new(f);
    for (entry, content) in entries {
        zip.start_file(*entry, SimpleFileOptions::default()).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
    path
}

fn read_all(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut reader = ArchiveReader::open(path).expect("output should be a valid jar");
    let mut out = Vec::new();
    while let Some(mut entry) = reader.next_entry().unwrap() {
        let content = entry.read_all().unwrap();
        out.push((entry.path().to_string(), content));
    }
    out
}

#[test]
fn integration_launch_jar_merges_libraries() {
    let _ = env_logger::builder().is_test(true).try_init();
    let tmp = TempDir::new().expect("tmpdir");
    let service = "META-INF/services/org.slf4j.spi.SLF4JServiceProvider";

    let loader = jar(
        tmp.path(),
        "fabric-loader.jar",
        &[
            ("net/fabricmc/loader/Main.class", b"\xca\xfe\xba\xbeloader"),
            (service, b"a\n#note\nb"),
            ("x.txt", b"1"),
        ],
    );
    let logging = jar(
        tmp.path(),
        "log4j-slf4j.jar",
        &[(service, b"b\r\nc\r\n"), ("x.txt", b"2")],
    );
    let dest = tmp.path().join("server").join("fabric-server-launch.jar");

    let messages = Mutex::new(Vec::new());
    let reporter = FnProgressReporter(|m: &str| messages.lock().unwrap().push(m.to_string()));
    let spec = BundleSpec::new(
        vec![loader, logging],
        dest.clone(),
        BundleManifest::server("net.fabricmc.loader.impl.launch.knot.KnotServer"),
    );

    let report = assemble_bundle(&spec, &reporter).expect("assembly failed");

    let entries = read_all(&dest);
    let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "META-INF/MANIFEST.MF",
            "fabric-server-launch.properties",
            "net/fabricmc/loader/Main.class",
            "x.txt",
            service,
        ]
    );
    assert_eq!(entries[2].1, b"\xca\xfe\xba\xbeloader".to_vec());
    assert_eq!(entries[3].1, b"1".to_vec());
    assert_eq!(entries[4].1, b"a\nb\nc\n".to_vec());
    assert_eq!(
        entries[1].1,
        b"launch.mainClass=net.fabricmc.loader.impl.launch.knot.KnotServer\n".to_vec()
    );

    assert_eq!(report.total_entries(), entries.len());
    assert_eq!(report.duplicate_count(), 1);
    assert_eq!(report.duplicates[0].path, "x.txt");
    assert_eq!(messages.lock().unwrap().len(), 3);
}

#[test]
fn integration_rerun_uses_fresh_state() {
    let tmp = TempDir::new().expect("tmpdir");
    let a = jar(tmp.path(), "a.jar", &[("a.txt", b"a")]);
    let b = jar(tmp.path(), "b.jar", &[("b.txt", b"b")]);
    let dest = tmp.path().join("out.jar");
    let manifest = BundleManifest::server("Main");

    let first = assemble_bundle(
        &BundleSpec::new(vec![a.clone(), b.clone()], dest.clone(), manifest.clone()),
        &SilentProgressReporter,
    )
    .unwrap();
    assert_eq!(first.copied_entries, 2);

    // Second run over the same output replaces it and reports no stale duplicates
    let second = assemble_bundle(
        &BundleSpec::new(vec![b], dest.clone(), manifest),
        &SilentProgressReporter,
    )
    .unwrap();
    assert_eq!(second.copied_entries, 1);
    assert_eq!(second.duplicate_count(), 0);

    let names: Vec<String> = read_all(&dest).into_iter().map(|(n, _)| n).collect();
    assert_eq!(
        names,
        vec!["META-INF/MANIFEST.MF", "fabric-server-launch.properties", "b.txt"]
    );
}

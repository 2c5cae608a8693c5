use crate::bundle::config::{DEFAULT_FETCH_CONCURRENCY, FABRIC_MAVEN_URL, SERVER_LAUNCH_JAR_NAME};
use crate::bundle::AssemblyReport;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A library entry from loader launcher meta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRef {
    /// Maven coordinates (`group:artifact:version[:classifier][@ext]`)
    pub name: String,

    /// Repository base URL; the default Maven is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha1: Option<String>,
}

impl LibraryRef {
    pub fn new(name: impl Into<String>, url: Option<&str>) -> Self {
        Self {
            name: name.into(),
            url: url.map(str::to_string),
            sha1: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MainClass {
    Single(String),
    Split { client: String, server: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchLibraries {
    #[serde(default)]
    pub common: Vec<LibraryRef>,
    #[serde(default)]
    pub client: Vec<LibraryRef>,
    #[serde(default)]
    pub server: Vec<LibraryRef>,
}

/// Loader launcher meta (the `launcherMeta` JSON published alongside a loader)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchMeta {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub libraries: LaunchLibraries,
    pub main_class: MainClass,
}

impl LaunchMeta {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse launcher meta")
    }

    pub fn server_main_class(&self) -> &str {
        match &self.main_class {
            MainClass::Single(class) => class,
            MainClass::Split { server, .. } => server,
        }
    }

    /// Libraries needed on a dedicated server: common first, then server-only.
    pub fn server_libraries(&self) -> impl Iterator<Item = &LibraryRef> {
        self.libraries
            .common
            .iter()
            .chain(self.libraries.server.iter())
    }
}

/// Server installation specification
#[derive(Debug, Clone)]
pub struct ServerInstallSpec {
    /// Directory the launch jar is written into
    pub server_dir: PathBuf,

    /// Local library cache (Maven layout)
    pub libraries_dir: PathBuf,

    /// Minecraft version ID (e.g., "1.20.1")
    pub game_version: String,

    /// Loader version (e.g., "0.15.11")
    pub loader_version: String,

    /// Repository for the loader and intermediary artifacts
    pub maven_url: String,

    /// Number of concurrent library fetches
    pub concurrency: usize,
}

impl ServerInstallSpec {
    pub fn new(server_dir: PathBuf, game_version: String, loader_version: String) -> Self {
        Self {
            libraries_dir: server_dir.join("libraries"),
            server_dir,
            game_version,
            loader_version,
            maven_url: FABRIC_MAVEN_URL.to_string(),
            concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }

    pub fn launch_jar_path(&self) -> PathBuf {
        self.server_dir.join(SERVER_LAUNCH_JAR_NAME)
    }
}

#[derive(Debug, Clone)]
pub struct ServerInstallOutcome {
    pub launch_jar: PathBuf,
    /// Library jars in the order they were merged
    pub libraries: Vec<PathBuf>,
    pub report: AssemblyReport,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_split_main_class_meta() {
        let meta = LaunchMeta::from_json(
            r#"{
                "version": 1,
                "libraries": {
                    "client": [{"name": "net.fabricmc:client-only:1.0", "url": "https://maven.fabricmc.net/"}],
                    "common": [{"name": "org.ow2.asm:asm:9.6", "url": "https://maven.fabricmc.net/"}],
                    "server": [{"name": "net.fabricmc:server-only:1.0"}],
                    "development": []
                },
                "mainClass": {
                    "client": "net.fabricmc.loader.impl.launch.knot.KnotClient",
                    "server": "net.fabricmc.loader.impl.launch.knot.KnotServer"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            meta.server_main_class(),
            "net.fabricmc.loader.impl.launch.knot.KnotServer"
        );
        let names: Vec<&str> = meta.server_libraries().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["org.ow2.asm:asm:9.6", "net.fabricmc:server-only:1.0"]);
    }

    #[test]
    fn parse_single_main_class_meta() {
        let meta = LaunchMeta::from_json(
            r#"{"mainClass": "net.fabricmc.loader.launch.knot.KnotServer"}"#,
        )
        .unwrap();
        assert_eq!(meta.server_main_class(), "net.fabricmc.loader.launch.knot.KnotServer");
        assert_eq!(meta.server_libraries().count(), 0);
    }

    #[test]
    fn parse_rejects_missing_main_class() {
        assert!(LaunchMeta::from_json(r#"{"version": 1}"#).is_err());
    }

    #[test]
    fn spec_defaults() {
        let spec = ServerInstallSpec::new(
            PathBuf::from("/srv/mc"),
            "1.20.1".to_string(),
            "0.15.11".to_string(),
        );
        assert_eq!(spec.libraries_dir, PathBuf::from("/srv/mc/libraries"));
        assert_eq!(spec.launch_jar_path(), PathBuf::from("/srv/mc/fabric-server-launch.jar"));
        assert_eq!(spec.maven_url, "https://maven.fabricmc.net/");
    }
}

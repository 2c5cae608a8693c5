//! Centralized bundle settings.
//! Static constants; `BundleSpec` and `ServerInstallSpec` use them as defaults.

/// Directory whose direct children are merged instead of copied.
pub const SERVICES_DIR: &str = "META-INF/services/";

pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.MF";
pub const MANIFEST_VERSION: &str = "1.0";

pub const LAUNCH_PROPERTIES_PATH: &str = "fabric-server-launch.properties";
pub const LAUNCH_MAIN_CLASS_KEY: &str = "launch.mainClass";

/// Bootstrap class written into the manifest; it reads the launch properties.
pub const SERVER_LAUNCHER_MAIN_CLASS: &str =
    "net.fabricmc.loader.launch.server.FabricServerLauncher";

pub const SERVER_LAUNCH_JAR_NAME: &str = "fabric-server-launch.jar";

// Copy buffer used when streaming entries between archives
pub const COPY_BUFFER_SIZE: usize = 32 * 1024;

// Manifest lines are limited to 72 bytes, continuation lines start with a space
pub const MANIFEST_LINE_LIMIT: usize = 72;

// URL Constants
pub const FABRIC_MAVEN_URL: &str = "https://maven.fabricmc.net/";

pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

use crate::bundle::config::{
    LAUNCH_MAIN_CLASS_KEY, LAUNCH_PROPERTIES_PATH, MANIFEST_LINE_LIMIT, MANIFEST_PATH,
    MANIFEST_VERSION, SERVER_LAUNCHER_MAIN_CLASS,
};
use serde::{Deserialize, Serialize};

/// Fixed metadata written as the first two entries of every bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleManifest {
    /// `Manifest-Version` attribute
    pub manifest_version: String,

    /// `Main-Class` attribute: the bootstrap launcher
    pub main_class: String,

    /// Class the bootstrap launcher hands over to (the real entry point)
    pub launch_main_class: String,

    /// Path of the properties entry carrying `launch_main_class`
    pub properties_path: String,
}

impl BundleManifest {
    /// Server bundle manifest with the default Fabric bootstrap launcher.
    pub fn server(launch_main_class: impl Into<String>) -> Self {
        Self {
            manifest_version: MANIFEST_VERSION.to_string(),
            main_class: SERVER_LAUNCHER_MAIN_CLASS.to_string(),
            launch_main_class: launch_main_class.into(),
            properties_path: LAUNCH_PROPERTIES_PATH.to_string(),
        }
    }

    /// Both bootstrap entry paths, in write order.
    pub fn bootstrap_paths(&self) -> [&str; 2] {
        [MANIFEST_PATH, self.properties_path.as_str()]
    }

    /// `META-INF/MANIFEST.MF` body: CRLF line endings, 72-byte wrapped
    /// attributes, terminated by an empty line.
    pub fn render_manifest(&self) -> Vec<u8> {
        let mut out = String::new();
        write_attribute(&mut out, "Manifest-Version", &self.manifest_version);
        write_attribute(&mut out, "Main-Class", &self.main_class);
        out.push_str("\r\n");
        out.into_bytes()
    }

    pub fn render_properties(&self) -> Vec<u8> {
        format!("{}={}\n", LAUNCH_MAIN_CLASS_KEY, self.launch_main_class).into_bytes()
    }
}

fn write_attribute(out: &mut String, name: &str, value: &str) {
    let line = format!("{}: {}", name, value);
    let mut rest = line.as_str();
    let mut limit = MANIFEST_LINE_LIMIT;
    let mut first = true;

    while !rest.is_empty() {
        if !first {
            out.push(' ');
        }
        let split = floor_char_boundary(rest, limit);
        out.push_str(&rest[..split]);
        out.push_str("\r\n");
        rest = &rest[split..];
        // Continuation lines spend one byte on the leading space
        limit = MANIFEST_LINE_LIMIT - 1;
        first = false;
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut idx = max;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_server_manifest() {
        let manifest = BundleManifest::server("net.minecraft.server.Main");
        let text = String::from_utf8(manifest.render_manifest()).unwrap();
        assert_eq!(
            text,
            "Manifest-Version: 1.0\r\nMain-Class: net.fabricmc.loader.launch.server.FabricServerLauncher\r\n\r\n"
        );
    }

    #[test]
    fn test_render_properties() {
        let manifest = BundleManifest::server("net.minecraft.server.Main");
        assert_eq!(
            manifest.render_properties(),
            b"launch.mainClass=net.minecraft.server.Main\n".to_vec()
        );
        assert_eq!(
            manifest.bootstrap_paths(),
            ["META-INF/MANIFEST.MF", "fabric-server-launch.properties"]
        );
    }

    #[test]
    fn test_long_attribute_is_wrapped() {
        let mut manifest = BundleManifest::server("x");
        manifest.main_class = format!("com.example.{}", "a".repeat(100));
        let text = String::from_utf8(manifest.render_manifest()).unwrap();

        for line in text.split("\r\n") {
            assert!(line.len() <= MANIFEST_LINE_LIMIT, "line too long: {line}");
        }

        // Unwrapping continuation lines restores the attribute
        let unwrapped = text.replace("\r\n ", "");
        assert!(unwrapped.contains(&format!("Main-Class: {}\r\n", manifest.main_class)));
    }
}

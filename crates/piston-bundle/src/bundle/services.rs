//! `META-INF/services` merging.
//!
//! Service definition files list implementation class names, one per line.
//! When several jars ship the same file, the bundle gets one file holding the
//! union of all lines, in the order they were first seen.
use crate::bundle::error::{BundleError, BundleResult};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::io::Read;

/// Insertion-ordered set: a sequence plus a membership index.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    items: Vec<T>,
    index: HashSet<T>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Append `value` unless already present. Returns true if it was added.
    pub fn insert(&mut self, value: T) -> bool {
        if self.index.contains(&value) {
            return false;
        }
        self.index.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// One merged service definition ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedService {
    pub path: String,
    pub contents: Vec<u8>,
}

/// Accumulates service definitions across all source archives.
#[derive(Debug)]
pub struct ServiceMerger {
    prefix: String,
    order: Vec<String>,
    services: HashMap<String, OrderedSet<String>>,
}

impl ServiceMerger {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            order: Vec::new(),
            services: HashMap::new(),
        }
    }

    /// Direct children of the services directory are merged; anything nested
    /// deeper is an ordinary file.
    pub fn is_merge_path(&self, path: &str) -> bool {
        match path.strip_prefix(self.prefix.as_str()) {
            Some(rest) => !rest.is_empty() && !rest.contains('/'),
            None => false,
        }
    }

    /// Fold the lines of one service file into the set for `path`.
    /// Returns the number of lines that were new.
    pub fn ingest(&mut self, path: &str, bytes: &[u8]) -> usize {
        let text = String::from_utf8_lossy(bytes);
        let mut added = 0;

        for line in definition_lines(&text) {
            if !self.services.contains_key(path) {
                self.order.push(path.to_string());
                self.services.insert(path.to_string(), OrderedSet::new());
            }
            if let Some(set) = self.services.get_mut(path) {
                if set.insert(line.to_string()) {
                    added += 1;
                }
            }
        }

        added
    }

    pub fn ingest_reader<R: Read + ?Sized>(&mut self, path: &str, reader: &mut R) -> BundleResult<usize> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|source| BundleError::EntryRead {
                entry: path.to_string(),
                source,
            })?;
        Ok(self.ingest(path, &bytes))
    }

    /// Number of distinct service paths with at least one line.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn lines(&self, path: &str) -> Option<&OrderedSet<String>> {
        self.services.get(path)
    }

    /// Render every merged file, in the order the paths were first seen.
    pub fn flush_all(mut self) -> Vec<MergedService> {
        let mut merged = Vec::with_capacity(self.order.len());
        for path in self.order {
            let Some(set) = self.services.remove(&path) else {
                continue;
            };
            let mut contents = String::new();
            for line in set.iter() {
                contents.push_str(line);
                contents.push('\n');
            }
            merged.push(MergedService {
                path,
                contents: contents.into_bytes(),
            });
        }
        merged
    }
}

/// Significant lines of a service file: comments stripped, trimmed, non-empty.
/// Accepts `\n`, `\r\n` and bare `\r` terminators.
fn definition_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c| c == '\n' || c == '\r').filter_map(|raw| {
        let line = match raw.find('#') {
            Some(pos) => &raw[..pos],
            None => raw,
        };
        // Same trim set as the JVM's String.trim: controls and space
        let line = line.trim_matches(|c: char| c <= ' ');
        (!line.is_empty()).then_some(line)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::config::SERVICES_DIR;

    const PATH: &str = "META-INF/services/net.fabricmc.api.ModInitializer";

    fn contents(merged: &[MergedService], path: &str) -> String {
        let entry = merged.iter().find(|m| m.path == path).expect("missing path");
        String::from_utf8(entry.contents.clone()).unwrap()
    }

    #[test]
    fn test_is_merge_path() {
        let merger = ServiceMerger::new(SERVICES_DIR);
        assert!(merger.is_merge_path(PATH));
        assert!(!merger.is_merge_path("META-INF/services/"));
        assert!(!merger.is_merge_path("META-INF/services/nested/Thing"));
        assert!(!merger.is_merge_path("META-INF/MANIFEST.MF"));
        assert!(!merger.is_merge_path("meta-inf/services/lowercase.Thing"));
    }

    #[test]
    fn test_ordered_set_keeps_first_insertion() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert!(set.contains(&"a"));
        assert_eq!(set.into_vec(), vec!["b", "a"]);
    }

    #[test]
    fn test_union_across_sources_in_first_seen_order() {
        let mut merger = ServiceMerger::new(SERVICES_DIR);
        merger.ingest(PATH, b"a\n#note\nb");
        merger.ingest(PATH, b"b\nc");

        let merged = merger.flush_all();
        assert_eq!(merged.len(), 1);
        assert_eq!(contents(&merged, PATH), "a\nb\nc\n");
    }

    #[test]
    fn test_comments_whitespace_and_terminators() {
        let mut merger = ServiceMerger::new(SERVICES_DIR);
        let added = merger.ingest(
            PATH,
            b"  com.example.One  # trailing comment\r\n\r\n\tcom.example.Two\rcom.example.One\n#only comment\n",
        );
        assert_eq!(added, 2);

        let merged = merger.flush_all();
        assert_eq!(contents(&merged, PATH), "com.example.One\ncom.example.Two\n");
    }

    #[test]
    fn test_comment_only_file_is_not_emitted() {
        let mut merger = ServiceMerger::new(SERVICES_DIR);
        assert_eq!(merger.ingest(PATH, b"# nothing here\n\n   \n"), 0);
        assert!(merger.is_empty());
        assert!(merger.flush_all().is_empty());
    }

    #[test]
    fn test_paths_flush_in_first_seen_order() {
        let mut merger = ServiceMerger::new(SERVICES_DIR);
        merger.ingest("META-INF/services/z.Last", b"z.Impl");
        merger.ingest("META-INF/services/a.First", b"a.Impl");
        merger.ingest("META-INF/services/z.Last", b"z.Other");

        let paths: Vec<String> = merger.flush_all().into_iter().map(|m| m.path).collect();
        assert_eq!(
            paths,
            vec![
                "META-INF/services/z.Last".to_string(),
                "META-INF/services/a.First".to_string()
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced_not_fatal() {
        let mut merger = ServiceMerger::new(SERVICES_DIR);
        let added = merger
            .ingest_reader(PATH, &mut &b"ok.Impl\n\xff\xfe\n"[..])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(merger.lines(PATH).unwrap().len(), 2);
    }
}

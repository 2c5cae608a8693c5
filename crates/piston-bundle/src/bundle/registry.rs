use std::collections::HashSet;

/// Paths already written to the output by direct copy.
#[derive(Debug, Default)]
pub struct EntryRegistry {
    paths: HashSet<String>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path` for the output. False means it was already taken.
    pub fn register(&mut self, path: &str) -> bool {
        if self.paths.contains(path) {
            return false;
        }
        self.paths.insert(path.to_string())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

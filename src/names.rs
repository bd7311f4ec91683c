//! Beer name cache, persisted between runs so names are only looked up once.
//!
//! Stored as `<folder>/untappd.metadata`, one `id~name` line per beer.

use crate::beer::DELIMITER;
use crate::error::{CellarError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const CACHE_FILE: &str = "untappd.metadata";

/// Cache file inside a cache folder
pub fn cache_file(folder: &Path) -> PathBuf {
    folder.join(CACHE_FILE)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameCache {
    names: BTreeMap<u32, String>,
}

impl NameCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the cache from `folder`; a missing file gives an empty cache
    pub fn load(folder: &Path) -> Result<Self> {
        let path = cache_file(folder);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No name cache at {}", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(CellarError::persistence(path, e)),
        };

        let mut cache = Self::new();
        for line in content.lines() {
            let parsed = line
                .split_once(DELIMITER)
                .and_then(|(id, name)| Some((id.parse::<u32>().ok()?, name)));

            match parsed {
                Some((id, name)) => cache.insert(id, name),
                None if line.is_empty() => {}
                None => tracing::warn!("Skipping bad name cache line: {}", line),
            }
        }

        Ok(cache)
    }

    /// Write the cache to `folder`, creating it if needed
    pub fn save(&self, folder: &Path) -> Result<()> {
        fs::create_dir_all(folder).map_err(|e| CellarError::persistence(folder, e))?;

        let path = cache_file(folder);
        let content: String = self
            .names
            .iter()
            .map(|(id, name)| format!("{}{}{}\n", id, DELIMITER, name))
            .collect();

        fs::write(&path, content).map_err(|e| CellarError::persistence(path, e))
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn insert(&mut self, id: u32, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let folder = temp.path().join("prod_cache");

        let mut cache = NameCache::new();
        cache.insert(7936, "Firestone Walker Brewing Company - Parabola");
        cache.insert(1234, "Tester1");
        cache.save(&folder).unwrap();

        let reloaded = NameCache::load(&folder).unwrap();
        assert_eq!(reloaded, cache);
        assert_eq!(reloaded.get(1234), Some("Tester1"));
    }

    #[test]
    fn test_load_missing_folder() {
        let temp = TempDir::new().unwrap();
        let cache = NameCache::load(&temp.path().join("nothing_here")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_load_skips_bad_lines() {
        let temp = TempDir::new().unwrap();
        fs::write(
            cache_file(temp.path()),
            "12~Good Beer\nnot a line\nabc~Bad Id\n13~Odd~Name\n",
        )
        .unwrap();

        let cache = NameCache::load(temp.path()).unwrap();
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get(13), Some("Odd~Name"));
    }
}

//! Prompt-keyed image cache and its persisted snapshot form.
//!
//! The in-memory map is authoritative for the life of the process. The
//! snapshot is a JSON object of prompt → image URIs; reading one only fills
//! prompts that are not already cached.

use crate::models::ImageResult;
use crate::Result;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCache {
    entries: BTreeMap<String, ImageResult>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact-match lookup.
    pub fn get(&self, prompt: &str) -> Option<&ImageResult> {
        self.entries.get(prompt)
    }

    pub fn contains(&self, prompt: &str) -> bool {
        self.entries.contains_key(prompt)
    }

    /// Store a generation result. Empty results are not cached so the
    /// prompt is retried next time. Returns whether the entry was written.
    pub fn insert(&mut self, prompt: &str, images: ImageResult) -> bool {
        if images.is_empty() {
            return false;
        }
        self.entries.insert(prompt.to_string(), images);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_snapshot(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.entries)?)
    }

    /// Merge a persisted snapshot, keeping every entry already in memory.
    /// Returns the number of prompts added.
    pub fn merge_snapshot(&mut self, snapshot: &str) -> Result<usize> {
        let stored: BTreeMap<String, Option<ImageResult>> = serde_json::from_str(snapshot)?;

        let mut added = 0;
        for (prompt, images) in stored {
            let Some(images) = images.filter(|images| !images.is_empty()) else {
                continue;
            };
            if !self.entries.contains_key(&prompt) {
                self.entries.insert(prompt, images);
                added += 1;
            }
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(items: &[&str]) -> ImageResult {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_results_are_not_cached() {
        let mut cache = ImageCache::new();
        assert!(!cache.insert("lamb", Vec::new()));
        assert!(!cache.contains("lamb"));
        assert!(cache.insert("lamb", urls(&["u1"])));
        assert_eq!(cache.get("lamb"), Some(&urls(&["u1"])));
    }

    #[test]
    fn test_lookup_is_exact() {
        let mut cache = ImageCache::new();
        cache.insert("A red apple", urls(&["u1"]));
        assert!(cache.get("a red apple").is_none());
        assert!(cache.get("A red apple ").is_none());
    }

    #[test]
    fn test_snapshot_restores_entries() {
        let mut cache = ImageCache::new();
        cache.insert("a red apple", urls(&["u1", "u2"]));
        let snapshot = cache.to_snapshot().unwrap();

        let mut restored = ImageCache::new();
        assert_eq!(restored.merge_snapshot(&snapshot).unwrap(), 1);
        assert_eq!(restored, cache);
    }

    #[test]
    fn test_merge_never_overwrites_memory() {
        let mut cache = ImageCache::new();
        cache.insert("x", urls(&["fresh"]));

        let added = cache
            .merge_snapshot(r#"{"x": ["stale"], "y": ["old"]}"#)
            .unwrap();

        assert_eq!(added, 1);
        assert_eq!(cache.get("x"), Some(&urls(&["fresh"])));
        assert_eq!(cache.get("y"), Some(&urls(&["old"])));
    }

    #[test]
    fn test_merge_skips_null_and_empty_entries() {
        let mut cache = ImageCache::new();
        let added = cache
            .merge_snapshot(r#"{"a": null, "b": [], "c": ["u"]}"#)
            .unwrap();
        assert_eq!(added, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_merge_rejects_corrupt_snapshot() {
        let mut cache = ImageCache::new();
        assert!(cache.merge_snapshot("{not json").is_err());
        assert!(cache.merge_snapshot(r#"{"a": [1]}"#).is_err());
        assert!(cache.is_empty());
    }
}

//! Playable URL registry.
//!
//! Every thumbnail, preview and video asset handed to the presentation layer is
//! addressed by an opaque `blob:` URL minted here. URLs are a scarce resource:
//! whoever owns the catalog must revoke them when the catalog is replaced.

use crate::system::fs::FileInfo;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

const URL_PREFIX: &str = "blob:reelshelf/";

#[derive(Debug, Default)]
struct Registry {
    next_id: u64,
    live: HashMap<String, PathBuf>,
}

#[derive(Debug, Clone, Default)]
pub struct UrlRegistry {
    inner: Arc<Mutex<Registry>>,
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mint a fresh URL for `file`. Minting the same file twice yields two
    /// distinct URLs that must each be revoked.
    pub fn mint(&self, file: &FileInfo) -> String {
        let mut registry = self.lock();
        registry.next_id += 1;
        let url = format!("{}{}", URL_PREFIX, registry.next_id);
        registry.live.insert(url.clone(), file.location.clone());
        debug!("Minted {} for {:?}", url, file.location);
        url
    }

    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.lock().live.get(url).cloned()
    }

    /// Returns false if the URL was unknown or already revoked.
    pub fn revoke(&self, url: &str) -> bool {
        self.lock().live.remove(url).is_some()
    }

    pub fn revoke_all<'a>(&self, urls: impl IntoIterator<Item = &'a str>) -> usize {
        let mut registry = self.lock();
        urls.into_iter()
            .filter(|url| registry.live.remove(*url).is_some())
            .count()
    }

    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(path: &str) -> FileInfo {
        FileInfo {
            name: path.rsplit('/').next().unwrap_or(path).to_string(),
            media_type: None,
            location: PathBuf::from(path),
            size_bytes: 0,
        }
    }

    #[test]
    fn test_mint_resolve_revoke() {
        let urls = UrlRegistry::new();
        let a = urls.mint(&info("show/a.mp4"));
        let b = urls.mint(&info("show/a.mp4"));

        assert_ne!(a, b);
        assert!(a.starts_with("blob:reelshelf/"));
        assert_eq!(urls.resolve(&a), Some(PathBuf::from("show/a.mp4")));
        assert_eq!(urls.live_count(), 2);

        assert!(urls.revoke(&a));
        assert!(!urls.revoke(&a));
        assert_eq!(urls.resolve(&a), None);
        assert_eq!(urls.live_count(), 1);
    }

    #[test]
    fn test_revoke_all_counts_only_live_urls() {
        let urls = UrlRegistry::new();
        let minted: Vec<String> = (0..3).map(|i| urls.mint(&info(&format!("{}.mp4", i)))).collect();
        urls.revoke(&minted[0]);

        let revoked = urls.revoke_all(minted.iter().map(String::as_str));
        assert_eq!(revoked, 2);
        assert_eq!(urls.live_count(), 0);
    }

    #[test]
    fn test_clones_share_state() {
        let urls = UrlRegistry::new();
        let other = urls.clone();
        let url = urls.mint(&info("x.webm"));
        assert!(other.revoke(&url));
        assert_eq!(urls.live_count(), 0);
    }
}

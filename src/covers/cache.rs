//! Cover caching with both memory and disk layers.
//!
//! - Memory cache: byte-bounded LRU of decoded covers, keyed by URL hash
//! - Disk cache: raw fetched bytes in XDG_CACHE_HOME/catshelf/covers/
//!
//! Disk entries hold undecoded bytes so a change of cover size or corner
//! radius does not invalidate them. The disk layer has no size bound; entries
//! stay until the cache directory is cleared.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use lru::LruCache;
use parking_lot::Mutex;
use tracing::{debug, trace, warn};
use xxhash_rust::xxh3::xxh3_64;

use super::CoverImage;

/// Bump when the on-disk layout changes.
const COVER_CACHE_VERSION: u8 = 1;

pub fn cover_key(url: &str) -> u64 {
    let mut data = Vec::with_capacity(url.len() + 1);
    data.push(COVER_CACHE_VERSION);
    data.extend_from_slice(url.as_bytes());
    xxh3_64(&data)
}

fn disk_filename(key: u64) -> String {
    format!("{:016x}.cover", key)
}

struct MemoryCovers {
    entries: LruCache<u64, Arc<CoverImage>>,
    bytes: usize,
    max_bytes: usize,
}

impl MemoryCovers {
    fn insert(&mut self, key: u64, image: Arc<CoverImage>) {
        let added = image.byte_len();
        if let Some(existing) = self.entries.put(key, image) {
            self.bytes = self.bytes.saturating_sub(existing.byte_len());
        }
        self.bytes = self.bytes.saturating_add(added);

        while self.bytes > self.max_bytes {
            if let Some((_key, evicted)) = self.entries.pop_lru() {
                self.bytes = self.bytes.saturating_sub(evicted.byte_len());
            } else {
                break;
            }
        }
    }
}

pub struct CoverCache {
    memory: Mutex<MemoryCovers>,
    disk_dir: Option<PathBuf>,
}

impl CoverCache {
    pub fn new(max_memory_bytes: usize, disk_dir: Option<PathBuf>) -> Self {
        let disk_dir = disk_dir.and_then(|dir| match std::fs::create_dir_all(&dir) {
            Ok(()) => Some(dir),
            Err(e) => {
                warn!(?dir, error = ?e, "Failed to create cover cache directory, disk cache disabled");
                None
            }
        });

        debug!(?disk_dir, max_memory_bytes, "Initialized cover cache");

        Self {
            memory: Mutex::new(MemoryCovers {
                entries: LruCache::unbounded(),
                bytes: 0,
                max_bytes: max_memory_bytes,
            }),
            disk_dir,
        }
    }

    #[cfg(test)]
    pub fn memory_only(max_memory_bytes: usize) -> Self {
        Self::new(max_memory_bytes, None)
    }

    pub fn get(&self, url: &str) -> Option<Arc<CoverImage>> {
        self.memory.lock().entries.get(&cover_key(url)).cloned()
    }

    pub fn insert(&self, url: &str, image: Arc<CoverImage>) {
        self.memory.lock().insert(cover_key(url), image);
    }

    pub fn memory_bytes(&self) -> usize {
        self.memory.lock().bytes
    }

    pub fn len(&self) -> usize {
        self.memory.lock().entries.len()
    }

    pub fn disk_dir(&self) -> Option<&Path> {
        self.disk_dir.as_deref()
    }

    fn disk_path(&self, url: &str) -> Option<PathBuf> {
        self.disk_dir
            .as_ref()
            .map(|dir| dir.join(disk_filename(cover_key(url))))
    }

    pub fn read_disk(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.disk_path(url)?;
        match std::fs::read(&path) {
            Ok(bytes) => {
                trace!(url, "Cover disk cache hit");
                Some(bytes)
            }
            Err(_) => None,
        }
    }

    /// Store fetched bytes. Written to a temp file first so readers never
    /// see a partial entry.
    pub fn write_disk(&self, url: &str, bytes: &[u8]) -> std::io::Result<()> {
        let Some(path) = self.disk_path(url) else {
            return Ok(());
        };
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &path)
    }

    pub fn remove_disk(&self, url: &str) {
        if let Some(path) = self.disk_path(url) {
            let _ = std::fs::remove_file(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cover(side: u32) -> Arc<CoverImage> {
        Arc::new(CoverImage {
            rgba: vec![0; (side * side * 4) as usize],
            width: side,
            height: side,
        })
    }

    #[test]
    fn test_key_is_stable_and_distinct() {
        assert_eq!(cover_key("https://x/jazz.png"), cover_key("https://x/jazz.png"));
        assert_ne!(cover_key("https://x/jazz.png"), cover_key("https://x/rock.png"));
        assert!(disk_filename(cover_key("a")).ends_with(".cover"));
        assert_eq!(disk_filename(0x1f).len(), 16 + ".cover".len());
    }

    #[test]
    fn test_memory_hit_and_miss() {
        let cache = CoverCache::memory_only(1024 * 1024);
        assert!(cache.get("https://x/jazz.png").is_none());

        let jazz = cover(4);
        cache.insert("https://x/jazz.png", jazz.clone());

        assert!(Arc::ptr_eq(&cache.get("https://x/jazz.png").unwrap(), &jazz));
        assert!(cache.get("https://x/rock.png").is_none());
        assert_eq!(cache.memory_bytes(), 64);
    }

    #[test]
    fn test_memory_evicts_least_recent_by_bytes() {
        // 8x8 RGBA = 256 bytes per cover, room for two
        let cache = CoverCache::memory_only(600);
        cache.insert("a", cover(8));
        cache.insert("b", cover(8));
        assert!(cache.get("a").is_some());

        cache.insert("c", cover(8));

        assert!(cache.get("a").is_some());
        assert!(cache.get("b").is_none());
        assert!(cache.get("c").is_some());
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.memory_bytes(), 512);
    }

    #[test]
    fn test_reinsert_replaces_byte_count() {
        let cache = CoverCache::memory_only(1024 * 1024);
        cache.insert("a", cover(8));
        cache.insert("a", cover(4));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.memory_bytes(), 64);
    }

    #[test]
    fn test_disk_roundtrip_and_remove() {
        let dir = tempdir().unwrap();
        let cache = CoverCache::new(1024, Some(dir.path().join("covers")));
        assert!(cache.disk_dir().is_some());

        cache.write_disk("https://x/jazz.png", b"jazz-bytes").unwrap();
        assert_eq!(
            cache.read_disk("https://x/jazz.png").as_deref(),
            Some(&b"jazz-bytes"[..])
        );
        assert!(cache.read_disk("https://x/rock.png").is_none());

        cache.remove_disk("https://x/jazz.png");
        assert!(cache.read_disk("https://x/jazz.png").is_none());
    }

    #[test]
    fn test_memory_only_skips_disk() {
        let cache = CoverCache::memory_only(1024);
        cache.write_disk("https://x/jazz.png", b"jazz-bytes").unwrap();
        assert!(cache.read_disk("https://x/jazz.png").is_none());
        assert!(cache.disk_dir().is_none());
    }
}

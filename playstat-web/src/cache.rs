//! In-memory cache for static files served by the resolvers.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use scc::HashMap;

/// Static file contents keyed by their path below the web directory.
///
/// Entries expire `ttl` after they were loaded; expiry is checked on access.
/// Concurrent misses on the same path may each load the file.
pub struct ResourceCache {
    ttl: Duration,
    entries: HashMap<String, (Instant, Arc<Vec<u8>>)>,
}

impl ResourceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Cached contents of `path`, or the result of `load` when the entry is
    /// missing or expired. Failed loads are not cached.
    pub fn get_or_load(
        &self,
        path: &str,
        load: impl FnOnce() -> io::Result<Vec<u8>>,
    ) -> io::Result<Arc<Vec<u8>>> {
        let cached = self.entries.read_sync(path, |_, (loaded_at, bytes)| {
            (loaded_at.elapsed() < self.ttl).then(|| Arc::clone(bytes))
        });
        if let Some(Some(bytes)) = cached {
            return Ok(bytes);
        }

        let bytes = Arc::new(load()?);
        let _ = self.entries.remove_sync(path);
        let _ = self
            .entries
            .insert_sync(path.to_string(), (Instant::now(), Arc::clone(&bytes)));
        Ok(bytes)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_second_read_is_served_from_cache() {
        let cache = ResourceCache::new(Duration::from_secs(60));
        let loads = Cell::new(0);
        let load = || {
            loads.set(loads.get() + 1);
            Ok(b"body {}".to_vec())
        };

        let first = cache.get_or_load("css/style.css", load).unwrap();
        let second = cache.get_or_load("css/style.css", load).unwrap();

        assert_eq!(first.as_slice(), b"body {}");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loads.get(), 1);
    }

    #[test]
    fn test_expired_entry_is_reloaded() {
        let cache = ResourceCache::new(Duration::ZERO);

        cache.get_or_load("index.html", || Ok(b"old".to_vec())).unwrap();
        let reloaded = cache.get_or_load("index.html", || Ok(b"new".to_vec())).unwrap();

        assert_eq!(reloaded.as_slice(), b"new");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let cache = ResourceCache::new(Duration::from_secs(60));

        let missing = cache.get_or_load("missing.js", || Err(io::Error::from(io::ErrorKind::NotFound)));

        assert_eq!(missing.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(cache.is_empty());
    }
}

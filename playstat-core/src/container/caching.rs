use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::DataContainer;
use crate::error::Result;

/// How long a caching supplier keeps its value unless told otherwise.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

type Original<T> = Arc<dyn Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync>;

/// Memoizes a producer for a time-to-live.
///
/// The cache starts out stale, so the first read always runs the producer.
/// Absent results are not cached. Concurrent reads are serialized, which
/// means a producer must not read its own key.
pub struct CachingSupplier<T> {
    original: Original<T>,
    ttl: Duration,
    cached: Mutex<Option<(Instant, T)>>,
}

impl<T: Clone + Send + Sync> CachingSupplier<T> {
    pub fn new<F>(original: F) -> Self
    where
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self::with_ttl(original, DEFAULT_TTL)
    }

    pub fn with_ttl<F>(original: F, ttl: Duration) -> Self
    where
        F: Fn(&dyn DataContainer) -> Result<Option<T>> + Send + Sync + 'static,
    {
        Self {
            original: Arc::new(original),
            ttl,
            cached: Mutex::new(None),
        }
    }

    /// The cached value while it is fresh, otherwise the producer's result.
    pub fn get(&self, container: &dyn DataContainer) -> Result<Option<T>> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((computed_at, value)) = cached.as_ref() {
            if computed_at.elapsed() < self.ttl {
                return Ok(Some(value.clone()));
            }
        }

        let fresh = (self.original)(container)?;
        *cached = fresh.clone().map(|value| (Instant::now(), value));
        Ok(fresh)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::sleep;

    use super::*;
    use crate::container::RawDataContainer;

    fn counting(calls: Arc<AtomicUsize>) -> impl Fn(&dyn DataContainer) -> Result<Option<usize>> + Send + Sync {
        move |_: &dyn DataContainer| Ok(Some(calls.fetch_add(1, Ordering::SeqCst) + 1))
    }

    #[test]
    fn test_value_is_reused_within_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let supplier = CachingSupplier::new(counting(calls.clone()));
        let container = RawDataContainer::new();

        assert_eq!(supplier.get(&container).unwrap(), Some(1));
        assert_eq!(supplier.get(&container).unwrap(), Some(1));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(supplier.ttl(), DEFAULT_TTL);
    }

    #[test]
    fn test_value_is_recomputed_after_ttl() {
        let calls = Arc::new(AtomicUsize::new(0));
        let supplier = CachingSupplier::with_ttl(counting(calls.clone()), Duration::from_millis(20));
        let container = RawDataContainer::new();

        assert_eq!(supplier.get(&container).unwrap(), Some(1));
        sleep(Duration::from_millis(40));
        assert_eq!(supplier.get(&container).unwrap(), Some(2));
    }

    #[test]
    fn test_absent_result_is_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let supplier = CachingSupplier::new(move |_: &dyn DataContainer| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None::<i64>)
        });
        let container = RawDataContainer::new();

        assert_eq!(supplier.get(&container).unwrap(), None);
        assert_eq!(supplier.get(&container).unwrap(), None);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}

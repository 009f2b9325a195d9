//! Bounded LRU caching in front of any data provider.
//!
//! Each lookup kind has its own fixed-capacity cache keyed by the full
//! argument tuple. When a cache is full the least-recently-used entry is
//! evicted. Cached values are clones of what the inner provider returned, so
//! wrapping a provider never changes what a caller observes.

use chrono::NaiveDate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::provider::{DataProvider, PriceHistory};
use crate::domain::{Bar, PriceField};

type PriceKey = (String, NaiveDate, PriceField);
type HistoryKey = (Vec<String>, NaiveDate, usize, PriceField);
type BarsKey = (Vec<String>, NaiveDate, NaiveDate);

/// Capacity of each cache.
#[derive(Debug, Clone, Copy)]
pub struct CacheCapacity {
    pub prices: NonZeroUsize,
    pub histories: NonZeroUsize,
    pub bars: NonZeroUsize,
}

impl Default for CacheCapacity {
    fn default() -> Self {
        Self {
            prices: NonZeroUsize::new(1024).unwrap_or(NonZeroUsize::MIN),
            histories: NonZeroUsize::new(128).unwrap_or(NonZeroUsize::MIN),
            bars: NonZeroUsize::new(128).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// Hit/miss counters across all three caches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// LRU-caching wrapper around a [`DataProvider`].
pub struct CachedProvider<P> {
    inner: P,
    prices: Mutex<LruCache<PriceKey, Option<f64>>>,
    histories: Mutex<LruCache<HistoryKey, PriceHistory>>,
    bars: Mutex<LruCache<BarsKey, Vec<Bar>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// A poisoned cache only means another thread panicked mid-lookup; the
/// cached values themselves are still whole clones.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<P: DataProvider> CachedProvider<P> {
    pub fn new(inner: P) -> Self {
        Self::with_capacity(inner, CacheCapacity::default())
    }

    pub fn with_capacity(inner: P, capacity: CacheCapacity) -> Self {
        Self {
            inner,
            prices: Mutex::new(LruCache::new(capacity.prices)),
            histories: Mutex::new(LruCache::new(capacity.histories)),
            bars: Mutex::new(LruCache::new(capacity.bars)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }
}

impl<P: DataProvider> DataProvider for CachedProvider<P> {
    fn get_bars(&self, symbols: &[String], start: NaiveDate, end: NaiveDate) -> Vec<Bar> {
        let key = (symbols.to_vec(), start, end);
        if let Some(bars) = lock(&self.bars).get(&key) {
            self.hit();
            return bars.clone();
        }
        self.miss();
        let bars = self.inner.get_bars(symbols, start, end);
        lock(&self.bars).put(key, bars.clone());
        bars
    }

    fn get_history(
        &self,
        symbols: &[String],
        end_date: NaiveDate,
        lookback: usize,
        field: PriceField,
    ) -> PriceHistory {
        let key = (symbols.to_vec(), end_date, lookback, field);
        if let Some(history) = lock(&self.histories).get(&key) {
            self.hit();
            return history.clone();
        }
        self.miss();
        let history = self.inner.get_history(symbols, end_date, lookback, field);
        lock(&self.histories).put(key, history.clone());
        history
    }

    fn get_price(&self, symbol: &str, date: NaiveDate, field: PriceField) -> Option<f64> {
        let key = (symbol.to_string(), date, field);
        if let Some(price) = lock(&self.prices).get(&key) {
            self.hit();
            return *price;
        }
        self.miss();
        let price = self.inner.get_price(symbol, date, field);
        lock(&self.prices).put(key, price);
        price
    }
}
